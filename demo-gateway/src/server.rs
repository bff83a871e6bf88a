use axum::Router;
use std::net::SocketAddr;

pub(crate) async fn spawn_http_server(port: u16, app: Router) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::debug!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await
}
