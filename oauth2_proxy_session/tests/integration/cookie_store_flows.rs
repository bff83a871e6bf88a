use chrono::Duration;
use http::HeaderMap;
use oauth2_proxy_session::{
    CookieOptions, CookieSessionStore, DefaultProvider, MAX_COOKIE_LENGTH, SessionError,
    SessionManager, SessionState, SessionStore, SignatureError,
};
use std::sync::Arc;

use crate::common::{
    COOKIE_NAME, MockBrowser, assert_same_session, cipher, cookie_options, signed_in_session,
};

fn large_session() -> SessionState {
    SessionState {
        id_token: Some("x".repeat(6000)),
        ..signed_in_session()
    }
}

#[tokio::test]
async fn test_small_session_fits_one_cookie() {
    let store = CookieSessionStore::new(cipher(), cookie_options());
    let mut browser = MockBrowser::new();
    let mut state = signed_in_session();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut state)
        .await
        .unwrap();
    browser.receive(&response);

    assert_eq!(browser.cookie_names(), vec![COOKIE_NAME]);
    let loaded = store.load(&browser.request()).await.unwrap();
    assert_same_session(&loaded, &state);
}

#[tokio::test]
async fn test_oversized_session_is_split_and_reassembled() {
    // Given a session whose signed value is larger than one cookie
    let store = CookieSessionStore::new(cipher(), cookie_options());
    let mut browser = MockBrowser::new();
    let mut state = large_session();

    // When saving it
    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut state)
        .await
        .unwrap();
    browser.receive(&response);

    // Then it spans several cookies, each under the size limit
    let names = browser.cookie_names();
    assert!(names.len() >= 2, "expected split cookies, got {names:?}");
    for header in response.get_all(http::header::SET_COOKIE) {
        assert!(header.len() < MAX_COOKIE_LENGTH);
    }

    // And loading from exactly those cookies reproduces the session
    let loaded = store.load(&browser.request()).await.unwrap();
    assert_same_session(&loaded, &state);
}

#[tokio::test]
async fn test_shrinking_session_drops_old_shards() {
    let store = CookieSessionStore::new(cipher(), cookie_options());
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut large_session())
        .await
        .unwrap();
    browser.receive(&response);
    assert!(browser.cookie_names().len() >= 2);

    let mut small = signed_in_session();
    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut small)
        .await
        .unwrap();
    browser.receive(&response);

    assert_eq!(browser.cookie_names(), vec![COOKIE_NAME]);
    let loaded = store.load(&browser.request()).await.unwrap();
    assert_same_session(&loaded, &small);
}

#[tokio::test]
async fn test_missing_middle_shard_fails() {
    let store = CookieSessionStore::new(cipher(), cookie_options());
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut large_session())
        .await
        .unwrap();
    browser.receive(&response);

    browser.remove_cookie(&format!("{COOKIE_NAME}_1"));

    assert!(store.load(&browser.request()).await.is_err());
}

#[tokio::test]
async fn test_clear_then_load_fails() {
    let store = CookieSessionStore::new(cipher(), cookie_options());
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut large_session())
        .await
        .unwrap();
    browser.receive(&response);

    let mut response = HeaderMap::new();
    store.clear(&browser.request(), &mut response).await.unwrap();
    browser.receive(&response);

    assert!(browser.cookie_names().is_empty());
    assert!(matches!(
        store.load(&browser.request()).await,
        Err(SessionError::NoCookie(_))
    ));
}

#[tokio::test]
async fn test_tampered_cookie_is_rejected() {
    let store = CookieSessionStore::new(cipher(), cookie_options());
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();
    browser.receive(&response);

    let value = browser.cookie(COOKIE_NAME).unwrap().to_string();
    let (payload, rest) = value.split_once('|').unwrap();
    let mut bytes = payload.as_bytes().to_vec();
    bytes[10] = if bytes[10] == b'A' { b'B' } else { b'A' };
    let tampered = format!("{}|{rest}", String::from_utf8(bytes).unwrap());
    browser.set_cookie(COOKIE_NAME, &tampered);

    assert!(matches!(
        store.load(&browser.request()).await,
        Err(SessionError::Signature(SignatureError::InvalidSignature))
    ));
}

#[tokio::test]
async fn test_cookie_attributes_follow_options() {
    let store = CookieSessionStore::new(
        cipher(),
        CookieOptions {
            domains: vec![".example.com".to_string()],
            path: "/app".to_string(),
            secure: false,
            same_site: "strict".parse().unwrap(),
            expire: Duration::hours(2),
            ..cookie_options()
        },
    );
    let browser = MockBrowser::with_host("auth.example.com");

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();

    let header = response
        .get(http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(header.contains("; Path=/app"));
    assert!(header.contains("; Domain=.example.com"));
    assert!(header.contains("; Max-Age=7200"));
    assert!(header.contains("; HttpOnly"));
    assert!(!header.contains("; Secure"));
    assert!(header.contains("; SameSite=Strict"));
}

#[tokio::test]
async fn test_manager_over_cookie_store() {
    // A signed-in browser passes through the manager untouched
    let store: Arc<dyn SessionStore> = Arc::new(CookieSessionStore::new(cipher(), cookie_options()));
    let manager = SessionManager::new(store.clone(), Arc::new(DefaultProvider), Duration::hours(1));
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    manager
        .save_session(&browser.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();
    browser.receive(&response);

    let mut response = HeaderMap::new();
    let loaded = manager
        .load_session(&browser.request(), &mut response)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.email.as_deref(), Some("a@b.com"));
    assert!(response.is_empty());

    let mut response = HeaderMap::new();
    manager
        .clear_session(&browser.request(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);

    let mut response = HeaderMap::new();
    assert!(
        manager
            .load_session(&browser.request(), &mut response)
            .await
            .unwrap()
            .is_none()
    );
}
