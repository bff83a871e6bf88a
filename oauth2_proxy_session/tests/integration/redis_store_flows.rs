use chrono::Duration;
use http::HeaderMap;
use oauth2_proxy_session::{
    CookieOptions, InMemoryCache, RedisSessionStore, SessionError, SessionStore, Ticket, validate,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::common::{
    COOKIE_NAME, COOKIE_SECRET, MockBrowser, assert_same_session, cipher, cookie_options,
    signed_in_session,
};

fn store(cache: Arc<InMemoryCache>, cookie: CookieOptions) -> RedisSessionStore {
    RedisSessionStore::with_cache(cipher(), cookie, cache)
}

fn ticket_of(browser: &MockBrowser) -> Ticket {
    let value = browser.cookie(COOKIE_NAME).unwrap();
    let (payload, _) = validate(
        COOKIE_NAME,
        value,
        COOKIE_SECRET,
        Duration::hours(168),
        Default::default(),
    )
    .unwrap();
    Ticket::decode(COOKIE_NAME, &payload).unwrap()
}

#[tokio::test]
async fn test_save_load_clear_round_trip() {
    // Given a ticketed store and a browser that signed in
    let cache = Arc::new(InMemoryCache::new());
    let store = store(cache.clone(), cookie_options());
    let mut browser = MockBrowser::new();
    let mut state = signed_in_session();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut state)
        .await
        .unwrap();
    browser.receive(&response);

    // Then the browser holds one small cookie
    assert_eq!(browser.cookie_names(), vec![COOKIE_NAME]);
    assert!(browser.cookie(COOKIE_NAME).unwrap().len() < 200);

    // When the browser comes back, the same session loads
    let loaded = store.load(&browser.request()).await.unwrap();
    assert_same_session(&loaded, &state);

    // When signing out
    let stale_request = browser.request();
    let mut response = HeaderMap::new();
    store.clear(&browser.request(), &mut response).await.unwrap();
    browser.receive(&response);

    // Then neither the browser nor a replayed cookie recovers the session
    assert!(browser.cookie(COOKIE_NAME).is_none());
    assert!(cache.is_empty().await);
    assert!(matches!(
        store.load(&browser.request()).await,
        Err(SessionError::NoCookie(_))
    ));
    assert!(matches!(
        store.load(&stale_request).await,
        Err(SessionError::NotFound)
    ));
}

#[tokio::test]
async fn test_resave_updates_same_entry() {
    let cache = Arc::new(InMemoryCache::new());
    let store = store(cache.clone(), cookie_options());
    let mut browser = MockBrowser::new();

    let mut state = signed_in_session();
    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut state)
        .await
        .unwrap();
    browser.receive(&response);
    let first_ticket = ticket_of(&browser);

    // A refreshed token for the same session
    state.access_token = Some("tok2".to_string());
    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut state)
        .await
        .unwrap();
    browser.receive(&response);

    assert_eq!(ticket_of(&browser), first_ticket);
    assert_eq!(cache.len().await, 1);
    let loaded = store.load(&browser.request()).await.unwrap();
    assert_eq!(loaded.access_token.as_deref(), Some("tok2"));
}

#[tokio::test]
async fn test_concurrent_clients_get_isolated_tickets() {
    // Given many clients signing in at once
    let cache = Arc::new(InMemoryCache::new());
    let store = Arc::new(store(cache.clone(), cookie_options()));

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut browser = MockBrowser::new();
            let mut state = signed_in_session();
            state.email = Some(format!("user{i}@example.com"));
            state.user = state.email.clone();

            let mut response = HeaderMap::new();
            store
                .save(&browser.request(), &mut response, &mut state)
                .await
                .unwrap();
            browser.receive(&response);
            browser
        }));
    }

    let mut browsers = Vec::new();
    for handle in handles {
        browsers.push(handle.await.unwrap());
    }

    // Then every ticket id and secret is distinct and each client sees only its own session
    let tickets: Vec<Ticket> = browsers.iter().map(ticket_of).collect();
    let ids: HashSet<_> = tickets.iter().map(|t| t.id().to_string()).collect();
    let encodings: HashSet<_> = tickets.iter().map(|t| t.encode(COOKIE_NAME)).collect();
    assert_eq!(ids.len(), 20);
    assert_eq!(encodings.len(), 20);
    assert_eq!(cache.len().await, 20);

    for (i, browser) in browsers.iter().enumerate() {
        let loaded = store.load(&browser.request()).await.unwrap();
        assert_eq!(loaded.email, Some(format!("user{i}@example.com")));
    }
}

#[tokio::test]
async fn test_forged_ticket_for_other_session_is_rejected() {
    let cache = Arc::new(InMemoryCache::new());
    let store = store(cache.clone(), cookie_options());

    let mut alice = MockBrowser::new();
    let mut response = HeaderMap::new();
    store
        .save(&alice.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();
    alice.receive(&response);

    // Mallory knows alice's ticket id and guesses a secret, but cannot sign the cookie
    let victim_id = ticket_of(&alice).id().to_string();
    let guessed = Ticket::new().unwrap().encode(COOKIE_NAME);
    let (_, guessed_secret) = guessed.split_once('.').unwrap();
    let mut mallory = MockBrowser::new();
    mallory.set_cookie(
        COOKIE_NAME,
        &format!("{COOKIE_NAME}-{victim_id}.{guessed_secret}|1700000000|c2lnbmF0dXJl"),
    );

    assert!(matches!(
        store.load(&mallory.request()).await,
        Err(SessionError::Signature(_))
    ));

    // Saving from that request mints a fresh ticket instead of adopting alice's
    let mut response = HeaderMap::new();
    store
        .save(&mallory.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();
    mallory.receive(&response);
    assert_ne!(ticket_of(&mallory).id(), victim_id);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_entry_expires_with_cookie_lifetime() {
    // Given a store whose cookies live for one minute
    let cache = Arc::new(InMemoryCache::new());
    let cookie = CookieOptions {
        expire: Duration::minutes(1),
        ..cookie_options()
    };
    let store = store(cache.clone(), cookie);
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();
    browser.receive(&response);
    assert!(store.load(&browser.request()).await.is_ok());

    // When the cache TTL passes
    tokio::time::advance(std::time::Duration::from_secs(61)).await;

    // Then the entry is gone even though the cookie is still presented
    assert!(cache.is_empty().await);
    assert!(matches!(
        store.load(&browser.request()).await,
        Err(SessionError::NotFound)
    ));
}

#[tokio::test]
async fn test_session_without_cipher_keeps_identity_only() {
    let cache = Arc::new(InMemoryCache::new());
    let store = RedisSessionStore::with_cache(None, cookie_options(), cache);
    let mut browser = MockBrowser::new();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut signed_in_session())
        .await
        .unwrap();
    browser.receive(&response);

    let loaded = store.load(&browser.request()).await.unwrap();
    assert_eq!(loaded.email.as_deref(), Some("a@b.com"));
    assert_eq!(loaded.preferred_username.as_deref(), Some("alice"));
    assert_eq!(loaded.access_token, None);
    assert_eq!(loaded.refresh_token, None);
}
