use http::HeaderMap;
use oauth2_proxy_session::{
    Cipher, RedisStoreOptions, SessionError, SessionOptions, SessionStore, new_session_store,
    secret_bytes,
};
use std::sync::Arc;

use crate::common::{MockBrowser, assert_same_session, cookie_options, signed_in_session};

#[tokio::test]
async fn test_factory_builds_working_cookie_store() {
    let opts = SessionOptions {
        store_type: "cookie".to_string(),
        cipher: Some(Arc::new(
            Cipher::new(&secret_bytes("A3Xbr6fu6Al0HkgrP1ztjb-mYiwmxgNPP-XbNsz1WBk=")).unwrap(),
        )),
        ..SessionOptions::default()
    };
    let store = new_session_store(&opts, &cookie_options()).unwrap();
    let mut browser = MockBrowser::new();
    let mut state = signed_in_session();

    let mut response = HeaderMap::new();
    store
        .save(&browser.request(), &mut response, &mut state)
        .await
        .unwrap();
    browser.receive(&response);

    let loaded = store.load(&browser.request()).await.unwrap();
    assert_same_session(&loaded, &state);
}

#[test]
fn test_factory_builds_redis_store_without_connecting() {
    let opts = SessionOptions {
        store_type: "redis".to_string(),
        redis: RedisStoreOptions {
            connection_url: "redis://127.0.0.1:6379/0".to_string(),
            ..RedisStoreOptions::default()
        },
        ..SessionOptions::default()
    };

    assert!(new_session_store(&opts, &cookie_options()).is_ok());
}

#[test]
fn test_factory_rejects_unknown_type() {
    let opts = SessionOptions {
        store_type: "memcache".to_string(),
        ..SessionOptions::default()
    };

    match new_session_store(&opts, &cookie_options()) {
        Err(err @ SessionError::UnknownStoreType(_)) => {
            assert_eq!(err.to_string(), "unknown session store type 'memcache'");
        }
        _ => panic!("Expected UnknownStoreType error"),
    }
}

#[test]
fn test_options_from_lookup_feed_factory() {
    let lookup = |key: &str| match key {
        "SESSION_STORE_TYPE" => Some("cookie".to_string()),
        "SESSION_CIPHER_SECRET" => Some("0123456789abcdef".to_string()),
        _ => None,
    };

    let opts = SessionOptions::from_lookup(lookup).unwrap();
    assert!(opts.cipher.is_some());
    assert!(new_session_store(&opts, &cookie_options()).is_ok());
}
