//! Full session lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `EventioApi` over
//! real HTTP with `UreqTransport`. Validates that key injection, bearer
//! injection and token rotation all line up with the backend.

use std::sync::Arc;
use std::time::Duration;

use eventio_core::{
    ApiError, Clients, Credentials, EventFilter, EventioApi, MemoryTokenStore, MissingTokenPolicy,
    RequestOptions, Settings, TokenStore, UreqTransport,
};

const API_KEY: &str = "integration-key";

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn api(base_url: &str, api_key: &str, policy: MissingTokenPolicy) -> (EventioApi, Arc<MemoryTokenStore>) {
    let settings = Settings::new(base_url, api_key)
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    let store = Arc::new(MemoryTokenStore::new());
    let transport = Arc::new(UreqTransport::new(settings.timeout()));
    let clients = Clients::with_policy(&settings, store.clone(), transport, policy).unwrap();
    (EventioApi::new(clients), store)
}

fn demo_credentials() -> Credentials {
    Credentials {
        email: mock_server::DEMO_EMAIL.to_string(),
        password: mock_server::DEMO_PASSWORD.to_string(),
    }
}

#[test]
fn session_lifecycle() {
    let base_url = start_server();
    let (api, store) = api(&base_url, API_KEY, MissingTokenPolicy::PassThrough);

    // Step 1: public listing works with only the API key.
    let events = api.list_events().unwrap();
    assert_eq!(events.len(), 2);

    // Step 2: fetch one event by id.
    let event = api.get_event(events[0].id).unwrap();
    assert_eq!(event.title, events[0].title);

    // The seed has one upcoming and one past event.
    assert_eq!(api.list_events_filtered(EventFilter::Future).unwrap().len(), 1);
    assert_eq!(api.list_events_filtered(EventFilter::Past).unwrap().len(), 1);

    // Step 3: /me without a token passes through and the server says 401.
    let err = api.me().unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 401, .. }), "{err:?}");

    // Step 4: login stores both rotation headers.
    let user = api.login(&demo_credentials()).unwrap();
    assert_eq!(user.email, mock_server::DEMO_EMAIL);
    let first_access = store.access_token().expect("access token stored");
    let first_refresh = store.refresh_token().expect("refresh token stored");

    // Step 5: /me now authenticates.
    let me = api.me().unwrap();
    assert_eq!(me, user);

    // Step 6: refresh rotates both tokens.
    api.refresh_session().unwrap();
    assert_ne!(store.access_token().unwrap(), first_access);
    assert_ne!(store.refresh_token().unwrap(), first_refresh);
    assert_eq!(api.me().unwrap(), user);

    // Step 7: sign out, then /me is rejected again.
    api.sign_out().unwrap();
    let err = api.me().unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[test]
fn wrong_api_key_is_an_http_error() {
    let base_url = start_server();
    let (api, _) = api(&base_url, "not-the-key", MissingTokenPolicy::PassThrough);
    let err = api.list_events().unwrap_err();
    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body["error"], "invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn required_token_blocks_private_calls_before_dispatch() {
    let base_url = start_server();
    let (api, _) = api(&base_url, API_KEY, MissingTokenPolicy::Require);

    let err = api.me().unwrap_err();
    assert!(err.is_auth_required());
    let err = api.refresh_session().unwrap_err();
    assert!(matches!(err, ApiError::MissingRefreshToken), "{err:?}");

    api.login(&demo_credentials()).unwrap();
    api.me().unwrap();
}

#[test]
fn unknown_path_surfaces_404() {
    let base_url = start_server();
    let (api, _) = api(&base_url, API_KEY, MissingTokenPolicy::PassThrough);
    let err = api
        .clients()
        .public
        .request("/nowhere", RequestOptions::get())
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn closed_port_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let (api, _) = api(&format!("http://{addr}"), API_KEY, MissingTokenPolicy::PassThrough);
    let err = api.list_events().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}
