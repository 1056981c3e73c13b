//! Session state written by one client and picked up by the next, the way the
//! command line reuses its session file between invocations.

use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use wardline::session::storage::COOKIES_KEY;
use wardline::{
    ApiClient, AuthApi, ClientConfig, Credential, FileStorage, MemorySessionStore, Session,
    Storage,
};
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_from_file(server: &MockServer, file: &Path) -> ApiClient {
    let storage = FileStorage::open(file).unwrap();
    let session = Session::restore(&storage);
    ApiClient::builder(ClientConfig::new(&server.uri()).unwrap())
        .session_store(Arc::new(MemorySessionStore::with_session(session)))
        .storage(Arc::new(storage))
        .build()
        .unwrap()
}

async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"csrfToken": "c"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn cookie_login_should_survive_a_new_client() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sessionid=abc123; Path=/; HttpOnly")
                .set_body_json(json!({"user": {"id": 4, "username": "nurse"}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/staff/"))
        .and(header_regex("cookie", "sessionid=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/staff/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let first = client_from_file(&server, &file);
    let session = AuthApi::new(first.clone()).login("nurse", "pw").await.unwrap();
    assert_eq!(session.access, Credential::SessionCookie);
    drop(first);

    let second = client_from_file(&server, &file);
    let response = second.get("/api/staff/").await.unwrap();

    assert_eq!(response.json_value().unwrap(), json!([{"id": 1}]));
    assert!(second.session_store().session().is_authenticated());
}

#[tokio::test]
async fn logout_should_forget_persisted_cookies() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(205))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    {
        let storage = FileStorage::open(&file).unwrap();
        storage.set("access_token", "session-auth").unwrap();
        storage.set(COOKIES_KEY, "sessionid=abc123").unwrap();
    }

    let client = client_from_file(&server, &file);
    AuthApi::new(client).logout().await.unwrap();

    let storage = FileStorage::open(&file).unwrap();
    assert_eq!(storage.get(COOKIES_KEY), None);
    assert_eq!(Session::restore(&storage), Session::default());
}
