use std::sync::mpsc;
use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wasp_common::{
    AuthToken, CallHandle, Callback, Error, MockTransport, NetworkMode, RequestInterceptor, Response, Result,
    ServiceContract, StatusCode, Wasp,
};
use wasp_macro::service;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: u64,
    name: String,
}

fn ada() -> User {
    User {
        id: 1,
        name: "Ada".into(),
    }
}

#[service(endpoint = "https://api.example.com/v1")]
pub trait UserService {
    /// 按 id 查询
    #[get(path = "/users/{id}", header = "Accept: application/json")]
    async fn user(&self, id: u64) -> Result<User>;

    #[get(path = "/users/{id}")]
    async fn user_response(&self, #[path("id")] user_id: u64) -> Result<Response<User>>;

    #[post(path = "/users", auth)]
    async fn create(&self, #[body] user: &User, #[header] x_trace: &str) -> Result<User>;

    #[get(path = "/search")]
    async fn search(&self, #[query("q")] text: &str, #[query] page: Option<u32>) -> Result<Vec<User>>;

    #[post(path = "/login", content_type = form_urlencoded)]
    async fn login(&self, #[field] user: &str, #[field] password: &str) -> Result<()>;

    #[get(path = "/ping", mock(status = 200, body = "pong"))]
    async fn ping(&self) -> Result<String>;

    #[get(path = "/users")]
    fn users(&self, #[query] page: u32, callback: impl Callback<Vec<User>>) -> CallHandle;

    #[get(path = "/version")]
    fn version(&self) -> Result<String>;
}

#[service]
trait HealthService {
    #[head(path = "/health")]
    async fn health(&self) -> anyhow::Result<()>;
}

fn mock_wasp(mock: &MockTransport) -> Wasp {
    Wasp::builder()
        .set_endpoint("https://fallback.example.com")
        .unwrap()
        .set_network_mode(NetworkMode::Mock)
        .set_mock_transport(mock.clone())
        .build()
        .unwrap()
}

fn json(value: &impl Serialize) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[test]
fn test_contract_metadata() {
    assert_eq!(UserServiceClient::NAME, "UserService");
    assert_eq!(UserServiceClient::ENDPOINT, Some("https://api.example.com/v1"));
    assert_eq!(UserServiceClient::methods().len(), 8);
    assert!(UserServiceClient::template("user").is_some());
    assert!(UserServiceClient::template("nope").is_none());

    let create = UserServiceClient::template("create").unwrap();
    assert!(create.auth);
    assert_eq!(create.params.len(), 2);
    assert_eq!(create.params[1].name, "X-Trace");

    assert_eq!(HealthServiceClient::ENDPOINT, None);
}

#[tokio::test]
async fn test_path_and_static_header() {
    let mock = MockTransport::recording();
    mock.respond("user", StatusCode::OK, json(&ada()));
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    assert_eq!(client.user(1).await.unwrap(), ada());

    let request = &mock.executed()[0];
    assert_eq!(request.url.as_str(), "https://api.example.com/v1/users/1");
    assert_eq!(request.headers["accept"], "application/json");
}

#[tokio::test]
async fn test_full_response_and_renamed_path() {
    let mock = MockTransport::recording();
    mock.respond("user_response", StatusCode::OK, json(&ada()));
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    let response = client.user_response(42).await.unwrap();
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.body, ada());
    assert_eq!(mock.executed()[0].url.path(), "/v1/users/42");
}

#[tokio::test]
async fn test_optional_query() {
    let mock = MockTransport::recording();
    mock.respond("search", StatusCode::OK, "[]");
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    client.search("rust", Some(2)).await.unwrap();
    client.search("rust", None).await.unwrap();

    let executed = mock.executed();
    assert_eq!(executed[0].url.query(), Some("q=rust&page=2"));
    assert_eq!(executed[1].url.query(), Some("q=rust"));
}

struct Token;

#[async_trait]
impl RequestInterceptor for Token {
    fn auth_token(&self) -> Option<AuthToken> {
        Some(AuthToken::bearer("t0ken"))
    }
}

#[tokio::test]
async fn test_body_header_and_auth() {
    let mock = MockTransport::recording();
    mock.respond("create", StatusCode::CREATED, json(&ada()));
    let client = Wasp::builder()
        .set_endpoint("https://fallback.example.com")
        .unwrap()
        .set_network_mode(NetworkMode::Mock)
        .set_mock_transport(mock.clone())
        .set_request_interceptor(Token)
        .build()
        .unwrap()
        .create::<UserServiceClient>()
        .unwrap();

    let created = client.create(&ada(), "trace-1").await.unwrap();
    assert_eq!(created, ada());

    let request = &mock.executed()[0];
    assert_eq!(request.headers["authorization"], "Bearer t0ken");
    assert_eq!(request.headers["x-trace"], "trace-1");
    let sent: User = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(sent, ada());
}

#[tokio::test]
async fn test_form_fields() {
    let mock = MockTransport::recording();
    mock.respond("login", StatusCode::NO_CONTENT, "");
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    client.login("ada", "s3cret").await.unwrap();

    let request = &mock.executed()[0];
    assert_eq!(request.body.as_deref(), Some(&b"user=ada&password=s3cret"[..]));
    assert_eq!(request.headers["content-type"], "application/x-www-form-urlencoded");
}

#[tokio::test]
async fn test_declared_mock() {
    let client = mock_wasp(&MockTransport::recording()).create::<UserServiceClient>().unwrap();
    assert_eq!(client.ping().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_service_error() {
    let mock = MockTransport::recording();
    mock.respond("user", StatusCode::NOT_FOUND, r#"{"message":"missing"}"#);
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    match client.user(9).await {
        Err(Error::Service(err)) => assert_eq!(err.status.as_u16(), 404),
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_endpoint_without_service_endpoint() {
    let mock = MockTransport::recording();
    mock.respond("health", StatusCode::OK, "");
    let client = mock_wasp(&mock).create::<HealthServiceClient>().unwrap();

    client.health().await.unwrap();
    assert_eq!(mock.executed()[0].url.as_str(), "https://fallback.example.com/health");
}

#[test]
fn test_blocking_method() {
    let mock = MockTransport::recording();
    mock.respond("version", StatusCode::OK, "1.2.3");
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    assert_eq!(client.version().unwrap(), "1.2.3");
}

#[test]
fn test_callback_method() {
    let mock = MockTransport::recording();
    mock.respond("users", StatusCode::OK, json(&vec![ada()]));
    let client = mock_wasp(&mock).create::<UserServiceClient>().unwrap();

    let (tx, rx) = mpsc::channel();
    let handle = client.users(1, move |result: Result<Response<Vec<User>>>| {
        let _ = tx.send(result.map(Response::into_body).ok());
    });

    let users = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(users, Some(vec![ada()]));
    assert_eq!(mock.executed()[0].url.query(), Some("page=1"));
    handle.detach();
}
