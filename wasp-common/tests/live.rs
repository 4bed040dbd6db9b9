use std::time::Duration;
use serde::Deserialize;
use wasp_common::*;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Repo {
    name: String,
    stars: u32,
}

fn github() -> ServiceDefinition {
    ServiceDefinition::new("GitHub")
        .method(
            RequestTemplate::new("repo", HttpMethod::Get, "/repos/{owner}/{name}")
                .param("owner", ParamRole::Path)
                .param("name", ParamRole::Path)
                .header("Accept", "application/json"),
        )
        .method(
            RequestTemplate::new("flaky", HttpMethod::Get, "/flaky").retry(RetryPolicy::fixed(3, 10)),
        )
        .method(
            RequestTemplate::new("star", HttpMethod::Post, "/stars").param("repo", ParamRole::Body)
                .retry(RetryPolicy::fixed(3, 10)),
        )
        .method(
            RequestTemplate::new("login", HttpMethod::Post, "/login")
                .content_type(ContentType::FormUrlEncoded)
                .param("user", ParamRole::Field)
                .param("password", ParamRole::Field),
        )
        .method(RequestTemplate::new("me", HttpMethod::Get, "/me"))
}

async fn client(server: &MockServer, builder: WaspBuilder) -> Dispatcher {
    builder
        .set_endpoint(&server.uri())
        .unwrap()
        .build()
        .unwrap()
        .create_dynamic(github())
        .unwrap()
}

#[tokio::test]
async fn test_live_get_with_path_and_static_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/rust-lang/rust"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "rust",
            "stars": 100
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = client(&server, Wasp::builder().set_log_level(LogLevel::FullRestOnly)).await;
    let response = service
        .call(
            "repo",
            Arguments::new().path("owner", "rust-lang").path("name", "rust"),
            decode::json::<Repo>,
        )
        .await
        .unwrap();

    assert_eq!(response.body, Repo { name: "rust".into(), stars: 100 });
    assert!(response.headers.contains_key("content-type"));
}

#[tokio::test]
async fn test_retry_recovers_from_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let service = client(&server, Wasp::builder()).await;
    let body = service
        .call("flaky", Arguments::new(), decode::text)
        .await
        .unwrap()
        .into_body();
    assert_eq!(body, "ok");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let service = client(&server, Wasp::builder()).await;
    let err = service
        .call("flaky", Arguments::new(), decode::text)
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn test_non_idempotent_method_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stars"))
        .and(body_json(serde_json::json!({"repo": "wasp"})))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let service = client(&server, Wasp::builder()).await;
    let err = service
        .call(
            "star",
            Arguments::new().body(&serde_json::json!({"repo": "wasp"})),
            decode::unit,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service(_)));
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "session=abc; Path=/"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ada"))
        .mount(server)
        .await;
}

async fn login_then_me(service: &Dispatcher) -> Result<Response<String>> {
    service
        .call(
            "login",
            Arguments::new().field("user", "ada").field("password", "hunter2"),
            decode::unit,
        )
        .await?;
    service.call("me", Arguments::new(), decode::text).await
}

#[tokio::test]
async fn test_cookies_are_kept_between_calls() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let service = client(&server, Wasp::builder().enable_cookies(CookiePolicy::AcceptAll)).await;
    let me = login_then_me(&service).await.unwrap();
    assert_eq!(me.body, "ada");
}

#[tokio::test]
async fn test_accept_none_drops_cookies() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let service = client(&server, Wasp::builder().enable_cookies(CookiePolicy::AcceptNone)).await;
    let err = login_then_me(&service).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn test_query_map_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "wasp"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let definition = ServiceDefinition::new("Search").method(
        RequestTemplate::new("search", HttpMethod::Get, "/search").param("filters", ParamRole::QueryMap),
    );
    let service = Wasp::builder()
        .set_endpoint(&server.uri())
        .unwrap()
        .build()
        .unwrap()
        .create_dynamic(definition)
        .unwrap();

    let response = service
        .call(
            "search",
            Arguments::new().query_map([("q", "wasp"), ("page", "2")]),
            decode::unit,
        )
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 204);
}

#[tokio::test]
async fn test_refused_connection_is_connect_error() {
    let service = Wasp::builder()
        .set_endpoint("http://127.0.0.1:1")
        .unwrap()
        .build()
        .unwrap()
        .create_dynamic(github())
        .unwrap();

    let err = service
        .call("me", Arguments::new(), decode::unit)
        .await
        .unwrap_err();
    match err {
        Error::Transport(err) => {
            assert_eq!(err.kind, TransportErrorKind::Connect);
            assert_eq!(err.url.as_str(), "http://127.0.0.1:1/me");
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_server_is_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let stack = ReqwestStack::new().timeout(Duration::from_millis(100));
    let service = client(&server, Wasp::builder().set_http_stack(stack)).await;

    let err = service
        .call("me", Arguments::new(), decode::unit)
        .await
        .unwrap_err();
    match err {
        Error::Transport(err) => assert_eq!(err.kind, TransportErrorKind::Timeout),
        other => panic!("expected a transport error, got {other:?}"),
    }
}
