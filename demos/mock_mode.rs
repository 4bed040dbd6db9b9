use serde::Deserialize;
use wasp_common::{Error, MockTransport, NetworkMode, Result, StatusCode, Wasp};
use wasp_macro::service;

#[derive(Debug, Deserialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

#[service(endpoint = "https://api.example.com")]
trait UserApi {
    /// 响应来自 `demos/fixtures/users.json`
    #[get(path = "/users", mock(status = 200, file = "fixtures/users.json"))]
    async fn users(&self) -> Result<Vec<User>>;

    #[get(path = "/users/{id}", mock(status = 404, body = "{\"message\":\"not found\"}"))]
    async fn user(&self, id: u32) -> Result<User>;

    #[delete(path = "/users/{id}")]
    async fn remove(&self, id: u32) -> Result<()>;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 运行时预置的响应优先于方法声明的 mock
    let mock = MockTransport::new();
    mock.respond("remove", StatusCode::NO_CONTENT, "");

    let wasp = Wasp::builder()
        .set_endpoint("https://api.example.com")?
        .set_network_mode(NetworkMode::Mock)
        .set_mock_transport(mock.clone())
        .build()?;
    let api = wasp.create::<UserApiClient>()?;

    for user in api.users().await? {
        println!("👤 #{} {} <{}>", user.id, user.name, user.email);
    }

    match api.user(7).await {
        Err(Error::Service(err)) => println!("❌ {} -> {:?}", err.status, err.body),
        other => println!("unexpected: {other:?}"),
    }

    api.remove(1).await?;
    println!("🗑️  remove ran {} time(s) without touching the network", mock.executed_count("remove"));

    Ok(())
}
