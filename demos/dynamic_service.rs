use serde_json::Value;
use wasp_common::{
    Arguments, ContentType, HttpMethod, MockTransport, NetworkMode, ParamRole, RequestTemplate, Result,
    ServiceDefinition, StatusCode, Wasp, decode,
};

/// 运行时描述服务，无需宏
fn definition() -> ServiceDefinition {
    ServiceDefinition::new("Inventory")
        .endpoint("https://inventory.example.com/api")
        .method(RequestTemplate::new("item", HttpMethod::Get, "/items/{sku}").param("sku", ParamRole::Path))
        .method(
            RequestTemplate::new("restock", HttpMethod::Post, "/items/{sku}/stock")
                .param("sku", ParamRole::Path)
                .param("amount", ParamRole::Field)
                .content_type(ContentType::FormUrlEncoded)
                .auth(true),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mock = MockTransport::new();
    mock.respond("item", StatusCode::OK, r#"{"sku":"A-1","stock":3}"#);
    mock.respond("restock", StatusCode::OK, r#"{"sku":"A-1","stock":13}"#);

    let wasp = Wasp::builder()
        .set_endpoint("https://unused.example.com")?
        .set_network_mode(NetworkMode::Mock)
        .set_mock_transport(mock.clone())
        .build()?;
    let inventory = wasp.create_dynamic(definition())?;
    println!("📦 {} @ {}", inventory.service(), inventory.endpoint());

    let item = inventory
        .call("item", Arguments::new().path("sku", "A-1"), decode::json::<Value>)
        .await?;
    println!("{} -> {}", item.url, item.body);

    let restocked = inventory
        .call(
            "restock",
            Arguments::new().path("sku", "A-1").field("amount", 10),
            decode::json::<Value>,
        )
        .await?;
    println!("{} -> {}", restocked.url, restocked.body);

    // 未声明的方法在调用时报错
    if let Err(e) = inventory.call("remove", Arguments::new(), decode::unit).await {
        println!("❌ {}", e);
    }

    Ok(())
}
