use std::time::Instant;
use async_trait::async_trait;
use serde::Deserialize;
use wasp_common::{
    AuthToken, Flow, HeaderInterceptor, LogLevel, RawResponse, RequestDescriptor, RequestInterceptor, Result, Wasp,
};
use wasp_macro::service;

#[derive(Debug, Deserialize)]
struct User {
    id: u32,
    name: String,
}

/// 提供令牌，只作用于标注了 `auth` 的方法
struct TokenProvider {
    token: String,
}

#[async_trait]
impl RequestInterceptor for TokenProvider {
    fn auth_token(&self) -> Option<AuthToken> {
        Some(AuthToken::bearer(&self.token))
    }
}

/// 记录请求与响应
struct Logger;

#[async_trait]
impl RequestInterceptor for Logger {
    async fn before_request(&self, request: RequestDescriptor) -> anyhow::Result<Flow> {
        println!("📤 {} {}", request.verb, request.url);
        Ok(Flow::Proceed(request))
    }

    async fn after_response(&self, response: RawResponse) -> anyhow::Result<RawResponse> {
        println!("📥 {} ({} bytes)", response.status, response.body.len());
        Ok(response)
    }
}

/// 方法级拦截器：拒绝发送到非 HTTPS 地址
#[derive(Default)]
struct HttpsOnly;

#[async_trait]
impl RequestInterceptor for HttpsOnly {
    async fn before_request(&self, request: RequestDescriptor) -> anyhow::Result<Flow> {
        anyhow::ensure!(request.url.scheme() == "https", "refusing to send {} over plain HTTP", request.url);
        Ok(Flow::Proceed(request))
    }
}

#[service]
trait UserApi {
    #[get(path = "/users/{id}")]
    async fn user(&self, id: u32) -> Result<User>;

    #[get(path = "/users/{id}", auth, interceptor = HttpsOnly)]
    async fn private_user(&self, id: u32) -> Result<User>;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let wasp = Wasp::builder()
        .set_endpoint("https://jsonplaceholder.typicode.com")?
        .set_log_level(LogLevel::FullRestOnly)
        .add_request_interceptor(Logger)
        .add_request_interceptor(TokenProvider {
            token: "demo-token".into(),
        })
        .add_request_interceptor(HeaderInterceptor::new().header("X-Client", "wasp-demo")?)
        .build()?;
    let api = wasp.create::<UserApiClient>()?;

    let started = Instant::now();
    let user = api.user(1).await?;
    println!("✅ {} (#{}) in {:?}\n", user.name, user.id, started.elapsed());

    let user = api.private_user(2).await?;
    println!("✅ {} (#{}) with Authorization header", user.name, user.id);

    Ok(())
}
