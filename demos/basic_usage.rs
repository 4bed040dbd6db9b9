use serde::{Deserialize, Serialize};
use wasp_common::{Error, LogLevel, Response, Result, Wasp};
use wasp_macro::service;

/// 用户数据结构
#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

/// 创建用户请求
#[derive(Serialize)]
struct CreateUserRequest {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u32,
    title: String,
}

#[service(endpoint = "https://jsonplaceholder.typicode.com")]
trait UserApi {
    /// 获取用户信息
    #[get(path = "/users/{id}", header = "Accept: application/json")]
    async fn user(&self, id: u32) -> Result<User>;

    /// 获取所有用户，保留状态码与耗时
    #[get(path = "/users")]
    async fn users(&self) -> Result<Response<Vec<User>>>;

    /// 某个用户的帖子
    #[get(path = "/posts")]
    async fn posts(&self, #[query("userId")] user_id: u32, #[query("_limit")] limit: Option<u32>) -> Result<Vec<Post>>;

    /// 创建新用户
    #[post(path = "/users", content_type = json)]
    async fn create_user(&self, #[body] user: &CreateUserRequest) -> Result<User>;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    println!("=== Wasp Basic Usage Example ===\n");

    // 服务自带地址，这里的地址只作为默认值
    let wasp = Wasp::builder()
        .set_endpoint("https://example.invalid")?
        .set_log_level(LogLevel::FullRestOnly)
        .build()?;
    let api = wasp.create::<UserApiClient>()?;

    println!("1. 获取单个用户");
    match api.user(1).await {
        Ok(user) => println!("   ✅ {} <{}>\n", user.name, user.email),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    println!("2. 获取全部用户");
    let response = api.users().await?;
    println!(
        "   ✅ {} 个用户，状态 {}，耗时 {:?}\n",
        response.body.len(),
        response.status,
        response.network_time
    );

    println!("3. 查询参数");
    for post in api.posts(1, Some(3)).await? {
        println!("   - #{} {}", post.id, post.title);
    }
    println!();

    println!("4. 创建新用户");
    let new_user = CreateUserRequest {
        name: "张三".to_string(),
        email: "zhangsan@example.com".to_string(),
    };
    match api.create_user(&new_user).await {
        Ok(user) => println!("   ✅ 创建的用户 id: {}\n", user.id),
        Err(Error::Service(err)) => println!("   ❌ 服务端返回 {}: {}\n", err.status, err.url),
        Err(e) => println!("   ❌ 错误: {}\n", e),
    }

    println!("5. 不存在的用户");
    if let Err(err) = api.user(100_000).await {
        println!("   状态码: {:?}", err.status());
    }

    Ok(())
}
