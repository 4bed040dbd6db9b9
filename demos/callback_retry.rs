use std::sync::mpsc;
use std::time::Duration;
use serde::Deserialize;
use wasp_common::{CallHandle, Callback, LogLevel, Response, Result, Wasp};
use wasp_macro::service;

#[derive(Debug, Deserialize)]
struct Comment {
    id: u32,
    email: String,
}

#[service(endpoint = "https://jsonplaceholder.typicode.com")]
trait CommentApi {
    /// 结果投递到回调线程
    #[get(path = "/comments")]
    fn comments(&self, #[query("postId")] post_id: u32, callback: impl Callback<Vec<Comment>>) -> CallHandle;

    /// 5xx 与连接失败时按指数退避重试
    #[get(path = "/comments/{id}", retry = "exponential(3, 100ms)")]
    fn comment(&self, id: u32) -> Result<Comment>;

    #[get(path = "/comments/{id}")]
    fn comment_response(&self, id: u32) -> Result<Response<Comment>>;
}

// 不在运行时内，客户端自带工作线程，同步方法可直接调用
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let wasp = Wasp::builder()
        .set_endpoint("https://example.invalid")?
        .set_log_level(LogLevel::Full)
        .build()?;
    let api = wasp.create::<CommentApiClient>()?;

    let (tx, rx) = mpsc::channel();
    let handle = api.comments(1, move |result: Result<Response<Vec<Comment>>>| {
        let thread = std::thread::current().name().map(str::to_string);
        let _ = tx.send((thread, result.map(Response::into_body)));
    });

    match rx.recv_timeout(Duration::from_secs(10))? {
        (thread, Ok(comments)) => println!("📬 {} comments delivered on {:?}", comments.len(), thread),
        (_, Err(e)) => println!("❌ callback failed: {}", e),
    }
    handle.detach();

    // 已取消的调用永远不会执行回调
    let cancelled = api.comments(2, |_: Result<Response<Vec<Comment>>>| {
        println!("never printed");
    });
    cancelled.cancel();
    println!("🛑 cancelled: {}", cancelled.is_cancelled());

    let comment = api.comment(3)?;
    println!("💬 #{} by {}", comment.id, comment.email);

    let response = api.comment_response(4)?;
    println!("⏱️  {} in {:?}", response.status, response.network_time);

    Ok(())
}
