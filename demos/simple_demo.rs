use serde::Deserialize;
use wasp_common::{LogLevel, Result, Wasp};
use wasp_macro::service;

#[derive(Debug, Deserialize)]
struct Todo {
    id: u32,
    title: String,
    completed: bool,
}

#[service]
trait TodoService {
    #[get(path = "/todos/{id}")]
    async fn todo(&self, id: u32) -> Result<Todo>;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let wasp = Wasp::builder()
        .set_endpoint("https://jsonplaceholder.typicode.com")?
        .set_log_level(LogLevel::FullRestOnly)
        .build()?;
    let todos = wasp.create::<TodoServiceClient>()?;

    let todo = todos.todo(1).await?;
    println!("#{} {} (done: {})", todo.id, todo.title, todo.completed);
    Ok(())
}
