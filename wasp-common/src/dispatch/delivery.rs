use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::sync::mpsc;
use crate::error::{Error, Result};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// 回调投递上下文
///
/// 回调只在这里执行，从不在工作线程上执行。
pub trait CallbackExecutor: Send + Sync {
    fn execute(&self, job: Job);
}

/// 由调用方自行在某个线程上取出并执行任务（例如事件循环）
impl CallbackExecutor for mpsc::UnboundedSender<Job> {
    fn execute(&self, job: Job) {
        if self.send(job).is_err() {
            log::warn!("callback receiver is closed, dropping delivery");
        }
    }
}

/// 默认投递线程：单个名为 `wasp-delivery` 的线程按顺序执行回调
#[derive(Debug, Clone)]
pub struct DeliveryThread {
    sender: mpsc::UnboundedSender<Job>,
}

impl DeliveryThread {
    /// 所有句柄释放后线程自动退出
    pub fn spawn() -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        std::thread::Builder::new()
            .name("wasp-delivery".into())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        log::warn!("callback panicked on the delivery thread");
                    }
                }
                log::debug!("delivery thread stopped");
            })
            .map_err(|e| Error::configuration(format!("failed to start delivery thread: {e}")))?;
        Ok(Self { sender })
    }
}

impl CallbackExecutor for DeliveryThread {
    fn execute(&self, job: Job) {
        self.sender.execute(job);
    }
}
