use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use crate::error::{Error, Result};
use crate::response::Response;

/// 异步调用的结果回调
///
/// 任意 `FnOnce(Result<Response<T>>)` 闭包都可以直接作为回调使用。
pub trait Callback<T>: Send + 'static {
    fn on_success(self, response: Response<T>);

    fn on_error(self, error: Error);
}

impl<T, F> Callback<T> for F
where
    F: FnOnce(Result<Response<T>>) + Send + 'static,
{
    fn on_success(self, response: Response<T>) {
        self(Ok(response))
    }

    fn on_error(self, error: Error) {
        self(Err(error))
    }
}

/// `async fn` 方法返回的调用
///
/// 请求在客户端的运行时上作为独立任务执行；丢弃未完成的调用会取消该任务。
#[must_use = "a call is cancelled when dropped"]
pub struct Call<T> {
    task: JoinHandle<Result<Response<T>>>,
}

impl<T> Call<T> {
    pub(crate) fn new(task: JoinHandle<Result<Response<T>>>) -> Self {
        Self { task }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for Call<T> {
    type Output = Result<Response<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Cancelled)),
        }
    }
}

impl<T> Drop for Call<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 回调方法返回的句柄
///
/// 取消或丢弃句柄后不会再有回调被执行；`detach` 让请求脱离句柄继续运行。
#[must_use = "the call is cancelled when its handle is dropped; use `detach` to keep it running"]
#[derive(Debug)]
pub struct CallHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl CallHandle {
    pub(crate) fn new(cancelled: Arc<AtomicBool>, task: JoinHandle<()>) -> Self {
        Self {
            cancelled,
            task: Some(task),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// 请求已结束（结果可能仍在投递队列中）
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for CallHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_call_resolves_task_output() {
        let call: Call<u32> = Call::new(tokio::spawn(async { Err(Error::configuration("nope")) }));
        assert!(matches!(call.await, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_cancelled_call() {
        let call: Call<u32> = Call::new(tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(Error::Cancelled)
        }));
        call.cancel();
        assert!(matches!(call.await, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let handle = CallHandle::new(cancelled.clone(), task);
        assert!(!handle.is_finished());
        drop(handle);
        assert!(cancelled.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_detached_handle_is_not_cancelled() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = CallHandle::new(cancelled.clone(), tokio::spawn(async {}));
        handle.detach();
        assert!(!cancelled.load(Ordering::Acquire));
    }

    #[test]
    fn test_closure_is_a_callback() {
        fn assert_callback<C: Callback<String>>(_: C) {}
        assert_callback(|result: Result<Response<String>>| drop(result));
    }
}
