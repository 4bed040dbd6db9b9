pub mod http;
pub mod args;
pub mod retry;

pub use http::{HttpMethod, ContentType};
pub use args::{HandlerArgs, MockArgs, ParamArgs, ServiceArgs};
pub use retry::{RetryPolicy, RetryConfig};
