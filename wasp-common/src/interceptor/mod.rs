pub mod chain;
pub mod traits;

pub use chain::{HeaderInterceptor, InterceptorChain};
pub use traits::{AuthToken, Flow, NoOpInterceptor, RequestInterceptor};
