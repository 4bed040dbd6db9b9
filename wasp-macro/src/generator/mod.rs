pub mod method;
pub mod service;

pub use service::generate_service;
