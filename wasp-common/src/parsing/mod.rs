pub mod handler;
pub mod param;
pub mod service;

pub use handler::{parse_handler_args, split_header};
pub use param::{parse_param_attrs, role_from_attribute};
pub use service::parse_service_args;
