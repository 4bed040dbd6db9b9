pub mod params;
pub mod template;

pub use params::{ParamModel, argument_call, classify_params};
pub use template::TemplateModel;
