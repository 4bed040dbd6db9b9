pub mod arguments;
pub mod descriptor;
pub mod template;

pub use arguments::Arguments;
pub use descriptor::{ExpectedTypes, RequestDescriptor, build_descriptor};
pub use template::{MockSource, MockSpec, ParamRole, ParamSpec, RequestTemplate, extract_placeholders};
