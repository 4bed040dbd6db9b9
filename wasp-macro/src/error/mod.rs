pub mod handling;

pub use handling::{MethodKind, ReturnShape, single_generic, validate_signature};
