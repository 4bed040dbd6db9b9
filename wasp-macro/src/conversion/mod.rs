pub mod types;

pub use types::decoder_for;
