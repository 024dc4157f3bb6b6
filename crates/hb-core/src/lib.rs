pub mod args;
pub mod error;
pub mod types;
pub mod value;

pub use args::Args;
pub use error::{BridgeError, HostError, MarshalError};
pub use types::*;
pub use value::*;
