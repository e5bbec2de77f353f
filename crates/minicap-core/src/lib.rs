pub mod config;
pub mod errors;
pub mod status;
pub mod types;

pub use config::CaptureConfig;
pub use errors::CaptureError;
pub use status::Status;
pub use types::*;
