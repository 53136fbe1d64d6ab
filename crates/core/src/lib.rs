pub mod config;
pub mod error;
pub mod platform;

pub use config::Config;
pub use error::{Error, Result};
pub use platform::Platform;
