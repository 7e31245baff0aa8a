pub mod config;
pub mod error_handler;
pub mod logging;

pub use config::{LaunchpadConfig, validate_url};
pub use error_handler::{
    ClassifiedCategory, ClassifiedError, ErrorSeverity, LaunchpadError, classify_error,
};
