pub mod config;
pub mod error;
pub mod policy;
pub mod sanitize;
pub mod types;

pub use config::Config;
pub use error::ModwatchError;
pub use policy::SeverityPolicy;
pub use sanitize::{normalize_timestamp, sanitize_body};
pub use types::*;
