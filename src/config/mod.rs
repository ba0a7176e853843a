pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX};
pub use types::*;
pub use validation::{validate_config, ConfigValidator, ValidationError};
