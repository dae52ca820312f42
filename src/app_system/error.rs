use thiserror::Error;

use crate::config::ConfigError;
use crate::error::LookupError;

/// Failures while starting or stopping the cart system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build storefront api client: {0}")]
    Api(#[from] LookupError),
    #[error("cart service task failed: {0}")]
    Task(String),
}
