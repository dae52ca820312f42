//! System orchestration, startup, and shutdown logic.

pub mod cart_system;
pub mod error;
pub mod logging;

pub use cart_system::*;
pub use error::*;
pub use logging::*;
