//! Shopping cart state for a storefront: a single cart service that validates
//! every change against live stock, persists the cart locally, and serves
//! snapshots to the presentation layer through [`clients::CartClient`].

pub mod actors;
pub mod app_system;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod lookup;
pub mod messages;
pub mod store;
pub mod view;

#[cfg(test)]
mod mock_framework;

pub use app_system::CartSystem;
pub use clients::CartClient;
pub use config::CartConfig;
pub use domain::{Cart, Product, ProductId};
pub use error::CartError;
