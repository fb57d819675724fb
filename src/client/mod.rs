//! # Wrapped client abstractions.
//!
//! - [`GatewayClient`] - trait the supervised connection implements
//! - [`ClientRef`] - shared reference to a client (`Arc<dyn GatewayClient>`)
//! - [`Credential`] - redacted secret passed to every `start`

mod credential;
mod gateway;

pub use credential::Credential;
pub use gateway::{ClientRef, GatewayClient};
