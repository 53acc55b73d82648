//! Credential models shared by the relay, transport, and session stores.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
