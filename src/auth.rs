//! Credential models: redacted secrets, access/refresh pairs, and the cached user identity.

pub mod credentials;
pub mod identity;
pub mod secret;

pub use credentials::*;
pub use identity::*;
pub use secret::*;
