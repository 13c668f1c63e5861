//! Service layer
//!
//! Services hold the state the poll loop works against: the credential store
//! written by the login side, and the session that owns the output sink
//! binding.

mod credentials;
mod session;

pub use credentials::CredentialStore;
pub use session::SessionManager;
