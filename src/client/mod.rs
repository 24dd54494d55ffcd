//! Typed client for the GHS REST API: bearer session, error taxonomy,
//! per-family query cache and the screen guard.

pub mod api;
pub mod cache;
pub mod error;
pub mod guard;
pub mod session;

pub use api::ApiClient;
pub use error::{ClientError, ClientResult};
pub use guard::Access;
pub use session::Session;
