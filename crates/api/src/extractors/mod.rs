//! Request extractors for authentication.

pub mod api_key;
pub mod session;

pub use api_key::ApiKeyAuth;
pub use session::SessionUser;
