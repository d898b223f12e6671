//! Application services.

pub mod bootstrap;
pub mod email;
pub mod oplog;

pub use email::EmailService;
