//! Domain models and data-transfer objects.

pub mod api_key;
pub mod backend_log;
pub mod email_log;
pub mod settings;
pub mod survey;
pub mod template;
pub mod user;

pub use api_key::*;
pub use backend_log::*;
pub use email_log::*;
pub use settings::*;
pub use survey::*;
pub use template::*;
pub use user::*;
