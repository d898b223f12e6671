//! Repository layer for database operations.
//!
//! Repositories own a pool handle and translate between row entities and
//! domain models. All SQL lives here.

pub mod api_key;
pub mod backend_log;
pub mod email_log;
pub mod setting;
pub mod survey;
pub mod template;
pub mod user;

pub use api_key::ApiKeyRepository;
pub use backend_log::BackendLogRepository;
pub use email_log::EmailLogRepository;
pub use setting::SettingRepository;
pub use survey::SurveyRepository;
pub use template::TemplateRepository;
pub use user::UserRepository;
