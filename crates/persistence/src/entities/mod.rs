//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod api_key;
pub mod backend_log;
pub mod email_log;
pub mod setting;
pub mod survey;
pub mod template;
pub mod user;

pub use api_key::ApiKeyEntity;
pub use backend_log::BackendLogEntity;
pub use email_log::EmailLogEntity;
pub use setting::SettingEntity;
pub use survey::{AnswerEntity, SurveyEntity};
pub use template::{QuestionEntity, TemplateEntity};
pub use user::UserEntity;
