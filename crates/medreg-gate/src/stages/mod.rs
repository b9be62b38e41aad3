//! Built-in gate stages.

pub mod identity;
pub mod photo;
pub mod required;

pub use identity::IdentityStage;
pub use photo::PhotoStage;
pub use required::RequiredFieldsStage;
