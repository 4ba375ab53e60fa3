pub use super::avatars::Entity as Avatars;
pub use super::credits_log::Entity as CreditsLog;
pub use super::users::Entity as Users;
