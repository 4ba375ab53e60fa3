pub mod prelude;

pub mod avatars;
pub mod credits_log;
pub mod users;
