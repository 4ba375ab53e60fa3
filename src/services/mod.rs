pub mod admin;
pub use admin::{AdminError, AdminService};

pub mod authorization;
pub use authorization::is_authorized;

pub mod avatars;
pub use avatars::{AvatarError, AvatarService};

pub mod credits;
pub use credits::{CreditError, CreditService};

pub mod generation;
pub use generation::{GenerationError, GenerationService};

pub mod provisioning;
pub use provisioning::ProvisioningService;
