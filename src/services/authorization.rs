//! The access gate: decides whether a provisioned account may use the
//! product. Pure predicates only; every mutation lives in provisioning and
//! the admin operations.

use crate::entities::users;

/// Administrators bypass approval; everyone else needs both the activation
/// and authentication flags.
#[must_use]
pub fn is_authorized(account: &users::Model) -> bool {
    account.is_admin || (account.is_active && account.is_authenticated)
}
