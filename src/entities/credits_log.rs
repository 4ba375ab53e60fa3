use sea_orm::entity::prelude::*;

/// Append-only audit row for one balance change. Never updated; deleted only
/// by the account-delete cascade.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credits_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub account_id: i32,

    /// Redundant copy of the owning account's external id.
    pub external_id: String,

    /// Positive = credit, negative = debit.
    pub amount: i64,

    /// One of: deduct, refund, admin_add, admin_remove.
    pub action_type: String,

    pub description: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
