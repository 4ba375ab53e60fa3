use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identity-provider user id, or `import-<uuid>` for bulk-imported rows.
    #[sea_orm(unique)]
    pub external_id: String,

    pub email: String,

    /// Signed on purpose: admins may force a negative balance.
    pub credits: i64,

    pub is_active: bool,

    pub is_authenticated: bool,

    pub is_admin: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
