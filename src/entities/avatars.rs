use sea_orm::entity::prelude::*;

/// One generated marketing-persona document. The twelve section columns hold
/// JSON strings; decoding into the canonical shape happens in the repository,
/// which also understands rows written by older schema versions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "avatars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub account_id: i32,

    pub external_id: String,

    pub account_email: String,

    pub name: String,

    /// JSON map of detail key/value pairs (name, age, gender, ...).
    pub details: String,

    pub story: String,

    pub current_wants: String,

    pub pain_points: String,

    pub desires: String,

    pub offer_results: String,

    pub biggest_problem: String,

    pub humiliation: String,

    pub frustrations: String,

    pub complaints: String,

    pub cost_of_not_buying: String,

    pub biggest_want: String,

    pub target_audience: String,

    pub help_description: String,

    pub image_url: Option<String>,

    pub image_keyword: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
