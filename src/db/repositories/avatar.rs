use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;

use crate::entities::{avatars, prelude::*, users};
use crate::models::avatar::{
    Avatar, AvatarDocument, AvatarPatch, SectionContent, details_from_stored, details_to_stored,
};

/// Field set for a freshly generated avatar row.
#[derive(Debug, Clone)]
pub struct NewAvatar {
    pub name: String,
    pub document: AvatarDocument,
    pub target_audience: String,
    pub help_description: String,
    pub image_url: Option<String>,
    pub image_keyword: Option<String>,
}

pub struct AvatarRepository {
    conn: DatabaseConnection,
}

impl AvatarRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, owner: &users::Model, new: NewAvatar) -> Result<Avatar> {
        let now = chrono::Utc::now().to_rfc3339();
        let document = &new.document;

        let active = avatars::ActiveModel {
            account_id: Set(owner.id),
            external_id: Set(owner.external_id.clone()),
            account_email: Set(owner.email.clone()),
            name: Set(new.name),
            details: Set(details_to_stored(&document.details)),
            story: Set(document.story.to_stored()),
            current_wants: Set(document.current_wants.to_stored()),
            pain_points: Set(document.pain_points.to_stored()),
            desires: Set(document.desires.to_stored()),
            offer_results: Set(document.offer_results.to_stored()),
            biggest_problem: Set(document.biggest_problem.to_stored()),
            humiliation: Set(document.humiliation.to_stored()),
            frustrations: Set(document.frustrations.to_stored()),
            complaints: Set(document.complaints.to_stored()),
            cost_of_not_buying: Set(document.cost_of_not_buying.to_stored()),
            biggest_want: Set(document.biggest_want.to_stored()),
            target_audience: Set(new.target_audience),
            help_description: Set(new.help_description),
            image_url: Set(new.image_url),
            image_keyword: Set(new.image_keyword),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(Self::decode(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Avatar>> {
        let model = Avatars::find_by_id(id).one(&self.conn).await?;
        Ok(model.map(Self::decode))
    }

    pub async fn list_for_account(&self, account_id: i32) -> Result<Vec<Avatar>> {
        let models = Avatars::find()
            .filter(avatars::Column::AccountId.eq(account_id))
            .order_by_desc(avatars::Column::CreatedAt)
            .order_by_desc(avatars::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(models.into_iter().map(Self::decode).collect())
    }

    /// Whole-field overwrite: every provided patch field replaces the stored
    /// column, absent fields stay untouched. Last writer wins.
    pub async fn update(&self, id: i32, patch: AvatarPatch) -> Result<Option<Avatar>> {
        let Some(model) = Avatars::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: avatars::ActiveModel = model.into();

        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(details) = patch.details {
            active.details = Set(details_to_stored(&details));
        }
        if let Some(section) = patch.story {
            active.story = Set(section.to_stored());
        }
        if let Some(section) = patch.current_wants {
            active.current_wants = Set(section.to_stored());
        }
        if let Some(section) = patch.pain_points {
            active.pain_points = Set(section.to_stored());
        }
        if let Some(section) = patch.desires {
            active.desires = Set(section.to_stored());
        }
        if let Some(section) = patch.offer_results {
            active.offer_results = Set(section.to_stored());
        }
        if let Some(section) = patch.biggest_problem {
            active.biggest_problem = Set(section.to_stored());
        }
        if let Some(section) = patch.humiliation {
            active.humiliation = Set(section.to_stored());
        }
        if let Some(section) = patch.frustrations {
            active.frustrations = Set(section.to_stored());
        }
        if let Some(section) = patch.complaints {
            active.complaints = Set(section.to_stored());
        }
        if let Some(section) = patch.cost_of_not_buying {
            active.cost_of_not_buying = Set(section.to_stored());
        }
        if let Some(section) = patch.biggest_want {
            active.biggest_want = Set(section.to_stored());
        }
        if let Some(target_audience) = patch.target_audience {
            active.target_audience = Set(target_audience);
        }
        if let Some(help_description) = patch.help_description {
            active.help_description = Set(help_description);
        }
        if let Some(image_keyword) = patch.image_keyword {
            active.image_keyword = Set(Some(image_keyword));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(Self::decode(updated)))
    }

    pub async fn set_image_url(&self, id: i32, image_url: &str) -> Result<Option<Avatar>> {
        let Some(model) = Avatars::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: avatars::ActiveModel = model.into();
        active.image_url = Set(Some(image_url.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(Self::decode(updated)))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Avatars::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Maps a stored row to the canonical document shape. Rows written under
    /// older schema versions (pre-rendered strings, `{main, subPoints}`
    /// arrays, nested `data` wrappers) are migrated here, once, instead of
    /// being duck-typed by every reader.
    fn decode(model: avatars::Model) -> Avatar {
        let document = AvatarDocument {
            details: details_from_stored(&parse_column(&model.details)),
            story: SectionContent::from_stored(&parse_column(&model.story)),
            current_wants: SectionContent::from_stored(&parse_column(&model.current_wants)),
            pain_points: SectionContent::from_stored(&parse_column(&model.pain_points)),
            desires: SectionContent::from_stored(&parse_column(&model.desires)),
            offer_results: SectionContent::from_stored(&parse_column(&model.offer_results)),
            biggest_problem: SectionContent::from_stored(&parse_column(&model.biggest_problem)),
            humiliation: SectionContent::from_stored(&parse_column(&model.humiliation)),
            frustrations: SectionContent::from_stored(&parse_column(&model.frustrations)),
            complaints: SectionContent::from_stored(&parse_column(&model.complaints)),
            cost_of_not_buying: SectionContent::from_stored(&parse_column(
                &model.cost_of_not_buying,
            )),
            biggest_want: SectionContent::from_stored(&parse_column(&model.biggest_want)),
        };

        Avatar {
            id: model.id,
            account_id: model.account_id,
            external_id: model.external_id,
            account_email: model.account_email,
            name: model.name,
            document,
            target_audience: model.target_audience,
            help_description: model.help_description,
            image_url: model.image_url,
            image_keyword: model.image_keyword,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Legacy rows sometimes hold bare prose instead of JSON; treat unparseable
/// column text as a v0 string value.
fn parse_column(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
