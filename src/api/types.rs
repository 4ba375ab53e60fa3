use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{credits_log, users};
use crate::models::avatar::{Avatar, SectionContent};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: i32,
    pub external_id: String,
    pub email: String,
    pub credits: i64,
    pub is_active: bool,
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for AccountDto {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            email: model.email,
            credits: model.credits,
            is_active: model.is_active,
            is_authenticated: model.is_authenticated,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Current caller, resolved and provisioned, plus the gate verdict the UI
/// uses to decide between the product surface and the pending screen.
#[derive(Debug, Serialize)]
pub struct MeDto {
    pub account: AccountDto,
    pub authorized: bool,
}

#[derive(Debug, Serialize)]
pub struct BalanceDto {
    pub credits: i64,
}

#[derive(Debug, Serialize)]
pub struct CreditLogDto {
    pub id: i64,
    pub account_id: i32,
    pub amount: i64,
    pub action_type: String,
    pub description: String,
    pub created_at: String,
}

impl From<credits_log::Model> for CreditLogDto {
    fn from(model: credits_log::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            amount: model.amount,
            action_type: model.action_type,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvatarDto {
    pub id: i32,
    pub name: String,
    pub details: BTreeMap<String, String>,
    pub story: SectionContent,
    pub current_wants: SectionContent,
    pub pain_points: SectionContent,
    pub desires: SectionContent,
    pub offer_results: SectionContent,
    pub biggest_problem: SectionContent,
    pub humiliation: SectionContent,
    pub frustrations: SectionContent,
    pub complaints: SectionContent,
    pub cost_of_not_buying: SectionContent,
    pub biggest_want: SectionContent,
    pub target_audience: String,
    pub help_description: String,
    pub image_url: Option<String>,
    pub image_keyword: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Avatar> for AvatarDto {
    fn from(avatar: Avatar) -> Self {
        let document = avatar.document;
        Self {
            id: avatar.id,
            name: avatar.name,
            details: document.details,
            story: document.story,
            current_wants: document.current_wants,
            pain_points: document.pain_points,
            desires: document.desires,
            offer_results: document.offer_results,
            biggest_problem: document.biggest_problem,
            humiliation: document.humiliation,
            frustrations: document.frustrations,
            complaints: document.complaints,
            cost_of_not_buying: document.cost_of_not_buying,
            biggest_want: document.biggest_want,
            target_audience: avatar.target_audience,
            help_description: avatar.help_description,
            image_url: avatar.image_url,
            image_keyword: avatar.image_keyword,
            created_at: avatar.created_at,
            updated_at: avatar.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageDto {
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub target_audience: String,
    pub help_description: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustCreditsRequest {
    pub amount: i64,
    pub is_add: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub value: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub emails: Vec<String>,
    pub default_credits: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub version: String,
    pub uptime: u64,
}
