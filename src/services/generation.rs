//! The avatar generation pipeline: validate input, hold a credit, call the
//! text and image providers, persist the result. Any failure after the debit
//! triggers a best-effort refund before the error is surfaced.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::imagegen::ImageGenerator;
use crate::clients::storage::BlobStore;
use crate::clients::textgen::TextGenerator;
use crate::db::{NewAvatar, Store};
use crate::entities::users;
use crate::models::avatar::{Avatar, AvatarDocument, SectionContent, SectionKind};
use crate::services::credits::{CreditError, CreditService};

const SYSTEM_PROMPT: &str = "You are an expert at creating detailed avatar profiles for target \
     audiences. You provide specific, realistic details and emotionally resonant content.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Avatar not found")]
    AvatarNotFound,

    #[error("Text generation failed: {0}")]
    TextGeneration(String),

    #[error("Could not parse generated avatar: {0}")]
    Parse(String),

    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    #[error("Image upload failed: {0}")]
    ImageUpload(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<CreditError> for GenerationError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::InsufficientCredits => Self::InsufficientCredits,
            CreditError::AccountNotFound => Self::AccountNotFound,
            CreditError::Database(message) => Self::Database(message),
        }
    }
}

#[derive(Clone)]
pub struct GenerationService {
    store: Store,
    textgen: Arc<dyn TextGenerator>,
    imagegen: Arc<dyn ImageGenerator>,
    storage: Arc<dyn BlobStore>,
    credits: CreditService,
    generation_cost: i64,
}

impl GenerationService {
    #[must_use]
    pub fn new(
        store: Store,
        textgen: Arc<dyn TextGenerator>,
        imagegen: Arc<dyn ImageGenerator>,
        storage: Arc<dyn BlobStore>,
        credits: CreditService,
        generation_cost: i64,
    ) -> Self {
        Self {
            store,
            textgen,
            imagegen,
            storage,
            credits,
            generation_cost,
        }
    }

    /// Runs the full pipeline for one new avatar. The credit is debited
    /// before any provider is called; every later failure refunds it.
    /// No idempotency: each successful call creates one new avatar row.
    pub async fn generate(
        &self,
        account: &users::Model,
        target_audience: &str,
        help_description: &str,
    ) -> Result<Avatar, GenerationError> {
        let target_audience = target_audience.trim();
        let help_description = help_description.trim();

        if target_audience.is_empty() {
            return Err(GenerationError::Validation(
                "Target audience is required".to_string(),
            ));
        }
        if help_description.is_empty() {
            return Err(GenerationError::Validation(
                "Help description is required".to_string(),
            ));
        }

        self.credits
            .debit(
                account.id,
                self.generation_cost,
                "Credits used for avatar generation",
            )
            .await?;

        match self
            .run_pipeline(account, target_audience, help_description)
            .await
        {
            Ok(avatar) => {
                info!(
                    account_id = account.id,
                    avatar_id = avatar.id,
                    "Generated avatar"
                );
                Ok(avatar)
            }
            Err(err) => {
                self.refund_after_failure(account).await;
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        account: &users::Model,
        target_audience: &str,
        help_description: &str,
    ) -> Result<Avatar, GenerationError> {
        let prompt = avatar_prompt(target_audience, help_description);
        let reply = self
            .textgen
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| GenerationError::TextGeneration(e.to_string()))?;

        let root = extract_json_object(&reply).ok_or_else(|| {
            GenerationError::Parse("no JSON object found in the reply".to_string())
        })?;
        let document = AvatarDocument::from_generated(&root);

        let image_url = self.produce_image(&document.details, None).await?;

        let avatar = self
            .store
            .insert_avatar(
                account,
                NewAvatar {
                    name: document.display_name(),
                    document,
                    target_audience: target_audience.to_string(),
                    help_description: help_description.to_string(),
                    image_url: Some(image_url),
                    image_keyword: None,
                },
            )
            .await
            .map_err(|e| GenerationError::Database(e.to_string()))?;

        Ok(avatar)
    }

    /// Regenerates the portrait for an existing avatar and swaps the stored
    /// URL in place. Free of charge, unlike a full generation.
    pub async fn regenerate_image(
        &self,
        account: &users::Model,
        avatar_id: i32,
    ) -> Result<Avatar, GenerationError> {
        let avatar = self
            .store
            .get_avatar(avatar_id)
            .await
            .map_err(|e| GenerationError::Database(e.to_string()))?
            .ok_or(GenerationError::AvatarNotFound)?;

        if avatar.account_id != account.id && !account.is_admin {
            return Err(GenerationError::AvatarNotFound);
        }

        let image_url = self
            .produce_image(&avatar.document.details, avatar.image_keyword.as_deref())
            .await?;

        self.store
            .set_avatar_image_url(avatar.id, &image_url)
            .await
            .map_err(|e| GenerationError::Database(e.to_string()))?
            .ok_or(GenerationError::AvatarNotFound)
    }

    /// Regenerates one narrative section. The caller persists the result
    /// through the avatar update path if it wants to keep it.
    pub async fn generate_section(
        &self,
        account: &users::Model,
        avatar_id: i32,
        kind: SectionKind,
    ) -> Result<SectionContent, GenerationError> {
        let avatar = self
            .store
            .get_avatar(avatar_id)
            .await
            .map_err(|e| GenerationError::Database(e.to_string()))?
            .ok_or(GenerationError::AvatarNotFound)?;

        if avatar.account_id != account.id && !account.is_admin {
            return Err(GenerationError::AvatarNotFound);
        }

        let prompt = section_prompt(&avatar.document, kind);
        let reply = self
            .textgen
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| GenerationError::TextGeneration(e.to_string()))?;

        let items = extract_json_array(&reply).ok_or_else(|| {
            GenerationError::Parse("no JSON array found in the reply".to_string())
        })?;

        let points = SectionContent::from_stored(&items).points;
        if points.is_empty() {
            return Err(GenerationError::Parse(
                "generated section contained no points".to_string(),
            ));
        }

        Ok(SectionContent {
            headline: kind.title().to_string(),
            points,
        })
    }

    /// Image generation + durable re-upload: the provider URL is temporary,
    /// so the bytes are pulled and pushed into our own bucket.
    async fn produce_image(
        &self,
        details: &BTreeMap<String, String>,
        keyword: Option<&str>,
    ) -> Result<String, GenerationError> {
        let temporary_url = self
            .imagegen
            .generate(&image_prompt(details, keyword))
            .await
            .map_err(|e| GenerationError::ImageGeneration(e.to_string()))?;

        let bytes = self
            .storage
            .fetch_bytes(&temporary_url)
            .await
            .map_err(|e| GenerationError::ImageUpload(e.to_string()))?;

        let object_path = format!("avatars/{}.png", Uuid::new_v4());
        self.storage
            .upload(&object_path, bytes, "image/png")
            .await
            .map_err(|e| GenerationError::ImageUpload(e.to_string()))
    }

    /// Best effort only: a refund failure is logged and must never mask the
    /// original pipeline error.
    async fn refund_after_failure(&self, account: &users::Model) {
        if let Err(err) = self
            .credits
            .refund(
                account.id,
                self.generation_cost,
                "Refund for failed avatar generation",
            )
            .await
        {
            warn!(
                account_id = account.id,
                error = %err,
                "Failed to refund credit after failed generation"
            );
        }
    }
}

fn avatar_prompt(target_audience: &str, help_description: &str) -> String {
    format!(
        r#"Create a detailed avatar profile representing someone from {target_audience} who needs help with {help_description}.

Return a JSON object with detailed, specific content about this person (NO placeholders, NO brackets):

{{
  "details": {{
    "name": "A realistic name for this demographic",
    "age": "Typical age for this situation",
    "gender": "Gender based on target audience",
    "location": "Specific location where they live",
    "career": "Their current occupation or role"
  }},
  "story": {{ "headline": "Their Background", "points": ["..."] }},
  "currentWants": {{ "headline": "Immediate Needs", "points": ["..."] }},
  "painPoints": {{ "headline": "Current Struggles", "points": ["..."] }},
  "desires": {{ "headline": "Long-term Dreams", "points": ["..."] }},
  "offerResults": {{ "headline": "What They Hope To Gain", "points": ["..."] }},
  "biggestProblem": {{ "headline": "Major Obstacles", "points": ["..."] }},
  "humiliation": {{ "headline": "Personal Fears", "points": ["..."] }},
  "frustrations": {{ "headline": "Daily Irritations", "points": ["..."] }},
  "complaints": {{ "headline": "Common Grievances", "points": ["..."] }},
  "costOfNotBuying": {{ "headline": "Consequences of Inaction", "points": ["..."] }},
  "biggestWant": {{ "headline": "Ultimate Goals", "points": ["..."] }}
}}

Important:
1. This avatar represents someone FROM the target audience who NEEDS help
2. Make all content specific to {target_audience} and their situation with {help_description}
3. Use realistic details that match their demographic and culture
4. Give every section three or more detailed, emotionally resonant points
5. Keep the content authentic to their situation"#
    )
}

fn section_prompt(document: &AvatarDocument, kind: SectionKind) -> String {
    let context = serde_json::to_string_pretty(document).unwrap_or_default();
    let section = kind.as_str();

    if kind == SectionKind::BiggestProblem {
        format!(
            r#"Given the following avatar data:

{context}

Generate 3 new detailed problems (a mix of financial and emotional) for the "{section}" section, as a JSON array:

[
  {{ "type": "financial", "problem": "Detailed financial problem" }},
  {{ "type": "emotional", "problem": "Detailed emotional problem" }},
  {{ "type": "financial", "problem": "Another detailed financial problem" }}
]

Ensure the generated problems are relevant, detailed, and specific to the avatar's situation. Provide ONLY the JSON array as the response, with no additional text."#
        )
    } else {
        format!(
            r#"Given the following avatar data:

{context}

Generate 3 new detailed main points with up to 3 subpoints each for the "{section}" section, as a JSON array:

[
  {{ "main": "Main point 1", "subPoints": ["Subpoint 1", "Subpoint 2"] }},
  {{ "main": "Main point 2", "subPoints": ["Subpoint 1"] }},
  {{ "main": "Main point 3", "subPoints": ["Subpoint 1", "Subpoint 2"] }}
]

Ensure the generated points are relevant, detailed, and specific to the avatar's situation and the {section} section. Provide ONLY the JSON array as the response, with no additional text."#
        )
    }
}

fn image_prompt(details: &BTreeMap<String, String>, keyword: Option<&str>) -> String {
    let get = |key: &str| details.get(key).map(String::as_str).unwrap_or_default();

    let name = details
        .get("name")
        .map_or("the person", String::as_str);
    let career = details
        .get("career")
        .or_else(|| details.get("profession"))
        .map_or("Professional", String::as_str);

    let mut prompt = format!(
        "Create a professional, photorealistic headshot portrait of a {} {} professional named {}.\n\
         Career context: {}\n\
         Physical characteristics: well-groomed and polished look, professional business attire, \
         natural confident expression, high-quality studio lighting, clean background.\n\
         Style notes: professional LinkedIn-style headshot, sharp focus on face, soft natural \
         lighting, neutral background.\n\
         Important: create a PHOTOREALISTIC image, not illustrated or artistic. The image should \
         look like a real professional headshot photograph.",
        get("gender"),
        get("age"),
        name,
        career,
    );

    if let Some(keyword) = keyword {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            prompt.push_str("\nAdditional direction: ");
            prompt.push_str(keyword);
        }
    }

    prompt
}

/// Replies routinely wrap the JSON in prose or code fences; strip the fences
/// and trim to the outermost braces before parsing.
fn extract_json_object(reply: &str) -> Option<Value> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

fn extract_json_array(reply: &str) -> Option<Value> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_reply() {
        let reply = "Here is your avatar:\n```json\n{\"details\": {\"name\": \"Anna\"}}\n```\nEnjoy!";
        let value = extract_json_object(reply).expect("should parse");
        assert_eq!(value["details"]["name"], "Anna");
    }

    #[test]
    fn extracts_object_from_bare_prose() {
        let reply = "Sure thing { \"story\": { \"headline\": \"Background\", \"points\": [] } } done";
        let value = extract_json_object(reply).expect("should parse");
        assert_eq!(value["story"]["headline"], "Background");
    }

    #[test]
    fn rejects_reply_without_object() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("} backwards {").is_none());
        assert!(extract_json_object("{ truncated").is_none());
    }

    #[test]
    fn extracts_array_for_sections() {
        let reply = "```json\n[{\"main\": \"Point\", \"subPoints\": [\"sub\"]}]\n```";
        let value = extract_json_array(reply).expect("should parse");
        let points = SectionContent::from_stored(&value).points;
        assert_eq!(points, vec!["Point", "sub"]);
    }

    #[test]
    fn image_prompt_includes_details_and_keyword() {
        let mut details = BTreeMap::new();
        details.insert("name".to_string(), "Anna".to_string());
        details.insert("gender".to_string(), "female".to_string());
        details.insert("career".to_string(), "Teacher".to_string());

        let prompt = image_prompt(&details, Some("warm smile"));
        assert!(prompt.contains("named Anna"));
        assert!(prompt.contains("Career context: Teacher"));
        assert!(prompt.contains("warm smile"));
    }
}
