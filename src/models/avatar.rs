use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Canonical shape for every narrative section of an avatar document.
///
/// Rows written by earlier schema versions stored sections as pre-rendered
/// strings, `{main, subPoints}` arrays, or objects nested under a `data` key;
/// [`SectionContent::from_stored`] maps all of them to this shape once, at
/// load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub points: Vec<String>,
}

impl SectionContent {
    /// Decodes a stored JSON value of any historical schema version.
    pub fn from_stored(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::String(text) => Self::from_legacy_text(text),
            Value::Array(items) => Self {
                headline: String::new(),
                points: points_from_legacy_items(items),
            },
            Value::Object(map) => {
                if let Some(inner) = map.get("data") {
                    return Self::from_stored(inner);
                }

                let headline = map
                    .get("headline")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                let points = match map.get("points") {
                    Some(Value::Array(items)) => points_from_legacy_items(items),
                    Some(Value::String(text)) => Self::from_legacy_text(text).points,
                    _ => Vec::new(),
                };

                Self { headline, points }
            }
            _ => Self::default(),
        }
    }

    /// Converts a pre-rendered text blob (v0 rows) into headline + points.
    /// The first line counts as a headline only when it is not itself a
    /// bullet; everything else becomes one point per non-empty line.
    pub fn from_legacy_text(text: &str) -> Self {
        let mut headline = String::new();
        let mut points = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let stripped = trimmed
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim();

            if index == 0 && stripped.len() == trimmed.len() && !trimmed.ends_with('.') {
                headline = trimmed.trim_end_matches(':').to_string();
            } else if !stripped.is_empty() {
                points.push(stripped.to_string());
            }
        }

        Self { headline, points }
    }

    #[must_use]
    pub fn to_stored(&self) -> String {
        json!({
            "headline": self.headline,
            "points": self.points,
        })
        .to_string()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headline.is_empty() && self.points.is_empty()
    }
}

/// Flattens legacy point arrays: `{main, subPoints}` items (v1), typed
/// `{type, problem}` items (v1 biggest-problem), or plain strings.
fn points_from_legacy_items(items: &[Value]) -> Vec<String> {
    let mut points = Vec::new();

    for item in items {
        match item {
            Value::String(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    points.push(trimmed.to_string());
                }
            }
            Value::Object(map) => {
                if let Some(main) = map.get("main").and_then(Value::as_str) {
                    points.push(main.to_string());
                    if let Some(Value::Array(subs)) = map.get("subPoints") {
                        points.extend(
                            subs.iter()
                                .filter_map(Value::as_str)
                                .map(ToString::to_string),
                        );
                    }
                } else if let Some(problem) = map.get("problem").and_then(Value::as_str) {
                    points.push(problem.to_string());
                }
            }
            _ => {}
        }
    }

    points
}

/// Decodes the stored `details` column: a JSON object of scalars under any
/// historical shape, or a v0 `Key: value` text blob.
pub fn details_from_stored(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => {
            let source = match map.get("data") {
                Some(Value::Object(inner)) => inner,
                _ => map,
            };
            source
                .iter()
                .filter_map(|(key, val)| {
                    let rendered = match val {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key.to_lowercase(), rendered))
                })
                .collect()
        }
        Value::String(text) => details_from_legacy_text(text),
        _ => BTreeMap::new(),
    }
}

fn details_from_legacy_text(text: &str) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key
                .trim()
                .trim_start_matches(['-', '*', '•'])
                .trim()
                .to_lowercase();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() && !key.contains(' ') {
                details.insert(key, value.to_string());
            }
        }
    }
    details
}

#[must_use]
pub fn details_to_stored(details: &BTreeMap<String, String>) -> String {
    serde_json::to_value(details)
        .unwrap_or_else(|_| json!({}))
        .to_string()
}

/// The eleven narrative sections of an avatar document, in store order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Story,
    CurrentWants,
    PainPoints,
    Desires,
    OfferResults,
    BiggestProblem,
    Humiliation,
    Frustrations,
    Complaints,
    CostOfNotBuying,
    BiggestWant,
}

impl SectionKind {
    pub const ALL: [Self; 11] = [
        Self::Story,
        Self::CurrentWants,
        Self::PainPoints,
        Self::Desires,
        Self::OfferResults,
        Self::BiggestProblem,
        Self::Humiliation,
        Self::Frustrations,
        Self::Complaints,
        Self::CostOfNotBuying,
        Self::BiggestWant,
    ];

    /// Accepts the kebab-case route form and the snake_case store form.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::CurrentWants => "current-wants",
            Self::PainPoints => "pain-points",
            Self::Desires => "desires",
            Self::OfferResults => "offer-results",
            Self::BiggestProblem => "biggest-problem",
            Self::Humiliation => "humiliation",
            Self::Frustrations => "frustrations",
            Self::Complaints => "complaints",
            Self::CostOfNotBuying => "cost-of-not-buying",
            Self::BiggestWant => "biggest-want",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Story => "Story",
            Self::CurrentWants => "Current Wants",
            Self::PainPoints => "Pain Points",
            Self::Desires => "Desires",
            Self::OfferResults => "Offer Results",
            Self::BiggestProblem => "Biggest Problem",
            Self::Humiliation => "Humiliation",
            Self::Frustrations => "Frustrations",
            Self::Complaints => "Complaints",
            Self::CostOfNotBuying => "Cost of Not Buying",
            Self::BiggestWant => "Biggest Want",
        }
    }
}

/// Fully decoded avatar document: a detail map plus the eleven sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarDocument {
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
}

impl AvatarDocument {
    /// Builds a document from the JSON object a text-generation call returns.
    /// The prompt asks for camelCase keys, but replies occasionally come back
    /// in other casings, so each field is resolved through a small alias list.
    #[must_use]
    pub fn from_generated(root: &Value) -> Self {
        let section = |aliases: &[&str]| {
            SectionContent::from_stored(lookup(root, aliases).unwrap_or(&Value::Null))
        };

        Self {
            details: details_from_stored(lookup(root, &["details"]).unwrap_or(&Value::Null)),
            story: section(&["story"]),
            current_wants: section(&["currentWants", "current_wants", "currentwants"]),
            pain_points: section(&["painPoints", "pain_points", "painpoints"]),
            desires: section(&["desires"]),
            offer_results: section(&["offerResults", "offer_results", "offerresults"]),
            biggest_problem: section(&["biggestProblem", "biggest_problem", "biggestproblem"]),
            humiliation: section(&["humiliation"]),
            frustrations: section(&["frustrations"]),
            complaints: section(&["complaints"]),
            cost_of_not_buying: section(&[
                "costOfNotBuying",
                "cost_of_not_buying",
                "costofnotbuying",
            ]),
            biggest_want: section(&["biggestWant", "biggest_want", "biggestwant"]),
        }
    }

    #[must_use]
    pub const fn section(&self, kind: SectionKind) -> &SectionContent {
        match kind {
            SectionKind::Story => &self.story,
            SectionKind::CurrentWants => &self.current_wants,
            SectionKind::PainPoints => &self.pain_points,
            SectionKind::Desires => &self.desires,
            SectionKind::OfferResults => &self.offer_results,
            SectionKind::BiggestProblem => &self.biggest_problem,
            SectionKind::Humiliation => &self.humiliation,
            SectionKind::Frustrations => &self.frustrations,
            SectionKind::Complaints => &self.complaints,
            SectionKind::CostOfNotBuying => &self.cost_of_not_buying,
            SectionKind::BiggestWant => &self.biggest_want,
        }
    }

    pub fn set_section(&mut self, kind: SectionKind, content: SectionContent) {
        match kind {
            SectionKind::Story => self.story = content,
            SectionKind::CurrentWants => self.current_wants = content,
            SectionKind::PainPoints => self.pain_points = content,
            SectionKind::Desires => self.desires = content,
            SectionKind::OfferResults => self.offer_results = content,
            SectionKind::BiggestProblem => self.biggest_problem = content,
            SectionKind::Humiliation => self.humiliation = content,
            SectionKind::Frustrations => self.frustrations = content,
            SectionKind::Complaints => self.complaints = content,
            SectionKind::CostOfNotBuying => self.cost_of_not_buying = content,
            SectionKind::BiggestWant => self.biggest_want = content,
        }
    }

    /// Derives the display name, `"<name> - <career>"`, from the detail map.
    #[must_use]
    pub fn display_name(&self) -> String {
        let sanitize = |raw: &str| -> String {
            raw.chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
                .collect::<String>()
                .trim()
                .to_string()
        };

        let name = self.details.get("name").map(|v| sanitize(v));
        let career = self
            .details
            .get("career")
            .or_else(|| self.details.get("profession"))
            .map(|v| sanitize(v));

        match (name, career) {
            (Some(name), Some(career)) if !name.is_empty() && !career.is_empty() => {
                format!("{name} - {career}")
            }
            (Some(name), _) if !name.is_empty() => name,
            _ => "Unnamed Avatar".to_string(),
        }
    }
}

fn lookup<'a>(root: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    let object = root.as_object()?;
    aliases.iter().find_map(|alias| object.get(*alias))
}

/// One decoded avatar row.
#[derive(Debug, Clone, Serialize)]
pub struct Avatar {
    pub id: i32,
    pub account_id: i32,
    pub external_id: String,
    pub account_email: String,
    pub name: String,
    #[serde(flatten)]
    pub document: AvatarDocument,
    pub target_audience: String,
    pub help_description: String,
    pub image_url: Option<String>,
    pub image_keyword: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Whole-field overwrite patch: a provided section replaces the stored one
/// entirely, absent fields are left untouched. Last writer wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvatarPatch {
    pub name: Option<String>,
    pub details: Option<BTreeMap<String, String>>,
    pub story: Option<SectionContent>,
    pub current_wants: Option<SectionContent>,
    pub pain_points: Option<SectionContent>,
    pub desires: Option<SectionContent>,
    pub offer_results: Option<SectionContent>,
    pub biggest_problem: Option<SectionContent>,
    pub humiliation: Option<SectionContent>,
    pub frustrations: Option<SectionContent>,
    pub complaints: Option<SectionContent>,
    pub cost_of_not_buying: Option<SectionContent>,
    pub biggest_want: Option<SectionContent>,
    pub target_audience: Option<String>,
    pub help_description: Option<String>,
    pub image_keyword: Option<String>,
}
