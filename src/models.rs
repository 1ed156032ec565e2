use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title given to personas synthesized from a user-entered name
pub const CUSTOM_PERSONA_TITLE: &str = "Custom Expert Persona";

/// Title shown for custom personas in the advice header
pub const CUSTOM_DISPLAY_TITLE: &str = "Custom Mentor Profile";

/// Substituted when the service returns no text
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "No response received.";

/// A mentor persona, either a preset or synthesized from a user-entered name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

impl PersonaProfile {
    /// Create a preset persona
    pub fn preset(id: &str, name: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            title: title.to_string(),
            description: Some(description.to_string()),
            is_custom: false,
        }
    }

    /// Synthesize a custom persona from user input with a fresh id.
    /// Returns `None` for blank names.
    pub fn custom(name: &str) -> Option<Self> {
        if name.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: format!("custom-{}", uuid::Uuid::new_v4()),
            name: name.to_string(),
            title: CUSTOM_PERSONA_TITLE.to_string(),
            description: None,
            is_custom: true,
        })
    }

    /// Title to show next to the persona name
    pub fn display_title(&self) -> &str {
        if self.is_custom {
            CUSTOM_DISPLAY_TITLE
        } else {
            &self.title
        }
    }
}

/// The user's self-description. Fields are free text and never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: String,
    pub gender: String,
    pub dream: String,
}

impl UserProfile {
    pub fn new(
        age: impl Into<String>,
        gender: impl Into<String>,
        dream: impl Into<String>,
    ) -> Self {
        Self {
            age: age.into(),
            gender: gender.into(),
            dream: dream.into(),
        }
    }
}

/// A web reference attached to a grounded answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

/// One grounding chunk from the service's metadata.
///
/// Chunks that do not carry a well-formed `web` payload are kept as opaque
/// values so the ordering of the original list survives normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroundingChunk {
    Web { web: WebSource },
    Other(serde_json::Value),
}

impl GroundingChunk {
    pub fn as_web(&self) -> Option<&WebSource> {
        match self {
            GroundingChunk::Web { web } => Some(web),
            GroundingChunk::Other(_) => None,
        }
    }
}

/// Normalized result of one successful fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceResult {
    pub persona_name: String,
    pub content: String,
    pub sources: Vec<GroundingChunk>,
    pub generated_at: DateTime<Utc>,
}

impl AdviceResult {
    /// Web sources in their original order; other chunk shapes are skipped
    pub fn web_sources(&self) -> impl Iterator<Item = &WebSource> + '_ {
        self.sources.iter().filter_map(GroundingChunk::as_web)
    }
}

/// Composite cache key over a persona name and every profile field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    persona_name: String,
    profile: UserProfile,
}

impl CacheKey {
    pub fn new(persona: &PersonaProfile, profile: &UserProfile) -> Self {
        Self {
            persona_name: persona.name.clone(),
            profile: profile.clone(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.persona_name, self.profile.age, self.profile.gender, self.profile.dream
        )
    }
}

// Gemini generateContent request format
#[derive(Debug, Serialize, Clone)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on thought-summary parts, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Serialize, Clone)]
pub enum Tool {
    #[serde(rename = "googleSearch")]
    GoogleSearch {},
}

#[derive(Debug, Serialize, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
}

// Gemini generateContent response format
#[derive(Debug, Deserialize, Default)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, rename = "groundingMetadata")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GroundingMetadata {
    #[serde(default, rename = "groundingChunks")]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

impl GenerateRequest {
    /// Single-turn request for one prompt
    pub fn single_turn(prompt: &str, temperature: f32, enable_search: bool) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                    thought: None,
                }],
            }],
            tools: if enable_search {
                vec![Tool::GoogleSearch {}]
            } else {
                Vec::new()
            },
            generation_config: GenerationConfig { temperature },
        }
    }
}

impl GenerateResponse {
    /// Concatenated answer text of the first candidate, if any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Grounding chunks of the first candidate, consuming the response
    pub fn into_grounding_chunks(self) -> Vec<GroundingChunk> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
    }
}
