//! Course finder backed by Gemini: turns a free-form question into a catalog query.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::integrations::{IntegrationError, IntegrationResult};

/// Marker the model uses for "every category" / "every course".
pub static ALL: &str = "all";

/// What the model understood from the message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "courseName")]
    pub course_name: Option<String>,
    /// Field name -> include flag.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub select: Option<Map<String, Value>>,
}

impl CourseQuery {
    pub fn wants_all_categories(&self) -> bool {
        self.category.as_deref() == Some(ALL)
    }

    pub fn wants_all_courses(&self) -> bool {
        self.course_name.as_deref() == Some(ALL)
    }

    /// Keeps only the selected keys of a JSON object. Without a selection the
    /// value is returned untouched.
    pub fn project(&self, value: Value) -> Value {
        match (&self.select, value) {
            (Some(select), Value::Object(mut fields)) => {
                fields.retain(|key, _| select.get(key).and_then(Value::as_bool).unwrap_or(false));
                Value::Object(fields)
            }
            (_, value) => value,
        }
    }
}

#[async_trait::async_trait]
pub trait CourseAssistant: Send + Sync {
    async fn classify(&self, message: &str) -> IntegrationResult<CourseQuery>;
}

pub fn classification_prompt(message: &str) -> String {
    format!(
        r#"You are a classification assistant for an LMS.
Your job is ONLY to extract exactly this JSON:

{{
  "category": string | null,
  "courseName": string | null,
  "select": object | null
}}

Rules:
- If user asks general topic like "I want React courses", category = "React"
- If user asks a specific course like "Full-Stack React Bootcamp", courseName = "Full-Stack React Bootcamp"
- If user asks for all the categories or all the courses assign 'all' to category or courseName respectively.
- Don't assign 'all' when the user asks for a specific thing. Eg: for all the react courses the category is react, not all.
- Never return category and courseName at the same time. Prefer courseName if the user specifies both.
- If user asks to view some properties like title, put them in a select object like select: {{ "title": true, "instructor": true }}, otherwise select: null.
- Only return a single JSON object (no additional text or explanation).
User message:
{message}
"#
    )
}

/// Strips a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

pub fn parse_course_query(raw: &str) -> IntegrationResult<CourseQuery> {
    let invalid = |details: &str| IntegrationError::InvalidResponse {
        service: "gemini",
        details: details.to_string(),
        raw: Some(raw.to_string()),
    };

    let value: Value =
        serde_json::from_str(strip_code_fences(raw)).map_err(|_| invalid("invalid JSON"))?;

    let Value::Object(fields) = &value else {
        return Err(invalid("expected a JSON object"));
    };
    if !["category", "courseName", "course_name", "select"]
        .iter()
        .any(|k| fields.contains_key(*k))
    {
        return Err(invalid("unexpected JSON shape"));
    }

    serde_json::from_value(value).map_err(|_| invalid("unexpected JSON shape"))
}

#[derive(Debug, Clone)]
pub struct GeminiAssistant {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiAssistant {
    pub fn new(client: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        )
    }
}

#[async_trait::async_trait]
impl CourseAssistant for GeminiAssistant {
    #[tracing::instrument(skip(self, message))]
    async fn classify(&self, message: &str) -> IntegrationResult<CourseQuery> {
        if self.api_key.is_empty() {
            return Err(IntegrationError::NotConfigured("gemini"));
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": classification_prompt(message) }] }]
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::UpstreamError {
                service: "gemini",
                status,
                body,
            });
        }

        let generated: GenerateResponse = resp.json().await?;
        let raw = generated
            .text()
            .ok_or_else(|| IntegrationError::invalid_response("gemini", "empty response"))?;

        tracing::debug!("model answered: {raw}");
        parse_course_query(&raw)
    }
}
