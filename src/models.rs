use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Query sent upstream: `"Latest news and key developments about {topic}"`.
pub fn brief_query(topic: &str) -> String {
    format!("Latest news and key developments about {}", topic)
}

/// Body of an answer call. Sent as-is to the direct endpoint and wrapped
/// in a [`ProxyRequest`] for the OAuth proxy.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest {
    pub query: String,
    #[serde(rename = "structuredOutput")]
    pub structured_output: Value,
}

impl AnswerRequest {
    pub fn meeting_brief(topic: &str) -> Self {
        Self {
            query: brief_query(topic),
            structured_output: brief_schema(),
        }
    }
}

/// Schema the answer service fills in for a meeting brief.
pub fn brief_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "executive_summary": {
                "type": "string",
                "description": "2-minute read summary of key information"
            },
            "key_developments": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of recent key developments or news"
            },
            "key_people": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Key people or leaders mentioned"
            },
            "important_dates": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Important upcoming dates or recent events"
            },
            "talking_points": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Key talking points to prepare"
            }
        }
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequest<'a> {
    pub path: &'static str,
    pub method: &'static str,
    pub body: &'a AnswerRequest,
}

impl<'a> ProxyRequest<'a> {
    pub fn answer(body: &'a AnswerRequest) -> Self {
        Self {
            path: "/v1/answer",
            method: "POST",
            body,
        }
    }
}

/// Upstream answer as received. Only `success` is interpreted on decode; the
/// payload fields are typed in the transform step once success is known.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerResult {
    #[serde(default, deserialize_with = "truthy")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub contents: Option<Value>,
    #[serde(default)]
    pub search_results: Option<Value>,
}

impl AnswerResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(Value::String(error.into())),
            ..Self::default()
        }
    }

    /// `None` when the answer carried no contents at all.
    pub fn brief_fields(&self) -> Option<serde_json::Result<BriefFields>> {
        let contents = self.contents.clone()?;
        Some(serde_json::from_value::<AnswerContents>(contents).and_then(AnswerContents::into_fields))
    }

    pub fn sources(&self) -> serde_json::Result<Vec<SearchResult>> {
        match &self.search_results {
            Some(results) => serde_json::from_value(results.clone()),
            None => Ok(Vec::new()),
        }
    }
}

/// Any JSON value, judged the way the answer service's clients judge `success`.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Structured output comes back either JSON-encoded in a string or inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnswerContents {
    Text(String),
    Structured(BriefFields),
}

impl AnswerContents {
    pub fn into_fields(self) -> serde_json::Result<BriefFields> {
        match self {
            AnswerContents::Text(raw) => serde_json::from_str(&raw),
            AnswerContents::Structured(fields) => Ok(fields),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BriefFields {
    #[serde(default)]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub key_developments: Option<Vec<String>>,
    #[serde(default)]
    pub key_people: Option<Vec<String>>,
    #[serde(default)]
    pub important_dates: Option<Vec<String>>,
    #[serde(default)]
    pub talking_points: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BriefResponse {
    pub topic: String,
    pub generated_at: String,
    pub brief: Brief,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub executive_summary: String,
    pub key_developments: Vec<String>,
    pub key_people: Vec<String>,
    pub important_dates: Vec<String>,
    pub talking_points: Vec<String>,
}

impl From<BriefFields> for Brief {
    fn from(fields: BriefFields) -> Self {
        Self {
            executive_summary: fields.executive_summary.unwrap_or_default(),
            key_developments: fields.key_developments.unwrap_or_default(),
            key_people: fields.key_people.unwrap_or_default(),
            important_dates: fields.important_dates.unwrap_or_default(),
            talking_points: fields.talking_points.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl From<SearchResult> for Source {
    fn from(result: SearchResult) -> Self {
        Self {
            title: result.title,
            url: result.url,
            published_date: result.publication_date,
            snippet: result.description,
        }
    }
}
