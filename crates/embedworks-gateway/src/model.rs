use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// oEmbed document attached to embed pages.
#[derive(Debug, PartialEq, Serialize)]
pub struct OembedResponse {
    pub provider_name: String,
    pub author_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}
