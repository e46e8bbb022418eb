use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator field carried by every upstream result object.
pub const CLASS_TAG: &str = "_class";
/// Discriminator value of a successful extraction.
pub const SUCCESS_CLASS: &str = "UfysResponse";
/// Discriminator value of a failed extraction.
pub const ERROR_CLASS: &str = "UfysError";

/// Metadata of a successfully extracted video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Extractor/site identifier, e.g. `TikTok`.
    #[serde(default)]
    pub site: Option<String>,
    /// Display name of whoever posted the video.
    #[serde(default)]
    pub creator: Option<String>,
    /// Directly playable video URL.
    pub video_url: String,
    /// Every other field the extractor reported.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoInfo {
    /// Returns a string-valued extra field, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Returns an integer-valued extra field, if present.
    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(Value::as_u64)
    }

    /// Human readable attribution: `creator on site`, or whichever is known.
    pub fn creator_line(&self) -> Option<String> {
        match (self.creator.as_deref(), self.site.as_deref()) {
            (Some(creator), Some(site)) if !creator.is_empty() && !site.is_empty() => {
                Some(format!("{creator} on {site}"))
            }
            (Some(creator), _) if !creator.is_empty() => Some(creator.to_string()),
            (_, Some(site)) if !site.is_empty() => Some(site.to_string()),
            _ => None,
        }
    }
}

/// A typed extraction failure reported by the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionError {
    pub code: String,
    pub message: String,
}

impl ExtractionError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One outcome reported by the extraction service for a URL.
///
/// Serializes to the wire shape, with the variant named by [`CLASS_TAG`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "_class")]
pub enum ExtractionResult {
    #[serde(rename = "UfysResponse")]
    Success(VideoInfo),
    #[serde(rename = "UfysError")]
    Error(ExtractionError),
}

impl ExtractionResult {
    pub fn as_success(&self) -> Option<&VideoInfo> {
        match self {
            ExtractionResult::Success(info) => Some(info),
            ExtractionResult::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ExtractionError> {
        match self {
            ExtractionResult::Success(_) => None,
            ExtractionResult::Error(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(creator: Option<&str>, site: Option<&str>) -> VideoInfo {
        VideoInfo {
            site: site.map(str::to_string),
            creator: creator.map(str::to_string),
            video_url: "https://cdn.example/v.mp4".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn creator_line_combines_creator_and_site() {
        assert_eq!(
            info(Some("alice"), Some("TikTok")).creator_line().as_deref(),
            Some("alice on TikTok")
        );
        assert_eq!(info(Some("alice"), None).creator_line().as_deref(), Some("alice"));
        assert_eq!(info(None, Some("Reddit")).creator_line().as_deref(), Some("Reddit"));
        assert_eq!(info(None, None).creator_line(), None);
    }

    #[test]
    fn serializes_with_class_tag() {
        let result = ExtractionResult::Error(ExtractionError::new("E1", "m"));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"_class": "UfysError", "code": "E1", "message": "m"}));
    }

    #[test]
    fn success_keeps_extra_fields_flat() {
        let mut extra = Map::new();
        extra.insert("title".to_string(), json!("a video"));
        let result = ExtractionResult::Success(VideoInfo {
            extra,
            ..info(Some("bob"), Some("YouTube"))
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["_class"], "UfysResponse");
        assert_eq!(value["title"], "a video");
        assert_eq!(value["creator"], "bob");
    }
}
