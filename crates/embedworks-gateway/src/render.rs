//! Presentation of extraction results as HTML pages, JSON documents and redirects.

use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use embedworks_core::{ExtractionError, ExtractionResult, VideoInfo};
use tracing::error;

use crate::model::OembedResponse;

pub const ERROR_TITLE: &str = "oh no! something went wrong (╯°□°)╯︵ ┻━┻";
pub const PROVIDER_NAME: &str = "embed.works";

/// Brand colour of well known extractors.
pub fn site_color(site: Option<&str>) -> Option<&'static str> {
    match site? {
        "Instagram" => Some("#CE0071"),
        "Reddit" => Some("#FF5700"),
        "TikTok" => Some("#FF0050"),
        "TwitchClips" => Some("#6441A5"),
        "Twitter" => Some("#1DA1F2"),
        "YouTube" => Some("#FF0000"),
        _ => None,
    }
}

/// 302 redirect, which every unfurler follows.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Renders `page`, falling back to a bare 500 if the template fails.
pub fn page<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

/// Links from an embed page to the other presentations of the same request.
#[derive(Debug, Clone)]
pub struct EmbedLinks {
    pub direct: String,
    pub oembed: String,
    pub original: String,
}

/// Unfurlable page carrying OpenGraph and Twitter player tags for a video.
#[derive(Template)]
#[template(path = "embed.html")]
pub struct EmbedPage<'a> {
    provider: &'static str,
    heading: String,
    creator: Option<String>,
    description: Option<&'a str>,
    theme_color: Option<&'static str>,
    video_width: Option<u64>,
    video_height: Option<u64>,
    thumbnail: Option<&'a str>,
    links: &'a EmbedLinks,
}

pub fn embed_page<'a>(info: &'a VideoInfo, links: &'a EmbedLinks) -> EmbedPage<'a> {
    let creator = info.creator_line();
    // Unfurlers ignore a lone dimension.
    let (video_width, video_height) = match (info.meta_u64("width"), info.meta_u64("height")) {
        (Some(width), Some(height)) => (Some(width), Some(height)),
        _ => (None, None),
    };

    EmbedPage {
        provider: PROVIDER_NAME,
        heading: creator.clone().unwrap_or_else(|| PROVIDER_NAME.to_string()),
        creator,
        description: info.meta_str("title"),
        theme_color: site_color(info.site.as_deref()),
        video_width,
        video_height,
        thumbnail: info.meta_str("thumbnail_url"),
        links,
    }
}

/// Error page listing one `code: message` line per error.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    provider: &'static str,
    title: &'static str,
    description: String,
    lines: Vec<String>,
}

pub fn error_page(errors: &[ExtractionError]) -> ErrorPage {
    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect();
    ErrorPage {
        provider: PROVIDER_NAME,
        title: ERROR_TITLE,
        description: lines.join("\n"),
        lines,
    }
}

fn pretty(results: &[ExtractionResult]) -> String {
    serde_json::to_string_pretty(results).unwrap_or_else(|e| format!("unserializable results: {e}"))
}

/// Pretty JSON of the tagged results.
pub fn debug_json(results: &[ExtractionResult]) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        pretty(results),
    )
        .into_response()
}

/// Unfurlable page whose description is the pretty JSON of the results.
#[derive(Template)]
#[template(path = "debug.html")]
pub struct DebugPage {
    provider: &'static str,
    json: String,
}

pub fn debug_page(results: &[ExtractionResult]) -> DebugPage {
    DebugPage {
        provider: PROVIDER_NAME,
        json: pretty(results),
    }
}

pub fn oembed(creator: Option<String>, author_url: &str, trace_id: Option<&str>) -> OembedResponse {
    let provider_name = match trace_id {
        Some(id) => format!("{PROVIDER_NAME} - trace {id}"),
        None => PROVIDER_NAME.to_string(),
    };
    OembedResponse {
        provider_name,
        author_url: author_url.to_string(),
        author_name: creator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn info() -> VideoInfo {
        let mut extra = Map::new();
        extra.insert("title".to_string(), json!("a <b> \"move\""));
        extra.insert("width".to_string(), json!(720));
        extra.insert("height".to_string(), json!(1280));
        VideoInfo {
            site: Some("TikTok".to_string()),
            creator: Some("alice".to_string()),
            video_url: "https://cdn.example/1.mp4".to_string(),
            extra,
        }
    }

    fn links() -> EmbedLinks {
        EmbedLinks {
            direct: "https://embed.works/x?ew-mode=direct".to_string(),
            oembed: "https://embed.works/x?ew-mode=oembed".to_string(),
            original: "https://embed.works/x?ew-mode=original".to_string(),
        }
    }

    #[test]
    fn known_sites_have_colors() {
        assert_eq!(site_color(Some("YouTube")), Some("#FF0000"));
        assert_eq!(site_color(Some("Vimeo")), None);
        assert_eq!(site_color(None), None);
    }

    #[test]
    fn embed_page_carries_video_tags() {
        let links = links();
        let info = info();
        let page = embed_page(&info, &links).render().unwrap();

        assert!(page.contains(r#"<meta property="og:title" content="alice on TikTok">"#));
        assert!(page.contains(r##"<meta name="theme-color" content="#FF0050">"##));
        assert!(page.contains(r#"<meta property="og:video" content="https://embed.works/x?ew-mode=direct">"#));
        assert!(page.contains(r#"<meta property="og:video:width" content="720">"#));
        assert!(page.contains("a &lt;b&gt;"));
        assert!(!page.contains(r#""move""#));
        assert!(page.contains(r#"type="application/json+oembed" href="https://embed.works/x?ew-mode=oembed""#));
    }

    #[test]
    fn error_page_lists_every_error() {
        let page = error_page(&[
            ExtractionError::new("unsupported", "no extractor"),
            ExtractionError::new("private", "login required"),
        ])
        .render()
        .unwrap();

        assert!(page.contains("unsupported: no extractor<br>private: login required"));
        assert!(page.contains("content=\"unsupported: no extractor\nprivate: login required\""));
    }

    #[test]
    fn embed_page_without_metadata_falls_back_to_provider() {
        let links = links();
        let info = VideoInfo {
            site: None,
            creator: None,
            video_url: "https://cdn.example/1.mp4".to_string(),
            extra: Map::new(),
        };
        let page = embed_page(&info, &links).render().unwrap();

        assert!(page.contains("<h1>embed.works</h1>"));
        assert!(!page.contains("og:title"));
        assert!(!page.contains("theme-color"));
        assert!(!page.contains("og:video:width"));
    }

    #[test]
    fn error_page_escapes_messages() {
        let page = error_page(&[ExtractionError::new("E1", "<script>alert(1)</script>")])
            .render()
            .unwrap();

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn debug_page_embeds_results_as_text() {
        let page = debug_page(&[ExtractionResult::Error(ExtractionError::new("E1", "m"))])
            .render()
            .unwrap();

        assert!(page.contains("<pre>"));
        assert!(page.contains("UfysError"));
        assert!(page.contains("E1"));
        assert!(!page.contains(r#""code""#));
    }

    #[test]
    fn rendered_page_is_html() {
        let response = page(&error_page(&[ExtractionError::new("E1", "m")]));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[test]
    fn oembed_adds_trace_only_when_requested() {
        let doc = oembed(Some("alice".to_string()), "https://t.test/v", None);
        assert_eq!(doc.provider_name, "embed.works");
        assert_eq!(doc.author_name.as_deref(), Some("alice"));

        let doc = oembed(None, "https://t.test/v", Some("abc"));
        assert_eq!(doc.provider_name, "embed.works - trace abc");
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("author_name").is_none());
    }

    #[test]
    fn found_is_a_302() {
        let response = found("https://t.test/v");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://t.test/v");
    }
}
