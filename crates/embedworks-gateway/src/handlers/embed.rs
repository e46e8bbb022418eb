use axum::extract::{Query, State};
use axum::http::header::{HOST, USER_AGENT};
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use embedworks_core::{
    canonical_url, determine_mode, mode_url, Error, ExtractionResult, ResponseMode,
    MODE_PARAM_KEY, TRACE_PARAM_KEY,
};
use tracing::{debug, field, info, instrument, Span};
use uuid::Uuid;

use crate::error::Result;
use crate::render::{self, EmbedLinks};
use crate::state::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Resolves any path on any configured host and presents the result.
#[instrument(skip_all, fields(trace_id = field::Empty))]
pub async fn embed_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let trace_id = Uuid::new_v4().simple().to_string();
    Span::current().record("trace_id", trace_id.as_str());
    let host = request_host(&headers, &uri).ok_or_else(|| Error::UnresolvableHost(String::new()))?;
    let target = state.resolver().resolve(host, uri.path())?;

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let is_bot = state.bots().is_bot(user_agent);
    let mode = determine_mode(query_value(&query, MODE_PARAM_KEY), is_bot);
    let url = canonical_url(&target, query.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    info!(url = %url, mode = %mode, is_bot, "Resolved request");

    if mode == ResponseMode::Original {
        return Ok(render::found(&url));
    }

    let results = state.fetcher().fetch(&url).await?;
    debug!(results = results.len(), "Fetched extraction results");

    let request = Request {
        url: request_url(&headers, host, &uri),
        canonical: url,
        trace_id: query_value(&query, TRACE_PARAM_KEY).map(|_| trace_id),
    };
    present(mode, &request, &results)
}

/// What a presentation needs to know about the request beyond the results.
struct Request {
    /// The inbound URL, as the client sees it.
    url: String,
    canonical: String,
    /// Set when the client opted into trace ids.
    trace_id: Option<String>,
}

fn present(mode: ResponseMode, request: &Request, results: &[ExtractionResult]) -> Result<Response> {
    match mode {
        ResponseMode::RawDebug => return Ok(render::debug_json(results)),
        ResponseMode::EmbedDebug => return Ok(render::page(&render::debug_page(results))),
        _ => {}
    }

    let info = match results.first() {
        Some(ExtractionResult::Success(info)) => info,
        _ => {
            let errors: Vec<_> = results.iter().filter_map(ExtractionResult::as_error).cloned().collect();
            return Ok(render::page(&render::error_page(&errors)));
        }
    };

    match mode {
        ResponseMode::Oembed => Ok(Json(render::oembed(
            info.creator_line(),
            &request.canonical,
            request.trace_id.as_deref(),
        ))
        .into_response()),
        ResponseMode::Direct => Ok(render::found(&info.video_url)),
        _ => {
            let links = EmbedLinks {
                direct: mode_url(&request.url, ResponseMode::Direct)?,
                oembed: mode_url(&request.url, ResponseMode::Oembed)?,
                original: mode_url(&request.url, ResponseMode::Original)?,
            };
            Ok(render::page(&render::embed_page(info, &links)))
        }
    }
}

fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .filter(|host| !host.is_empty())
}

fn request_url(headers: &HeaderMap, host: &str, uri: &Uri) -> String {
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    format!("{scheme}://{host}{path}")
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
