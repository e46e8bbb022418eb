//! Decoding of extraction service payloads into [`ExtractionResult`]s.
//!
//! The service answers with an array of objects, each tagged by a `_class`
//! discriminator. Older deployments answer with a single tagged object,
//! which is accepted as a one-element array.

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::model::{
    ExtractionError, ExtractionResult, VideoInfo, CLASS_TAG, ERROR_CLASS, SUCCESS_CLASS,
};

/// Outcome of decoding a single payload entry.
#[derive(Debug)]
pub enum Entry {
    Recognized(ExtractionResult),
    /// Missing or unknown discriminator; the entry is ignored.
    Unrecognized,
    /// Known discriminator, but the fields do not fit the variant.
    Malformed { class: String, reason: String },
}

/// Decodes a raw upstream payload.
///
/// Unrecognized and malformed entries are dropped; the order of the remaining
/// entries is preserved. Fails with [`Error::InvalidUpstreamResponse`] if the
/// payload is not JSON, is neither an array nor an object, or yields no entry.
pub fn decode_results(raw: &[u8]) -> Result<Vec<ExtractionResult>> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        warn!(error = %e, "Extraction service returned invalid JSON");
        Error::invalid_upstream_response(format!("response is not valid JSON: {e}"))
    })?;
    decode_value(value)
}

/// Decodes an already parsed upstream payload. See [`decode_results`].
pub fn decode_value(value: Value) -> Result<Vec<ExtractionResult>> {
    let entries = match value {
        Value::Array(entries) => entries,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(Error::invalid_upstream_response(format!(
                "expected an array of result objects, got {}",
                kind(&other)
            )))
        }
    };

    let total = entries.len();
    let mut results = Vec::with_capacity(total);
    for (index, entry) in entries.into_iter().enumerate() {
        match decode_entry(entry) {
            Entry::Recognized(result) => results.push(result),
            Entry::Unrecognized => trace!(index, "Skipping entry without a known discriminator"),
            Entry::Malformed { class, reason } => {
                warn!(index, class = %class, reason = %reason, "Skipping malformed result entry")
            }
        }
    }

    if results.is_empty() {
        return Err(Error::invalid_upstream_response(format!(
            "none of the {total} entries is a recognized result"
        )));
    }
    Ok(results)
}

/// Decodes one entry by switching on its discriminator.
pub fn decode_entry(entry: Value) -> Entry {
    let Value::Object(mut fields) = entry else {
        return Entry::Unrecognized;
    };
    let class = match fields.remove(CLASS_TAG) {
        Some(Value::String(class)) => class,
        _ => return Entry::Unrecognized,
    };

    match class.as_str() {
        SUCCESS_CLASS => decode_fields::<VideoInfo>(fields)
            .map(ExtractionResult::Success)
            .map_or_else(|reason| Entry::Malformed { class, reason }, Entry::Recognized),
        ERROR_CLASS => decode_fields::<ExtractionError>(fields)
            .map(ExtractionResult::Error)
            .map_or_else(|reason| Entry::Malformed { class, reason }, Entry::Recognized),
        _ => Entry::Unrecognized,
    }
}

fn decode_fields<T: serde::de::DeserializeOwned>(
    fields: Map<String, Value>,
) -> std::result::Result<T, String> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
