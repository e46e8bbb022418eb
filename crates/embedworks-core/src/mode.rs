use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Query parameter that overrides the response mode.
pub const MODE_PARAM_KEY: &str = "ew-mode";
/// Query parameter that opts into trace ids in structured output.
pub const TRACE_PARAM_KEY: &str = "ew-trace";
/// Prefix reserved for the service's own query parameters.
pub const RESERVED_PARAM_PREFIX: &str = "ew-";

/// How a resolved URL is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseMode {
    /// Placeholder resolved to `Embed` or `Original`.
    Auto,
    Embed,
    Direct,
    /// Redirect to the canonical URL without extracting.
    Original,
    Oembed,
    /// Placeholder resolved to `EmbedDebug` or `RawDebug`.
    AutoDebug,
    EmbedDebug,
    RawDebug,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Auto => "auto",
            ResponseMode::Embed => "embed",
            ResponseMode::Direct => "direct",
            ResponseMode::Original => "original",
            ResponseMode::Oembed => "oembed",
            ResponseMode::AutoDebug => "auto-debug",
            ResponseMode::EmbedDebug => "embed-debug",
            ResponseMode::RawDebug => "raw-debug",
        }
    }

    /// Replaces an `auto` placeholder with a concrete mode.
    pub fn resolve_auto(self, is_bot: bool) -> Self {
        match self {
            ResponseMode::Auto if is_bot => ResponseMode::Embed,
            ResponseMode::Auto => ResponseMode::Original,
            ResponseMode::AutoDebug if is_bot => ResponseMode::EmbedDebug,
            ResponseMode::AutoDebug => ResponseMode::RawDebug,
            concrete => concrete,
        }
    }
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ResponseMode::Auto),
            "embed" => Ok(ResponseMode::Embed),
            "direct" => Ok(ResponseMode::Direct),
            // "redirect" is the name older links carry
            "original" | "redirect" => Ok(ResponseMode::Original),
            "oembed" => Ok(ResponseMode::Oembed),
            "auto-debug" => Ok(ResponseMode::AutoDebug),
            "embed-debug" => Ok(ResponseMode::EmbedDebug),
            "raw-debug" => Ok(ResponseMode::RawDebug),
            other => Err(format!("unknown response mode: {other}")),
        }
    }
}

impl Display for ResponseMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the response mode for a request.
///
/// A recognized `override_param` wins; anything else falls back to `auto`.
/// Placeholders are then resolved using `is_bot`.
pub fn determine_mode(override_param: Option<&str>, is_bot: bool) -> ResponseMode {
    override_param
        .and_then(|value| value.parse().ok())
        .unwrap_or(ResponseMode::Auto)
        .resolve_auto(is_bot)
}
