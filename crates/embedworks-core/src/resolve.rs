//! Turning an inbound host and path into the URL that should be extracted.

use tracing::trace;
use url::Url;

use crate::error::{Error, Result};
use crate::mode::{ResponseMode, MODE_PARAM_KEY, RESERVED_PARAM_PREFIX};

/// Resolves inbound requests against the configured base hosts.
///
/// Two request shapes are supported:
///
/// - `https://<base>/<target url>`: the path is the target.
/// - `https://<target host>.<base>/<path>`: the labels left of the base form
///   the target host, e.g. `tiktok.com.embed.works/@a/video/1` resolves to
///   `https://tiktok.com/@a/video/1`.
#[derive(Debug, Clone, Default)]
pub struct HostResolver {
    base_hosts: Vec<String>,
}

impl HostResolver {
    pub fn new<I, S>(base_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base_hosts = base_hosts
            .into_iter()
            .map(|host| host.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Self { base_hosts }
    }

    /// Parses a comma separated list of base hosts.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn base_hosts(&self) -> &[String] {
        &self.base_hosts
    }

    /// Resolves `host` (optionally with a port) and `path` to a target URL.
    ///
    /// The result still needs [`canonical_url`] to gain a guaranteed scheme
    /// and the forwarded query.
    pub fn resolve(&self, host: &str, path: &str) -> Result<String> {
        let host = strip_port(host).trim_end_matches('.').to_ascii_lowercase();
        let path = path.strip_prefix('/').unwrap_or(path);

        if self.base_hosts.iter().any(|base| *base == host) {
            trace!(host = %host, "Request on a base host, path is the target");
            return Ok(repair_scheme(path));
        }

        for base in &self.base_hosts {
            if let Some(target_host) = strip_base(&host, base) {
                trace!(host = %host, base = %base, target_host = %target_host, "Resolved subdomain target");
                return Ok(format!("https://{target_host}/{path}"));
            }
        }

        Err(Error::UnresolvableHost(host))
    }
}

fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// Compares labels right to left; returns the labels left over once `base`
/// is fully consumed, or `None` if `host` is not a strict subdomain of `base`.
fn strip_base(host: &str, base: &str) -> Option<String> {
    let mut host_labels: Vec<&str> = host.split('.').collect();
    let mut base_labels: Vec<&str> = base.split('.').collect();

    loop {
        let (Some(host_label), Some(base_label)) = (host_labels.pop(), base_labels.pop()) else {
            return None;
        };
        if host_label != base_label {
            return None;
        }
        if base_labels.is_empty() {
            if host_labels.is_empty() || host_labels.iter().any(|label| label.is_empty()) {
                return None;
            }
            return Some(host_labels.join("."));
        }
    }
}

/// Restores `scheme://` where an unfurler collapsed it to `scheme:/`.
pub fn repair_scheme(path: &str) -> String {
    for scheme in ["https:/", "http:/"] {
        if let Some(rest) = path.strip_prefix(scheme) {
            if !rest.is_empty() && !rest.starts_with('/') {
                return format!("{scheme}/{rest}");
            }
        }
    }
    path.to_string()
}

fn has_http_scheme(target: &str) -> bool {
    let lower = target
        .get(..8)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| target.to_ascii_lowercase());
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PARAM_PREFIX)
}

/// Builds the canonical URL for a resolved target.
///
/// A target without an http(s) scheme is taken as `https://`. Reserved
/// `ew-` parameters are removed from the target, then every non-reserved
/// inbound query pair is appended in order.
pub fn canonical_url<I, K, V>(target: &str, query: I) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let absolute = if has_http_scheme(target) {
        target.to_string()
    } else {
        format!("https://{target}")
    };
    let mut url = Url::parse(&absolute).map_err(|e| Error::InvalidTargetUrl(format!("{absolute}: {e}")))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::InvalidTargetUrl(format!("{absolute}: missing host")));
    }

    if url.query_pairs().any(|(key, _)| is_reserved(&key)) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.set_query(None);
        if !kept.is_empty() {
            url.query_pairs_mut().extend_pairs(kept);
        }
    }

    let forwarded: Vec<(K, V)> = query
        .into_iter()
        .filter(|(key, _)| !is_reserved(key.as_ref()))
        .collect();
    if !forwarded.is_empty() {
        url.query_pairs_mut().extend_pairs(forwarded);
    }

    Ok(url.into())
}

/// Returns `request_url` with its mode override set to `mode`.
pub fn mode_url(request_url: &str, mode: ResponseMode) -> Result<String> {
    let mut url =
        Url::parse(request_url).map_err(|e| Error::InvalidTargetUrl(format!("{request_url}: {e}")))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != MODE_PARAM_KEY)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(kept)
        .append_pair(MODE_PARAM_KEY, mode.as_str());
    Ok(url.into())
}
