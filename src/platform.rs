//! Platform detection from the page URL.
//!
//! Each known chat application may be reachable under several hostnames
//! (official, historical, mirrored). Matching is substring-based against
//! a fixed table; an unrecognized host is a legitimate "do not extract
//! here" outcome, not an error.

use url::Url;

/// A known chat application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformId {
    ChatGpt,
    DeepSeek,
    Monica,
}

impl PlatformId {
    /// Display/wire name, as the memory API expects it.
    pub fn name(&self) -> &'static str {
        match self {
            PlatformId::ChatGpt => "ChatGPT",
            PlatformId::DeepSeek => "DeepSeek",
            PlatformId::Monica => "Monica",
        }
    }
}

/// Host patterns per platform. Order matters only for readability;
/// patterns are disjoint in practice.
const HOST_PATTERNS: &[(&str, PlatformId)] = &[
    ("chat.openai.com", PlatformId::ChatGpt),
    ("chatgpt.com", PlatformId::ChatGpt),
    // historical mirror
    ("oai.liuliangbang.vip", PlatformId::ChatGpt),
    ("chat.deepseek.com", PlatformId::DeepSeek),
    ("chat.monica.im", PlatformId::Monica),
];

/// Extract the host portion of a page URL. Accepts bare hosts too,
/// since callers sometimes only have `window.location.host`-style input.
pub fn host_of(page_url: &str) -> String {
    Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| page_url.trim().to_string())
}

/// Map a page URL (or bare host) to a known platform, or `None` when
/// the host is unsupported.
pub fn detect_platform(page_url: &str) -> Option<PlatformId> {
    let host = host_of(page_url);
    HOST_PATTERNS
        .iter()
        .find(|(pattern, _)| host.contains(pattern))
        .map(|(_, platform)| *platform)
}
