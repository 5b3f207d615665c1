use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{MonitorError, Result};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://((?:www\.)?[a-z0-9.-]+)/([a-z0-9-]+)/*$").expect("valid regex")
});
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9-]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// CampaignTarget — normalized identity of one tracked fundraiser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignTarget {
    pub slug: String,
    pub url: String,
}

impl CampaignTarget {
    /// Normalize a bare slug or a full fundraiser URL.
    ///
    /// Slugs are lowercased. URLs must point at the fundraiser site; any other
    /// host is rejected. Either way the canonical URL is
    /// `https://www.siepomaga.pl/<slug>`.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(MonitorError::InvalidTarget("empty fundraiser".into()));
        }

        if let Some(caps) = URL_RE.captures(raw) {
            let host = caps[1].to_ascii_lowercase();
            if !config::ALLOWED_HOSTS.contains(&host.as_str()) {
                return Err(MonitorError::InvalidTarget(format!(
                    "{raw} does not point at {}",
                    config::ALLOWED_HOSTS[0]
                )));
            }
            return Ok(Self::from_slug(&caps[2]));
        }

        if SLUG_RE.is_match(raw) {
            return Ok(Self::from_slug(raw));
        }

        Err(MonitorError::InvalidTarget(format!(
            "{raw} is neither a fundraiser slug nor a fundraiser URL"
        )))
    }

    fn from_slug(slug: &str) -> Self {
        let slug = slug.to_ascii_lowercase();
        let url = format!("{}/{}", config::BASE_URL, slug);
        Self { slug, url }
    }
}

impl fmt::Display for CampaignTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}
