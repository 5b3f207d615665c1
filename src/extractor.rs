//! Field extraction from the raw fundraiser page.
//!
//! Each field is searched for independently; a field that cannot be found or
//! parsed is left as `None` without affecting the others. Only two outcomes
//! fail the whole page: a missing currency marker (the server returned
//! something other than a fundraiser page) and a page with no fields at all.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Captures, Match, Regex};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config;
use crate::error::{MonitorError, Result};
use crate::models::{CampaignSnapshot, CampaignTarget};

/// Integer with optional single-character thousands separators.
const INT: &str = r"\d{1,3}(?:[ \x{A0}\x{202F}]\d{3})+|\d+";
/// Amount: integer part (dots allowed as separators) and an optional 1-2 digit fraction.
///
/// A sign only counts when it touches the digits; `Zebrano - 1 234 zł` is a
/// separator, `-1 234 zł` is negative.
const AMOUNT: &str = r"(-|−)?\b(\d{1,3}(?:[ \x{A0}\x{202F}.]\d{3})+|\d+)(?:[.,](\d{1,2}))?\s*zł";
const PERCENT: &str = r"(-?\d+(?:[.,]\d+)?)\s*%";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]*>"));
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)<\s*/?\s*(?:br|p|div|li|ul|ol|tr|td|th|table|section|article|header|footer|h[1-6])\b[^>]*>")
});
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);"));
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<title[^>]*>(.*?)</title>"));

static COLLECTED_LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)Zebrano[^\d]{{0,40}}?{AMOUNT}")));
static COLLECTED_WITH_PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i){AMOUNT}\s*\(\s*{PERCENT}\s*\)")));
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| re(&format!("(?i){AMOUNT}")));
static MISSING_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)Brakuje[^\d]{{0,40}}?{AMOUNT}")));

static PERCENT_LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)Postęp[^\d]{{0,20}}?{PERCENT}")));
static PERCENT_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"\(\s*{PERCENT}\s*\)")));

static SUPPORTERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(&format!(
        r"(?i)Wspar\w*\W{{0,10}}?(-|−)?\b({INT})\s*(?:osoby|osoba|osób|osob)"
    ))
});
static SUPPORTERS_LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)Wspierających\W{{0,10}}?(-|−)?\b({INT})\b")));
static RECURRING_RE: LazyLock<Regex> =
    LazyLock::new(|| re(&format!(r"(?i)(-|−)?\b({INT})\s*Stałych\s+Pomagaczy")));

static START_RE: LazyLock<Regex> = LazyLock::new(|| date_re("Rozpoczęcie"));
static END_RE: LazyLock<Regex> = LazyLock::new(|| date_re("Zakończenie"));

fn date_re(label: &str) -> Regex {
    re(&format!(
        r"(?i){label}\s*:?\s*(?:(\d{{1,2}})\s+(\p{{L}}+)\s+(\d{{4}})|(\d{{1,2}})\.(\d{{1,2}})\.(\d{{4}}))"
    ))
}

/// Lines mentioning these never carry the collected amount.
const NON_COLLECTED_LINE_MARKERS: [&str; 4] =
    ["Zakończenie:", "Rozpoczęcie:", "Brakuje", "Koszt"];

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

/// Parse a fundraiser page into a [`CampaignSnapshot`].
///
/// # Errors
///
/// * [`MonitorError::TemplateMismatch`] if the page never mentions the
///   currency marker (consent walls, error pages, empty app shells).
/// * [`MonitorError::NoFields`] if the page passed that check but not a
///   single field could be extracted.
pub fn extract(
    raw_html: &str,
    target: &CampaignTarget,
    fetched_at: DateTime<Utc>,
) -> Result<CampaignSnapshot> {
    let html = unescape_json_text(raw_html);
    if !html.contains(config::CURRENCY_MARKER) {
        return Err(MonitorError::TemplateMismatch {
            excerpt: page_excerpt(&html),
        });
    }

    let text = html_to_text(&html);
    let mut notes = Discards::default();
    let mut snapshot = CampaignSnapshot::empty(&target.slug, &target.url, fetched_at);

    let (collected, percent_near_amount) = find_collected(&text, &mut notes);
    snapshot.collected_amount = collected;
    snapshot.missing_amount = first_amount(&MISSING_RE, &text, &mut notes);
    snapshot.goal_amount = match (snapshot.collected_amount, snapshot.missing_amount) {
        (Some(collected), Some(missing)) => Some(collected + missing),
        _ => None,
    };
    snapshot.progress_percent = find_percent(&text, percent_near_amount, &mut notes);
    snapshot.supporters_count = first_count(&SUPPORTERS_RE, &text, &mut notes)
        .or_else(|| first_count(&SUPPORTERS_LABELED_RE, &text, &mut notes));
    snapshot.recurring_supporters_count = first_count(&RECURRING_RE, &text, &mut notes);
    snapshot.start_date = find_date(&START_RE, &text, &mut notes);
    snapshot.end_date = find_date(&END_RE, &text, &mut notes);
    snapshot.title = find_title(&html);
    snapshot.raw_excerpt = notes.first;

    if snapshot.is_empty() {
        return Err(MonitorError::NoFields {
            excerpt: page_excerpt(&text),
        });
    }
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Field finders
// ---------------------------------------------------------------------------

/// Collected amount, plus the percent printed right after it when present.
fn find_collected(text: &str, notes: &mut Discards) -> (Option<Decimal>, Option<Decimal>) {
    if let Some(amount) = first_amount(&COLLECTED_LABELED_RE, text, notes) {
        return (Some(amount), None);
    }

    for line in text.lines() {
        if line.contains("Zakończenie:") || line.contains("Rozpoczęcie:") {
            continue;
        }
        if let Some(caps) = COLLECTED_WITH_PERCENT_RE.captures(line) {
            let amount = amount_from(&caps, notes, line);
            let percent = caps.get(4).and_then(|m| percent_value(m, line, notes));
            if amount.is_some() {
                return (amount, percent);
            }
        }
    }

    debug!("no labeled or 'zł (percent)' amount found; trying plain 'zł' lines");
    for line in text.lines() {
        if NON_COLLECTED_LINE_MARKERS.iter().any(|m| line.contains(m)) {
            continue;
        }
        if let Some(caps) = AMOUNT_RE.captures(line) {
            if let Some(amount) = amount_from(&caps, notes, line) {
                return (Some(amount), None);
            }
        }
    }
    (None, None)
}

fn first_amount(pattern: &Regex, text: &str, notes: &mut Discards) -> Option<Decimal> {
    let caps = pattern.captures(text)?;
    amount_from(&caps, notes, text)
}

/// Build an amount from captures laid out as `(sign)(integer)(fraction)`.
fn amount_from(caps: &Captures<'_>, notes: &mut Discards, haystack: &str) -> Option<Decimal> {
    let whole = caps.get(0)?;
    if caps.get(1).is_some() {
        notes.discard(haystack, whole.start(), whole.end());
        return None;
    }
    let int_part: String = caps
        .get(2)?
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let literal = match caps.get(3) {
        Some(frac) => format!("{int_part}.{}", frac.as_str()),
        None => int_part,
    };
    match Decimal::from_str(&literal) {
        Ok(value) => Some(value),
        Err(_) => {
            notes.discard(haystack, whole.start(), whole.end());
            None
        }
    }
}

fn find_percent(
    text: &str,
    near_amount: Option<Decimal>,
    notes: &mut Discards,
) -> Option<Decimal> {
    if let Some(m) = PERCENT_LABELED_RE.captures(text).and_then(|caps| caps.get(1)) {
        if let Some(value) = percent_value(m, text, notes) {
            return Some(value);
        }
    }
    if near_amount.is_some() {
        return near_amount;
    }
    let m = PERCENT_PAREN_RE.captures(text)?.get(1)?;
    percent_value(m, text, notes)
}

/// Parse a percent token; values outside 0-100 are noise, not clamped.
fn percent_value(token: Match<'_>, haystack: &str, notes: &mut Discards) -> Option<Decimal> {
    let value = Decimal::from_str(&token.as_str().replace(',', ".")).ok();
    match value {
        Some(v) if v >= Decimal::ZERO && v <= Decimal::ONE_HUNDRED => Some(v),
        _ => {
            notes.discard(haystack, token.start(), token.end());
            None
        }
    }
}

/// Counts are captured as `(sign)(integer)`; signed matches are discarded.
fn first_count(pattern: &Regex, text: &str, notes: &mut Discards) -> Option<u64> {
    let caps = pattern.captures(text)?;
    let whole = caps.get(0)?;
    if caps.get(1).is_some() {
        notes.discard(text, whole.start(), whole.end());
        return None;
    }
    let digits: String = caps[2].chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            notes.discard(text, whole.start(), whole.end());
            None
        }
    }
}

fn find_date(pattern: &Regex, text: &str, notes: &mut Discards) -> Option<NaiveDate> {
    let caps = pattern.captures(text)?;
    let whole = caps.get(0)?;

    let named = (caps.get(1), caps.get(2), caps.get(3));
    let numeric = (caps.get(4), caps.get(5), caps.get(6));
    let parsed = if let (Some(day), Some(month), Some(year)) = named {
        polish_month(month.as_str()).and_then(|m| ymd(year.as_str(), m, day.as_str()))
    } else if let (Some(day), Some(month), Some(year)) = numeric {
        month
            .as_str()
            .parse::<u32>()
            .ok()
            .and_then(|m| ymd(year.as_str(), m, day.as_str()))
    } else {
        None
    };

    if parsed.is_none() {
        notes.discard(text, whole.start(), whole.end());
    }
    parsed
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

/// Month number for a Polish month name in the genitive case.
pub fn polish_month(name: &str) -> Option<u32> {
    let month = match name.trim().to_lowercase().as_str() {
        "stycznia" => 1,
        "lutego" => 2,
        "marca" => 3,
        "kwietnia" => 4,
        "maja" => 5,
        "czerwca" => 6,
        "lipca" => 7,
        "sierpnia" => 8,
        "września" | "wrzesnia" => 9,
        "października" | "pazdziernika" => 10,
        "listopada" => 11,
        "grudnia" => 12,
        _ => return None,
    };
    Some(month)
}

fn find_title(html: &str) -> Option<String> {
    let caps = TITLE_RE.captures(html)?;
    let title = collapse_ws(&decode_entities(&caps[1]));
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

// ---------------------------------------------------------------------------
// Text normalization
// ---------------------------------------------------------------------------

/// Replace block-level tags with line breaks and all other tags with
/// spaces, then decode entities.
pub fn html_to_text(html: &str) -> String {
    let lines = BLOCK_TAG_RE.replace_all(html, "\n");
    decode_entities(&TAG_RE.replace_all(&lines, " "))
}

pub fn decode_entities(s: &str) -> String {
    ENTITY_RE
        .replace_all(s, |caps: &Captures<'_>| {
            let name = &caps[1];
            let hex = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"));
            let decoded = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "nbsp" => Some('\u{A0}'),
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Pages that ship their text inside JSON carry `zł` as `z\u0142`.
///
/// Only when the plain marker is missing and an escaped `ł` is present are
/// `\uXXXX` sequences decoded; everything else is returned untouched.
fn unescape_json_text(raw: &str) -> String {
    if raw.contains(config::CURRENCY_MARKER) || !raw.to_ascii_lowercase().contains("\\u0142") {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find("\\u") {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 2..];
        let decoded = after
            .get(..4)
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &after[4..];
            }
            None => {
                out.push_str("\\u");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading part of the page, whitespace-collapsed, for diagnostics.
pub fn page_excerpt(text: &str) -> String {
    collapse_ws(text).chars().take(config::EXCERPT_LEN).collect()
}

// ---------------------------------------------------------------------------
// Discards
// ---------------------------------------------------------------------------

/// Remembers the first value that matched an anchor but was thrown away.
#[derive(Default)]
struct Discards {
    first: Option<String>,
}

impl Discards {
    const CONTEXT: usize = 40;

    fn discard(&mut self, haystack: &str, start: usize, end: usize) {
        if self.first.is_some() {
            return;
        }
        let from = floor_boundary(haystack, start.saturating_sub(Self::CONTEXT));
        let to = ceil_boundary(haystack, (end + Self::CONTEXT).min(haystack.len()));
        self.first = Some(collapse_ws(&haystack[from..to]));
    }
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
