//! Text and field normalization
//!
//! Pure functions that clean the heterogeneous values coming back from the
//! source APIs into canonical forms. All of them are total: bad input yields
//! an empty string / `None`, never an error.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Characters stripped outright before whitespace collapsing.
///
/// Covers the Unicode control category plus the common format characters
/// (soft hyphen, zero-width and bidi marks, BOM). Whitespace controls are
/// left for the collapse step so tabs/newlines still act as separators.
fn is_stripped(c: char) -> bool {
    if c.is_whitespace() {
        return false;
    }
    c.is_control()
        || matches!(
            c,
            '\u{00AD}'
                | '\u{200B}'..='\u{200F}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2060}'..='\u{2064}'
                | '\u{FEFF}'
        )
}

/// Collapse whitespace runs to a single space, trim, and strip
/// control/format characters.
pub fn clean_text(s: &str) -> String {
    let stripped: String = s.chars().filter(|&c| !is_stripped(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`clean_text`] over a JSON value, coercing scalars to their string form.
///
/// Null, arrays and objects become the empty string.
pub fn clean_value_text(v: &Value) -> String {
    match v {
        Value::String(s) => clean_text(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Date-only patterns, tried in order. Day-first forms win over the US
/// month-first form for ambiguous strings.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Timestamp patterns; the date part is kept, the time discarded.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"];

/// Normalize a free-form date string to a calendar date.
///
/// Tries a fixed ordered list of patterns; the first match wins. If nothing
/// matches, falls back to any standalone 4-digit year starting with 19 or 20
/// anywhere in the string (mapped to January 1). Absent result means
/// "unknown", not an error.
pub fn normalize_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    // Bare "YYYY" or a year embedded in otherwise unparseable text
    find_year(trimmed).and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
}

/// First standalone 4-digit token starting with 19 or 20.
fn find_year(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let run = &s[start..i];
            let bounded = (start == 0 || !bytes[start - 1].is_ascii_alphanumeric())
                && (i == bytes.len() || !bytes[i].is_ascii_alphanumeric());
            if bounded && run.len() == 4 && (run.starts_with("19") || run.starts_with("20")) {
                return run.parse().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}

const DOI_PREFIXES: &[&str] = &[
    "doi:",
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
];

/// Strip known DOI prefixes and validate the `10.<digits>/<suffix>` form.
///
/// Anything that does not validate comes back as the empty string.
pub fn clean_doi(s: &str) -> String {
    let trimmed = s.trim();
    let lower = trimmed.to_ascii_lowercase();
    let bare = DOI_PREFIXES
        .iter()
        .find(|p| lower.starts_with(**p))
        .map_or(trimmed, |p| &trimmed[p.len()..]);

    if is_valid_doi(bare) {
        bare.to_string()
    } else {
        String::new()
    }
}

fn is_valid_doi(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("10.") else {
        return false;
    };
    let Some((registrant, suffix)) = rest.split_once('/') else {
        return false;
    };
    !registrant.is_empty() && registrant.bytes().all(|b| b.is_ascii_digit()) && !suffix.is_empty()
}

/// Strip a `pmid:` prefix and accept only all-digit identifiers.
pub fn clean_pmid(s: &str) -> String {
    let trimmed = s.trim();
    let lower = trimmed.to_ascii_lowercase();
    let bare = lower
        .strip_prefix("pmid:")
        .map_or(trimmed, |_| trimmed["pmid:".len()..].trim());

    if !bare.is_empty() && bare.bytes().all(|b| b.is_ascii_digit()) {
        bare.to_string()
    } else {
        String::new()
    }
}

/// Candidate field names tried, in order, on structured author objects.
fn author_name(obj: &serde_json::Map<String, Value>) -> String {
    for key in ["name", "full_name", "fullName"] {
        if let Some(Value::String(s)) = obj.get(key) {
            let cleaned = clean_text(s);
            if !cleaned.is_empty() {
                return cleaned;
            }
        }
    }
    for (first, last) in [("first_name", "last_name"), ("given", "family")] {
        let first = obj.get(first).and_then(Value::as_str).unwrap_or("");
        let last = obj.get(last).and_then(Value::as_str).unwrap_or("");
        let joined = clean_text(&format!("{first} {last}"));
        if !joined.is_empty() {
            return joined;
        }
    }
    String::new()
}

fn split_author_string(s: &str) -> Vec<String> {
    s.split([';', ','])
        .flat_map(|part| part.split(" and "))
        .map(clean_text)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Extract an ordered author-name list from whatever shape the API returned.
///
/// Accepts a delimited string (`;`, `,` or the word "and"), a list of
/// strings, or a list of structured objects. The variant is resolved here,
/// at the adapter boundary; nothing downstream sees it.
pub fn extract_authors(v: &Value) -> Vec<String> {
    match v {
        Value::String(s) => split_author_string(s),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let name = match item {
                    Value::String(s) => clean_text(s),
                    Value::Object(obj) => author_name(obj),
                    _ => String::new(),
                };
                (!name.is_empty()).then_some(name)
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract a keyword list from a delimited string, string list, or list of
/// `{text|value|keyword}` objects.
pub fn extract_keywords(v: &Value) -> Vec<String> {
    match v {
        Value::String(s) => s
            .split([';', ','])
            .map(clean_text)
            .filter(|k| !k.is_empty())
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let kw = match item {
                    Value::String(s) => clean_text(s),
                    Value::Object(obj) => ["text", "value", "keyword"]
                        .iter()
                        .find_map(|k| obj.get(*k))
                        .map(clean_value_text)
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                (!kw.is_empty()).then_some(kw)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  hello \t\n  world  "), "hello world");
    }

    #[test]
    fn clean_text_strips_controls() {
        assert_eq!(clean_text("foo\u{0}bar\u{200B}baz"), "foobarbaz");
    }

    #[test]
    fn clean_text_keeps_unicode_letters() {
        assert_eq!(clean_text("Sjögren syndrome"), "Sjögren syndrome");
    }

    #[test]
    fn clean_value_text_coerces_scalars() {
        assert_eq!(clean_value_text(&json!(42)), "42");
        assert_eq!(clean_value_text(&json!(null)), "");
        assert_eq!(clean_value_text(&json!("  a  b ")), "a b");
    }

    #[test]
    fn normalize_date_iso() {
        assert_eq!(
            normalize_date("2023-05-14"),
            NaiveDate::from_ymd_opt(2023, 5, 14)
        );
    }

    #[test]
    fn normalize_date_us_slash() {
        // Month-first only matches once day-first has failed (14 > 12)
        assert_eq!(
            normalize_date("05/14/2023"),
            NaiveDate::from_ymd_opt(2023, 5, 14)
        );
    }

    #[test]
    fn normalize_date_day_first_wins_when_ambiguous() {
        assert_eq!(
            normalize_date("04/05/2023"),
            NaiveDate::from_ymd_opt(2023, 5, 4)
        );
    }

    #[test]
    fn normalize_date_month_name() {
        assert_eq!(
            normalize_date("May 14, 2023"),
            NaiveDate::from_ymd_opt(2023, 5, 14)
        );
        assert_eq!(
            normalize_date("14 May 2023"),
            NaiveDate::from_ymd_opt(2023, 5, 14)
        );
    }

    #[test]
    fn normalize_date_timestamp() {
        assert_eq!(
            normalize_date("2023-05-14T10:30:00Z"),
            NaiveDate::from_ymd_opt(2023, 5, 14)
        );
    }

    #[test]
    fn normalize_date_year_fallback() {
        assert_eq!(
            normalize_date("Spring 2021 issue"),
            NaiveDate::from_ymd_opt(2021, 1, 1)
        );
        assert_eq!(normalize_date("2021"), NaiveDate::from_ymd_opt(2021, 1, 1));
    }

    #[test]
    fn normalize_date_rejects_garbage() {
        assert_eq!(normalize_date("not a date"), None);
        assert_eq!(normalize_date(""), None);
        // 5-digit runs are not years
        assert_eq!(normalize_date("item 20233"), None);
    }

    #[test]
    fn clean_doi_strips_url_prefix() {
        assert_eq!(
            clean_doi("https://doi.org/10.1002/art.12345"),
            "10.1002/art.12345"
        );
        assert_eq!(clean_doi("doi:10.1038/s41586-020-1"), "10.1038/s41586-020-1");
    }

    #[test]
    fn clean_doi_rejects_invalid() {
        assert_eq!(clean_doi("not-a-doi"), "");
        assert_eq!(clean_doi("10./missing-registrant"), "");
        assert_eq!(clean_doi("10.1002/"), "");
    }

    #[test]
    fn clean_pmid_accepts_digits_only() {
        assert_eq!(clean_pmid("PMID: 12345678"), "12345678");
        assert_eq!(clean_pmid(" 9876 "), "9876");
        assert_eq!(clean_pmid("PMC12345"), "");
    }

    #[test]
    fn extract_authors_from_string() {
        let v = json!("Smith J; Doe A and Roe B");
        assert_eq!(extract_authors(&v), vec!["Smith J", "Doe A", "Roe B"]);
    }

    #[test]
    fn extract_authors_from_objects() {
        let v = json!([
            {"name": "Jane Smith"},
            {"first_name": "Ada", "last_name": "Lovelace"},
            {"given": "Alan", "family": "Turing"},
            {"orcid": "0000"}
        ]);
        assert_eq!(
            extract_authors(&v),
            vec!["Jane Smith", "Ada Lovelace", "Alan Turing"]
        );
    }

    #[test]
    fn extract_authors_ignores_non_list_shapes() {
        assert!(extract_authors(&json!(null)).is_empty());
        assert!(extract_authors(&json!(42)).is_empty());
    }

    #[test]
    fn extract_keywords_mixed_shapes() {
        assert_eq!(
            extract_keywords(&json!("autoimmunity; T cells")),
            vec!["autoimmunity", "T cells"]
        );
        assert_eq!(
            extract_keywords(&json!([{"text": "IBD"}, "microbiome", {"value": "IL-6"}])),
            vec!["IBD", "microbiome", "IL-6"]
        );
    }
}
