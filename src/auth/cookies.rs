//! Cookie header aggregation
//!
//! The site's redirect/cookie behavior is inconsistent across environments,
//! so login gathers cookies from every observable source (live jar, direct
//! response, raw Set-Cookie headers) into one explicit [`CookieHeader`]
//! value that downstream requests thread along verbatim.

use regex::Regex;
use std::sync::LazyLock;

/// Name prefix of the session-identifying cookie
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// Set-Cookie attributes that are not cookie pairs
const COOKIE_ATTRIBUTES: [&str; 7] = [
    "expires", "path", "domain", "max-age", "secure", "httponly", "samesite",
];

static SESSION_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)JSESSIONID[^=]*=([^;\s]+)").expect("valid session cookie regex")
});

/// Aggregated, order-preserving cookie set
///
/// Merging is idempotent: one entry per cookie name, first-seen position
/// kept, latest value wins. Once the session cookie has been observed it
/// stays present no matter what later merges contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieHeader {
    pairs: Vec<(String, String)>,
}

impl CookieHeader {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge cookie pairs from one source
    ///
    /// Empty values are skipped. A name already present keeps its position
    /// and takes the new value.
    pub fn merge(&mut self, source: impl IntoIterator<Item = (String, String)>) {
        for (name, value) in source {
            let name = name.trim().to_string();
            let value = value.trim().to_string();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = value,
                None => self.pairs.push((name, value)),
            }
        }
    }

    /// Pin a cookie if no entry with its name exists yet
    pub fn ensure(&mut self, name: &str, value: &str) {
        if !self.contains(name) {
            self.pairs.push((name.to_string(), value.to_string()));
        }
    }

    /// Whether a cookie with this name was observed
    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(existing, _)| existing == name)
    }

    /// Value of the named cookie, if observed
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether any cookie was observed
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as a `Cookie` header value
    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Tolerantly extract cookie pairs from a raw Set-Cookie header
///
/// Comma-splitting is lossy for attribute values (Expires dates), so known
/// attribute names are filtered out rather than trusting the split.
pub fn parse_set_cookie(header: &str) -> Vec<(String, String)> {
    header
        .split(',')
        .filter_map(|part| {
            let (name, rest) = part.split_once('=')?;
            let name = name.trim();
            let value = rest.split(';').next().unwrap_or("").trim();
            // Splinters of attribute values are not valid cookie tokens
            if name.is_empty()
                || value.is_empty()
                || name.contains(';')
                || name.contains(char::is_whitespace)
                || COOKIE_ATTRIBUTES.contains(&name.to_ascii_lowercase().as_str())
            {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Last-resort session id extraction from a raw Set-Cookie header
pub fn find_session_id(header: &str) -> Option<String> {
    SESSION_ID_RE
        .captures(header)
        .map(|captures| captures[1].to_string())
}

/// Whether a cookie name identifies the session
pub fn is_session_cookie(name: &str) -> bool {
    name.to_ascii_uppercase().starts_with(SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_is_idempotent_and_order_preserving() {
        let mut header = CookieHeader::new();
        let source = pairs(&[("WMONID", "w1"), ("JSESSIONID", "s1"), ("pref", "ko")]);

        header.merge(source.clone());
        header.merge(source);

        assert_eq!(
            header.header_value(),
            "WMONID=w1; JSESSIONID=s1; pref=ko"
        );
    }

    #[test]
    fn test_merge_updates_value_in_place() {
        let mut header = CookieHeader::new();
        header.merge(pairs(&[("WMONID", "w1"), ("JSESSIONID", "s1")]));
        header.merge(pairs(&[("JSESSIONID", "s2")]));

        assert_eq!(header.header_value(), "WMONID=w1; JSESSIONID=s2");
    }

    #[test]
    fn test_session_cookie_survives_merges_that_omit_it() {
        let mut header = CookieHeader::new();
        header.merge(pairs(&[("JSESSIONID", "s1")]));
        header.ensure(SESSION_COOKIE, "s1");

        header.merge(pairs(&[("WMONID", "w1")]));
        header.ensure(SESSION_COOKIE, "s1");

        assert!(header.contains(SESSION_COOKIE));
        assert_eq!(header.get(SESSION_COOKIE), Some("s1"));
    }

    #[test]
    fn test_merge_skips_empty_values() {
        let mut header = CookieHeader::new();
        header.merge(pairs(&[("empty", ""), ("", "value"), ("ok", "1")]));
        assert_eq!(header.header_value(), "ok=1");
    }

    #[test]
    fn test_parse_set_cookie_plain() {
        let parsed = parse_set_cookie("JSESSIONID=abc123; Path=/; HttpOnly");
        assert_eq!(parsed, pairs(&[("JSESSIONID", "abc123")]));
    }

    #[test]
    fn test_parse_set_cookie_multiple_cookies_skips_attributes() {
        let parsed = parse_set_cookie(
            "WMONID=w1; Expires=Wed, 09-Jun-2027 10:18:14 GMT; Path=/, JSESSIONID=abc; Path=/",
        );
        assert_eq!(parsed, pairs(&[("WMONID", "w1"), ("JSESSIONID", "abc")]));
    }

    #[test]
    fn test_find_session_id_regex_fallback() {
        assert_eq!(
            find_session_id("jsessionid_canary=xyz987; Path=/").as_deref(),
            Some("xyz987")
        );
        assert_eq!(find_session_id("WMONID=w1"), None);
    }

    #[test]
    fn test_is_session_cookie() {
        assert!(is_session_cookie("JSESSIONID"));
        assert!(is_session_cookie("jsessionid_v2"));
        assert!(!is_session_cookie("WMONID"));
    }
}
