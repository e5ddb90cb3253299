/// Split a `Cookie` header value into `(name, value)` pairs.
///
/// Segments are separated by `;` and split on the first `=`. Segments without
/// a `=` or with an empty name are skipped.
///
/// # Examples
///
/// ```
/// use courier::core::parse_cookie_pairs;
///
/// let pairs = parse_cookie_pairs("a=1; b=x=y");
/// assert_eq!(pairs, vec![("a".to_string(), "1".to_string()), ("b".to_string(), "x=y".to_string())]);
/// ```
pub fn parse_cookie_pairs(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// A parsed `Set-Cookie` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name:    String,
    pub value:   String,
    /// `Domain` attribute, lowercased and without a leading dot.
    pub domain:  Option<String>,
    /// `Max-Age` attribute in seconds.
    pub max_age: Option<i64>,
}

impl SetCookie {
    /// `Max-Age` of zero or less asks the client to drop the cookie.
    pub fn is_removal(&self) -> bool { matches!(self.max_age, Some(age) if age <= 0) }
}

/// Parse a `Set-Cookie` header value.
///
/// Only `Domain` and `Max-Age` are interpreted; other attributes are ignored.
/// Returns `None` when the leading `name=value` pair is missing.
pub fn parse_set_cookie(header: &str) -> Option<SetCookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = SetCookie {
        name:    name.to_string(),
        value:   value.trim().to_string(),
        domain:  None,
        max_age: None,
    };

    for attribute in parts {
        let (key, val) = match attribute.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attribute.trim(), ""),
        };
        if key.eq_ignore_ascii_case("domain") {
            let domain = val.trim_start_matches('.').to_ascii_lowercase();
            if !domain.is_empty() {
                cookie.domain = Some(domain);
            }
        } else if key.eq_ignore_ascii_case("max-age") {
            cookie.max_age = val.parse().ok();
        }
    }

    Some(cookie)
}

/// Returns `true` if `host` falls under `domain` (equal, or a subdomain of it).
pub fn domain_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str, value: &str) -> (String, String) { (name.to_string(), value.to_string()) }

    #[test]
    fn test_parse_cookie_pairs() {
        assert_eq!(
            parse_cookie_pairs("session=abc; theme=dark"),
            vec![pair("session", "abc"), pair("theme", "dark")]
        );
    }

    #[test]
    fn test_parse_cookie_pairs_splits_on_first_equals() {
        assert_eq!(parse_cookie_pairs("token=a=b=c"), vec![pair("token", "a=b=c")]);
    }

    #[test]
    fn test_parse_cookie_pairs_skips_malformed() {
        assert_eq!(
            parse_cookie_pairs("; flag; =orphan; ok=1;"),
            vec![pair("ok", "1")]
        );
    }

    #[test]
    fn test_parse_set_cookie_with_domain() {
        let cookie = parse_set_cookie("a=1; Domain=example.com").unwrap();
        assert_eq!(cookie.name, "a");
        assert_eq!(cookie.value, "1");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert!(!cookie.is_removal());
    }

    #[test]
    fn test_parse_set_cookie_strips_leading_dot() {
        let cookie = parse_set_cookie("a=1; domain=.Example.COM; Path=/").unwrap();
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_parse_set_cookie_max_age() {
        let cookie = parse_set_cookie("a=; Max-Age=0").unwrap();
        assert_eq!(cookie.max_age, Some(0));
        assert!(cookie.is_removal());

        let cookie = parse_set_cookie("a=1; Max-Age=3600; HttpOnly; Secure").unwrap();
        assert_eq!(cookie.max_age, Some(3600));
        assert!(!cookie.is_removal());
    }

    #[test]
    fn test_parse_set_cookie_invalid() {
        assert!(parse_set_cookie("").is_none());
        assert!(parse_set_cookie("novalue").is_none());
        assert!(parse_set_cookie("=1; Domain=x").is_none());
    }

    #[test]
    fn test_domain_matches() {
        assert!(domain_matches("example.com", "example.com"));
        assert!(domain_matches("api.example.com", "example.com"));
        assert!(domain_matches("API.Example.com", "example.com"));
        assert!(!domain_matches("badexample.com", "example.com"));
        assert!(!domain_matches("example.com", "api.example.com"));
        assert!(!domain_matches("example.org", "example.com"));
    }
}
