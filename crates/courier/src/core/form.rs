use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything but the RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single form value or header value.
///
/// Unreserved characters pass through, a space becomes `%20`.
pub fn encode_component(value: &str) -> Cow<'_, str> { utf8_percent_encode(value, COMPONENT).into() }

/// Serialize pairs as `k=v&k=v`, percent-encoding the values.
///
/// Pair order is preserved.
///
/// # Examples
///
/// ```
/// use courier::core::encode_form;
///
/// let body = encode_form([("a", "b c"), ("d", "e")]);
/// assert_eq!(body, "a=b%20c&d=e");
/// ```
pub fn encode_form<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(key.as_ref());
        out.push('=');
        out.push_str(&encode_component(value.as_ref()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_form_basic() {
        assert_eq!(encode_form([("a", "b c"), ("d", "e")]), "a=b%20c&d=e");
    }

    #[test]
    fn test_encode_form_preserves_order() {
        assert_eq!(encode_form([("z", "1"), ("a", "2"), ("m", "3")]), "z=1&a=2&m=3");
    }

    #[test]
    fn test_encode_form_empty() {
        assert_eq!(encode_form(Vec::<(String, String)>::new()), "");
    }

    #[test]
    fn test_encode_form_empty_value() {
        assert_eq!(encode_form([("k", "")]), "k=");
    }

    #[test]
    fn test_encode_component_reserved() {
        assert_eq!(encode_component("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_component("50%"), "50%25");
        assert_eq!(encode_component("x+y/z"), "x%2By%2Fz");
    }

    #[test]
    fn test_encode_component_unreserved_untouched() {
        assert_eq!(encode_component("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn test_encode_component_utf8() {
        assert_eq!(encode_component("é"), "%C3%A9");
    }
}
