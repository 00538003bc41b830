//! Query-string encoding and decoding.
//!
//! Keys repeated in the input collapse into lists, keys without a value decode
//! to the empty string, and encoding escapes like `encodeURIComponent`.

use std::borrow::Cow;

use indexmap::IndexMap;

/// A decoded value: one string, or every value of a repeated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// The first value.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::Multiple(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                *self = QueryValue::Multiple(vec![std::mem::take(first), value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for QueryValue {
    fn from(values: Vec<S>) -> Self {
        QueryValue::Multiple(values.into_iter().map(Into::into).collect())
    }
}

pub type QueryMap = IndexMap<String, QueryValue>;

/// Encode with `&` and `=`.
pub fn encode(map: &QueryMap) -> String {
    encode_with(map, "&", "=", None)
}

/// Encode `map`, joining pairs with `sep` and keys to values with `eq`.
///
/// A non-empty result is prefixed with `prefix` when one is given. Keys whose
/// list is empty are skipped.
pub fn encode_with(map: &QueryMap, sep: &str, eq: &str, prefix: Option<&str>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in map {
        let key = escape(key);
        match value {
            QueryValue::Single(value) => pairs.push(format!("{key}{eq}{}", escape(value))),
            QueryValue::Multiple(values) => {
                pairs.extend(values.iter().map(|value| format!("{key}{eq}{}", escape(value))));
            }
        }
    }

    let encoded = pairs.join(sep);
    match prefix {
        Some(prefix) if !encoded.is_empty() => format!("{prefix}{encoded}"),
        _ => encoded,
    }
}

/// Decode with `&` and `=`.
pub fn decode(input: &str) -> QueryMap {
    decode_with(input, "&", "=")
}

/// Decode `input`, splitting pairs on `sep` and each pair on its first `eq`.
///
/// Empty segments are skipped. `+` decodes to a space.
pub fn decode_with(input: &str, sep: &str, eq: &str) -> QueryMap {
    let mut map = QueryMap::new();
    if input.is_empty() {
        return map;
    }

    for segment in input.split(sep).filter(|segment| !segment.is_empty()) {
        let (key, value) = segment.split_once(eq).unwrap_or((segment, ""));
        let key = unescape(key);
        let value = unescape(value);
        match map.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                map.insert(key, QueryValue::Single(value));
            }
        }
    }
    map
}

/// Characters `encodeURIComponent` leaves alone on top of the unreserved set.
const KEPT: &[(&str, &str)] = &[
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

fn escape(raw: &str) -> String {
    let mut escaped = urlencoding::encode(raw).into_owned();
    for (encoded, plain) in KEPT {
        if escaped.contains(encoded) {
            escaped = escaped.replace(encoded, plain);
        }
    }
    escaped
}

fn unescape(raw: &str) -> String {
    let raw: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map<const N: usize>(pairs: [(&str, QueryValue); N]) -> QueryMap {
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    #[test]
    fn large_numeric_value_survives_round_trip() {
        let original = map([("foo", "918854443121279438895193".into())]);
        assert_eq!(encode(&original), "foo=918854443121279438895193");
        assert_eq!(decode(&encode(&original)), original);
    }

    #[test]
    fn lists_encode_as_repeated_keys() {
        let original = map([("foo", vec!["bar", "quux"].into())]);
        assert_eq!(encode(&original), "foo=bar&foo=quux");
        assert_eq!(decode("foo=bar&foo=quux"), original);
    }

    #[test]
    fn missing_value_decodes_to_empty_string() {
        assert_eq!(
            decode("foo&bar=baz"),
            map([("foo", "".into()), ("bar", "baz".into())])
        );
    }

    #[test]
    fn canonical_strings_decode() {
        let cases = [
            ("foo=1&bar=2", map([("foo", "1".into()), ("bar", "2".into())])),
            (
                "my%20weird%20field=q1!2%22'w%245%267%2Fz8)%3F",
                map([("my weird field", "q1!2\"'w$5&7/z8)?".into())]),
            ),
            ("foo%3Dbaz=bar", map([("foo=baz", "bar".into())])),
            ("foo=baz%3Dbar", map([("foo", "baz=bar".into())])),
            (
                "str=foo&arr=1&arr=2&arr=3&somenull=&undef=",
                map([
                    ("str", "foo".into()),
                    ("arr", vec!["1", "2", "3"].into()),
                    ("somenull", "".into()),
                    ("undef", "".into()),
                ]),
            ),
            ("%20foo%20=%20bar%20", map([(" foo ", " bar ".into())])),
            ("foo=%EF%BF%BD", map([("foo", "\u{fffd}".into())])),
        ];
        for (input, expected) in cases {
            assert_eq!(decode(input), expected, "{input}");
        }
    }

    #[test]
    fn plus_decodes_to_space() {
        assert_eq!(
            decode("my+weird+field=q1%212"),
            map([("my weird field", "q1!2".into())])
        );
    }

    #[test]
    fn escapes_like_encode_uri_component() {
        let original = map([("my weird field", "q1!2\"'w$5&7/z8)?".into())]);
        assert_eq!(
            encode(&original),
            "my%20weird%20field=q1!2%22'w%245%267%2Fz8)%3F"
        );
        let brackets = map([("goat[]", "scone".into())]);
        assert_eq!(encode(&brackets), "goat%5B%5D=scone");
    }

    #[test]
    fn custom_separators() {
        assert_eq!(
            decode_with("foo:1&bar:2;baz:quux", ";", ":"),
            map([("foo", "1&bar:2".into()), ("baz", "quux".into())])
        );
        assert_eq!(
            decode_with("foo:baz:bar", ";", ":"),
            map([("foo", "baz:bar".into())])
        );
        let original = map([("foo", vec!["bar", "quux"].into())]);
        assert_eq!(encode_with(&original, ";", ":", None), "foo:bar;foo:quux");
    }

    #[test]
    fn nested_query_in_value() {
        let outer = decode("a=b&q=x%3Dy%26y%3Dz");
        let inner = decode(outer["q"].first().unwrap());
        assert_eq!(inner, map([("x", "y".into()), ("y", "z".into())]));
    }

    #[test]
    fn empty_input_and_lists() {
        assert!(decode("").is_empty());
        let with_empty = map([("foo", QueryValue::Multiple(Vec::new())), ("bar", "baz".into())]);
        assert_eq!(encode(&with_empty), "bar=baz");
        assert_eq!(encode_with(&QueryMap::new(), "&", "=", Some("?")), "");
        assert_eq!(encode_with(&with_empty, "&", "=", Some("?")), "?bar=baz");
    }

    #[test]
    fn empty_segments_are_skipped() {
        assert_eq!(
            decode("a=1&&b=2&"),
            map([("a", "1".into()), ("b", "2".into())])
        );
    }
}
