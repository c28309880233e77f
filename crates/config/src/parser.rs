//! A line-oriented `KEY=VALUE` parser for the configuration source.
//!
//! Rules: each line is trimmed; empty lines and lines starting with `#` are
//! ignored; the remainder is split on the first `=` only; a `VALUE` wrapped
//! in a single matching pair of single or double quotes has them stripped.

use indexmap::IndexMap;

/// Parses `contents` into an ordered key/value map.
///
/// Later occurrences of a key overwrite earlier ones, matching how shell
/// `.env` files are conventionally read.
pub fn parse(contents: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();

    for raw_line in contents.lines() {
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim().to_string();
        let value = strip_matching_quotes(value.trim());

        map.insert(key, value);
    }

    map
}

/// Strips a single matching pair of leading/trailing quotes, if present.
fn strip_matching_quotes(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' || first == b'\'') && first == last {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

/// Splits a comma-separated value into its trimmed, non-empty components.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Serializes a key/value map back into the line format this module parses,
/// used by the round-trip property test.
pub fn serialize(map: &IndexMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_blank_and_comment_lines() {
        let map = parse("\n# a comment\n\nKEY=value\n");
        assert_eq!(map.get("KEY").map(String::as_str), Some("value"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn splits_only_on_first_equals() {
        let map = parse("URL=https://example.com/path?x=1");
        assert_eq!(
            map.get("URL").map(String::as_str),
            Some("https://example.com/path?x=1")
        );
    }

    #[test]
    fn strips_matching_double_quotes() {
        let map = parse(r#"EXCLUDE_CONTAINERS="a, b ,c""#);
        assert_eq!(map.get("EXCLUDE_CONTAINERS").map(String::as_str), Some("a, b ,c"));
    }

    #[test]
    fn strips_matching_single_quotes() {
        let map = parse("KEY='value'");
        assert_eq!(map.get("KEY").map(String::as_str), Some("value"));
    }

    #[test]
    fn leaves_mismatched_quotes_untouched() {
        let map = parse(r#"KEY="value'"#);
        assert_eq!(map.get("KEY").map(String::as_str), Some(r#""value'"#));
    }

    #[test]
    fn exclude_containers_scenario_splits_and_trims() {
        let map = parse(r#"EXCLUDE_CONTAINERS="a, b ,c""#);
        let names = split_csv(&map["EXCLUDE_CONTAINERS"]);
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn round_trips_simple_maps() {
        let mut map = IndexMap::new();
        map.insert("AUTO_UPDATE".to_string(), "true".to_string());
        map.insert("LOG_LEVEL".to_string(), "DEBUG".to_string());

        let serialized = serialize(&map);
        let parsed = parse(&serialized);

        assert_eq!(parsed, map);
    }
}
