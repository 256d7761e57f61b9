use std::collections::BTreeMap;
use tracing::warn;

use super::lexer::unescape;

/// Tag key → tag value for one struct field.
pub type TagMap = BTreeMap<String, String>;

/// Parse a Go struct tag (`json:"name,omitempty" gorm:"not null"`).
///
/// Follows the `reflect.StructTag` convention: space-separated `key:"value"`
/// pairs where the value is a Go interpreted string. Parsing stops at the
/// first malformed pair and keeps what was read before it. The first
/// occurrence of a repeated key wins.
pub fn parse_struct_tag(tag: &str) -> TagMap {
    let mut tags = TagMap::new();
    let bytes = tag.as_bytes();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let key_start = i;
        while i < bytes.len()
            && bytes[i] > b' '
            && bytes[i] != b':'
            && bytes[i] != b'"'
            && bytes[i] != 0x7f
        {
            i += 1;
        }
        if i == key_start || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
            warn!(tag = %tag, offset = key_start, "malformed struct tag; ignoring remainder");
            break;
        }
        let key = &tag[key_start..i];

        // skip `:"`
        i += 2;
        let value_start = i;
        while i < bytes.len() && bytes[i] != b'"' {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= bytes.len() {
            warn!(tag = %tag, key = %key, "unterminated struct tag value; ignoring remainder");
            break;
        }
        let raw_value = &tag[value_start..i];
        i += 1;

        match unescape(raw_value, '"') {
            Ok(value) => {
                tags.entry(key.to_string()).or_insert(value);
            }
            Err(e) => {
                warn!(tag = %tag, key = %key, error = %e, "invalid struct tag value; ignoring remainder");
                break;
            }
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_tags() {
        let tags = parse_struct_tag(
            r#"json:"Name,omitempty" query:"name" gorm:"not null" validate:"required""#,
        );
        assert_eq!(tags.len(), 4);
        assert_eq!(tags["json"], "Name,omitempty");
        assert_eq!(tags["gorm"], "not null");
        assert_eq!(tags["validate"], "required");
    }

    #[test]
    fn test_escaped_quote_in_value() {
        let tags = parse_struct_tag(r#"doc:"say \"hi\"" persist:"false""#);
        assert_eq!(tags["doc"], "say \"hi\"");
        assert_eq!(tags["persist"], "false");
    }

    #[test]
    fn test_malformed_tag_keeps_prefix() {
        let tags = parse_struct_tag(r#"json:"a" broken gorm:"b""#);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["json"], "a");

        assert!(parse_struct_tag(r#"json:"unterminated"#).is_empty());
        assert!(parse_struct_tag("").is_empty());
    }

    #[test]
    fn test_first_duplicate_key_wins() {
        let tags = parse_struct_tag(r#"json:"first" json:"second""#);
        assert_eq!(tags["json"], "first");
    }
}
