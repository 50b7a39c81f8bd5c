//! Parsing of OData resource path segments such as `Products`, `Products(1)` or `Suppliers(Id=1)`.

use thiserror::Error;

/// One path segment: a name with an optional key predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    /// Key literal with quoting removed, e.g. `1` for `(1)` and `o'k` for `('o''k')`
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed path segment '{segment}': {reason}")]
pub struct SegmentError {
    pub segment: String,
    pub reason: &'static str,
}

impl Segment {
    /// Parse an already percent-decoded segment
    pub fn parse(segment: &str) -> Result<Self, SegmentError> {
        let fail = |reason| SegmentError {
            segment: segment.to_string(),
            reason,
        };

        let (name, key) = match segment.split_once('(') {
            None => (segment, None),
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').ok_or_else(|| fail("key predicate is not closed"))?;
                (name, Some(parse_key_literal(inner).map_err(fail)?))
            }
        };

        if name.is_empty() {
            return Err(fail("name is empty"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(fail("name contains invalid characters"));
        }

        Ok(Self {
            name: name.to_string(),
            key,
        })
    }
}

/// Unquote the text between the parentheses of a key predicate.
///
/// Accepts a bare literal (`1`), a single-quoted string with `''` as the escaped quote (`'abc'`) and a
/// named key (`Id=1`, `Id='abc'`). Composite keys are rejected.
pub fn parse_key_literal(literal: &str) -> Result<String, &'static str> {
    let literal = literal.trim();
    if literal.is_empty() {
        return Err("key is empty");
    }

    if literal.starts_with('\'') {
        return unquote(literal);
    }

    match literal.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err("key name is invalid");
            }
            if value.contains(',') && !value.trim_start().starts_with('\'') {
                return Err("composite keys are not supported");
            }
            let value = value.trim();
            if value.is_empty() {
                return Err("key is empty");
            }
            if value.starts_with('\'') { unquote(value) } else { bare(value) }
        }
        None => bare(literal),
    }
}

fn bare(literal: &str) -> Result<String, &'static str> {
    if literal.contains(['\'', ',', '(', ')']) {
        return Err("key literal is malformed");
    }
    Ok(literal.to_string())
}

fn unquote(literal: &str) -> Result<String, &'static str> {
    let inner = literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .filter(|_| literal.len() >= 2)
        .ok_or("string literal is not terminated")?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // Inside a literal a quote only appears doubled
            if chars.next() != Some('\'') {
                return Err("string literal contains an unescaped quote");
            }
        }
        out.push(c);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(segment: &str) -> Option<String> {
        Segment::parse(segment).unwrap().key
    }

    #[test]
    fn test_plain_and_keyed_segments() {
        assert_eq!(
            Segment::parse("Products").unwrap(),
            Segment {
                name: "Products".to_string(),
                key: None
            }
        );
        assert_eq!(Segment::parse("$ref").unwrap().name, "$ref");
        assert_eq!(key_of("Products(1)").as_deref(), Some("1"));
        assert_eq!(key_of("Products( 12 )").as_deref(), Some("12"));
    }

    #[test]
    fn test_key_literal_forms() {
        assert_eq!(key_of("Suppliers(Id=1)").as_deref(), Some("1"));
        assert_eq!(key_of("Suppliers('abc')").as_deref(), Some("abc"));
        assert_eq!(key_of("Suppliers('o''k')").as_deref(), Some("o'k"));
        assert_eq!(key_of("Suppliers(Name='a=b')").as_deref(), Some("a=b"));
        assert_eq!(key_of("Suppliers('')").as_deref(), Some(""));
    }

    #[test]
    fn test_malformed_segments() {
        for bad in [
            "Products(1",
            "(1)",
            "Products()",
            "Products('abc)",
            "Products('a'b')",
            "Products(A=1,B=2)",
            "Prod ucts",
            "Products(=1)",
        ] {
            assert!(Segment::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
