// Filter expression grammar: Name=tag:<key>,Values=<pattern>
use std::str::FromStr;

use crate::error::{Result, SyncError};
use crate::filtering::types::Filter;

impl Filter {
    /// Parse a filter expression
    ///
    /// The expression must split into exactly two parts on `,`; the first into
    /// exactly two on `:` (the key) and the second into exactly two on `=`
    /// (the pattern). Patterns containing any of those separators are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let fault = || SyncError::FilterParse {
            expression: input.to_string(),
        };

        let (name_part, values_part) = split_exactly_two(input, ',').ok_or_else(fault)?;
        let (_, tag_key) = split_exactly_two(name_part, ':').ok_or_else(fault)?;
        let (_, pattern) = split_exactly_two(values_part, '=').ok_or_else(fault)?;

        Ok(Self {
            tag_key: tag_key.to_string(),
            pattern: pattern.to_string(),
            source_expression: input.to_string(),
        })
    }
}

impl FromStr for Filter {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn split_exactly_two(s: &str, separator: char) -> Option<(&str, &str)> {
    let mut parts = s.split(separator);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) => Some((first, second)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let filter = Filter::parse("Name=tag:env,Values=dev").unwrap();
        assert_eq!(filter.tag_key(), "env");
        assert_eq!(filter.pattern(), "dev");
        assert_eq!(filter.source_expression(), "Name=tag:env,Values=dev");
    }

    #[test]
    fn test_parse_regex_pattern() {
        let filter: Filter = "Name=tag:env,Values=(^production)|(^dev$)".parse().unwrap();
        assert_eq!(filter.tag_key(), "env");
        assert_eq!(filter.pattern(), "(^production)|(^dev$)");
    }

    #[test]
    fn test_parse_faults() {
        let malformed = [
            "",
            "Name=tag:env",
            "Name=tag:env,Values=dev,extra",
            "Name=tag,Values=dev",
            "Name=tag:aws:cloudformation,Values=dev",
            "Name=tag:env,Values",
            "Name=tag:env,Values=a=b",
            "Name=tag:env,Values=a{1,3}",
        ];

        for input in malformed {
            let err = Filter::parse(input).unwrap_err();
            assert!(
                matches!(err, SyncError::FilterParse { .. }),
                "expected parse fault for {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_empty_pattern() {
        let filter = Filter::parse("Name=tag:env,Values=").unwrap();
        assert_eq!(filter.pattern(), "");
    }
}
