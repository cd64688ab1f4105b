// Parsed filter expressions
use regex::Regex;
use std::fmt;

use crate::error::Result;
use crate::service::ServiceIdentity;

/// One parsed `Name=tag:<key>,Values=<pattern>` expression
///
/// Only obtainable through [`Filter::parse`](crate::filtering::Filter::parse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub(super) tag_key: String,
    pub(super) pattern: String,
    pub(super) source_expression: String,
}

impl Filter {
    /// Tag key to inspect
    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    /// Regular expression searched in the tag value
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Original expression, for diagnostics
    pub fn source_expression(&self) -> &str {
        &self.source_expression
    }

    /// Compile the pattern for repeated evaluation
    pub fn compile(&self) -> Result<CompiledFilter> {
        let regex = Regex::new(&self.pattern)?;
        Ok(CompiledFilter {
            filter: self.clone(),
            regex,
        })
    }

    /// Evaluate against a service's raw tags
    ///
    /// An absent tag or an invalid pattern never matches.
    pub fn matches(&self, identity: &ServiceIdentity) -> bool {
        match self.compile() {
            Ok(compiled) => compiled.matches(identity),
            Err(e) => {
                tracing::warn!(
                    expression = %self.source_expression,
                    error = %e,
                    "Invalid filter pattern"
                );
                false
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_expression)
    }
}

/// Filter with a pre-compiled pattern
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    filter: Filter,
    regex: Regex,
}

impl CompiledFilter {
    /// Unanchored search of the pattern in the raw tag value
    pub fn matches(&self, identity: &ServiceIdentity) -> bool {
        identity
            .raw_tag_map()
            .get(&self.filter.tag_key)
            .is_some_and(|value| self.regex.is_match(value))
    }
}

/// Outcome of compiling one configured expression
///
/// Expressions that fail to parse or compile become `Never`, which matches no
/// service.
#[derive(Debug, Clone)]
pub enum Predicate {
    Compiled(CompiledFilter),
    Never { expression: String },
}

impl Predicate {
    pub fn matches(&self, identity: &ServiceIdentity) -> bool {
        match self {
            Predicate::Compiled(filter) => filter.matches(identity),
            Predicate::Never { .. } => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Predicate::Compiled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RawResource;

    fn service(tags: &[(&str, &str)]) -> ServiceIdentity {
        let mut resource = RawResource::new("abc123", "orders");
        for (k, v) in tags {
            resource = resource.with_tag(*k, *v);
        }
        ServiceIdentity::new(resource, "us-west-2").unwrap()
    }

    #[test]
    fn test_matches_tag_value() {
        let filter = Filter::parse("Name=tag:env,Values=^dev").unwrap();
        assert!(filter.matches(&service(&[("env", "development")])));
        assert!(!filter.matches(&service(&[("env", "prod")])));
    }

    #[test]
    fn test_absent_tag_never_matches() {
        let filter = Filter::parse("Name=tag:env,Values=.*").unwrap();
        assert!(!filter.matches(&service(&[("team", "core")])));
        assert!(!filter.matches(&service(&[])));
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        let filter = Filter::parse("Name=tag:env,Values=(dev").unwrap();
        assert!(filter.compile().is_err());
        assert!(!filter.matches(&service(&[("env", "(dev")])));
    }

    #[test]
    fn test_never_predicate() {
        let predicate = Predicate::Never {
            expression: "env=dev".to_string(),
        };
        assert!(!predicate.is_valid());
        assert!(!predicate.matches(&service(&[("env", "dev")])));
    }
}
