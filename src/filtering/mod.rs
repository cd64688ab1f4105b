// Service eligibility filtering
//
// Inclusion filters are ANDed: a service must match every one of them.
// Exclusion filters are ORed: a surviving service matching any of them is dropped.
// Malformed expressions and invalid patterns never abort evaluation; they match nothing.

mod expression;
mod types;

pub use types::{CompiledFilter, Filter, Predicate};

use crate::service::ServiceIdentity;

/// Compiled inclusion and exclusion filters for one cycle
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    inclusions: Vec<Predicate>,
    exclusions: Vec<Predicate>,
}

impl FilterSet {
    /// Compile expressions once so each candidate is not re-parsed
    ///
    /// # Arguments
    /// * `inclusions` - Expressions every candidate must match
    /// * `exclusions` - Expressions that remove a candidate when any matches
    pub fn new<S: AsRef<str>>(inclusions: &[S], exclusions: &[S]) -> Self {
        Self {
            inclusions: inclusions.iter().map(|e| compile(e.as_ref())).collect(),
            exclusions: exclusions.iter().map(|e| compile(e.as_ref())).collect(),
        }
    }

    pub fn inclusions(&self) -> &[Predicate] {
        &self.inclusions
    }

    pub fn exclusions(&self) -> &[Predicate] {
        &self.exclusions
    }

    /// Passes the inclusion stage: every inclusion matches
    pub fn is_included(&self, identity: &ServiceIdentity) -> bool {
        self.inclusions.iter().all(|p| p.matches(identity))
    }

    /// Caught by the exclusion stage: any exclusion matches
    pub fn is_excluded(&self, identity: &ServiceIdentity) -> bool {
        self.exclusions.iter().any(|p| p.matches(identity))
    }

    /// Eligible for registration
    pub fn admits(&self, identity: &ServiceIdentity) -> bool {
        self.is_included(identity) && !self.is_excluded(identity)
    }

    /// Keep eligible candidates, preserving input order
    pub fn apply(&self, candidates: Vec<ServiceIdentity>) -> Vec<ServiceIdentity> {
        let included: Vec<ServiceIdentity> = candidates
            .into_iter()
            .filter(|svc| self.is_included(svc))
            .collect();

        included
            .into_iter()
            .filter(|svc| {
                let excluded = self.is_excluded(svc);
                if excluded {
                    tracing::debug!(service = %svc.canonical_name(), "Excluded by filter");
                }
                !excluded
            })
            .collect()
    }
}

/// Parse and compile one expression, logging and neutralising any fault
fn compile(expression: &str) -> Predicate {
    let filter = match Filter::parse(expression) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(expression, error = %e, "Ignoring malformed filter");
            return Predicate::Never {
                expression: expression.to_string(),
            };
        }
    };

    match filter.compile() {
        Ok(compiled) => Predicate::Compiled(compiled),
        Err(e) => {
            tracing::warn!(expression, error = %e, "Invalid filter pattern");
            Predicate::Never {
                expression: expression.to_string(),
            }
        }
    }
}

/// Evaluate a single expression against a service
///
/// Parse faults and invalid patterns yield `false`.
pub fn filter_matches(expression: &str, identity: &ServiceIdentity) -> bool {
    compile(expression).matches(identity)
}

/// Reduce candidates to those eligible for registration
///
/// # Arguments
/// * `candidates` - Services discovered this cycle, in listing order
/// * `inclusions` - Expressions that must all match (empty keeps everything)
/// * `exclusions` - Expressions that each remove matching survivors (empty removes nothing)
pub fn filter_services<S: AsRef<str>>(
    candidates: Vec<ServiceIdentity>,
    inclusions: &[S],
    exclusions: &[S],
) -> Vec<ServiceIdentity> {
    FilterSet::new(inclusions, exclusions).apply(candidates)
}
