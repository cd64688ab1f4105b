// Tag sanitation for catalog metadata fields
// Consul rejects metadata keys outside [A-Za-z0-9-_]; see hashicorp/consul#8127
use regex::Regex;
use std::sync::OnceLock;

const REPLACEMENT_SEPARATOR: &str = "-";

fn invalid_runs() -> Option<&'static Regex> {
    static INVALID_RUNS: OnceLock<Option<Regex>> = OnceLock::new();
    INVALID_RUNS
        .get_or_init(|| match Regex::new("[^a-zA-Z0-9]+") {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to compile tag sanitizer pattern");
                None
            }
        })
        .as_ref()
}

/// Replace every maximal run of non-alphanumeric characters with a single `-`
///
/// Never fails: if the pattern cannot be compiled the result is an empty string.
pub fn sanitize(s: &str) -> String {
    match invalid_runs() {
        Some(regex) => regex.replace_all(s, REPLACEMENT_SEPARATOR).into_owned(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(
            sanitize("aws:cloudformation:logical-id"),
            "aws-cloudformation-logical-id"
        );
        assert_eq!(sanitize("a::/ b"), "a-b");
        assert_eq!(sanitize("--x--"), "-x-");
    }

    #[test]
    fn test_sanitize_keeps_alphanumerics() {
        assert_eq!(sanitize("ApiGatewayRestApi"), "ApiGatewayRestApi");
        assert_eq!(sanitize("STAGE"), "STAGE");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_arn() {
        let arn = "arn:aws:cloudformation:us-west-2:1234567:stack/my-service-staging/7fd50290-84eb-11ec-93c7-0ac7bf603f03";
        assert_eq!(
            sanitize(arn),
            "arn-aws-cloudformation-us-west-2-1234567-stack-my-service-staging-7fd50290-84eb-11ec-93c7-0ac7bf603f03"
        );
    }

    #[test]
    fn test_sanitize_output_alphabet() {
        let inputs = ["héllo wörld", "a.b.c", "tab\there", "x_y_z", "100%"];
        for input in inputs {
            let out = sanitize(input);
            assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
            assert!(!out.contains("--"), "{input} -> {out}");
        }
    }
}
