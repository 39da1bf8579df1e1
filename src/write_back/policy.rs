use std::str::FromStr;

use derive_more::Display;
use snafu::Snafu;

/// What a flush does with a dirty node whose producer abstains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum FlushPolicy {
    /// Clear the dirty flag anyway, leaving the old bytes in place.
    #[default]
    #[display("lenient")]
    Lenient,
    /// Keep the node dirty so the next flush tries again.
    #[display("strict")]
    Strict,
}

impl FromStr for FlushPolicy {
    type Err = UnknownFlushPolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(FlushPolicy::Lenient),
            "strict" => Ok(FlushPolicy::Strict),
            _ => UnknownFlushPolicySnafu { value }.fail(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown flush policy '{}', expected 'lenient' or 'strict'", value))]
pub struct UnknownFlushPolicyError {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("lenient", FlushPolicy::Lenient)]
    #[case("Strict", FlushPolicy::Strict)]
    #[case("  STRICT ", FlushPolicy::Strict)]
    fn parses_policy_names(#[case] input: &str, #[case] expected: FlushPolicy) {
        assert_eq!(input.parse::<FlushPolicy>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_names() {
        let error = "eager".parse::<FlushPolicy>().unwrap_err();
        assert!(error.to_string().contains("'eager'"));
    }

    #[test]
    fn displays_the_parseable_name() {
        for policy in [FlushPolicy::Lenient, FlushPolicy::Strict] {
            assert_eq!(policy.to_string().parse::<FlushPolicy>().unwrap(), policy);
        }
    }
}
