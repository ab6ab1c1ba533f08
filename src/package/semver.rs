//! Semantic version and version specification parsing for package versions
//!
//! Python releases do not always follow semantic versioning (`3.01.2`,
//! `2.0b1`, `1.0.0.post1`). Parsing therefore goes through three tiers:
//! strict parsing, a retry with leading zeros trimmed from numeric
//! components, and finally a best-effort coercion.

use std::str::FromStr;
use std::sync::LazyLock;

use pep508_rs::pep440_rs::{Version as Pep440Version, VersionSpecifiers};
use regex::Regex;
use semver::Version;
use tracing::{debug, warn};

use crate::config::{ANY_VERSION, NEGATED_PREFIX};
use crate::package::error::PackageError;

static NUMERIC_BASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+(?:\.\d+)?)?").expect("valid numeric base regex"));

static INVALID_SUFFIX_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9+.-]").expect("valid suffix regex"));

/// Parse a version identifier into a semantic version, never failing
///
/// Examples:
/// - "1.2.3" -> Version(1, 2, 3)
/// - "3.01.2" -> Version(3, 1, 2) with leading zeros trimmed
/// - "2.0b1" -> Version(2, 0, 0, pre: b1)
/// - "not-a-version" -> Version(0, 0, 0)
pub fn parse_semantic_version(identifier: &str, package_name: Option<&str>) -> Version {
    let err = match Version::parse(identifier) {
        Ok(version) => return version,
        Err(err) => err,
    };

    if let Some(version) = trim_leading_zeros(identifier).and_then(|t| Version::parse(&t).ok()) {
        return version;
    }

    match (coerce_version(identifier), package_name) {
        (Some(version), Some(name)) => {
            debug!(
                "Cannot determine semantic version {} of package {}, approximated version is {}: {}",
                identifier, name, version, err
            );
            version
        }
        (Some(version), None) => {
            debug!(
                "Cannot determine semantic version {}, approximated version is {}: {}",
                identifier, version, err
            );
            version
        }
        (None, _) => {
            warn!(
                "Cannot approximate semantic version {} of package {}, falling back to 0.0.0: {}",
                identifier,
                package_name.unwrap_or("<unknown>"),
                err
            );
            Version::new(0, 0, 0)
        }
    }
}

/// Rewrite an all-numeric dotted identifier without leading zeros ("3.01.2" -> "3.1.2")
fn trim_leading_zeros(identifier: &str) -> Option<String> {
    identifier
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse::<u64>().ok().map(|n| n.to_string())
        })
        .collect::<Option<Vec<_>>>()
        .map(|parts| parts.join("."))
}

/// Best-effort coercion of a version identifier into a semantic version
///
/// The leading numeric part is padded to a major.minor.patch triple; the
/// remainder becomes pre-release and build metadata where semver accepts
/// it and is dropped otherwise. Returns `None` when there is no leading
/// numeric part at all.
pub fn coerce_version(identifier: &str) -> Option<Version> {
    let input = identifier.trim().trim_start_matches(['v', 'V']);
    let base = NUMERIC_BASE.find(input)?;

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(base.as_str().split('.')) {
        *slot = part.parse().ok()?;
    }
    let core = Version::new(numbers[0], numbers[1], numbers[2]);

    let rest = &input[base.end()..];
    if rest.is_empty() {
        return Some(core);
    }

    let rest = INVALID_SUFFIX_CHARS.replace_all(rest, "-");
    let (prerelease, build) = match rest.as_bytes()[0] {
        b'+' | b'.' => ("", &rest[1..]),
        b'-' => split_build(&rest[1..]),
        _ => split_build(&rest),
    };
    let build = build.replace('+', ".");

    let mut candidate = core.to_string();
    if !prerelease.is_empty() {
        candidate.push('-');
        candidate.push_str(prerelease);
    }
    if !build.is_empty() {
        candidate.push('+');
        candidate.push_str(&build);
    }

    Some(Version::parse(&candidate).unwrap_or(core))
}

fn split_build(rest: &str) -> (&str, &str) {
    rest.split_once('+').unwrap_or((rest, ""))
}

/// Parse a version specification such as `>=1.0,<2.0`
///
/// `*` and the empty string accept any version. A negated locked version
/// (`!1.2.3`) is read as an exclusion of that release (`!=1.2.3`).
pub fn parse_version_specification(spec: &str) -> Result<VersionSpecifiers, PackageError> {
    let spec = spec.trim();
    if spec.is_empty() || spec == ANY_VERSION {
        return Ok(VersionSpecifiers::from_iter(std::iter::empty()));
    }

    let normalized = match spec.strip_prefix(NEGATED_PREFIX) {
        Some(rest) if !rest.starts_with('=') => format!("!={}", rest),
        _ => spec.to_string(),
    };

    VersionSpecifiers::from_str(&normalized).map_err(|e| {
        PackageError::Parse(format!("Invalid version specification '{}': {}", spec, e))
    })
}

/// Check whether a candidate release satisfies the given specifiers
pub fn specification_contains(
    specifiers: &VersionSpecifiers,
    candidate: &str,
) -> Result<bool, PackageError> {
    let version = Pep440Version::from_str(candidate.trim()).map_err(|e| {
        PackageError::Parse(format!("Invalid candidate version '{}': {}", candidate, e))
    })?;

    Ok(specifiers.contains(&version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case("1.2.3-rc.1", "1.2.3-rc.1")]
    #[case("3.01.2", "3.1.2")] // leading zeros trimmed
    #[case("01.002.0003", "1.2.3")]
    #[case("1.0", "1.0.0")] // partial version padded
    #[case("7", "7.0.0")]
    #[case("2.0b1", "2.0.0-b1")]
    #[case("1.2.3rc1", "1.2.3-rc1")]
    #[case("1.0.0.post1", "1.0.0+post1")]
    #[case("1.2.3.4", "1.2.3+4")]
    #[case("v1.4", "1.4.0")]
    #[case("2019.3", "2019.3.0")]
    fn parse_semantic_version_returns_expected(#[case] identifier: &str, #[case] expected: &str) {
        assert_eq!(
            parse_semantic_version(identifier, Some("pkg")),
            Version::parse(expected).unwrap()
        );
    }

    #[rstest]
    #[case("not-a-version")]
    #[case("")]
    #[case("latest")]
    fn parse_semantic_version_falls_back_to_zero(#[case] identifier: &str) {
        assert_eq!(parse_semantic_version(identifier, None), Version::new(0, 0, 0));
    }

    #[rstest]
    #[case("3.01.2", Some("3.1.2".to_string()))]
    #[case("1.2.3", Some("1.2.3".to_string()))]
    #[case("1.0b1", None)]
    #[case("1..2", None)]
    #[case("+1.2.3", None)]
    fn trim_leading_zeros_only_rewrites_numeric_identifiers(
        #[case] identifier: &str,
        #[case] expected: Option<String>,
    ) {
        assert_eq!(trim_leading_zeros(identifier), expected);
    }

    #[test]
    fn coerce_version_drops_suffix_semver_rejects() {
        // "01" is not a valid numeric pre-release identifier
        assert_eq!(coerce_version("1.2.3-01"), Some(Version::new(1, 2, 3)));
    }

    #[test]
    fn coerce_version_returns_none_without_numeric_base() {
        assert_eq!(coerce_version("release"), None);
    }

    #[rstest]
    #[case(">=1.0,<2.0", "1.5", true)]
    #[case(">=1.0,<2.0", "2.0", false)]
    #[case(">=1.0, !=1.5.0", "1.5.0", false)]
    #[case("==1.0.*", "1.0.3", true)]
    #[case("==1.2.3", "1.2.3", true)]
    #[case("~=1.4.2", "1.4.9", true)]
    #[case("~=1.4.2", "1.5.0", false)]
    #[case("!1.2.3", "1.2.3", false)] // negated locked version
    #[case("!1.2.3", "1.2.4", true)]
    #[case("!=1.2.3", "1.2.3", false)]
    #[case("*", "0.0.1", true)]
    #[case("", "10.0", true)]
    fn version_specification_contains_expected(
        #[case] spec: &str,
        #[case] candidate: &str,
        #[case] expected: bool,
    ) {
        let specifiers = parse_version_specification(spec).unwrap();
        assert_eq!(
            specification_contains(&specifiers, candidate).unwrap(),
            expected
        );
    }

    #[test]
    fn parse_version_specification_rejects_invalid_spec() {
        let err = parse_version_specification("invalid>>=spec").unwrap_err();
        assert!(matches!(err, PackageError::Parse(_)));
    }

    #[test]
    fn specification_contains_rejects_invalid_candidate() {
        let specifiers = parse_version_specification(">=1.0").unwrap();
        let err = specification_contains(&specifiers, "not a version").unwrap_err();
        assert!(matches!(err, PackageError::Parse(_)));
    }
}
