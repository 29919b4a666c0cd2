//! Node.js `exports` compatibility categories.
//!
//! A category names an era of Node.js releases that shares one set of
//! package `exports` rules. Resolution runs under one category at a time;
//! a version range maps to every category whose releases it covers.

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compatibility mode controlling which `exports` shapes are honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// `exports` ignored entirely.
    PreExports,
    /// Only string and array `exports` honored; object forms ignored.
    Broken,
    /// Object form honored, but only the `default` condition.
    Experimental,
    /// Full conditional maps.
    Conditions,
    /// Conditions, but trailing-slash directory subpaths disabled.
    BrokenDirSlashConditions,
    Patterns,
    PatternTrailers,
    /// Pattern trailers; directory subpaths removed.
    PatternTrailersNoDirSlash,
}

/// `(major, minor, patch)` lower bound, inclusive.
type Bound = (u64, u64, u64);

/// Half-open release span `[from, until)`. `None` is unbounded.
type Span = (Bound, Option<Bound>);

impl Category {
    /// Every category, oldest era first.
    pub const ALL: [Category; 8] = [
        Self::PreExports,
        Self::Broken,
        Self::Experimental,
        Self::Conditions,
        Self::BrokenDirSlashConditions,
        Self::Patterns,
        Self::PatternTrailers,
        Self::PatternTrailersNoDirSlash,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreExports => "pre-exports",
            Self::Broken => "broken",
            Self::Experimental => "experimental",
            Self::Conditions => "conditions",
            Self::BrokenDirSlashConditions => "broken-dir-slash-conditions",
            Self::Patterns => "patterns",
            Self::PatternTrailers => "pattern-trailers",
            Self::PatternTrailersNoDirSlash => "pattern-trailers-no-dir-slash",
        }
    }

    /// All category names, comma separated (for error messages).
    #[must_use]
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the `exports` field is consulted at all.
    #[must_use]
    pub fn honors_exports(self) -> bool {
        self != Self::PreExports
    }

    /// Whether object-valued `exports` nodes (conditions or subpaths) are honored.
    #[must_use]
    pub fn supports_object_exports(self) -> bool {
        !matches!(self, Self::PreExports | Self::Broken)
    }

    /// Whether conditional maps are restricted to the `default` condition.
    #[must_use]
    pub fn default_condition_only(self) -> bool {
        self == Self::Experimental
    }

    /// Whether subpath keys ending in `/` are honored.
    #[must_use]
    pub fn supports_dir_slash(self) -> bool {
        !matches!(
            self,
            Self::BrokenDirSlashConditions | Self::PatternTrailersNoDirSlash
        )
    }

    /// Whether conditions may be configured for this category.
    #[must_use]
    pub fn accepts_conditions(self) -> bool {
        !matches!(self, Self::PreExports | Self::Broken)
    }

    fn spans(self) -> &'static [Span] {
        match self {
            Self::PreExports => &[((0, 0, 0), Some((12, 17, 0)))],
            Self::Broken => &[((13, 0, 0), Some((13, 2, 0)))],
            Self::Experimental => &[
                ((12, 17, 0), Some((12, 19, 0))),
                ((13, 2, 0), Some((13, 7, 0))),
            ],
            Self::Conditions => &[
                ((12, 19, 0), Some((12, 20, 0))),
                ((13, 7, 0), Some((14, 0, 0))),
            ],
            Self::BrokenDirSlashConditions => &[
                ((12, 20, 0), Some((13, 0, 0))),
                ((14, 0, 0), Some((14, 13, 0))),
            ],
            Self::Patterns => &[
                ((14, 13, 0), Some((14, 19, 0))),
                ((15, 0, 0), Some((16, 9, 0))),
            ],
            Self::PatternTrailers => &[
                ((14, 19, 0), Some((15, 0, 0))),
                ((16, 9, 0), Some((17, 0, 0))),
            ],
            Self::PatternTrailersNoDirSlash => &[((17, 0, 0), None)],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown category `{}` (expected one of: {})",
            self.0,
            Category::names()
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A version range that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRange(pub String);

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version range `{}`", self.0)
    }
}

impl std::error::Error for InvalidRange {}

/// The category a concrete Node.js version belongs to.
#[must_use]
pub fn category_for_version(version: &Version) -> Category {
    let v = (version.major, version.minor, version.patch);
    Category::ALL
        .into_iter()
        .find(|c| c.spans().iter().any(|span| span_contains(span, v)))
        .unwrap_or(Category::PatternTrailersNoDirSlash)
}

/// Every category with at least one release satisfying `range`, oldest first.
///
/// Accepts npm-style ranges: `||` alternatives, whitespace-separated
/// comparators, `x`/`*` wildcards, bare versions (exact) and a leading `v`.
pub fn categories_for_range(range: &str) -> Result<Vec<Category>, InvalidRange> {
    let alternatives = parse_range(range)?;

    Ok(Category::ALL
        .into_iter()
        .filter(|category| {
            category
                .spans()
                .iter()
                .any(|span| alternatives.iter().any(|req| span_intersects(span, req)))
        })
        .collect())
}

fn span_contains(span: &Span, v: Bound) -> bool {
    let (from, until) = span;
    v >= *from && until.map_or(true, |until| v < until)
}

/// Whether some version in `span` satisfies `req`.
///
/// Probes the span's lower bound and the versions just at and after each
/// comparator, which is where a satisfying interval can begin.
fn span_intersects(span: &Span, req: &VersionReq) -> bool {
    let (from, _) = span;
    let mut probes = vec![*from];

    for cmp in &req.comparators {
        let minor = cmp.minor.unwrap_or(0);
        let patch = cmp.patch.unwrap_or(0);
        probes.push((cmp.major, minor, patch));
        probes.push((cmp.major, minor, patch + 1));
        probes.push((cmp.major, minor + 1, 0));
        probes.push((cmp.major + 1, 0, 0));
    }

    probes.into_iter().any(|probe| {
        span_contains(span, probe) && req.matches(&Version::new(probe.0, probe.1, probe.2))
    })
}

fn parse_range(range: &str) -> Result<Vec<VersionReq>, InvalidRange> {
    let trimmed = range.trim();
    if trimmed.is_empty() {
        return Err(InvalidRange(range.to_string()));
    }

    trimmed
        .split("||")
        .map(|alt| parse_alternative(alt.trim()).ok_or_else(|| InvalidRange(range.to_string())))
        .collect()
}

fn parse_alternative(alt: &str) -> Option<VersionReq> {
    if alt.is_empty() || matches!(alt, "*" | "x" | "X") {
        return Some(VersionReq::STAR);
    }

    let mut comparators = Vec::new();
    let mut pending_op = String::new();

    for token in alt.split_whitespace() {
        if token.chars().all(is_op_char) {
            pending_op.push_str(token);
            continue;
        }
        let glued = format!("{pending_op}{token}");
        pending_op.clear();
        comparators.push(cargo_comparator(&glued));
    }

    if !pending_op.is_empty() {
        return None;
    }

    VersionReq::parse(&comparators.join(", ")).ok()
}

fn is_op_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^')
}

/// npm comparator to cargo syntax: bare versions are exact, `v` prefixes dropped.
fn cargo_comparator(token: &str) -> String {
    let split = token.find(|c: char| !is_op_char(c)).unwrap_or(token.len());
    let (op, version) = token.split_at(split);
    let version = version.strip_prefix('v').unwrap_or(version);

    if op.is_empty() && !version.contains(['x', 'X', '*']) {
        format!("={version}")
    } else {
        format!("{op}{version}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("modern".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::BrokenDirSlashConditions).unwrap();
        assert_eq!(json, r#""broken-dir-slash-conditions""#);
    }

    #[test]
    fn test_star_covers_every_category() {
        assert_eq!(categories_for_range("*").unwrap(), Category::ALL.to_vec());
    }

    #[test]
    fn test_open_upper_range() {
        assert_eq!(
            categories_for_range(">= 17").unwrap(),
            vec![Category::PatternTrailersNoDirSlash]
        );
    }

    #[test]
    fn test_exact_version() {
        assert_eq!(
            categories_for_range("v12.18.0").unwrap(),
            vec![Category::Experimental]
        );
        assert_eq!(
            categories_for_range("14.13.0").unwrap(),
            vec![Category::Patterns]
        );
    }

    #[test]
    fn test_old_releases_are_pre_exports() {
        assert_eq!(
            categories_for_range("<12").unwrap(),
            vec![Category::PreExports]
        );
    }

    #[test]
    fn test_alternatives_and_compound_ranges() {
        let categories = categories_for_range("^13.0.0 <13.2 || >=16.9 <17").unwrap();
        assert_eq!(
            categories,
            vec![Category::Broken, Category::PatternTrailers]
        );
    }

    #[test]
    fn test_major_wildcard() {
        assert_eq!(
            categories_for_range("16.x").unwrap(),
            vec![Category::Patterns, Category::PatternTrailers]
        );
    }

    #[test]
    fn test_invalid_range() {
        assert!(categories_for_range("").is_err());
        assert!(categories_for_range("not a range").is_err());
        assert!(categories_for_range(">=").is_err());
    }

    #[test]
    fn test_category_for_version() {
        assert_eq!(
            category_for_version(&Version::new(10, 0, 0)),
            Category::PreExports
        );
        assert_eq!(
            category_for_version(&Version::new(14, 5, 0)),
            Category::BrokenDirSlashConditions
        );
        assert_eq!(
            category_for_version(&Version::new(20, 11, 1)),
            Category::PatternTrailersNoDirSlash
        );
    }

    #[test]
    fn test_feature_predicates() {
        assert!(!Category::PreExports.honors_exports());
        assert!(Category::Broken.honors_exports());
        assert!(!Category::Broken.supports_object_exports());
        assert!(Category::Experimental.default_condition_only());
        assert!(!Category::BrokenDirSlashConditions.supports_dir_slash());
        assert!(Category::Patterns.supports_dir_slash());
        assert!(!Category::PatternTrailersNoDirSlash.supports_dir_slash());
    }
}
