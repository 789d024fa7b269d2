//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method against an allowed set
//! - Match request path against literal/wildcard patterns
//! - Support negative path predicates (include X except Y, Z)
//!
//! # Design Decisions
//! - Path matching is case-sensitive and segment based
//! - `**` is only valid as the final segment and matches one or more segments
//! - Empty and trailing segments are ignored (`/user/` == `/user`)
//! - No regex to guarantee O(n) matching

use std::collections::HashSet;
use std::fmt;

use axum::http::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the method/path pair matches this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

const WILDCARD: &str = "**";

/// Why a pattern string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    MissingLeadingSlash,
    WildcardNotLast,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingLeadingSlash => write!(f, "pattern must start with '/'"),
            PatternError::WildcardNotLast => write!(f, "'**' may only be the last segment"),
        }
    }
}

impl std::error::Error for PatternError {}

/// A compiled path pattern such as `/user/register/**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    literals: Vec<String>,
    wildcard: bool,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        let segments: Vec<&str> = segments(raw).collect();
        let mut literals = Vec::with_capacity(segments.len());
        let mut wildcard = false;

        for (i, segment) in segments.iter().enumerate() {
            if *segment == WILDCARD {
                if i != segments.len() - 1 {
                    return Err(PatternError::WildcardNotLast);
                }
                wildcard = true;
            } else {
                literals.push((*segment).to_string());
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            literals,
            wildcard,
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches_path(&self, path: &str) -> bool {
        let mut path_segments = segments(path);

        for literal in &self.literals {
            match path_segments.next() {
                Some(segment) if segment == literal => {}
                _ => return false,
            }
        }

        let remaining = path_segments.next().is_some();
        if self.wildcard {
            remaining
        } else {
            !remaining
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A set of patterns; matches when any pattern matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<PathPattern>,
}

impl PatternSet {
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, PatternError> {
        let patterns = raw
            .iter()
            .map(|p| PathPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches_path(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathPattern> {
        self.patterns.iter()
    }
}

/// Matches paths accepted by `include` and rejected by every `exclude` pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: PatternSet,
    exclude: PatternSet,
}

impl PathMatcher {
    pub fn new(include: PatternSet, exclude: PatternSet) -> Self {
        Self { include, exclude }
    }

    pub fn include(&self) -> &PatternSet {
        &self.include
    }

    pub fn exclude(&self) -> &PatternSet {
        &self.exclude
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        self.include.contains(path) && !self.exclude.contains(path)
    }
}

/// Matches the request method. An empty set accepts any method.
#[derive(Debug, Clone, Default)]
pub struct MethodMatcher {
    allowed: HashSet<Method>,
}

impl MethodMatcher {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(allowed: impl IntoIterator<Item = Method>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allowed(&self) -> Vec<String> {
        let mut names: Vec<String> = self.allowed.iter().map(|m| m.to_string()).collect();
        names.sort();
        names
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(raw: &str) -> PathPattern {
        PathPattern::parse(raw).unwrap()
    }

    #[test]
    fn test_literal_pattern() {
        let p = pattern("/user/login");
        assert!(p.matches_path("/user/login"));
        assert!(p.matches_path("/user/login/"));
        assert!(!p.matches_path("/user/login/extra"));
        assert!(!p.matches_path("/user"));
        assert!(!p.matches_path("/User/login")); // Case sensitive
    }

    #[test]
    fn test_wildcard_requires_one_segment() {
        let p = pattern("/user/register/**");
        assert!(p.matches_path("/user/register/email"));
        assert!(p.matches_path("/user/register/a/b/c"));
        assert!(!p.matches_path("/user/register"));
        assert!(!p.matches_path("/user/registered/email"));
    }

    #[test]
    fn test_root_wildcard() {
        let p = pattern("/**");
        assert!(p.matches_path("/anything"));
        assert!(!p.matches_path("/"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(PathPattern::parse("user/**"), Err(PatternError::MissingLeadingSlash));
        assert_eq!(PathPattern::parse("/a/**/b"), Err(PatternError::WildcardNotLast));
    }

    #[test]
    fn test_path_matcher_with_exclusions() {
        let matcher = PathMatcher::new(
            PatternSet::parse(&["/live-lecture/**"]).unwrap(),
            PatternSet::parse(&["/live-lecture/sort/**", "/live-lecture/search/**"]).unwrap(),
        );

        assert!(matcher.matches(&Method::GET, "/live-lecture/123"));
        assert!(!matcher.matches(&Method::GET, "/live-lecture/sort/recent"));
        assert!(!matcher.matches(&Method::GET, "/live-lecture/search/yoga"));
        assert!(!matcher.matches(&Method::GET, "/recorded-lecture/1"));
    }

    #[test]
    fn test_method_matcher() {
        let any = MethodMatcher::any();
        assert!(any.matches(&Method::DELETE, "/"));

        let get_only = MethodMatcher::new([Method::GET]);
        assert!(get_only.matches(&Method::GET, "/"));
        assert!(!get_only.matches(&Method::POST, "/"));
    }
}
