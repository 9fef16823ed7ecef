//! Ranked string matching for section type names.
//!
//! Template types and editor names disagree on case and on `_` vs `-`, and
//! template authors append random suffixes (`pdp_benefits_aB1`). Matching is
//! therefore done on normalised strings with an ordered list of strategies,
//! strongest first.

use slug::slugify;

/// Separator used between the segments of a normalised type name.
pub const SEPARATOR: char = '-';

/// Slugify a type name: lower-case, runs of `_` or whitespace fold to a
/// single `-`, and leading or trailing separators are dropped.
pub fn normalize(value: &str) -> String {
    slugify(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// `subject == candidate`
    Exact,
    /// `subject` starts with `candidate` followed by the separator.
    Prefix,
    /// `subject` contains `candidate` anywhere.
    Substring,
}

impl MatchStrategy {
    /// Both arguments are expected to be normalised already.
    pub fn matches(self, subject: &str, candidate: &str) -> bool {
        if candidate.is_empty() || subject.is_empty() {
            return false;
        }
        match self {
            MatchStrategy::Exact => subject == candidate,
            MatchStrategy::Prefix => subject
                .strip_prefix(candidate)
                .is_some_and(|rest| rest.starts_with(SEPARATOR)),
            MatchStrategy::Substring => subject.contains(candidate),
        }
    }
}

/// Strategies used when placing a requested section: substring is a last resort.
pub const ORDERING_STRATEGIES: &[MatchStrategy] = &[
    MatchStrategy::Exact,
    MatchStrategy::Prefix,
    MatchStrategy::Substring,
];

/// Strategies used for hiding and header detection. Substring matching is
/// excluded so `marquee` never hides `header-with-marquee`.
pub const SEGMENT_STRATEGIES: &[MatchStrategy] = &[MatchStrategy::Exact, MatchStrategy::Prefix];

/// Return the first strategy in `strategies` under which `subject` matches
/// `candidate`.
pub fn ranked_match(
    subject: &str,
    candidate: &str,
    strategies: &[MatchStrategy],
) -> Option<MatchStrategy> {
    strategies
        .iter()
        .copied()
        .find(|strategy| strategy.matches(subject, candidate))
}
