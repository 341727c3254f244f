//! Match policies applied to suggestion sets

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

type MatchFn = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Rule deciding whether a candidate matches the partially typed word
#[derive(Clone, Default)]
pub enum MatchPolicy {
    /// Candidate starts with the partial word
    #[default]
    Prefix,

    /// Path-style matching
    ///
    /// The directory part of the candidate must equal the directory part of
    /// the partial word and the basename must start with the partial
    /// basename. Dot-files only match when the partial basename starts with
    /// a dot.
    Path,

    /// Caller-supplied predicate called as `(candidate, partial)`
    Custom(Arc<MatchFn>),
}

impl MatchPolicy {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Check if `candidate` matches `partial` under this policy
    pub fn matches(&self, candidate: &str, partial: &str) -> bool {
        match self {
            Self::Prefix => candidate.starts_with(partial),
            Self::Path => path_matches(candidate, partial),
            Self::Custom(predicate) => predicate(candidate, partial),
        }
    }

    /// Keep the matching candidates, de-duplicated and sorted
    pub fn filter<I>(&self, candidates: I, partial: &str) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        candidates
            .into_iter()
            .filter(|candidate| self.matches(candidate, partial))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl fmt::Debug for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "Prefix"),
            Self::Path => write!(f, "Path"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..=pos], &path[pos + 1..]),
        None => ("", path),
    }
}

fn path_matches(candidate: &str, partial: &str) -> bool {
    // Directory candidates carry a trailing slash.
    let trimmed = candidate.strip_suffix('/').unwrap_or(candidate);
    let (candidate_dir, candidate_base) = split_path(trimmed);
    let (partial_dir, partial_base) = split_path(partial);

    if candidate_dir != partial_dir || !candidate_base.starts_with(partial_base) {
        return false;
    }

    !candidate_base.starts_with('.') || partial_base.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_filter_dedups_and_sorts() {
        let items = strings(&["--verbose", "--version", "--help", "--verbose"]);
        assert_eq!(
            MatchPolicy::Prefix.filter(items, "--ver"),
            ["--verbose", "--version"]
        );
    }

    #[test]
    fn test_empty_partial_matches_all() {
        let items = strings(&["b", "a"]);
        assert_eq!(MatchPolicy::Prefix.filter(items, ""), ["a", "b"]);
    }

    #[test]
    fn test_path_same_directory_only() {
        let policy = MatchPolicy::Path;
        assert!(policy.matches("src/main.rs", "src/ma"));
        assert!(policy.matches("src/bin/", "src/b"));
        assert!(!policy.matches("src/bin/main.rs", "src/"));
        assert!(!policy.matches("lib/main.rs", "src/ma"));
        assert!(policy.matches("Cargo.toml", ""));
    }

    #[test]
    fn test_path_hides_dotfiles() {
        let policy = MatchPolicy::Path;
        assert!(!policy.matches(".git/", ""));
        assert!(!policy.matches("src/.hidden", "src/"));
        assert!(policy.matches(".git/", "."));
        assert!(policy.matches("src/.hidden", "src/.h"));
    }

    #[test]
    fn test_custom_policy() {
        let policy = MatchPolicy::custom(|candidate, partial| {
            candidate.to_lowercase().contains(&partial.to_lowercase())
        });
        let items = strings(&["Alpha", "beta", "GAMMA"]);
        assert_eq!(policy.filter(items, "a"), ["Alpha", "GAMMA", "beta"]);
        assert_eq!(format!("{policy:?}"), "Custom(..)");
    }
}
