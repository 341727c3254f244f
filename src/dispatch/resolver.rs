//! Resolver interface and registry
//!
//! Drivers own the mapping from state and function names to resolvers. A
//! resolver receives the partial word together with the full
//! [`ParseResult`], so it can branch on flags and positionals captured
//! earlier on the line.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::builtins;
use super::matcher::MatchPolicy;
use crate::grammar::Grammar;
use crate::interpreter::ParseResult;

/// Everything a resolver may look at
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// State or function name being resolved
    pub state: &'a str,

    /// Text already typed for the cursor word
    pub partial: &'a str,

    pub parse: &'a ParseResult,

    /// Words the active grammar was interpreted against, command word first
    pub words: &'a [String],
}

/// Outcome of one resolver call
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Candidates, filtered by the dispatcher with `policy`
    Suggestions {
        items: Vec<String>,
        policy: MatchPolicy,
    },

    /// Resolve another named state instead
    State(String),

    /// Interpret `words[offset..]` against another grammar
    Grammar { grammar: Arc<Grammar>, offset: usize },
}

impl Resolution {
    /// Prefix-matched suggestions
    pub fn suggestions<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Suggestions {
            items: items.into_iter().map(Into::into).collect(),
            policy: MatchPolicy::Prefix,
        }
    }

    /// Path-matched suggestions
    pub fn paths(items: Vec<String>) -> Self {
        Self::Suggestions {
            items,
            policy: MatchPolicy::Path,
        }
    }

    pub fn empty() -> Self {
        Self::suggestions(Vec::<String>::new())
    }
}

/// A source of suggestions for one state or function name
///
/// Resolvers must return within bounded time and report "no results" as an
/// empty suggestion set, never as an error.
pub trait Resolver: Send + Sync {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution;
}

impl<F> Resolver for F
where
    F: Fn(&ResolveContext<'_>) -> Resolution + Send + Sync,
{
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        self(ctx)
    }
}

/// Turn a closure into a [`Resolver`]
///
/// Only needed to pin down the closure's argument type when it is not
/// otherwise inferable.
pub fn resolver_fn<F>(f: F) -> F
where
    F: Fn(&ResolveContext<'_>) -> Resolution + Send + Sync,
{
    f
}

/// Resolver answering with a fixed word list
#[derive(Debug, Clone)]
pub struct StaticWords {
    words: Vec<String>,
    policy: MatchPolicy,
}

impl StaticWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            policy: MatchPolicy::Prefix,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Resolver for StaticWords {
    fn resolve(&self, _ctx: &ResolveContext<'_>) -> Resolution {
        Resolution::Suggestions {
            items: self.words.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Name to resolver mapping for states and functions
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    states: HashMap<String, Arc<dyn Resolver>>,
    functions: HashMap<String, Arc<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `files`, `dirs` and `executables`
    /// functions registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_function("files", builtins::files);
        registry.register_function("dirs", builtins::dirs);
        registry.register_function("executables", builtins::executables);
        registry
    }

    /// Register the resolver for `NamedState(name)`, replacing any previous one
    pub fn register_state<R>(&mut self, name: impl Into<String>, resolver: R)
    where
        R: Resolver + 'static,
    {
        self.states.insert(name.into(), Arc::new(resolver));
    }

    /// Register the resolver for `Function(name)`, replacing any previous one
    pub fn register_function<R>(&mut self, name: impl Into<String>, resolver: R)
    where
        R: Resolver + 'static,
    {
        self.functions.insert(name.into(), Arc::new(resolver));
    }

    pub fn state(&self, name: &str) -> Option<&Arc<dyn Resolver>> {
        self.states.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<dyn Resolver>> {
        self.functions.get(name)
    }

    /// Registered state names, sorted
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered function names, sorted
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("states", &self.state_names())
            .field("functions", &self.function_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(resolver: &dyn Resolver) -> Resolution {
        let parse = ParseResult::default();
        let words = vec!["tool".to_string()];
        resolver.resolve(&ResolveContext {
            state: "test",
            partial: "",
            parse: &parse,
            words: &words,
        })
    }

    fn echo_state(ctx: &ResolveContext<'_>) -> Resolution {
        Resolution::suggestions([ctx.state])
    }

    #[test]
    fn test_function_is_a_resolver() {
        match resolve(&echo_state) {
            Resolution::Suggestions { items, .. } => assert_eq!(items, ["test"]),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_static_words() {
        let resolver = StaticWords::new(["low", "high"]).with_policy(MatchPolicy::Path);
        match resolve(&resolver) {
            Resolution::Suggestions { items, policy } => {
                assert_eq!(items, ["low", "high"]);
                assert!(matches!(policy, MatchPolicy::Path));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ResolverRegistry::with_builtins();
        registry.register_state("level", StaticWords::new(["low"]));

        assert!(registry.state("level").is_some());
        assert!(registry.state("files").is_none());
        assert!(registry.function("files").is_some());
        assert_eq!(registry.function_names(), ["dirs", "executables", "files"]);
        assert_eq!(registry.state_names(), ["level"]);
    }

    #[test]
    fn test_registry_clone_shares_resolvers() {
        let mut parent = ResolverRegistry::new();
        parent.register_state("a", StaticWords::new(["x"]));
        let mut child = parent.clone();
        child.register_state("b", StaticWords::new(["y"]));

        assert!(child.state("a").is_some());
        assert!(parent.state("b").is_none());
    }
}
