//! Completion dispatcher
//!
//! Turns the completion action of the cursor word into suggestions.
//!
//! - `Literal` offers the flag spellings that are still eligible
//! - `Function(name)` calls the registered function resolver directly
//! - `NamedState(name)` is handed back as [`Dispatch::Deferred`]; the
//!   driver's state resolvers take it from there
//! - `Empty` offers nothing
//!
//! [`Dispatcher::complete`] runs the whole loop, following deferred states
//! and grammar delegation up to a fixed depth.

mod builtins;
mod cache;
mod command;
mod matcher;
mod resolver;

pub use cache::CachedResolver;
pub use command::{CommandResolver, DEFAULT_COMMAND_TIMEOUT};
pub use matcher::MatchPolicy;
pub use resolver::{
    ResolveContext, Resolution, Resolver, ResolverRegistry, StaticWords, resolver_fn,
};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::grammar::{CompletionAction, Grammar};
use crate::interpreter::{ParseResult, WordRole, interpret};

/// Maximum number of state hops and grammar delegations per request
pub const MAX_DELEGATION_DEPTH: usize = 8;

/// Outcome of one dispatch step
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Final, filtered suggestions
    Suggestions(Vec<String>),

    /// A named state the caller must resolve with the parse result
    Deferred(String),

    /// Interpret `words[offset..]` against another grammar
    Delegate { grammar: Arc<Grammar>, offset: usize },
}

/// Resolves completion actions against a resolver registry
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    resolvers: &'r ResolverRegistry,
    max_depth: usize,
}

impl<'r> Dispatcher<'r> {
    pub fn new(resolvers: &'r ResolverRegistry) -> Self {
        Self {
            resolvers,
            max_depth: MAX_DELEGATION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve the cursor action of `parse` one step
    ///
    /// # Arguments
    /// * `grammar` - Grammar `parse` was produced from
    /// * `parse` - Interpretation of `words`
    /// * `words` - Words the grammar was interpreted against
    ///
    /// # Returns
    /// * `Dispatch` - Suggestions, or what the caller still has to resolve
    pub fn dispatch(&self, grammar: &Grammar, parse: &ParseResult, words: &[String]) -> Dispatch {
        let partial = parse.current.as_str();
        let action = parse.cursor_action();

        // A dash typed where a positional is expected still asks for flags.
        let wants_flags = partial.starts_with('-')
            && parse.cursor_role() == Some(WordRole::Positional)
            && !action.is_literal();

        if wants_flags {
            return Dispatch::Suggestions(literal_set(grammar, parse));
        }

        match action {
            CompletionAction::Literal => Dispatch::Suggestions(literal_set(grammar, parse)),
            CompletionAction::NamedState(name) => Dispatch::Deferred(name),
            CompletionAction::Function(name) => match self.resolvers.function(&name) {
                Some(resolver) => {
                    let ctx = ResolveContext {
                        state: &name,
                        partial,
                        parse,
                        words,
                    };
                    settle(resolver.resolve(&ctx), partial)
                }
                None => {
                    warn!(function = %name, "no resolver registered for function");
                    Dispatch::Suggestions(Vec::new())
                }
            },
            CompletionAction::Empty => Dispatch::Suggestions(Vec::new()),
        }
    }

    /// Resolve a named state with the driver's state resolvers
    ///
    /// An unregistered state yields no suggestions.
    pub fn resolve_state(&self, state: &str, parse: &ParseResult, words: &[String]) -> Dispatch {
        let Some(resolver) = self.resolvers.state(state) else {
            debug!(state, "no resolver registered for state");
            return Dispatch::Suggestions(Vec::new());
        };

        let ctx = ResolveContext {
            state,
            partial: &parse.current,
            parse,
            words,
        };
        settle(resolver.resolve(&ctx), &parse.current)
    }

    /// Complete the word at `cursor`
    ///
    /// # Arguments
    /// * `grammar` - Grammar of the command in `words[0]`
    /// * `words` - Words typed so far, command word first
    /// * `cursor` - Index of the word being completed, `words.len()` for a new word
    ///
    /// # Returns
    /// * `Vec<String>` - Sorted, de-duplicated suggestions
    pub fn complete(&self, grammar: &Grammar, words: &[String], cursor: usize) -> Vec<String> {
        self.complete_at(grammar, words, cursor, 0)
    }

    /// Suggestions for an existing interpretation of `words`
    pub fn suggest(&self, grammar: &Grammar, parse: &ParseResult, words: &[String]) -> Vec<String> {
        let step = self.dispatch(grammar, parse, words);
        self.follow(step, parse, words, 0)
    }

    fn complete_at(
        &self,
        grammar: &Grammar,
        words: &[String],
        cursor: usize,
        depth: usize,
    ) -> Vec<String> {
        let parse = interpret(grammar, words, cursor);
        let step = self.dispatch(grammar, &parse, words);
        self.follow(step, &parse, words, depth)
    }

    fn follow(
        &self,
        step: Dispatch,
        parse: &ParseResult,
        words: &[String],
        depth: usize,
    ) -> Vec<String> {
        match step {
            Dispatch::Suggestions(items) => items,
            _ if depth >= self.max_depth => {
                warn!(?step, max_depth = self.max_depth, "delegation depth exceeded");
                Vec::new()
            }
            Dispatch::Deferred(state) => {
                let next = self.resolve_state(&state, parse, words);
                self.follow(next, parse, words, depth + 1)
            }
            Dispatch::Delegate { grammar, offset } => {
                if offset > parse.cursor || offset > words.len() {
                    debug!(offset, cursor = parse.cursor, "delegation offset past the cursor");
                    return Vec::new();
                }
                self.complete_at(&grammar, &words[offset..], parse.cursor - offset, depth + 1)
            }
        }
    }
}

/// Eligible flag spellings filtered by the cursor word
fn literal_set(grammar: &Grammar, parse: &ParseResult) -> Vec<String> {
    let candidates = grammar
        .spellings()
        .filter(|spelling| !parse.is_excluded(spelling))
        .map(str::to_string);
    MatchPolicy::Prefix.filter(candidates, &parse.current)
}

fn settle(resolution: Resolution, partial: &str) -> Dispatch {
    match resolution {
        Resolution::Suggestions { items, policy } => {
            Dispatch::Suggestions(policy.filter(items, partial))
        }
        Resolution::State(state) => Dispatch::Deferred(state),
        Resolution::Grammar { grammar, offset } => Dispatch::Delegate { grammar, offset },
    }
}
