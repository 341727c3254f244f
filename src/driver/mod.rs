//! CLI drivers
//!
//! A driver knows the tools it completes. For every request it picks the
//! grammar that applies to the typed words (descending into subcommands
//! where it has them) and supplies the resolvers for that grammar's named
//! states.
//!
//! Two drivers ship with the crate:
//! - [`GrammarDriver`]: one grammar and a registry built in Rust
//! - [`SpecFileDriver`]: any number of tools described in a TOML spec file
//!
//! [`CompletionEngine`] ties a driver to the interpreter and dispatcher.

mod engine;
mod spec_file;

#[cfg(test)]
mod tests;

pub use engine::{CompletionEngine, Explanation};
pub use spec_file::{SUBCOMMANDS_STATE, SpecFileDriver, SpecSettings, command_name};

use std::sync::Arc;

use crate::dispatch::ResolverRegistry;
use crate::error::Result;
use crate::grammar::{Grammar, compile};

/// The grammar chosen for a request
#[derive(Debug, Clone)]
pub struct Selection {
    pub grammar: Arc<Grammar>,

    /// Index of the word acting as the command word of `grammar`
    pub offset: usize,

    /// Resolvers for the named states of `grammar`
    pub resolvers: Arc<ResolverRegistry>,
}

/// Chooses grammars and resolvers for completion requests
pub trait Driver: Send + Sync {
    /// Select the grammar for `words`
    ///
    /// The returned offset never exceeds `cursor`.
    ///
    /// # Arguments
    /// * `words` - Words typed so far, command word first (never empty)
    /// * `cursor` - Index of the word being completed
    ///
    /// # Returns
    /// * `Result<Selection>` - Grammar selection, or an error for unknown commands
    fn select(&self, words: &[String], cursor: usize) -> Result<Selection>;
}

/// Driver for a single command defined in code
#[derive(Debug, Clone)]
pub struct GrammarDriver {
    grammar: Arc<Grammar>,
    resolvers: Arc<ResolverRegistry>,
}

impl GrammarDriver {
    pub fn new(grammar: Grammar, resolvers: ResolverRegistry) -> Self {
        Self {
            grammar: Arc::new(grammar),
            resolvers: Arc::new(resolvers),
        }
    }

    /// Compile `tokens` and pair them with `resolvers`
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S], resolvers: ResolverRegistry) -> Result<Self> {
        Ok(Self::new(compile(tokens)?, resolvers))
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }
}

impl Driver for GrammarDriver {
    fn select(&self, _words: &[String], _cursor: usize) -> Result<Selection> {
        Ok(Selection {
            grammar: self.grammar.clone(),
            offset: 0,
            resolvers: self.resolvers.clone(),
        })
    }
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn select(&self, words: &[String], cursor: usize) -> Result<Selection> {
        (**self).select(words, cursor)
    }
}
