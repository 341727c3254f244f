//! Completion engine: driver selection, interpretation and dispatch

use serde::Serialize;
use tracing::debug;

use super::Driver;
use crate::dispatch::{Dispatcher, MAX_DELEGATION_DEPTH};
use crate::error::Result;
use crate::grammar::CompletionAction;
use crate::interpreter::{ParseResult, WordRole, interpret};

/// Entry point for completion requests
pub struct CompletionEngine<D> {
    driver: D,
    max_depth: usize,
}

/// What the engine made of one request, for debugging grammars
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// Index of the word used as command word for the selected grammar
    pub offset: usize,

    /// Words handed to the interpreter
    pub words: Vec<String>,

    /// Cursor relative to `words`
    pub cursor: usize,

    pub action: CompletionAction,
    pub role: Option<WordRole>,
    pub parse: ParseResult,
    pub suggestions: Vec<String>,
}

impl<D: Driver> CompletionEngine<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            max_depth: MAX_DELEGATION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Complete the word at `cursor`
    ///
    /// Only driver errors (unknown command, broken spec) are returned;
    /// anything about the typed words themselves yields fewer suggestions.
    ///
    /// # Arguments
    /// * `words` - Words typed so far, command word first
    /// * `cursor` - Index of the word being completed, `words.len()` for a new word
    ///
    /// # Returns
    /// * `Result<Vec<String>>` - Sorted suggestions
    pub fn complete<S: AsRef<str>>(&self, words: &[S], cursor: usize) -> Result<Vec<String>> {
        Ok(self.explain(words, cursor)?.suggestions)
    }

    /// Complete the word at `cursor` and report how it was classified
    pub fn explain<S: AsRef<str>>(&self, words: &[S], cursor: usize) -> Result<Explanation> {
        let words: Vec<String> = words.iter().map(|w| w.as_ref().to_string()).collect();

        if words.is_empty() {
            return Ok(Explanation {
                offset: 0,
                words,
                cursor,
                action: CompletionAction::Literal,
                role: None,
                parse: ParseResult::default(),
                suggestions: Vec::new(),
            });
        }

        let selection = self.driver.select(&words, cursor)?;
        let offset = selection.offset.min(cursor).min(words.len() - 1);
        let local = &words[offset..];
        let local_cursor = cursor - offset;

        debug!(command = %local[0], offset, cursor = local_cursor, "completing");

        let parse = interpret(&selection.grammar, local, local_cursor);
        let suggestions = Dispatcher::new(&selection.resolvers)
            .with_max_depth(self.max_depth)
            .suggest(&selection.grammar, &parse, local);

        Ok(Explanation {
            offset,
            words: local.to_vec(),
            cursor: local_cursor,
            action: parse.cursor_action(),
            role: parse.cursor_role(),
            parse,
            suggestions,
        })
    }
}
