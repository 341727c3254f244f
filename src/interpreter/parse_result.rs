//! Per-request parse state
//!
//! A [`ParseResult`] is built fresh for every completion request and thrown
//! away once the cursor word has been resolved.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::CompletionAction;

/// Separator used when a flag captured several argument words
pub const OPT_ARG_SEPARATOR: &str = ":";

/// How a word was classified by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordRole {
    /// The command word itself (index 0)
    Command,
    /// One or more flags
    Flag,
    /// An argument consumed by the most recently opened flag
    OptionArgument,
    /// A bare word matched against the positional slots
    Positional,
}

/// The action and role recorded for one word index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordClass {
    pub action: CompletionAction,
    pub role: WordRole,
}

/// Result of walking the typed words against a grammar
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    /// Positional values in the order they were typed
    pub line: Vec<String>,

    /// Every spelling of every flag that was typed
    pub opts: BTreeSet<String>,

    /// Flag spellings no longer eligible for suggestion
    pub excluded: BTreeSet<String>,

    /// Index of the word being completed
    pub cursor: usize,

    /// Text of the word being completed (empty for a new word)
    pub current: String,

    opt_args: BTreeMap<String, Vec<String>>,
    words: BTreeMap<usize, WordClass>,
}

impl ParseResult {
    pub(crate) fn new(cursor: usize) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, index: usize, action: CompletionAction, role: WordRole) {
        self.words.insert(index, WordClass { action, role });
    }

    pub(crate) fn push_opt_arg(&mut self, spellings: &[String], value: &str) {
        for spelling in spellings {
            self.opt_args
                .entry(spelling.clone())
                .or_default()
                .push(value.to_string());
        }
    }

    /// The action recorded for a word index
    pub fn action_at(&self, index: usize) -> Option<&CompletionAction> {
        self.words.get(&index).map(|class| &class.action)
    }

    pub fn role_at(&self, index: usize) -> Option<WordRole> {
        self.words.get(&index).map(|class| class.role)
    }

    /// The action for the cursor word, `Literal` when nothing was recorded
    pub fn cursor_action(&self) -> CompletionAction {
        self.action_at(self.cursor)
            .cloned()
            .unwrap_or(CompletionAction::Literal)
    }

    pub fn cursor_role(&self) -> Option<WordRole> {
        self.role_at(self.cursor)
    }

    /// All recorded word classes in index order
    pub fn words(&self) -> impl Iterator<Item = (usize, &WordClass)> {
        self.words.iter().map(|(index, class)| (*index, class))
    }

    /// Check if a flag was typed under any of its spellings
    pub fn has_flag(&self, spelling: &str) -> bool {
        self.opts.contains(spelling)
    }

    pub fn is_excluded(&self, spelling: &str) -> bool {
        self.excluded.contains(spelling)
    }

    /// Captured arguments of a flag, joined with [`OPT_ARG_SEPARATOR`]
    pub fn opt_arg(&self, spelling: &str) -> Option<String> {
        self.opt_args
            .get(spelling)
            .map(|values| values.join(OPT_ARG_SEPARATOR))
    }

    /// Captured arguments of a flag, one entry per word
    pub fn opt_values(&self, spelling: &str) -> &[String] {
        self.opt_args
            .get(spelling)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
