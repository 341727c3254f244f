//! Command-line interpreter
//!
//! Walks the typed words of one command against a [`Grammar`] in a single
//! left-to-right pass and records, for every word, the completion action
//! that applied while it was being typed.
//!
//! The walk is greedy and never backtracks:
//! - while a flag's action chain is pending, words are its arguments
//! - words starting with `-` are flags, single-dash words are split into
//!   one flag per character unless the whole word is a known spelling
//! - anything else fills the next positional slot
//!
//! The interpreter never fails. Unknown flags, exhausted slots and cursors
//! outside the word list simply fall back to a default action.

mod parse_result;


pub use parse_result::{OPT_ARG_SEPARATOR, ParseResult, WordClass, WordRole};

use std::collections::VecDeque;
use tracing::trace;

use crate::grammar::{
    ActionChain, CompletionAction, FlagId, Grammar, PositionalSlot, is_short_spelling,
};

/// Interpret `words` against `grammar` for the word at `cursor`
///
/// `words[0]` is the command word. A cursor equal to `words.len()` stands
/// for a new word that has not been typed yet; its action is derived from
/// the state left by the last word.
///
/// # Arguments
/// * `grammar` - Compiled grammar of the command
/// * `words` - The words typed so far, command word first
/// * `cursor` - Index of the word being completed
///
/// # Returns
/// * `ParseResult` - Captured flags, arguments and per-word actions
pub fn interpret<S: AsRef<str>>(grammar: &Grammar, words: &[S], cursor: usize) -> ParseResult {
    let mut walker = Walker::new(grammar, cursor);

    for (index, word) in words.iter().enumerate() {
        walker.word(index, word.as_ref());
    }

    if cursor == words.len() && cursor > 0 {
        walker.new_word(cursor);
    }

    walker.result
}

/// Actions still owed to the most recently opened flag or slot
#[derive(Default)]
struct ActionQueue<'g> {
    chain: Option<&'g ActionChain>,
    pos: usize,
}

impl<'g> ActionQueue<'g> {
    fn starting_at(chain: &'g ActionChain, pos: usize) -> Self {
        // A one-action repeating chain never runs dry.
        let pos = if chain.repeats_tail() {
            pos.min(chain.len().saturating_sub(1))
        } else {
            pos
        };
        Self {
            chain: Some(chain),
            pos,
        }
    }

    fn front(&self) -> Option<&'g CompletionAction> {
        self.chain.and_then(|chain| chain.actions().get(self.pos))
    }

    /// Check if only the repeating tail is left
    fn at_repeating_tail(&self) -> bool {
        self.chain
            .is_some_and(|chain| chain.repeats_tail() && self.pos + 1 == chain.len())
    }

    fn pop(&mut self) -> Option<&'g CompletionAction> {
        let front = self.front()?;
        if !self.at_repeating_tail() {
            self.pos += 1;
        }
        Some(front)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

struct Walker<'g> {
    grammar: &'g Grammar,
    queue: ActionQueue<'g>,
    /// Flag owning the pending queue, `None` when a slot chain owns it
    owner: Option<FlagId>,
    slots: VecDeque<&'g PositionalSlot>,
    result: ParseResult,
}

impl<'g> Walker<'g> {
    fn new(grammar: &'g Grammar, cursor: usize) -> Self {
        Self {
            grammar,
            queue: ActionQueue::default(),
            owner: None,
            slots: grammar.slots().iter().collect(),
            result: ParseResult::new(cursor),
        }
    }

    fn word(&mut self, index: usize, word: &str) {
        if index == self.result.cursor {
            self.result.current = word.to_string();
        }

        if index == 0 {
            self.result
                .record(0, CompletionAction::Empty, WordRole::Command);
            return;
        }

        let looks_like_flag = word.len() > 1 && word.starts_with('-');

        // The repeating tail ends where the next flag starts.
        if looks_like_flag && self.queue.at_repeating_tail() {
            self.queue.clear();
            self.owner = None;
        }

        if let Some(action) = self.queue.pop() {
            self.option_argument(index, word, action.clone());
        } else if looks_like_flag {
            self.flags(index, word);
        } else {
            self.positional(index, word);
        }
    }

    fn option_argument(&mut self, index: usize, word: &str, action: CompletionAction) {
        match self.owner.and_then(|id| self.grammar.flag_by_id(id)) {
            Some(flag) => self.result.push_opt_arg(flag.spellings(), word),
            None => self.result.line.push(word.to_string()),
        }

        trace!(index, word, ?action, "option argument");
        self.result.record(index, action, WordRole::OptionArgument);
    }

    fn flags(&mut self, index: usize, word: &str) {
        for (id, short) in self.resolve(word) {
            let Some(flag) = self.grammar.flag_by_id(id) else {
                continue;
            };

            self.result.opts.extend(flag.spellings().iter().cloned());

            if !flag.is_repeatable()
                && (index != self.result.cursor || short)
                && let Some(group) = flag.group().and_then(|g| self.grammar.group(g))
            {
                self.result.excluded.extend(group.members().iter().cloned());
            }

            if flag.takes_arguments() {
                self.queue = ActionQueue::starting_at(flag.chain(), 0);
                self.owner = Some(id);
            }
        }

        trace!(index, word, "flag");
        self.result
            .record(index, CompletionAction::Literal, WordRole::Flag);
    }

    /// Resolve a flag word to flag records, with whether each came from a
    /// short spelling
    fn resolve(&self, word: &str) -> Vec<(FlagId, bool)> {
        if let Some(id) = self.grammar.flag_id(word) {
            return vec![(id, is_short_spelling(word))];
        }

        if word.starts_with("--") {
            return Vec::new();
        }

        word.chars()
            .skip(1)
            .filter_map(|c| self.grammar.flag_id(&format!("-{c}")))
            .map(|id| (id, true))
            .collect()
    }

    fn positional(&mut self, index: usize, word: &str) {
        self.result.line.push(word.to_string());

        let action = match self.slots.front().copied() {
            Some(slot) => {
                if !slot.is_repeatable() {
                    self.slots.pop_front();
                }
                if slot.chain().len() > 1 || slot.chain().repeats_tail() {
                    self.queue = ActionQueue::starting_at(slot.chain(), 1);
                    self.owner = None;
                }
                slot.action()
            }
            None => CompletionAction::Empty,
        };

        trace!(index, word, ?action, "positional");
        self.result.record(index, action, WordRole::Positional);
    }

    /// Classify the not-yet-typed word at the end of the line
    fn new_word(&mut self, index: usize) {
        let (action, role) = match self.queue.front() {
            Some(action) => (action.clone(), WordRole::OptionArgument),
            None => (
                self.slots
                    .front()
                    .map(|slot| slot.action())
                    .unwrap_or(CompletionAction::Empty),
                WordRole::Positional,
            ),
        };

        self.result.current.clear();
        self.result.record(index, action, role);
    }
}
