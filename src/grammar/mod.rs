//! Compiled grammar of one command
//!
//! A [`Grammar`] is the table the interpreter walks: flag records looked up
//! by spelling, the ordered positional slots, and the exclusion groups that
//! decide which flags stay eligible once others were typed.
//!
//! Grammars are built with [`compile`] from the token mini-language and are
//! immutable afterwards, so drivers can share them behind an `Arc`.
//!
//! # Examples
//!
//! ```
//! use compline::grammar::{compile, CompletionAction};
//!
//! let grammar = compile(&[
//!     "(mode){-i,--install}",
//!     "(mode){-u,--upgrade}",
//!     "-o:output",
//!     ":*package",
//! ])
//! .unwrap();
//!
//! let install = grammar.flag("--install").unwrap();
//! assert_eq!(install.spellings(), ["-i", "--install"]);
//! assert_eq!(grammar.group("mode").unwrap().members().len(), 4);
//! assert_eq!(
//!     grammar.flag("-o").unwrap().chain().first(),
//!     Some(&CompletionAction::state("output"))
//! );
//! ```

mod action;
mod compiler;
mod tokens;

pub use action::{ActionChain, CompletionAction};
pub use compiler::compile;

use std::collections::{BTreeMap, BTreeSet};

/// Index of a flag record inside its grammar
pub type FlagId = usize;

/// One option record, shared by all of its alias spellings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    spellings: Vec<String>,
    group: Option<String>,
    explicit_group: bool,
    chain: ActionChain,
    repeatable: bool,
}

impl Flag {
    /// All spellings bound to this record, canonical first
    pub fn spellings(&self) -> &[String] {
        &self.spellings
    }

    /// The first declared spelling
    pub fn canonical(&self) -> &str {
        &self.spellings[0]
    }

    /// Exclusion group id (implicit groups use the canonical spelling)
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Check if the group came from a `(id)` prefix
    pub fn has_explicit_group(&self) -> bool {
        self.explicit_group
    }

    pub fn chain(&self) -> &ActionChain {
        &self.chain
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    /// Check if the flag consumes argument words
    pub fn takes_arguments(&self) -> bool {
        !self.chain.is_empty()
    }
}

/// Set of mutually exclusive flag spellings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionGroup {
    id: String,
    members: BTreeSet<String>,
    implicit: bool,
}

impl ExclusionGroup {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Check if this is the singleton group of a non-repeatable flag
    pub fn is_implicit(&self) -> bool {
        self.implicit
    }
}

/// Rule for interpreting one bare word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSlot {
    chain: ActionChain,
    repeatable: bool,
}

impl PositionalSlot {
    pub fn chain(&self) -> &ActionChain {
        &self.chain
    }

    /// The action applied to the first word matching this slot
    pub fn action(&self) -> CompletionAction {
        self.chain.first().cloned().unwrap_or(CompletionAction::Empty)
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }
}

/// Compiled representation of one command's spec
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    flags: Vec<Flag>,
    spellings: BTreeMap<String, FlagId>,
    slots: Vec<PositionalSlot>,
    groups: BTreeMap<String, ExclusionGroup>,
    named_sets: BTreeMap<String, Vec<String>>,
}

impl Grammar {
    /// Look up the flag record for a spelling
    pub fn flag(&self, spelling: &str) -> Option<&Flag> {
        self.flag_id(spelling).map(|id| &self.flags[id])
    }

    pub fn flag_id(&self, spelling: &str) -> Option<FlagId> {
        self.spellings.get(spelling).copied()
    }

    pub fn flag_by_id(&self, id: FlagId) -> Option<&Flag> {
        self.flags.get(id)
    }

    /// Flag records in declaration order
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Every known spelling, sorted
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        self.spellings.keys().map(String::as_str)
    }

    pub fn slots(&self) -> &[PositionalSlot] {
        &self.slots
    }

    pub fn group(&self, id: &str) -> Option<&ExclusionGroup> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ExclusionGroup> {
        self.groups.values()
    }

    /// Exclusion group of the flag bound to `spelling`
    pub fn group_of(&self, spelling: &str) -> Option<&ExclusionGroup> {
        self.flag(spelling)
            .and_then(Flag::group)
            .and_then(|id| self.groups.get(id))
    }

    /// Spellings collected under a `+name` context during compilation
    pub fn named_set(&self, name: &str) -> Option<&[String]> {
        self.named_sets.get(name).map(Vec::as_slice)
    }

    /// Check if two grammars accept the same flags, groups and slots
    ///
    /// Declaration order of flags and the ids of implicit groups do not
    /// matter; explicit group ids, memberships, action chains and the slot
    /// sequence do.
    pub fn equivalent(&self, other: &Grammar) -> bool {
        self.signature() == other.signature()
    }

    fn signature(&self) -> GrammarSignature {
        let flags = self
            .flags
            .iter()
            .map(|flag| {
                let members = self
                    .group_of(flag.canonical())
                    .map(|g| g.members.clone())
                    .unwrap_or_default();
                FlagSignature {
                    spellings: flag.spellings.iter().cloned().collect(),
                    group: flag.explicit_group.then(|| flag.group.clone()).flatten(),
                    members,
                    chain: (flag.chain.len(), flag.chain.to_token_suffix()),
                    repeatable: flag.repeatable,
                }
            })
            .collect();

        GrammarSignature {
            flags,
            slots: self.slots.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct FlagSignature {
    spellings: BTreeSet<String>,
    group: Option<String>,
    members: BTreeSet<String>,
    chain: (usize, String),
    repeatable: bool,
}

#[derive(Debug, PartialEq)]
struct GrammarSignature {
    flags: BTreeSet<FlagSignature>,
    slots: Vec<PositionalSlot>,
}

/// Check if a spelling is a single-character short flag such as `-v`
pub fn is_short_spelling(spelling: &str) -> bool {
    let mut chars = spelling.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('-'), Some(c), None) if c != '-'
    )
}
