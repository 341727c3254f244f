//! Completion actions and action chains
//!
//! A completion action is the resolved meaning of a word: what should be
//! offered when the cursor sits on it. Flags and positional slots carry
//! ordered chains of actions, one per argument word they consume.

use serde::Serialize;
use std::fmt;

/// What to complete for one word
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum CompletionAction {
    /// Suggest from the live flag set
    Literal,

    /// Hand resolution to the driver's resolver registered under this name
    NamedState(String),

    /// Invoke a registered function resolver directly
    Function(String),

    /// Argument accepted, nothing to suggest
    Empty,
}

impl CompletionAction {
    /// Create a named state action
    pub fn state(name: impl Into<String>) -> Self {
        Self::NamedState(name.into())
    }

    /// Create a function action
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    /// Check if this is the literal flag action
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal)
    }
}

/// Token form of an action: `-`, `` (empty), `name` or `name()`.
impl fmt::Display for CompletionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionAction::Literal => write!(f, "-"),
            CompletionAction::NamedState(name) => write!(f, "{name}"),
            CompletionAction::Function(name) => write!(f, "{name}()"),
            CompletionAction::Empty => Ok(()),
        }
    }
}

/// Ordered list of actions consumed one per word
///
/// When `repeat_tail` is set, the last action is never exhausted: it applies
/// to every further word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ActionChain {
    actions: Vec<CompletionAction>,
    repeat_tail: bool,
}

impl ActionChain {
    /// Create a chain. A repeating marker on an empty chain is dropped.
    pub fn new(actions: Vec<CompletionAction>, repeat_tail: bool) -> Self {
        let repeat_tail = repeat_tail && !actions.is_empty();
        Self {
            actions,
            repeat_tail,
        }
    }

    /// Create a single-action, non-repeating chain
    pub fn single(action: CompletionAction) -> Self {
        Self::new(vec![action], false)
    }

    pub fn actions(&self) -> &[CompletionAction] {
        &self.actions
    }

    pub fn first(&self) -> Option<&CompletionAction> {
        self.actions.first()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Check if the last action repeats for every further word
    pub fn repeats_tail(&self) -> bool {
        self.repeat_tail
    }

    /// Render the chain as `:`-separated token segments, repeating marker
    /// on the tail.
    pub fn to_token_suffix(&self) -> String {
        let last = self.actions.len().saturating_sub(1);
        self.actions
            .iter()
            .enumerate()
            .map(|(i, action)| {
                if self.repeat_tail && i == last {
                    format!("*{action}")
                } else {
                    action.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display() {
        assert_eq!(CompletionAction::Literal.to_string(), "-");
        assert_eq!(CompletionAction::Empty.to_string(), "");
        assert_eq!(CompletionAction::state("package").to_string(), "package");
        assert_eq!(CompletionAction::function("files").to_string(), "files()");
    }

    #[test]
    fn test_empty_chain_never_repeats() {
        let chain = ActionChain::new(Vec::new(), true);
        assert!(!chain.repeats_tail());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_token_suffix() {
        let chain = ActionChain::new(
            vec![
                CompletionAction::state("name"),
                CompletionAction::Empty,
                CompletionAction::function("files"),
            ],
            true,
        );
        assert_eq!(chain.to_token_suffix(), "name::*files()");
    }

    #[test]
    fn test_action_serializes_tagged() {
        let json = serde_json::to_string(&CompletionAction::state("value")).unwrap();
        assert_eq!(json, r#"{"kind":"named_state","name":"value"}"#);

        let json = serde_json::to_string(&CompletionAction::Literal).unwrap();
        assert_eq!(json, r#"{"kind":"literal"}"#);
    }
}
