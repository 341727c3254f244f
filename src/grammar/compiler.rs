//! Spec compiler: grammar tokens to [`Grammar`]
//!
//! Token forms:
//!
//! | Token | Meaning |
//! |---|---|
//! | `-f`, `--flag` | flag without arguments |
//! | `-o:a:b` | flag whose next two words complete as `a` then `b` |
//! | `-I:*dir` | flag whose every following word completes as `dir` |
//! | `*-v` | repeatable flag, never excluded by itself |
//! | `{-i,--install}` | aliases sharing one flag record |
//! | `(mode)-x` | member of exclusion group `mode` |
//! | `+name` / `+` | switch / clear the named set new flags join |
//! | `{@name}` | the spellings collected in named set `name` |
//! | `:name`, `:*name` | positional slot, `*` for repeatable |
//!
//! Action bodies: empty for no completion, `-` for the flag set, `name()`
//! for a function resolver, anything else names a state.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::{ActionChain, CompletionAction, ExclusionGroup, Flag, FlagId, Grammar, PositionalSlot};
use crate::error::{CompileError, CompileErrorKind};

type KindResult<T> = std::result::Result<T, CompileErrorKind>;

/// Compile a sequence of grammar tokens
///
/// # Arguments
/// * `tokens` - Tokens in the grammar mini-language
///
/// # Returns
/// * `Result<Grammar, CompileError>` - Compiled grammar or the first malformed token
pub fn compile<S: AsRef<str>>(tokens: &[S]) -> Result<Grammar, CompileError> {
    let mut compiler = Compiler::default();

    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        compiler.token(token).map_err(|kind| CompileError {
            index,
            token: token.to_string(),
            kind,
        })?;
    }

    let grammar = compiler.finish();
    debug!(
        flags = grammar.flags.len(),
        slots = grammar.slots.len(),
        groups = grammar.groups.len(),
        "compiled grammar"
    );
    Ok(grammar)
}

#[derive(Default)]
struct Compiler {
    flags: Vec<Flag>,
    spellings: BTreeMap<String, FlagId>,
    slots: Vec<PositionalSlot>,
    named_sets: BTreeMap<String, Vec<String>>,
    current_set: Option<String>,
}

impl Compiler {
    fn token(&mut self, token: &str) -> KindResult<()> {
        if token.is_empty() {
            return Err(CompileErrorKind::EmptyToken);
        }

        if let Some(name) = token.strip_prefix('+') {
            return self.switch_set(name);
        }

        if let Some(rest) = token.strip_prefix(':') {
            return self.slot(rest);
        }

        let (group, rest) = split_group(token)?;
        let (repeatable, rest) = match rest.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        if !rest.starts_with('-') && !rest.starts_with('{') {
            // A bare word with no marker at all is not a token we know.
            if group.is_none() && !repeatable {
                return Err(CompileErrorKind::UnknownForm);
            }
            let spelling = rest.split(':').next().unwrap_or_default();
            return Err(if spelling.is_empty() {
                CompileErrorKind::EmptySpelling
            } else {
                CompileErrorKind::InvalidSpelling(spelling.to_string())
            });
        }

        let (spellings, actions) = self.split_spellings(rest)?;
        let chain = match actions {
            Some(actions) => Some(parse_chain(&actions.split(':').collect::<Vec<_>>())?),
            None => None,
        };

        self.define_flag(spellings, group, repeatable, chain)
    }

    fn switch_set(&mut self, name: &str) -> KindResult<()> {
        if name.is_empty() {
            self.current_set = None;
            return Ok(());
        }

        validate_name(name)?;
        self.named_sets.entry(name.to_string()).or_default();
        self.current_set = Some(name.to_string());
        Ok(())
    }

    fn slot(&mut self, rest: &str) -> KindResult<()> {
        let (repeatable, rest) = match rest.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        let parts: Vec<&str> = rest.split(':').collect();
        let chain = parse_chain(&parts)?;

        if self.slots.iter().any(PositionalSlot::is_repeatable) {
            warn!(
                slot = %rest,
                "positional slot follows a repeatable slot and can never match"
            );
        }

        self.slots.push(PositionalSlot { chain, repeatable });
        Ok(())
    }

    /// Split `-flag:actions` or `{a,b}:actions` into spellings and the
    /// optional action suffix (without its leading `:`).
    fn split_spellings<'t>(&self, rest: &'t str) -> KindResult<(Vec<String>, Option<&'t str>)> {
        let (head, tail) = if let Some(inner) = rest.strip_prefix('{') {
            let close = inner
                .find('}')
                .ok_or(CompileErrorKind::UnterminatedAliasSet)?;
            let after = &inner[close + 1..];
            if !after.is_empty() && !after.starts_with(':') {
                return Err(CompileErrorKind::InvalidSpelling(after.to_string()));
            }
            (self.expand_aliases(&inner[..close])?, after)
        } else {
            let end = rest.find(':').unwrap_or(rest.len());
            let spelling = &rest[..end];
            validate_spelling(spelling)?;
            (vec![spelling.to_string()], &rest[end..])
        };

        Ok((head, tail.strip_prefix(':')))
    }

    fn expand_aliases(&self, inner: &str) -> KindResult<Vec<String>> {
        let mut spellings = Vec::new();

        for item in inner.split(',').map(str::trim) {
            if let Some(name) = item.strip_prefix('@') {
                let set = self
                    .named_sets
                    .get(name)
                    .ok_or_else(|| CompileErrorKind::UnknownNamedSet(name.to_string()))?;
                spellings.extend(set.iter().cloned());
            } else {
                validate_spelling(item)?;
                spellings.push(item.to_string());
            }
        }

        if spellings.is_empty() {
            return Err(CompileErrorKind::EmptySpelling);
        }

        let mut seen = BTreeSet::new();
        spellings.retain(|s| seen.insert(s.clone()));
        Ok(spellings)
    }

    fn define_flag(
        &mut self,
        spellings: Vec<String>,
        group: Option<String>,
        repeatable: bool,
        chain: Option<ActionChain>,
    ) -> KindResult<()> {
        let mut bound: Vec<FlagId> = spellings
            .iter()
            .filter_map(|s| self.spellings.get(s).copied())
            .collect();
        bound.sort_unstable();
        bound.dedup();

        let fresh: Vec<&String> = spellings
            .iter()
            .filter(|s| !self.spellings.contains_key(*s))
            .collect();

        let targets = match bound.as_slice() {
            [] => {
                self.flags.push(Flag {
                    spellings: Vec::new(),
                    group: None,
                    explicit_group: false,
                    chain: ActionChain::default(),
                    repeatable: false,
                });
                vec![self.flags.len() - 1]
            }
            [id] => vec![*id],
            [first, second, ..] if !fresh.is_empty() => {
                return Err(CompileErrorKind::ConflictingAliases {
                    first: self.flags[*first].canonical().to_string(),
                    second: self.flags[*second].canonical().to_string(),
                });
            }
            // Re-declaring existing flags only updates each of them.
            ids => ids.to_vec(),
        };

        if let [id] = targets.as_slice() {
            for spelling in fresh {
                self.spellings.insert(spelling.clone(), *id);
                self.flags[*id].spellings.push(spelling.clone());
            }
        }

        for id in targets {
            let flag = &mut self.flags[id];
            flag.repeatable |= repeatable;
            if let Some(group) = &group {
                flag.group = Some(group.clone());
                flag.explicit_group = true;
            }
            if let Some(chain) = &chain {
                flag.chain = chain.clone();
            }
        }

        if let Some(set) = &self.current_set {
            let members = self.named_sets.entry(set.clone()).or_default();
            for spelling in spellings {
                if !members.contains(&spelling) {
                    members.push(spelling);
                }
            }
        }

        Ok(())
    }

    fn finish(mut self) -> Grammar {
        let mut groups: BTreeMap<String, ExclusionGroup> = BTreeMap::new();

        for flag in &mut self.flags {
            if !flag.explicit_group {
                flag.group = (!flag.repeatable).then(|| flag.canonical().to_string());
            }

            if let Some(id) = &flag.group {
                let group = groups.entry(id.clone()).or_insert_with(|| ExclusionGroup {
                    id: id.clone(),
                    members: BTreeSet::new(),
                    implicit: !flag.explicit_group,
                });
                group.implicit &= !flag.explicit_group;
                group.members.extend(flag.spellings.iter().cloned());
            }
        }

        Grammar {
            flags: self.flags,
            spellings: self.spellings,
            slots: self.slots,
            groups,
            named_sets: self.named_sets,
        }
    }
}

/// Strip a leading `(id)` exclusion-group prefix
fn split_group(token: &str) -> KindResult<(Option<String>, &str)> {
    let Some(inner) = token.strip_prefix('(') else {
        return Ok((None, token));
    };

    let close = inner.find(')').ok_or(CompileErrorKind::UnterminatedGroup)?;
    let id = inner[..close].trim();
    if id.is_empty() {
        return Err(CompileErrorKind::EmptyGroupId);
    }

    Ok((Some(id.to_string()), &inner[close + 1..]))
}

fn parse_chain(parts: &[&str]) -> KindResult<ActionChain> {
    let last = parts.len().saturating_sub(1);
    let mut actions = Vec::with_capacity(parts.len());
    let mut repeat_tail = false;

    for (i, part) in parts.iter().enumerate() {
        let body = match part.strip_prefix('*') {
            Some(body) if i == last => {
                repeat_tail = true;
                body
            }
            Some(body) => return Err(CompileErrorKind::MisplacedRepeat(body.to_string())),
            None => part,
        };
        actions.push(parse_action(body)?);
    }

    Ok(ActionChain::new(actions, repeat_tail))
}

fn parse_action(body: &str) -> KindResult<CompletionAction> {
    match body {
        "" => Ok(CompletionAction::Empty),
        "-" => Ok(CompletionAction::Literal),
        _ => {
            if let Some(name) = body.strip_suffix("()") {
                validate_name(name)?;
                Ok(CompletionAction::Function(name.to_string()))
            } else if body.contains('(') {
                Err(CompileErrorKind::UnterminatedFunction(body.to_string()))
            } else {
                validate_name(body)?;
                Ok(CompletionAction::NamedState(body.to_string()))
            }
        }
    }
}

fn validate_spelling(spelling: &str) -> KindResult<()> {
    if spelling.is_empty() {
        return Err(CompileErrorKind::EmptySpelling);
    }
    if !spelling.starts_with('-')
        || spelling == "-"
        || spelling.chars().any(|c| c.is_whitespace() || "{},:()".contains(c))
    {
        return Err(CompileErrorKind::InvalidSpelling(spelling.to_string()));
    }
    Ok(())
}

fn validate_name(name: &str) -> KindResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    if valid_start && chars.all(|c| c.is_alphanumeric() || "_-.".contains(c)) {
        Ok(())
    } else {
        Err(CompileErrorKind::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(tokens: &[&str]) -> CompileErrorKind {
        compile(tokens).unwrap_err().kind
    }

    #[test]
    fn test_plain_flag() {
        let grammar = compile(&["--help"]).unwrap();
        let flag = grammar.flag("--help").unwrap();
        assert!(!flag.takes_arguments());
        assert!(!flag.is_repeatable());
        assert_eq!(flag.group(), Some("--help"));
    }

    #[test]
    fn test_flag_chain() {
        let grammar = compile(&["--arg:name:value"]).unwrap();
        let chain = grammar.flag("--arg").unwrap().chain();
        assert_eq!(
            chain.actions(),
            [
                CompletionAction::state("name"),
                CompletionAction::state("value")
            ]
        );
        assert!(!chain.repeats_tail());
    }

    #[test]
    fn test_action_kinds() {
        let grammar = compile(&["-x::-:files():state"]).unwrap();
        assert_eq!(
            grammar.flag("-x").unwrap().chain().actions(),
            [
                CompletionAction::Empty,
                CompletionAction::Literal,
                CompletionAction::function("files"),
                CompletionAction::state("state"),
            ]
        );
    }

    #[test]
    fn test_repeating_tail() {
        let grammar = compile(&["-I:*dir"]).unwrap();
        let chain = grammar.flag("-I").unwrap().chain();
        assert!(chain.repeats_tail());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_misplaced_repeat() {
        assert_eq!(
            kind_of(&["-x:*a:b"]),
            CompileErrorKind::MisplacedRepeat("a".to_string())
        );
    }

    #[test]
    fn test_repeatable_flag() {
        let grammar = compile(&["*{-v,--verbose}"]).unwrap();
        let flag = grammar.flag("--verbose").unwrap();
        assert!(flag.is_repeatable());
        assert_eq!(flag.group(), None);
    }

    #[test]
    fn test_alias_set_shares_record() {
        let grammar = compile(&["{-o,--output}:file"]).unwrap();
        assert_eq!(grammar.flag_id("-o"), grammar.flag_id("--output"));
        assert_eq!(grammar.flags().len(), 1);
        assert_eq!(grammar.flag("-o").unwrap().canonical(), "-o");
    }

    #[test]
    fn test_alias_added_later_joins_record() {
        let grammar = compile(&["{-i,--install}:pkg", "{--install,-I}"]).unwrap();
        let flag = grammar.flag("-I").unwrap();
        assert_eq!(flag.spellings(), ["-i", "--install", "-I"]);
        // No new actions were listed, the chain is kept.
        assert_eq!(flag.chain().first(), Some(&CompletionAction::state("pkg")));
        assert_eq!(grammar.flags().len(), 1);
    }

    #[test]
    fn test_conflicting_aliases() {
        let kind = kind_of(&["-a", "-b", "{-a,-b,-c}"]);
        assert_eq!(
            kind,
            CompileErrorKind::ConflictingAliases {
                first: "-a".to_string(),
                second: "-b".to_string()
            }
        );
    }

    #[test]
    fn test_redeclaring_existing_flags_updates_each() {
        let grammar = compile(&["-a", "-b", "(ab){-a,-b}"]).unwrap();
        assert_eq!(grammar.flags().len(), 2);
        assert_eq!(grammar.flag("-a").unwrap().group(), Some("ab"));
        assert_eq!(grammar.flag("-b").unwrap().group(), Some("ab"));
        assert_eq!(grammar.group("ab").unwrap().members().len(), 2);
    }

    #[test]
    fn test_named_set_expansion() {
        let grammar = compile(&[
            "+ops",
            "--sync",
            "--query",
            "--remove",
            "+",
            "--verbose",
            "(op){@ops}",
        ])
        .unwrap();

        assert_eq!(
            grammar.named_set("ops").unwrap(),
            ["--sync", "--query", "--remove"]
        );
        let group = grammar.group("op").unwrap();
        assert_eq!(group.members().len(), 3);
        assert!(!group.members().contains("--verbose"));
        assert_eq!(grammar.flag("--verbose").unwrap().group(), Some("--verbose"));
    }

    #[test]
    fn test_unknown_named_set() {
        assert_eq!(
            kind_of(&["{@nope}"]),
            CompileErrorKind::UnknownNamedSet("nope".to_string())
        );
    }

    #[test]
    fn test_group_errors() {
        assert_eq!(kind_of(&["(mode-i"]), CompileErrorKind::UnterminatedGroup);
        assert_eq!(kind_of(&["()-i"]), CompileErrorKind::EmptyGroupId);
        assert_eq!(
            kind_of(&["(mode)install"]),
            CompileErrorKind::InvalidSpelling("install".to_string())
        );
        assert_eq!(kind_of(&["(mode)"]), CompileErrorKind::EmptySpelling);
    }

    #[test]
    fn test_token_form_errors() {
        assert_eq!(kind_of(&[""]), CompileErrorKind::EmptyToken);
        assert_eq!(kind_of(&["install"]), CompileErrorKind::UnknownForm);
        assert_eq!(kind_of(&["{-a,-b"]), CompileErrorKind::UnterminatedAliasSet);
        assert_eq!(kind_of(&["{}"]), CompileErrorKind::EmptySpelling);
        assert_eq!(
            kind_of(&["-x:files(x"]),
            CompileErrorKind::UnterminatedFunction("files(x".to_string())
        );
        assert_eq!(
            kind_of(&["-x:bad name"]),
            CompileErrorKind::InvalidName("bad name".to_string())
        );
        assert_eq!(
            kind_of(&["+bad set"]),
            CompileErrorKind::InvalidName("bad set".to_string())
        );
    }

    #[test]
    fn test_error_carries_index() {
        let err = compile(&["-a", "-b", "(x"]).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.token, "(x");
    }

    #[test]
    fn test_slots() {
        let grammar = compile(&[":target", ":*files()", ":", ":*"]).unwrap();
        let slots = grammar.slots();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].action(), CompletionAction::state("target"));
        assert!(!slots[0].is_repeatable());
        assert_eq!(slots[1].action(), CompletionAction::function("files"));
        assert!(slots[1].is_repeatable());
        assert_eq!(slots[2].action(), CompletionAction::Empty);
        assert!(slots[3].is_repeatable());
    }

    #[test]
    fn test_slot_chain() {
        let grammar = compile(&[":key:value"]).unwrap();
        assert_eq!(grammar.slots()[0].chain().len(), 2);
    }
}
