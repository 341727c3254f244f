//! Driver reading grammars and state resolvers from a TOML spec file
//!
//! ```toml
//! [commands.pkg]
//! tokens = ["(mode){-i,--install}", "(mode){-u,--upgrade}", ":*package"]
//!
//! [commands.pkg.states.package]
//! command = ["pkg", "list", "--available"]
//! cache_ttl_secs = 60
//!
//! [commands.pkg.states.level]
//! words = ["low", "high"]
//!
//! [commands.pkg.subcommands.remote]
//! tokens = ["-v", ":name"]
//! ```
//!
//! Every grammar is compiled when the file is loaded, so a broken token is
//! reported once with its command path instead of on every key press.
//! Subcommands inherit the states of their parent, and a command with
//! subcommands gets a `subcommands` state listing their names.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{Driver, Selection};
use crate::dispatch::{
    CachedResolver, CommandResolver, DEFAULT_COMMAND_TIMEOUT, MatchPolicy, Resolution, Resolver,
    ResolverRegistry, StaticWords, resolver_fn,
};
use crate::error::{ComplineError, Result, SpecError};
use crate::grammar::{Grammar, compile};
use crate::interpreter::{WordRole, interpret};

/// Name of the state listing a command's subcommands
pub const SUBCOMMANDS_STATE: &str = "subcommands";

/// Defaults applied to states that do not set their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSettings {
    /// Timeout for `command` states
    pub command_timeout: Duration,

    /// Cache lifetime for `command` states, zero disables caching
    pub cache_ttl: Duration,
}

impl Default for SpecSettings {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            cache_ttl: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecDocument {
    #[serde(default)]
    commands: BTreeMap<String, CommandSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandSpec {
    #[serde(default)]
    tokens: Vec<String>,

    #[serde(default)]
    states: BTreeMap<String, StateSpec>,

    #[serde(default)]
    subcommands: BTreeMap<String, CommandSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StateSpec {
    command: Option<Vec<String>>,
    words: Option<Vec<String>>,
    function: Option<String>,
    state: Option<String>,
    cache_ttl_secs: Option<u64>,
    timeout_ms: Option<u64>,

    #[serde(default, rename = "match")]
    matching: MatchKind,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MatchKind {
    #[default]
    Prefix,
    Path,
}

impl MatchKind {
    fn policy(self) -> MatchPolicy {
        match self {
            MatchKind::Prefix => MatchPolicy::Prefix,
            MatchKind::Path => MatchPolicy::Path,
        }
    }
}

/// Compiled command with its resolvers and subcommands
#[derive(Debug)]
struct CommandNode {
    grammar: Arc<Grammar>,
    resolvers: Arc<ResolverRegistry>,
    subcommands: BTreeMap<String, CommandNode>,
}

/// Driver for the tools described in a spec file
#[derive(Debug, Default)]
pub struct SpecFileDriver {
    commands: BTreeMap<String, CommandNode>,
}

impl SpecFileDriver {
    /// Load a spec file from disk
    ///
    /// # Arguments
    /// * `path` - Path to the TOML spec file
    /// * `settings` - Defaults for states that do not set their own
    ///
    /// # Returns
    /// * `Result<Self>` - Driver, or the first read, parse or compile error
    pub fn load(path: impl AsRef<Path>, settings: &SpecSettings) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SpecError::NotFound(path.display().to_string()).into(),
            _ => ComplineError::Io(e),
        })?;

        let driver = Self::from_toml_str(&content, settings)?;
        info!(path = %path.display(), commands = driver.commands.len(), "loaded spec file");
        Ok(driver)
    }

    /// Parse a spec file with the built-in functions available
    pub fn from_toml_str(content: &str, settings: &SpecSettings) -> Result<Self> {
        Self::with_registry(content, settings, ResolverRegistry::with_builtins())
    }

    /// Parse a spec file on top of a caller-supplied registry
    ///
    /// States and functions already in `registry` are visible to every
    /// command and can be named by `function = "..."` states.
    pub fn with_registry(
        content: &str,
        settings: &SpecSettings,
        registry: ResolverRegistry,
    ) -> Result<Self> {
        let document: SpecDocument = toml::from_str(content)?;

        let commands = document
            .commands
            .into_iter()
            .map(|(name, spec)| {
                let node = build_node(&name, spec, &registry, settings)?;
                Ok((name, node))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { commands })
    }

    /// Names of the top-level commands, sorted
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Grammar of a command path such as `["pkg", "remote"]`
    pub fn grammar<S: AsRef<str>>(&self, path: &[S]) -> Option<&Arc<Grammar>> {
        self.node(path).map(|node| &node.grammar)
    }

    /// Registered state names of a command path
    pub fn states<S: AsRef<str>>(&self, path: &[S]) -> Option<Vec<String>> {
        self.node(path).map(|node| {
            node.resolvers
                .state_names()
                .into_iter()
                .map(str::to_string)
                .collect()
        })
    }

    /// Every command path in the file, parents before children
    pub fn command_paths(&self) -> Vec<Vec<String>> {
        fn walk(
            prefix: &[String],
            nodes: &BTreeMap<String, CommandNode>,
            out: &mut Vec<Vec<String>>,
        ) {
            for (name, node) in nodes {
                let mut path = prefix.to_vec();
                path.push(name.clone());
                out.push(path.clone());
                walk(&path, &node.subcommands, out);
            }
        }

        let mut paths = Vec::new();
        walk(&[], &self.commands, &mut paths);
        paths
    }

    fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.commands.get(first.as_ref())?;
        for name in rest {
            node = node.subcommands.get(name.as_ref())?;
        }
        Some(node)
    }
}

impl Driver for SpecFileDriver {
    fn select(&self, words: &[String], cursor: usize) -> Result<Selection> {
        let command = words.first().map(|w| command_name(w)).unwrap_or_default();
        let mut node = self
            .commands
            .get(command)
            .ok_or_else(|| SpecError::UnknownCommand(command.to_string()))?;
        let mut offset = 0;

        // Descend while the first positional word before the cursor names a
        // subcommand.
        while !node.subcommands.is_empty() {
            let typed = &words[offset..cursor.clamp(offset, words.len())];
            let parse = interpret(&node.grammar, typed, typed.len());
            let child = parse
                .words()
                .find(|(index, class)| {
                    *index > 0 && *index < typed.len() && class.role == WordRole::Positional
                })
                .and_then(|(index, _)| {
                    node.subcommands
                        .get(&typed[index])
                        .map(|child| (index, child))
                });

            match child {
                Some((index, child)) => {
                    debug!(subcommand = %typed[index], offset = offset + index, "descending");
                    node = child;
                    offset += index;
                }
                None => break,
            }
        }

        Ok(Selection {
            grammar: node.grammar.clone(),
            offset,
            resolvers: node.resolvers.clone(),
        })
    }
}

/// Basename of a command word, `/usr/bin/pkg` becomes `pkg`
pub fn command_name(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

fn build_node(
    path: &str,
    spec: CommandSpec,
    parent: &ResolverRegistry,
    settings: &SpecSettings,
) -> Result<CommandNode> {
    let grammar = compile(&spec.tokens).map_err(|source| SpecError::Grammar {
        command: path.to_string(),
        source,
    })?;

    let mut resolvers = parent.clone();
    for (name, state) in spec.states {
        register_state(&mut resolvers, path, &name, state, settings)?;
    }

    // Children inherit the states, not the subcommand list.
    let inherited = resolvers.clone();
    if !spec.subcommands.is_empty() {
        resolvers.register_state(
            SUBCOMMANDS_STATE,
            StaticWords::new(spec.subcommands.keys().cloned()),
        );
    }

    let subcommands = spec
        .subcommands
        .into_iter()
        .map(|(name, child)| {
            let node = build_node(&format!("{path} {name}"), child, &inherited, settings)?;
            Ok((name, node))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    debug!(command = path, states = resolvers.state_names().len(), "built command");

    Ok(CommandNode {
        grammar: Arc::new(grammar),
        resolvers: Arc::new(resolvers),
        subcommands,
    })
}

fn register_state(
    resolvers: &mut ResolverRegistry,
    command: &str,
    name: &str,
    spec: StateSpec,
    settings: &SpecSettings,
) -> Result<()> {
    let invalid = |reason: String| SpecError::InvalidState {
        command: command.to_string(),
        state: name.to_string(),
        reason,
    };

    let StateSpec {
        command: argv,
        words,
        function,
        state,
        cache_ttl_secs,
        timeout_ms,
        matching,
    } = spec;

    let defined = [argv.is_some(), words.is_some(), function.is_some(), state.is_some()]
        .into_iter()
        .filter(|defined| *defined)
        .count();
    if defined != 1 {
        return Err(invalid(
            "expected exactly one of `command`, `words`, `function` or `state`".to_string(),
        )
        .into());
    }

    let policy = matching.policy();

    if let Some(argv) = argv {
        let timeout = timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(settings.command_timeout);
        let resolver = CommandResolver::new(argv)
            .ok_or_else(|| invalid("`command` is empty".to_string()))?
            .with_timeout(timeout)
            .with_policy(policy);

        let ttl = cache_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(settings.cache_ttl);
        if ttl.is_zero() {
            resolvers.register_state(name, resolver);
        } else {
            resolvers.register_state(name, CachedResolver::new(resolver, ttl));
        }
    } else if let Some(words) = words {
        resolvers.register_state(name, StaticWords::new(words).with_policy(policy));
    } else if let Some(function) = function {
        let target = resolvers
            .function(&function)
            .cloned()
            .ok_or_else(|| invalid(format!("unknown function `{function}`")))?;
        resolvers.register_state(name, resolver_fn(move |ctx| target.resolve(ctx)));
    } else if let Some(target) = state {
        if target == name {
            return Err(invalid("state refers to itself".to_string()).into());
        }
        resolvers.register_state(name, resolver_fn(move |_| Resolution::State(target.clone())));
    }

    Ok(())
}
