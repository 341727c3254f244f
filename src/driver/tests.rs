use super::*;
use crate::dispatch::{ResolveContext, Resolution, StaticWords, resolver_fn};
use crate::error::{ComplineError, SpecError};
use crate::grammar::CompletionAction;
use crate::interpreter::WordRole;

const PKG_SPEC: &str = r#"
[commands.pkg]
tokens = [
    "(mode){-i,--install}",
    "(mode){-u,--upgrade}",
    "*{-v,--verbose}",
    "--level:level",
    "-C:dirs()",
    ":subcommands",
    ":*package",
]

[commands.pkg.states.package]
words = ["pkg1", "pkg2", "other"]

[commands.pkg.states.level]
words = ["low", "high"]

[commands.pkg.states.priority]
state = "level"

[commands.pkg.subcommands.remote]
tokens = ["-v", ":remote", ":level"]

[commands.pkg.subcommands.remote.states.remote]
words = ["origin", "upstream"]

[commands.pkg.subcommands.remote.subcommands.add]
tokens = ["--name:priority"]

[commands.git]
tokens = ["--version"]
"#;

fn driver() -> SpecFileDriver {
    SpecFileDriver::from_toml_str(PKG_SPEC, &SpecSettings::default()).unwrap()
}

fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn complete(line: &str, cursor: usize) -> Vec<String> {
    CompletionEngine::new(driver())
        .complete(&words(line), cursor)
        .unwrap()
}

#[test]
fn test_install_upgrade_scenario() {
    let engine = CompletionEngine::new(driver());
    let explanation = engine.explain(&words("pkg --install pkg1 pkg2"), 3).unwrap();

    assert_eq!(explanation.action, CompletionAction::state("package"));
    assert_eq!(explanation.parse.line, ["pkg1", "pkg2"]);
    assert!(explanation.parse.is_excluded("--upgrade"));
    assert_eq!(explanation.suggestions, ["pkg2"]);

    let mut line = words("pkg --install pkg1");
    line.push("-".to_string());
    let flags = engine.complete(&line, 3).unwrap();
    assert!(!flags.iter().any(|f| f == "--upgrade" || f == "-u" || f == "--install"));
    assert!(flags.iter().any(|f| f == "--verbose"));
}

#[test]
fn test_arg_chain_scenario() {
    let g = crate::grammar::compile(&["--arg:name:value"]).unwrap();
    let mut resolvers = ResolverRegistry::new();
    resolvers.register_state(
        "value",
        resolver_fn(|ctx: &ResolveContext<'_>| {
            let name = ctx.parse.opt_arg("--arg").unwrap_or_default();
            Resolution::suggestions([format!("{name}=1"), format!("{name}=2")])
        }),
    );

    let engine = CompletionEngine::new(GrammarDriver::new(g, resolvers));
    let explanation = engine.explain(&words("tool --arg foo"), 3).unwrap();

    assert_eq!(explanation.action, CompletionAction::state("value"));
    assert_eq!(explanation.role, Some(WordRole::OptionArgument));
    assert_eq!(explanation.parse.opt_arg("--arg").as_deref(), Some("foo"));
    assert_eq!(explanation.suggestions, ["foo=1", "foo=2"]);
}

#[test]
fn test_literal_flags() {
    let flags = complete("pkg --", 1);
    assert_eq!(flags, ["--install", "--level", "--upgrade", "--verbose"]);
}

#[test]
fn test_subcommand_names() {
    assert_eq!(complete("pkg re", 1), ["remote"]);
}

#[test]
fn test_descends_into_subcommand() {
    let engine = CompletionEngine::new(driver());
    let explanation = engine.explain(&words("pkg -v remote up"), 3).unwrap();

    assert_eq!(explanation.offset, 2);
    assert_eq!(explanation.words, ["remote", "up"]);
    assert_eq!(explanation.cursor, 1);
    assert_eq!(explanation.suggestions, ["upstream"]);
}

#[test]
fn test_subcommand_inherits_parent_states() {
    assert_eq!(complete("pkg remote origin h", 3), ["high"]);
}

#[test]
fn test_nested_subcommand_and_state_alias() {
    let engine = CompletionEngine::new(driver());
    let explanation = engine.explain(&words("pkg remote add --name"), 4).unwrap();
    assert_eq!(explanation.offset, 2);
    assert_eq!(explanation.suggestions, ["high", "low"]);
}

#[test]
fn test_no_descent_at_cursor() {
    // The subcommand word itself is still being typed.
    let engine = CompletionEngine::new(driver());
    let explanation = engine.explain(&words("pkg remote"), 1).unwrap();
    assert_eq!(explanation.offset, 0);
    assert_eq!(explanation.suggestions, ["remote"]);
}

#[test]
fn test_option_argument_is_not_a_subcommand() {
    let engine = CompletionEngine::new(driver());
    let explanation = engine.explain(&words("pkg --level remote x"), 3).unwrap();
    assert_eq!(explanation.offset, 0);
}

#[test]
fn test_command_basename() {
    assert_eq!(command_name("/usr/local/bin/pkg"), "pkg");
    assert_eq!(command_name("pkg"), "pkg");
    assert_eq!(complete("/usr/bin/pkg --ver", 1), ["--verbose"]);
}

#[test]
fn test_unknown_command() {
    let err = CompletionEngine::new(driver())
        .complete(&words("nope x"), 1)
        .unwrap_err();
    assert!(matches!(err, ComplineError::Spec(SpecError::UnknownCommand(ref c)) if c == "nope"));
}

#[test]
fn test_empty_words() {
    let empty: Vec<String> = Vec::new();
    let suggestions = CompletionEngine::new(driver()).complete(&empty, 0).unwrap();
    assert!(suggestions.is_empty());
}

#[test]
fn test_command_paths() {
    let paths = driver().command_paths();
    assert_eq!(
        paths,
        vec![
            vec!["git".to_string()],
            vec!["pkg".to_string()],
            vec!["pkg".to_string(), "remote".to_string()],
            vec!["pkg".to_string(), "remote".to_string(), "add".to_string()],
        ]
    );
}

#[test]
fn test_states_listing() {
    let d = driver();
    let states = d.states(&["pkg"]).unwrap();
    assert_eq!(states, ["level", "package", "priority", "subcommands"]);

    let remote = d.states(&["pkg", "remote"]).unwrap();
    assert!(remote.contains(&"remote".to_string()));
    assert!(remote.contains(&"level".to_string()));
    assert!(remote.contains(&"subcommands".to_string()));

    let add = d.states(&["pkg", "remote", "add"]).unwrap();
    assert!(!add.contains(&"subcommands".to_string()));
}

#[test]
fn test_grammar_lookup_round_trips() {
    let d = driver();
    let grammar = d.grammar(&["pkg", "remote"]).unwrap();
    assert_eq!(grammar.to_tokens(), ["-v", ":remote", ":level"]);
    assert!(d.grammar(&["pkg", "nope"]).is_none());
}

#[test]
fn test_compile_error_names_command() {
    let spec = r#"
[commands.pkg.subcommands.remote]
tokens = ["(broken"]
"#;
    let err = SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).unwrap_err();
    match err {
        ComplineError::Spec(SpecError::Grammar { command, source }) => {
            assert_eq!(command, "pkg remote");
            assert_eq!(source.index, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_state_needs_exactly_one_source() {
    let spec = r#"
[commands.pkg]
tokens = [":x"]

[commands.pkg.states.x]
words = ["a"]
function = "files"
"#;
    let err = SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).unwrap_err();
    assert!(matches!(
        err,
        ComplineError::Spec(SpecError::InvalidState { ref state, .. }) if state == "x"
    ));

    let spec = r#"
[commands.pkg.states.x]
cache_ttl_secs = 3
"#;
    assert!(SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).is_err());
}

#[test]
fn test_unknown_function_state() {
    let spec = r#"
[commands.pkg.states.x]
function = "nope"
"#;
    let err = SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).unwrap_err();
    assert!(err.to_string().contains("unknown function `nope`"));
}

#[test]
fn test_unknown_field_is_rejected() {
    let spec = r#"
[commands.pkg]
tokenz = ["-a"]
"#;
    let err = SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).unwrap_err();
    assert!(matches!(err, ComplineError::Toml(_)));
}

#[test]
fn test_custom_registry() {
    let mut registry = ResolverRegistry::new();
    registry.register_function("hosts", StaticWords::new(["alpha", "beta"]));

    let spec = r#"
[commands.ssh]
tokens = [":host"]

[commands.ssh.states.host]
function = "hosts"
"#;
    let d = SpecFileDriver::with_registry(spec, &SpecSettings::default(), registry).unwrap();
    let suggestions = CompletionEngine::new(d).complete(&words("ssh b"), 1).unwrap();
    assert_eq!(suggestions, ["beta"]);
}

#[test]
fn test_missing_spec_file() {
    let err = SpecFileDriver::load("/definitely/not/here.toml", &SpecSettings::default())
        .unwrap_err();
    assert!(matches!(err, ComplineError::Spec(SpecError::NotFound(_))));
}

#[cfg(unix)]
#[test]
fn test_command_state() {
    let spec = r#"
[commands.pkg]
tokens = [":*package"]

[commands.pkg.states.package]
command = ["printf", "vim\nvlc\nemacs\n"]
cache_ttl_secs = 0
"#;
    let d = SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).unwrap();
    let suggestions = CompletionEngine::new(d).complete(&words("pkg v"), 1).unwrap();
    assert_eq!(suggestions, ["vim", "vlc"]);
}

#[cfg(unix)]
#[test]
fn test_cached_command_state_follows_partial_word() {
    let spec = r#"
[commands.t]
tokens = [":word"]

[commands.t.states.word]
command = ["sh", "-c", "echo \"${COMPLINE_PARTIAL}-x\""]
cache_ttl_secs = 60
"#;
    let d = SpecFileDriver::from_toml_str(spec, &SpecSettings::default()).unwrap();
    let engine = CompletionEngine::new(d);

    assert_eq!(engine.complete(&words("t a"), 1).unwrap(), ["a-x"]);
    assert_eq!(engine.complete(&words("t b"), 1).unwrap(), ["b-x"]);
    assert_eq!(engine.complete(&words("t a"), 1).unwrap(), ["a-x"]);
}

#[test]
fn test_command_states_are_not_cached_by_default() {
    assert!(SpecSettings::default().cache_ttl.is_zero());
}

#[test]
fn test_grammar_driver_from_tokens() {
    let mut resolvers = ResolverRegistry::new();
    resolvers.register_state("level", StaticWords::new(["low", "high"]));
    let d = GrammarDriver::from_tokens(&["--level:level"], resolvers).unwrap();
    let engine = CompletionEngine::new(d);
    assert_eq!(engine.complete(&["tool", "--level", "l"], 2).unwrap(), ["low"]);

    assert!(GrammarDriver::from_tokens(&["(x"], ResolverRegistry::new()).is_err());
}

#[test]
fn test_explanation_serializes() {
    let engine = CompletionEngine::new(driver());
    let explanation = engine.explain(&words("pkg --level"), 2).unwrap();
    let json = serde_json::to_value(&explanation).unwrap();
    assert_eq!(json["action"]["kind"], "named_state");
    assert_eq!(json["action"]["name"], "level");
    assert_eq!(json["role"], "option_argument");
    assert_eq!(json["suggestions"], serde_json::json!(["high", "low"]));
}
