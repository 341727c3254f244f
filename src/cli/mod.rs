//! Command-line interface for compline
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and verbosity overrides
//! - Running completion requests against spec files
//! - Printing shell integration scripts

pub mod completion;

use clap::{ArgAction, Args, Parser, Subcommand};
use nu_ansi_term::{Color, Style};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::config::{Config, LogLevel};
use crate::driver::{CompletionEngine, Explanation, SpecFileDriver};
use crate::error::{ComplineError, Result, SpecError};
use crate::grammar::CompletionAction;
use crate::interpreter::WordRole;

/// compline - declarative shell completion
#[derive(Parser, Debug)]
#[command(
    name = "compline",
    version,
    about = "Declarative shell completion engine",
    long_about = "Completes command lines for tools described by compact grammar tokens.
Grammars and their state resolvers are read from TOML spec files; shells call
`compline complete` through the helper printed by `compline completion <shell>`."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for compline
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print completions for the word at the cursor, one per line
    Complete(RequestArgs),

    /// Show how the words were classified and what would be suggested
    Explain {
        #[command(flatten)]
        request: RequestArgs,

        /// Print the explanation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a spec file and list the commands it defines
    Check {
        /// Spec file path, or name looked up in the spec directory
        #[arg(short = 's', long, value_name = "SPEC")]
        spec: String,
    },

    /// Print the normalized grammar tokens of a command
    Tokens {
        /// Spec file path, or name looked up in the spec directory
        #[arg(short = 's', long, value_name = "SPEC")]
        spec: String,

        /// Command path, for example `pkg remote`
        #[arg(value_name = "COMMAND", required = true)]
        command: Vec<String>,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// Arguments shared by `complete` and `explain`
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Spec file path, or name looked up in the spec directory
    #[arg(short = 's', long, value_name = "SPEC")]
    pub spec: String,

    /// Index of the word being completed (defaults to the last word)
    #[arg(long, value_name = "INDEX")]
    pub cursor: Option<usize>,

    /// Words of the command line after `--`, command word first
    #[arg(last = true, value_name = "WORDS")]
    pub words: Vec<String>,
}

impl RequestArgs {
    /// The cursor index, defaulting to the last word
    pub fn cursor(&self) -> usize {
        self.cursor
            .unwrap_or_else(|| self.words.len().saturating_sub(1))
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from parsed arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Self>` - CLI interface, or an error if the configuration is broken
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Config::load(args.config_file.as_deref())?;
        Ok(Self { args, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Effective log level after `-v` and `-q`
    pub fn log_level(&self) -> LogLevel {
        if self.args.quiet {
            LogLevel::Error
        } else {
            self.config.logging.level.raised(self.args.verbose)
        }
    }

    /// Whether human-readable output should be colored
    pub fn use_color(&self) -> bool {
        !self.args.no_color && std::io::stdout().is_terminal()
    }

    /// Run the selected subcommand
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn run(&self) -> Result<()> {
        match &self.args.command {
            Commands::Complete(request) => {
                for suggestion in self.complete(request)? {
                    println!("{suggestion}");
                }
            }
            Commands::Explain { request, json } => {
                let explanation = self.explain(request)?;
                if *json {
                    let text = serde_json::to_string_pretty(&explanation)
                        .map_err(|e| ComplineError::Generic(e.to_string()))?;
                    println!("{text}");
                } else {
                    print!("{}", render_explanation(&explanation, self.use_color()));
                }
            }
            Commands::Check { spec } => print!("{}", self.check(spec)?),
            Commands::Tokens { spec, command } => {
                for token in self.tokens(spec, command)? {
                    println!("{token}");
                }
            }
            Commands::Completion { shell } => {
                print!("{}", completion::generate_completion(shell)?);
            }
            Commands::Config { show, validate } => {
                self.handle_config_command(*show, *validate)?;
            }
        }

        Ok(())
    }

    /// Complete the requested word
    ///
    /// # Arguments
    /// * `request` - Spec, cursor and words
    ///
    /// # Returns
    /// * `Result<Vec<String>>` - Suggestions, or an error for a broken spec or unknown command
    pub fn complete(&self, request: &RequestArgs) -> Result<Vec<String>> {
        self.engine(&request.spec)?
            .complete(&request.words, request.cursor())
    }

    /// Complete the requested word and report how it was classified
    pub fn explain(&self, request: &RequestArgs) -> Result<Explanation> {
        self.engine(&request.spec)?
            .explain(&request.words, request.cursor())
    }

    /// Load a spec file and describe every command in it
    ///
    /// # Returns
    /// * `Result<String>` - Report text, or the first load error
    pub fn check(&self, spec: &str) -> Result<String> {
        let path = self.config.resolve_spec_path(spec);
        let driver = self.load_driver(spec)?;

        let mut report = format!("✅ {} is valid\n", path.display());
        for command in driver.command_paths() {
            let states = driver.states(&command).unwrap_or_default();
            report.push_str(&format!(
                "   {} ({} states)\n",
                command.join(" "),
                states.len()
            ));
        }
        Ok(report)
    }

    /// Normalized tokens of the grammar for `command`
    pub fn tokens(&self, spec: &str, command: &[String]) -> Result<Vec<String>> {
        let driver = self.load_driver(spec)?;
        let grammar = driver
            .grammar(command)
            .ok_or_else(|| SpecError::UnknownCommand(command.join(" ")))?;
        Ok(grammar.to_tokens())
    }

    fn load_driver(&self, spec: &str) -> Result<SpecFileDriver> {
        let path = self.config.resolve_spec_path(spec);
        SpecFileDriver::load(path, &self.config.spec_settings())
    }

    fn engine(&self, spec: &str) -> Result<CompletionEngine<SpecFileDriver>> {
        Ok(CompletionEngine::new(self.load_driver(spec)?)
            .with_max_depth(self.config.resolver.max_delegation_depth))
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("❌ Configuration file does not exist");
            return;
        }

        match Config::from_file(&path) {
            Ok(_) => println!("✅ Configuration is valid"),
            Err(e) => println!("❌ {e}"),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        println!("# Configuration file: {}", self.config_path().display());
        println!();
        print!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Get configuration file path (from args or default)
    fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}

/// Render an explanation for a terminal
///
/// # Arguments
/// * `explanation` - Result of [`CompletionEngine::explain`]
/// * `color` - Emit ANSI colors
///
/// # Returns
/// * `String` - Multi-line report
pub fn render_explanation(explanation: &Explanation, color: bool) -> String {
    let paint = |style: Style, text: &str| {
        if color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    };
    let label = |name: &str| paint(Color::Cyan.bold(), &format!("{name:<12}"));

    let mut words: Vec<String> = explanation
        .words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            if index == explanation.cursor {
                paint(Style::new().bold().underline(), &format!("[{word}]"))
            } else {
                word.clone()
            }
        })
        .collect();
    if explanation.cursor >= explanation.words.len() {
        words.push(paint(Style::new().bold(), "[]"));
    }

    let parse = &explanation.parse;

    let mut out = String::new();
    out.push_str(&format!("{}{}\n", label("words"), words.join(" ")));
    if explanation.offset > 0 {
        out.push_str(&format!("{}{}\n", label("subcommand"), explanation.offset));
    }
    out.push_str(&format!(
        "{}{}\n",
        label("role"),
        describe_role(explanation.role)
    ));
    out.push_str(&format!(
        "{}{}\n",
        label("action"),
        paint(Color::Yellow.normal(), &describe_action(&explanation.action))
    ));
    out.push_str(&format!("{}{}\n", label("flags"), join(&parse.opts)));
    out.push_str(&format!(
        "{}{}\n",
        label("excluded"),
        paint(Color::DarkGray.normal(), &join(&parse.excluded))
    ));
    out.push_str(&format!("{}{}\n", label("positional"), join(&parse.line)));
    out.push_str(&format!(
        "{}{}\n",
        label("suggestions"),
        explanation.suggestions.len()
    ));
    for suggestion in &explanation.suggestions {
        out.push_str(&format!("  {}\n", paint(Color::Green.normal(), suggestion)));
    }
    out
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe_action(action: &CompletionAction) -> String {
    match action {
        CompletionAction::Literal => "literal flags".to_string(),
        CompletionAction::NamedState(name) => format!("state {name}"),
        CompletionAction::Function(name) => format!("function {name}()"),
        CompletionAction::Empty => "nothing".to_string(),
    }
}

fn describe_role(role: Option<WordRole>) -> &'static str {
    match role {
        Some(WordRole::Command) => "command",
        Some(WordRole::Flag) => "flag",
        Some(WordRole::OptionArgument) => "option argument",
        Some(WordRole::Positional) => "positional",
        None => "none",
    }
}
