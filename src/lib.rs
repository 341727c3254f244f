//! compline - declarative shell completion
//!
//! Tools describe their command line with compact grammar tokens such as
//! `(mode){-i,--install}` or `--level:level`. compline compiles the tokens,
//! walks the words the user has typed against the grammar and resolves the
//! word under the cursor into suggestions.
//!
//! # Modules
//!
//! - `grammar`: Token compiler and compiled grammar
//! - `interpreter`: Walks typed words into a per-request parse result
//! - `dispatch`: Turns the cursor word's action into suggestions
//! - `driver`: Picks grammars and resolvers per request, spec files
//! - `config`: Configuration management
//! - `cli`: Command-line interface and shell integration
//! - `error`: Error types and handling
//!
//! # Example
//!
//! ```
//! use compline::dispatch::{ResolverRegistry, StaticWords};
//! use compline::driver::{CompletionEngine, GrammarDriver};
//!
//! let mut resolvers = ResolverRegistry::new();
//! resolvers.register_state("package", StaticWords::new(["vim", "vlc", "emacs"]));
//!
//! let driver = GrammarDriver::from_tokens(
//!     &["(mode){-i,--install}", "(mode){-u,--upgrade}", ":*package"],
//!     resolvers,
//! )
//! .unwrap();
//!
//! let engine = CompletionEngine::new(driver);
//! let suggestions = engine.complete(&["pkg", "--install", "v"], 2).unwrap();
//! assert_eq!(suggestions, ["vim", "vlc"]);
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod interpreter;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{Resolution, Resolver, ResolverRegistry};
pub use driver::{CompletionEngine, Driver, GrammarDriver, SpecFileDriver};
pub use error::{ComplineError, Result};
pub use grammar::{CompletionAction, Grammar, compile};
pub use interpreter::{ParseResult, interpret};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
