use std::{fmt, io};

/// Crate-wide `Result` type using [`ComplineError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ComplineError>;

/// Top-level error type for compline operations.
///
/// Only grammar authors and configuration files can produce these. Anything
/// derived from what the user typed on the command line degrades to an
/// empty suggestion set instead of an error.
#[derive(Debug)]
pub enum ComplineError {
    /// Malformed grammar token.
    Compile(CompileError),

    /// Spec file errors.
    Spec(SpecError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// TOML deserialization errors.
    Toml(toml::de::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Grammar compilation errors.
///
/// Every variant carries the position of the offending token in the token
/// list together with its text, so a driver author can find it quickly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Index of the token in the compiled sequence.
    pub index: usize,

    /// The offending token, verbatim.
    pub token: String,

    /// What is wrong with it.
    pub kind: CompileErrorKind,
}

/// The specific reason a grammar token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The token is empty.
    EmptyToken,

    /// The token does not start with any recognized marker.
    UnknownForm,

    /// `(` without a matching `)`.
    UnterminatedGroup,

    /// `()` with nothing inside.
    EmptyGroupId,

    /// `{` without a matching `}`.
    UnterminatedAliasSet,

    /// An alias set or flag token without a spelling.
    EmptySpelling,

    /// A flag spelling that does not start with `-`.
    InvalidSpelling(String),

    /// `@name` referring to a named set that was never declared.
    UnknownNamedSet(String),

    /// An alias set whose spellings already belong to different flags.
    ConflictingAliases { first: String, second: String },

    /// A state, function, group or set name with invalid characters.
    InvalidName(String),

    /// A repeating marker on an action that is not the last of its chain.
    MisplacedRepeat(String),

    /// A function action with an opening `(` but no `()` suffix.
    UnterminatedFunction(String),
}

/// Spec file errors.
#[derive(Debug)]
pub enum SpecError {
    /// The command is not described by the spec file.
    UnknownCommand(String),

    /// A state definition is missing a resolver or defines several.
    InvalidState { command: String, state: String, reason: String },

    /// A grammar inside the spec file failed to compile.
    Grammar { command: String, source: CompileError },

    /// The spec file could not be found.
    NotFound(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Generic configuration error.
    Generic(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ComplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplineError::Compile(e) => write!(f, "Grammar error: {e}"),
            ComplineError::Spec(e) => write!(f, "Spec error: {e}"),
            ComplineError::Config(e) => write!(f, "Configuration error: {e}"),
            ComplineError::Io(e) => write!(f, "I/O error: {e}"),
            ComplineError::Toml(e) => write!(f, "TOML error: {e}"),
            ComplineError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token #{} `{}`: {}", self.index, self.token, self.kind)
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorKind::EmptyToken => write!(f, "empty token"),
            CompileErrorKind::UnknownForm => {
                write!(f, "expected a flag, positional slot or `+` set switch")
            }
            CompileErrorKind::UnterminatedGroup => {
                write!(f, "unterminated exclusion-group prefix")
            }
            CompileErrorKind::EmptyGroupId => write!(f, "empty exclusion-group id"),
            CompileErrorKind::UnterminatedAliasSet => write!(f, "unterminated alias set"),
            CompileErrorKind::EmptySpelling => write!(f, "missing flag spelling"),
            CompileErrorKind::InvalidSpelling(s) => {
                write!(f, "flag spelling '{s}' must start with '-'")
            }
            CompileErrorKind::UnknownNamedSet(name) => write!(f, "unknown named set '@{name}'"),
            CompileErrorKind::ConflictingAliases { first, second } => {
                write!(f, "'{first}' and '{second}' already name different flags")
            }
            CompileErrorKind::InvalidName(name) => write!(f, "invalid name '{name}'"),
            CompileErrorKind::MisplacedRepeat(action) => {
                write!(f, "only the last action may repeat, found '*{action}'")
            }
            CompileErrorKind::UnterminatedFunction(action) => {
                write!(f, "function action '{action}' must end with '()'")
            }
        }
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::UnknownCommand(cmd) => write!(f, "No grammar for command: {cmd}"),
            SpecError::InvalidState {
                command,
                state,
                reason,
            } => write!(f, "Invalid state '{state}' in '{command}': {reason}"),
            SpecError::Grammar { command, source } => write!(f, "{command}: {source}"),
            SpecError::NotFound(path) => write!(f, "Spec file not found: {path}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ComplineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComplineError::Compile(e) => Some(e),
            ComplineError::Spec(e) => Some(e),
            ComplineError::Config(e) => Some(e),
            ComplineError::Io(e) => Some(e),
            ComplineError::Toml(e) => Some(e),
            ComplineError::Generic(_) => None,
        }
    }
}
impl std::error::Error for CompileError {}
impl std::error::Error for SpecError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ComplineError ========================= */

impl From<io::Error> for ComplineError {
    fn from(err: io::Error) -> Self {
        ComplineError::Io(err)
    }
}

impl From<toml::de::Error> for ComplineError {
    fn from(err: toml::de::Error) -> Self {
        ComplineError::Toml(err)
    }
}

impl From<CompileError> for ComplineError {
    fn from(err: CompileError) -> Self {
        ComplineError::Compile(err)
    }
}

impl From<SpecError> for ComplineError {
    fn from(err: SpecError) -> Self {
        ComplineError::Spec(err)
    }
}

impl From<ConfigError> for ComplineError {
    fn from(err: ConfigError) -> Self {
        ComplineError::Config(err)
    }
}

impl From<String> for ComplineError {
    fn from(msg: String) -> Self {
        ComplineError::Generic(msg)
    }
}

impl From<&str> for ComplineError {
    fn from(msg: &str) -> Self {
        ComplineError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError {
            index: 2,
            token: "(mode-x".to_string(),
            kind: CompileErrorKind::UnterminatedGroup,
        };
        assert_eq!(
            err.to_string(),
            "token #2 `(mode-x`: unterminated exclusion-group prefix"
        );
    }

    #[test]
    fn test_wrapped_compile_error() {
        let err: ComplineError = CompileError {
            index: 0,
            token: "x".to_string(),
            kind: CompileErrorKind::UnknownForm,
        }
        .into();
        assert!(matches!(err, ComplineError::Compile(_)));
        assert!(err.to_string().starts_with("Grammar error:"));
    }

    #[test]
    fn test_spec_error_display() {
        let err = SpecError::UnknownCommand("pkg".to_string());
        assert_eq!(err.to_string(), "No grammar for command: pkg");
    }
}
