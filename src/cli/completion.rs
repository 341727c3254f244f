//! Shell integration scripts
//!
//! Each script has two parts: the clap-generated completion for `compline`
//! itself, and a `compline_register` helper that hooks any other command up
//! to `compline complete`:
//!
//! ```bash
//! eval "$(compline completion bash)"
//! compline_register pkg            # spec looked up as pkg.toml
//! compline_register git ~/git.toml
//! ```

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::cli::CliArgs;
use crate::error::{ComplineError, Result};

const BASH_HELPER: &str = r#"
# compline dispatch for registered commands
declare -gA _COMPLINE_SPECS

_compline_dispatch() {
    local cmd="${1##*/}"
    local spec="${_COMPLINE_SPECS[$cmd]:-$cmd}"
    local IFS=$'\n'
    COMPREPLY=($(compline complete --spec "$spec" --cursor "$COMP_CWORD" -- "${COMP_WORDS[@]}" 2>/dev/null))
    if [[ ${#COMPREPLY[@]} -eq 1 && ${COMPREPLY[0]} == */ ]]; then
        compopt -o nospace
    fi
}

# Usage: compline_register <command> [spec]
compline_register() {
    _COMPLINE_SPECS[$1]="${2:-$1}"
    complete -F _compline_dispatch "$1"
}
"#;

const ZSH_HELPER: &str = r#"
# compline dispatch for registered commands
typeset -gA _compline_specs

_compline_dispatch() {
    local cmd=${words[1]:t}
    local spec=${_compline_specs[$cmd]:-$cmd}
    local -a suggestions
    suggestions=("${(@f)$(compline complete --spec "$spec" --cursor $((CURRENT - 1)) -- "${words[@]}" 2>/dev/null)}")
    suggestions=(${suggestions:#})
    compadd -Q -a suggestions
}

# Usage: compline_register <command> [spec]
compline_register() {
    _compline_specs[$1]=${2:-$1}
    compdef _compline_dispatch $1
}
"#;

const FISH_HELPER: &str = r#"
# compline dispatch for registered commands
function __compline_dispatch
    set -l tokens (commandline -opc) (commandline -ct)
    compline complete --spec $argv[1] --cursor (math (count $tokens) - 1) -- $tokens 2>/dev/null
end

# Usage: compline_register <command> [spec]
function compline_register
    set -l spec $argv[1]
    set -q argv[2]; and set spec $argv[2]
    complete -c $argv[1] -f -a "(__compline_dispatch $spec)"
end
"#;

/// Generate the shell integration script
///
/// # Arguments
/// * `shell_name` - Shell type (bash, zsh, fish)
///
/// # Returns
/// * `Result<String>` - Script text or error for unsupported shells
pub fn generate_completion(shell_name: &str) -> Result<String> {
    let shell = parse_shell(shell_name)?;

    let mut cmd = CliArgs::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, "compline", &mut buffer);

    let helper = match shell {
        Shell::Bash => BASH_HELPER,
        Shell::Zsh => ZSH_HELPER,
        _ => FISH_HELPER,
    };

    Ok(format!("{}{helper}", String::from_utf8_lossy(&buffer)))
}

/// Parse shell name string to Shell enum
fn parse_shell(shell_name: &str) -> Result<Shell> {
    match shell_name.to_lowercase().as_str() {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(ComplineError::Generic(format!(
            "Unsupported shell: {shell_name}. Supported shells: bash, zsh, fish"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert!(matches!(parse_shell("bash"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("zsh"), Ok(Shell::Zsh)));
        assert!(matches!(parse_shell("fish"), Ok(Shell::Fish)));
        assert!(parse_shell("invalid").is_err());
    }

    #[test]
    fn test_parse_shell_case_insensitive() {
        assert!(matches!(parse_shell("BASH"), Ok(Shell::Bash)));
        assert!(matches!(parse_shell("FiSh"), Ok(Shell::Fish)));
    }

    #[test]
    fn test_scripts_include_register_helper() {
        for shell in ["bash", "zsh", "fish"] {
            let script = generate_completion(shell).unwrap();
            assert!(script.contains("compline_register"), "{shell}");
            assert!(script.contains("compline complete --spec"), "{shell}");
        }
    }

    #[test]
    fn test_bash_script_completes_compline_itself() {
        let script = generate_completion("bash").unwrap();
        assert!(script.contains("_compline()"));
        assert!(script.contains("complete -F _compline_dispatch"));
    }
}
