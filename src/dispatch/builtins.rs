//! Built-in function resolvers
//!
//! `files()` and `dirs()` list the directory named by the partial word,
//! `executables()` lists the programs found on `$PATH`. Listing errors are
//! logged and produce an empty set.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::resolver::{ResolveContext, Resolution};

const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/usr/local/sbin:/sbin";

/// Complete file and directory names
pub fn files(ctx: &ResolveContext<'_>) -> Resolution {
    Resolution::paths(list_directory(ctx.partial, false))
}

/// Complete directory names only
pub fn dirs(ctx: &ResolveContext<'_>) -> Resolution {
    Resolution::paths(list_directory(ctx.partial, true))
}

/// Complete program names from `$PATH`
///
/// A partial word containing a slash is a path, not a program name, and is
/// completed like `files()`.
pub fn executables(ctx: &ResolveContext<'_>) -> Resolution {
    if ctx.partial.contains('/') {
        return files(ctx);
    }

    let path = std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());
    let mut names = BTreeSet::new();

    for dir in std::env::split_paths(&path) {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(ctx.partial) && is_executable(&entry.path()) {
                names.insert(name.to_string());
            }
        }
    }

    Resolution::suggestions(names)
}

/// List the entries of the directory part of `partial`
///
/// Candidates keep the directory part exactly as typed, so `~/` and
/// relative prefixes survive. Directories get a trailing slash.
fn list_directory(partial: &str, dirs_only: bool) -> Vec<String> {
    let dir_part = match partial.rfind('/') {
        Some(pos) => &partial[..=pos],
        None => "",
    };

    let dir = expand_home(dir_part);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list directory");
            return Vec::new();
        }
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let is_dir = entry.path().is_dir();
            if dirs_only && !is_dir {
                return None;
            }
            let slash = if is_dir { "/" } else { "" };
            Some(format!("{dir_part}{name}{slash}"))
        })
        .collect()
}

fn expand_home(dir_part: &str) -> PathBuf {
    if dir_part.is_empty() {
        return PathBuf::from(".");
    }

    if let Some(rest) = dir_part.strip_prefix("~/")
        && let Some(home) = ::dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(dir_part)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
