//! Resolver backed by an external command
//!
//! The command prints one suggestion per line on stdout. It runs with a hard
//! timeout; a command that cannot be spawned, exits non-zero or runs past
//! the timeout yields no suggestions.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};
use tracing::debug;

use super::matcher::MatchPolicy;
use super::resolver::{ResolveContext, Resolution, Resolver};

/// Default time an external command may take
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Runs a program and turns its output lines into suggestions
///
/// The program sees the request through the environment:
/// - `COMPLINE_STATE` - state or function name being resolved
/// - `COMPLINE_PARTIAL` - text typed so far for the cursor word
/// - `COMPLINE_LINE` - the interpreted words joined by spaces
#[derive(Debug, Clone)]
pub struct CommandResolver {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    policy: MatchPolicy,
}

impl CommandResolver {
    /// Create a resolver from an argument vector, program first
    ///
    /// # Arguments
    /// * `argv` - Program and its arguments
    ///
    /// # Returns
    /// * `Option<Self>` - `None` when `argv` is empty
    pub fn new<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next()?;

        Some(Self {
            program,
            args: argv.collect(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
            policy: MatchPolicy::Prefix,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the command and collect its output lines
    ///
    /// Never fails: every problem is logged at debug level and returns an
    /// empty list.
    pub fn run(&self, ctx: &ResolveContext<'_>) -> Vec<String> {
        let env = [
            ("COMPLINE_STATE", ctx.state.to_string()),
            ("COMPLINE_PARTIAL", ctx.partial.to_string()),
            ("COMPLINE_LINE", ctx.words.join(" ")),
        ];

        let stdout = if Handle::try_current().is_ok() {
            // A runtime cannot be blocked on from inside another one.
            std::thread::scope(|scope| {
                scope
                    .spawn(|| self.block_on(&env))
                    .join()
                    .ok()
                    .flatten()
            })
        } else {
            self.block_on(&env)
        };

        stdout
            .map(|out| {
                out.lines()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn block_on(&self, env: &[(&str, String)]) -> Option<String> {
        let runtime = match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                debug!(error = %e, "cannot start runtime for resolver command");
                return None;
            }
        };

        runtime.block_on(self.execute(env))
    }

    async fn execute(&self, env: &[(&str, String)]) -> Option<String> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .envs(env.iter().map(|(key, value)| (*key, value.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %self.program, error = %e, "cannot spawn resolver command");
                return None;
            }
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                debug!(program = %self.program, status = %output.status, "resolver command failed");
                None
            }
            Ok(Err(e)) => {
                debug!(program = %self.program, error = %e, "resolver command failed");
                None
            }
            Err(_) => {
                debug!(
                    program = %self.program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "resolver command timed out"
                );
                None
            }
        }
    }
}

impl Resolver for CommandResolver {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        Resolution::Suggestions {
            items: self.run(ctx),
            policy: self.policy.clone(),
        }
    }
}
