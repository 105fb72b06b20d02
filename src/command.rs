use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Object-safe trait for a fully parsed built-in invocation, ready to run.
///
/// Built-ins execute in-process rather than being spawned as pipeline
/// children: they receive the stage's output sink directly (a pipe buffer,
/// a redirection file, or the shell's stdout) together with the environment
/// the stage is allowed to see.
pub trait BuiltinInvocation {
    /// Executes the command, consuming the invocation.
    fn run(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Factory that tries to create a built-in invocation from a command name
/// and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`, leaving the
/// orchestrator to resolve the stage as an external command instead.
pub trait CommandFactory {
    /// Attempt to create an invocation for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn BuiltinInvocation>>;
}
