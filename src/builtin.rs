use crate::command::{BuiltinInvocation, CommandFactory, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process instead of being spawned as pipeline children, so a
/// malformed invocation surfaces as a usage message rather than an exec of
/// garbage argv entries.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "pwd".
    fn name() -> &'static str;

    /// Executes the command against the provided output sink and environment.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for
    /// failure.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> BuiltinInvocation for T {
    fn run(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match T::execute(*self, stdout, env) {
            Ok(code) => Ok(code),
            Err(e) => {
                eprintln!("xsh: {e:#}");
                Ok(1)
            }
        }
    }
}

/// Stand-in invocation produced when argument parsing fails or `--help` is
/// requested: it carries the argh-generated output instead of a runnable
/// command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl BuiltinInvocation for InvalidArgs {
    fn run(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        if self.is_error {
            eprintln!("{}", self.output.trim_end());
            Ok(1)
        } else {
            writeln!(stdout, "{}", self.output.trim_end())?;
            Ok(0)
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn BuiltinInvocation>> {
        if name != T::name() {
            return None;
        }
        Some(match T::from_args(&[name], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub(crate) struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub(crate) struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = PathBuf::from(&self.target);
        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical =
            fs::canonicalize(&new_dir).with_context(|| format!("cd: {}", self.target))?;
        if !canonical.is_dir() {
            return Err(anyhow!("cd: {}: not a directory", self.target));
        }

        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Define or update a shell variable used by $NAME expansion.
pub(crate) struct Set {
    #[argh(positional)]
    /// variable name.
    pub name: String,

    #[argh(positional)]
    /// value to bind to the name.
    pub value: String,
}

impl BuiltinCommand for Set {
    fn name() -> &'static str {
        "set"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.set(self.name, self.value)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Remove a shell variable.
pub(crate) struct Unset {
    #[argh(positional)]
    /// variable name to remove.
    pub name: String,
}

impl BuiltinCommand for Unset {
    fn name() -> &'static str {
        "unset"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.unset(&self.name)?;
        Ok(0)
    }
}
