//! xsh, a tiny interactive command interpreter.
//!
//! This crate provides the command-execution core of a minimal shell: `$NAME`
//! expansion against a bounded variable store, pipeline decomposition on `|`,
//! per-stage argument parsing with `>` output redirection, and a process
//! orchestrator that spawns one child per stage, hands pipe descriptors
//! between adjacent stages and reaps every child before returning.
//!
//! The main entry point is [`Interpreter`], which executes one input line at
//! a time and owns the shell's variable store and working directory. The
//! public modules [`command`] and [`env`] expose the traits and types needed
//! to implement additional built-in commands and to interact with the
//! shell-local environment.

mod builtin;
pub mod command;
pub mod env;
mod expand;
mod external;
mod interpreter;
mod pipeline;

pub use command::ExitCode;
pub use interpreter::Interpreter;
