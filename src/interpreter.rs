use crate::command::{BuiltinInvocation, CommandFactory, ExitCode};
use crate::env::Environment;
use crate::expand::expand;
use crate::external::{ExternalCommand, terminated_by_signal};
use crate::pipeline::{StageDescriptor, parse_stage, split_pipeline};
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{self, Write};
use std::process::{Child, ChildStdout, Stdio};

/// Factory allows creating instances of built-in invocations.
///
/// Only supports the builtins defined in this crate; see
/// [`crate::command::CommandFactory`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Where the final stage of a pipeline writes.
enum Output<'a> {
    /// The shell's own stdout, inherited by the last child.
    Inherit,
    /// A caller-supplied writer the parent drains the last pipe into.
    Capture(&'a mut dyn Write),
}

/// Input side of the next stage to be wired.
enum StageInput {
    /// The shell's own stdin (first stage only).
    Inherit,
    /// Read end of the pipe coming from the previous external stage.
    Pipe(ChildStdout),
    /// Output captured from an in-process builtin stage, to be fed into the
    /// next child through a fresh pipe.
    Buffer(Vec<u8>),
    /// The previous stage redirected to a file or failed; reads see
    /// immediate end-of-input.
    Closed,
}

/// The interactive command interpreter.
///
/// The interpreter owns the shell's [`Environment`] (variable store and
/// working directory) and a list of [`CommandFactory`] objects queried to
/// recognize built-in commands by name; anything no factory claims is
/// resolved as an external command. See [`Default`] for the factories
/// included out of the box.
///
/// Example
/// ```
/// use xsh::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let code = sh.execute_line_with_output("set USER monke", &mut out).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of builtin factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            builtins,
        }
    }

    /// Execute one input line; the last stage writes to the shell's stdout.
    ///
    /// Returns the (advisory) exit status of the last pipeline stage once
    /// every stage has terminated, or an error when the line itself is
    /// malformed. A malformed stage fails the whole pipeline before any
    /// process is spawned.
    pub fn execute_line(&mut self, line: &str) -> Result<ExitCode> {
        self.execute(line, Output::Inherit)
    }

    /// Execute one input line with the last stage's output collected into
    /// `stdout` instead of the terminal.
    pub fn execute_line_with_output(
        &mut self,
        line: &str,
        stdout: &mut dyn Write,
    ) -> Result<ExitCode> {
        self.execute(line, Output::Capture(stdout))
    }

    /// Read-Eval-Print Loop: prompt, read a line, execute it, repeat.
    ///
    /// Literal `exit`/`quit` lines, end-of-input and an interrupt all end
    /// the loop; errors from individual lines are reported on stderr and the
    /// loop continues.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline("xsh# ") {
                Ok(line) => {
                    if line == "exit" || line == "quit" {
                        break;
                    }
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    if let Err(err) = self.execute_line(&line) {
                        eprintln!("xsh: {err:#}");
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Expansion, splitting and per-stage parsing; all stages are parsed
    /// before anything runs.
    fn execute(&mut self, line: &str, out: Output<'_>) -> Result<ExitCode> {
        let expanded = expand(line, &self.env);
        let mut stages = Vec::new();
        for segment in split_pipeline(&expanded) {
            stages.push(parse_stage(segment)?);
        }
        self.run_pipeline(stages, out)
    }

    /// The process orchestrator: spawn one child per external stage, wire
    /// adjacent stages together, run builtins in-process, and only then
    /// block until every child has terminated.
    fn run_pipeline(&mut self, stages: Vec<StageDescriptor>, mut out: Output<'_>) -> Result<ExitCode> {
        let total = stages.len();
        let mut children: Vec<Child> = Vec::with_capacity(total);
        let mut last_child: Option<usize> = None;
        let mut capture: Option<ChildStdout> = None;
        let mut input = StageInput::Inherit;
        let mut last_status: ExitCode = 0;

        for (i, stage) in stages.into_iter().enumerate() {
            let is_last = i + 1 == total;
            let input_taken = std::mem::replace(&mut input, StageInput::Closed);

            let args: Vec<&str> = stage.argv[1..].iter().map(String::as_str).collect();
            if let Some(builtin) = self.create_builtin(&stage.argv[0], &args) {
                // Builtins never read their stdin; dropping a pipe end here
                // closes it, so an upstream writer observes a broken pipe
                // exactly as it would with a forked child that exited.
                drop(input_taken);
                let status = self.run_builtin_stage(
                    builtin,
                    stage.redirect.as_deref(),
                    is_last,
                    total,
                    &mut out,
                    &mut input,
                )?;
                if is_last {
                    last_status = status;
                }
                continue;
            }

            let Some(external) = ExternalCommand::resolve(&self.env, &stage.argv[0], &stage.argv[1..])
            else {
                eprintln!("xsh: {}: command not found", stage.argv[0]);
                if is_last {
                    last_status = 127;
                }
                continue;
            };

            let mut cmd = external.command(&self.env);
            let mut feed: Option<Vec<u8>> = None;
            cmd.stdin(match input_taken {
                StageInput::Inherit => Stdio::inherit(),
                StageInput::Pipe(upstream) => Stdio::from(upstream),
                StageInput::Buffer(buf) => {
                    feed = Some(buf);
                    Stdio::piped()
                }
                StageInput::Closed => Stdio::null(),
            });

            // A redirection target overrides any pipe-based stdout wiring;
            // the next stage then reads end-of-input.
            let stdout = if let Some(target) = stage.redirect.as_deref() {
                match File::create(target) {
                    Ok(file) => Stdio::from(file),
                    Err(err) => {
                        eprintln!("xsh: {target}: {err}");
                        if is_last {
                            last_status = 1;
                        }
                        continue;
                    }
                }
            } else if !is_last {
                Stdio::piped()
            } else {
                match out {
                    Output::Inherit => Stdio::inherit(),
                    Output::Capture(_) => Stdio::piped(),
                }
            };
            cmd.stdout(stdout);

            match cmd.spawn() {
                Ok(mut child) => {
                    if let Some(buf) = feed {
                        if let Some(mut stdin) = child.stdin.take() {
                            // The stage may exit without reading; a broken
                            // pipe here is the writer's SIGPIPE equivalent.
                            let _ = stdin.write_all(&buf);
                        }
                    }
                    if stage.redirect.is_none() {
                        if !is_last {
                            input = match child.stdout.take() {
                                Some(upstream) => StageInput::Pipe(upstream),
                                None => StageInput::Closed,
                            };
                        } else if matches!(out, Output::Capture(_)) {
                            capture = child.stdout.take();
                        }
                    }
                    if is_last {
                        last_child = Some(children.len());
                    }
                    children.push(child);
                }
                Err(err) => {
                    eprintln!("xsh: {}: {err}", stage.argv[0]);
                    if is_last {
                        last_status = 126;
                    }
                }
            }
        }

        // Drain the captured tail before reaping anything, so a full pipe
        // can never wedge the final wait.
        let mut drain_err = None;
        if let Some(mut tail) = capture {
            if let Output::Capture(w) = &mut out {
                if let Err(err) = io::copy(&mut tail, &mut **w) {
                    drain_err = Some(err);
                }
            }
        }

        // Every spawned child is reaped, even when an earlier wait fails.
        let mut wait_err = None;
        for (idx, child) in children.iter_mut().enumerate() {
            match child.wait() {
                Ok(status) => {
                    if Some(idx) == last_child {
                        last_status = status
                            .code()
                            .unwrap_or_else(|| terminated_by_signal(status));
                    }
                }
                Err(err) => wait_err = Some(err),
            }
        }

        if let Some(err) = drain_err {
            return Err(err).context("reading pipeline output");
        }
        if let Some(err) = wait_err {
            return Err(err).context("waiting for pipeline");
        }
        Ok(last_status)
    }

    fn create_builtin(&self, name: &str, args: &[&str]) -> Option<Box<dyn BuiltinInvocation>> {
        self.builtins
            .iter()
            .find_map(|factory| factory.try_create(name, args))
    }

    /// Run one builtin stage in-process.
    ///
    /// A single-stage invocation mutates the interpreter's own environment;
    /// inside a pipeline the builtin sees a clone instead, with the same
    /// isolation a forked child would have, so its `set`/`cd` never reach
    /// the interactive shell.
    fn run_builtin_stage(
        &mut self,
        builtin: Box<dyn BuiltinInvocation>,
        redirect: Option<&str>,
        is_last: bool,
        total: usize,
        out: &mut Output<'_>,
        next_input: &mut StageInput,
    ) -> Result<ExitCode> {
        let mut isolated;
        let env = if total == 1 {
            &mut self.env
        } else {
            isolated = self.env.clone();
            &mut isolated
        };

        if let Some(target) = redirect {
            return match File::create(target) {
                Ok(mut file) => builtin.run(&mut file, env),
                Err(err) => {
                    eprintln!("xsh: {target}: {err}");
                    Ok(1)
                }
            };
        }

        if is_last {
            match out {
                Output::Inherit => builtin.run(&mut io::stdout(), env),
                Output::Capture(w) => builtin.run(&mut **w, env),
            }
        } else {
            let mut buffer = Vec::new();
            let status = builtin.run(&mut buffer, env)?;
            *next_input = StageInput::Buffer(buffer);
            Ok(status)
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of builtins:
    /// `cd`, `pwd`, `set`, `unset`.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Set>::default()),
            Box::new(Factory::<Unset>::default()),
        ])
    }
}
