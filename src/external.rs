use crate::env::Environment;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// A pipeline stage resolved to an executable outside the shell.
///
/// Resolution happens in the parent before the stage is spawned, so an
/// unknown command is reported once instead of surfacing as a failed exec
/// inside a child.
pub(crate) struct ExternalCommand {
    path: OsString,
    args: Vec<OsString>,
}

impl ExternalCommand {
    /// Resolve `name` to an executable path, searching PATH for bare names.
    ///
    /// Returns `None` when nothing matches; the caller decides how to report
    /// that.
    pub fn resolve(env: &Environment, name: &str, args: &[String]) -> Option<Self> {
        let search_paths = stdenv::var_os("PATH").unwrap_or_default();
        let path = find_command_path(&search_paths, &env.current_dir, Path::new(name))?;
        Some(Self {
            path: path.into_os_string(),
            args: args.iter().map(OsString::from).collect(),
        })
    }

    /// Prepared process builder for this command; stdio wiring is the
    /// orchestrator's job.
    pub fn command(&self, env: &Environment) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.args(&self.args).current_dir(&env.current_dir);
        cmd
    }
}

/// Map a child killed without an exit code to a conventional shell status.
#[cfg(unix)]
pub(crate) fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
pub(crate) fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// - Absolute path: returned when it exists.
/// - Path with more than one component (`./tool`, `bin/sh`): resolved
///   against `cwd`.
/// - Bare name: the first existing match across the `search_paths` (PATH)
///   directories.
/// - Empty path: never resolves.
pub(crate) fn find_command_path(
    search_paths: &OsStr,
    cwd: &Path,
    path: &Path,
) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }
    if path.components().nth(1).is_some() {
        let candidate = cwd.join(path);
        return candidate.exists().then_some(candidate);
    }
    stdenv::split_paths(search_paths)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::File;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn cwd() -> PathBuf {
        stdenv::current_dir().unwrap()
    }

    #[test]
    fn test_absolute_existing_path() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), &cwd(), path)
            .expect("expected to find /bin/sh via absolute path");
        assert_eq!(found, path);
    }

    #[test]
    fn test_absolute_nonexisting_path() {
        let path = Path::new("/bin/nonexisting");
        assert!(find_command_path(osstr("/bin"), &cwd(), path).is_none());
    }

    #[test]
    fn test_bare_name_found_in_path() {
        let found = find_command_path(osstr("/bin"), &cwd(), Path::new("sh"))
            .expect("expected to find 'sh' in /bin via PATH search");
        assert_eq!(found, Path::new("/bin/sh"));
    }

    #[test]
    fn test_bare_name_not_found_in_path() {
        let found = find_command_path(osstr("/bin"), &cwd(), Path::new("nonexisting"));
        assert!(found.is_none());
    }

    #[test]
    fn test_qualified_relative_path_resolves_against_cwd() {
        let base = stdenv::temp_dir().join(format!("xsh_external_{}_rel", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(base.join("bin")).expect("create temp bin dir");
        File::create(base.join("bin").join("tool")).expect("touch bin/tool");

        let found = find_command_path(osstr("/does/not/matter"), &base, Path::new("bin/tool"))
            .expect("expected to find relative 'bin/tool' under the base dir");
        assert_eq!(found, base.join("bin/tool"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_dot_prefixed_path_resolves_against_cwd() {
        let base = stdenv::temp_dir().join(format!("xsh_external_{}_dot", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).expect("create temp dir");
        File::create(base.join("tool")).expect("touch tool");

        let found = find_command_path(osstr("/bin"), &base, Path::new("./tool"))
            .expect("expected to find './tool' under the base dir");
        assert_eq!(found, base.join("./tool"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_empty_path_never_resolves() {
        assert!(find_command_path(osstr("/bin"), &cwd(), Path::new("")).is_none());
    }

    #[test]
    fn test_resolve_ignores_the_shell_store() {
        // PATH comes from the process environment, not from `set` bindings
        let env = Environment::new();
        assert!(ExternalCommand::resolve(&env, "sh", &[]).is_some());
        assert!(ExternalCommand::resolve(&env, "xsh_no_such_cmd_404", &[]).is_none());
    }
}
