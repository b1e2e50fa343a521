use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// The two questions the pull asks of version control. Implementations
/// answer "unknown" (`None` / `false`) instead of failing.
pub trait VersionControl {
    /// Commit time of the last commit touching `file`, or `None` when the
    /// file has no history.
    fn committed_time(&self, file: &Path) -> Option<DateTime<Utc>>;

    /// Whether any file under `dir` is modified, staged or untracked.
    fn has_uncommitted_changes(&self, dir: &Path) -> bool;
}

impl<T: VersionControl + ?Sized> VersionControl for &T {
    fn committed_time(&self, file: &Path) -> Option<DateTime<Utc>> {
        (**self).committed_time(file)
    }

    fn has_uncommitted_changes(&self, dir: &Path) -> bool {
        (**self).has_uncommitted_changes(dir)
    }
}

/// `VersionControl` backed by the `git` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, args: &[&str], cwd: &Path) -> Option<String> {
        let output = match Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                debug!("failed to run {} {:?}: {}", self.program, args, e);
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                "{} {:?} exited with {}: {}",
                self.program,
                args,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for GitCli {
    fn committed_time(&self, file: &Path) -> Option<DateTime<Utc>> {
        let cwd = file.parent().filter(|p| !p.as_os_str().is_empty())?;
        let file_arg = file.file_name()?.to_string_lossy();
        let raw = self.run(&["log", "-1", "--format=%cI", "--", &file_arg], cwd)?;
        if raw.is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                debug!("unparsable commit time '{}' for {}: {}", raw, file.display(), e);
                None
            }
        }
    }

    fn has_uncommitted_changes(&self, dir: &Path) -> bool {
        let (cwd, dir_arg) = if dir.is_dir() {
            (dir, Cow::Borrowed("."))
        } else {
            match (dir.parent(), dir.file_name()) {
                (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                    (parent, name.to_string_lossy())
                }
                _ => return false,
            }
        };
        self.run(&["status", "--porcelain", "--", &dir_arg], cwd)
        .map(|out| !out.is_empty())
        .unwrap_or(false)
    }
}
