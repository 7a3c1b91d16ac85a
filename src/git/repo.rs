use crate::config::Config;
use crate::error::RerollError;
use crate::utils::debug_log;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// A git repository bound to an explicit working directory.
///
/// Every method is one synchronous invocation of the git binary with the
/// bound directory as its cwd; nothing here relies on the ambient process
/// cwd. The struct owns no other state, so every call re-queries the
/// on-disk repository.
pub struct GitRepo {
    workdir: PathBuf,
    base_branch: String,
}

/// Result of a check-only `git apply`. Cleanliness is judged by the exit
/// status; the captured stderr is kept for display.
pub struct ApplyCheck {
    pub status: i32,
    pub stderr: String,
}

impl ApplyCheck {
    pub fn is_clean(&self) -> bool {
        self.status == 0
    }
}

/// Captured result of a rebase. The output is line-oriented; callers scan
/// it for conflict markers.
pub struct RebaseOutcome {
    pub status: i32,
    pub output: String,
}

impl RebaseOutcome {
    pub fn is_clean(&self) -> bool {
        self.status == 0
    }
}

impl GitRepo {
    /// Bind to the repository at `workdir`. `base` overrides the default
    /// integration branch; otherwise the configured override applies, and
    /// failing that the branch is detected from the repository.
    pub fn open(workdir: impl Into<PathBuf>, base: Option<String>) -> Result<GitRepo, RerollError> {
        let mut repo = GitRepo {
            workdir: workdir.into(),
            base_branch: String::new(),
        };

        let probe = repo.output(&["rev-parse", "--is-inside-work-tree"])?;
        if !probe.status.success() {
            return Err(RerollError::Generic(format!(
                "{} is not a git repository",
                repo.workdir.display()
            )));
        }

        repo.base_branch = base
            .or_else(|| Config::get().base_branch().map(str::to_string))
            .unwrap_or_else(|| repo.detect_base_branch());
        Ok(repo)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The long-lived integration branch patches are diffed against.
    pub fn base_branch(&self) -> &str {
        &self.base_branch
    }

    /// Apply a patch file to the index and working tree. Returns the git
    /// exit code.
    pub fn apply_patch(&self, patch_file: &Path) -> Result<i32, RerollError> {
        self.status(&["apply", "--index", &patch_file.to_string_lossy()])
    }

    /// Check-only apply. Never mutates the tree or index.
    pub fn apply_check(&self, patch_file: &Path) -> Result<ApplyCheck, RerollError> {
        let output = self.output(&["apply", "--check", &patch_file.to_string_lossy()])?;
        Ok(ApplyCheck {
            status: output.status.code().unwrap_or(1),
            stderr: String::from_utf8(output.stderr)?,
        })
    }

    /// Checkout an existing branch.
    pub fn checkout(&self, branch: &str) -> Result<i32, RerollError> {
        self.status(&["checkout", branch])
    }

    /// Create and checkout a new branch, optionally starting at `from`.
    pub fn checkout_new(&self, branch: &str, from: Option<&str>) -> Result<i32, RerollError> {
        let mut args = vec!["checkout", "-b", branch];
        if let Some(commit) = from {
            args.push(commit);
        }
        self.status(&args)
    }

    /// True iff the branches are set up for generating an interdiff: a
    /// branch named `old_patch` exists and `new_patch` is checked out.
    ///
    /// The convention: the patch as originally posted is committed on
    /// `old_patch`, then work continues on `new_patch`. Standardized names
    /// make the later diffs and interdiffs automatic.
    pub fn is_ready_for_reroll(&self) -> Result<bool, RerollError> {
        let listing = self.branch_listing()?;
        Ok(listing_is_ready(&listing))
    }

    /// Discard everything and return to a clean default branch: abort any
    /// rebase or merge in progress, checkout the default branch, delete all
    /// other branches, stash whatever is left, pull the default remote
    /// branch, and sweep patch and interdiff files. Destructive and
    /// irreversible; also idempotent.
    pub fn cleanup(&self) -> Result<(), RerollError> {
        // Most of these steps legitimately fail when there is nothing to do
        // (no rebase in progress, no remote, nothing to stash), so exit
        // codes are ignored.
        self.run(&["rebase", "--abort"])?;
        self.run(&["merge", "--abort"])?;
        self.checkout(&self.base_branch)?;
        self.delete_all_not_checked_out_branches()?;
        self.run(&["stash"])?;
        self.pull(Config::get().remote(), &self.base_branch)?;
        self.delete_patch_files()?;
        self.delete_interdiff_files()?;
        Ok(())
    }

    /// Diff between the working tree and another branch, as text.
    pub fn diff_text(&self, compare_branch: &str) -> Result<String, RerollError> {
        let output = self.output(&["diff", compare_branch])?;
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Diff between the working tree and another branch, written to a file
    /// inside the working directory. Returns the diff invocation's exit
    /// code. Writes exactly the bytes `diff_text` would return.
    pub fn diff_to_file(&self, compare_branch: &str, filename: &str) -> Result<i32, RerollError> {
        let output = self.output(&["diff", compare_branch])?;
        fs::write(self.workdir.join(filename), &output.stdout)?;
        Ok(output.status.code().unwrap_or(1))
    }

    /// Commit the currently staged changes.
    pub fn commit(&self, message: &str) -> Result<i32, RerollError> {
        self.status(&["commit", "-m", message])
    }

    pub fn delete_branch(&self, branch: &str) -> Result<i32, RerollError> {
        self.status(&["branch", "-D", branch])
    }

    /// Branch names other than the currently checked-out one.
    pub fn not_checked_out_branches(&self) -> Result<Vec<String>, RerollError> {
        let listing = self.branch_listing()?;
        Ok(listing
            .lines()
            .filter(|line| !line.starts_with('*'))
            .map(|line| line.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }

    pub fn delete_all_not_checked_out_branches(&self) -> Result<(), RerollError> {
        for branch in self.not_checked_out_branches()? {
            self.delete_branch(&branch)?;
        }
        Ok(())
    }

    /// Escape hatch for any subcommand not wrapped above. Returns the exit
    /// code.
    pub fn run(&self, args: &[&str]) -> Result<i32, RerollError> {
        self.status(args)
    }

    /// Rebase the current branch onto another, capturing the output for
    /// conflict scanning.
    pub fn rebase(&self, onto: &str) -> Result<RebaseOutcome, RerollError> {
        let output = self.output(&["rebase", onto])?;
        let mut text = String::from_utf8(output.stdout)?;
        text.push_str(&String::from_utf8(output.stderr)?);
        Ok(RebaseOutcome {
            status: output.status.code().unwrap_or(1),
            output: text,
        })
    }

    pub fn pull(&self, remote: &str, branch: &str) -> Result<i32, RerollError> {
        self.status(&["pull", remote, branch])
    }

    /// Local patch files, named relative to the working directory.
    pub fn patch_files(&self) -> Result<Vec<PathBuf>, RerollError> {
        self.matching_files("*.patch")
    }

    /// Delete all `*.patch` files in the working directory.
    pub fn delete_patch_files(&self) -> Result<(), RerollError> {
        for file in self.matching_files("*.patch")? {
            fs::remove_file(self.workdir.join(file))?;
        }
        Ok(())
    }

    /// Delete all `interdiff*.txt` files in the working directory.
    pub fn delete_interdiff_files(&self) -> Result<(), RerollError> {
        for file in self.matching_files("interdiff*.txt")? {
            fs::remove_file(self.workdir.join(file))?;
        }
        Ok(())
    }

    /// The most recent commit at or before the given date on the current
    /// branch. Empty when the date predates the whole history.
    pub fn commit_at_date(&self, date: &str) -> Result<String, RerollError> {
        let before = format!("--before={}", date);
        let output = self.output(&["log", "--format=%H", "-n", "1", &before])?;
        Ok(String::from_utf8(output.stdout)?.trim_end().to_string())
    }

    fn branch_listing(&self) -> Result<String, RerollError> {
        let output = self.output(&["branch"])?;
        Ok(String::from_utf8(output.stdout)?)
    }

    fn detect_base_branch(&self) -> String {
        // Prefer whatever the remote calls HEAD; fall back to a long-lived
        // local branch name.
        let remote_head = format!("refs/remotes/{}/HEAD", Config::get().remote());
        if let Ok(output) = self.output(&["symbolic-ref", "--short", &remote_head]) {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout);
                if let Some((_, branch)) = name.trim().split_once('/') {
                    return branch.to_string();
                }
            }
        }

        if let Ok(listing) = self.branch_listing() {
            for candidate in ["main", "master"] {
                let found = listing
                    .lines()
                    .any(|line| line.trim_start_matches('*').trim() == candidate);
                if found {
                    return candidate.to_string();
                }
            }
        }

        "master".to_string()
    }

    fn matching_files(&self, pattern: &str) -> Result<Vec<PathBuf>, RerollError> {
        let full_pattern = self.workdir.join(pattern);
        let paths = glob::glob(&full_pattern.to_string_lossy())
            .map_err(|e| RerollError::Generic(format!("Bad glob pattern {}: {}", pattern, e)))?;
        let mut files = Vec::new();
        for path in paths {
            let path =
                path.map_err(|e| RerollError::Generic(format!("Glob failed: {}", e)))?;
            if let Ok(rel) = path.strip_prefix(&self.workdir) {
                files.push(rel.to_path_buf());
            }
        }
        Ok(files)
    }

    /// Run git letting it inherit our stdio; returns the exit code.
    fn status(&self, args: &[&str]) -> Result<i32, RerollError> {
        debug_log(&format!("git {}", args.join(" ")));
        let status = Command::new(Config::get().git_cmd())
            .current_dir(&self.workdir)
            .args(args)
            .status()
            .map_err(|e| {
                RerollError::Generic(format!("Failed to execute git {}: {}", args.join(" "), e))
            })?;
        Ok(status.code().unwrap_or(1))
    }

    /// Run git capturing stdout and stderr.
    fn output(&self, args: &[&str]) -> Result<Output, RerollError> {
        debug_log(&format!("git {} (captured)", args.join(" ")));
        Command::new(Config::get().git_cmd())
            .current_dir(&self.workdir)
            .args(args)
            .output()
            .map_err(|e| {
                RerollError::Generic(format!("Failed to execute git {}: {}", args.join(" "), e))
            })
    }
}

/// Branch-listing check behind `is_ready_for_reroll`, split out so it can
/// be exercised over synthetic listings.
fn listing_is_ready(listing: &str) -> bool {
    let mut has_old = false;
    let mut on_new = false;
    for line in listing.lines() {
        let is_current = line.trim_start().starts_with('*');
        let name = line.trim_start().trim_start_matches('*').trim();
        if name == "old_patch" {
            has_old = true;
        }
        if is_current && name == "new_patch" {
            on_new = true;
        }
    }
    has_old && on_new
}
