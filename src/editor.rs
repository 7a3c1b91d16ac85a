use crate::config::Config;
use crate::error::RerollError;
use crate::utils::debug_log;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const CONFLICT_MARKER: &str = "CONFLICT (content): Merge conflict in ";

/// Open every file referenced by the `+++ ` lines of a diff file in the
/// operator's editor.
pub fn open_diff_files(workdir: &Path, diff_file: &Path) -> Result<(), RerollError> {
    let files = files_in_diff(workdir, diff_file)?;
    open_in_editor(workdir, &files)
}

/// Open the patch file itself plus every file a rebase reported a content
/// conflict in.
pub fn open_rebase_conflicts(
    workdir: &Path,
    patch_file: &Path,
    rebase_output: &str,
) -> Result<(), RerollError> {
    let mut files = vec![patch_file.to_path_buf()];
    files.extend(conflicted_files(workdir, rebase_output));
    open_in_editor(workdir, &files)
}

/// Paths named on `+++ ` lines of a unified diff, resolved against the
/// working directory. Deleted files (`+++ /dev/null`) are skipped.
fn files_in_diff(workdir: &Path, diff_file: &Path) -> Result<Vec<PathBuf>, RerollError> {
    let contents = fs::read_to_string(diff_file)?;
    Ok(parse_diff_targets(&contents)
        .into_iter()
        .map(|rel| workdir.join(rel))
        .collect())
}

fn parse_diff_targets(diff: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for line in diff.lines() {
        if let Some(target) = line.strip_prefix("+++ ") {
            let target = target.trim();
            if target == "/dev/null" {
                continue;
            }
            // git prefixes the new side with "b/"
            let target = target.strip_prefix("b/").unwrap_or(target);
            targets.push(target.to_string());
        }
    }
    targets
}

/// Paths named on conflict-marker lines of rebase output, resolved against
/// the working directory.
fn conflicted_files(workdir: &Path, rebase_output: &str) -> Vec<PathBuf> {
    rebase_output
        .lines()
        .filter_map(|line| {
            let idx = line.find(CONFLICT_MARKER)?;
            Some(workdir.join(line[idx + CONFLICT_MARKER.len()..].trim()))
        })
        .collect()
}

/// Launch the configured editor on the given files. Without an editor
/// configured this just prints the list so the operator can open them by
/// hand.
fn open_in_editor(workdir: &Path, files: &[PathBuf]) -> Result<(), RerollError> {
    if files.is_empty() {
        return Ok(());
    }

    let Some(editor) = Config::get().editor_cmd() else {
        println!("No editor configured (set REROLL_EDITOR); files to look at:");
        for file in files {
            println!("  {}", file.display());
        }
        return Ok(());
    };

    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(RerollError::Generic(format!(
            "Editor command is empty: {:?}",
            editor
        )));
    };

    println!("Opening files in editor:");
    for file in files {
        println!("  {}", file.display());
    }

    debug_log(&format!("spawning editor: {}", editor));
    Command::new(program)
        .args(parts)
        .arg(workdir)
        .args(files)
        .spawn()
        .map_err(|e| RerollError::Generic(format!("Failed to launch editor {}: {}", editor, e)))?;
    Ok(())
}
