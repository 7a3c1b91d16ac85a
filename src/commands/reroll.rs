use crate::download::download_patch;
use crate::editor;
use crate::error::RerollError;
use crate::git::GitRepo;
use crate::prompt::Prompter;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Where a reroll run ended up. Halting mid-workflow deliberately leaves
/// the repository as the last completed step left it, so the operator can
/// pick up by hand.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The patch still applies at the tip; nothing to reroll.
    CleanApply,
    /// Applied at an older revision, rebased clean, fresh diff written.
    Rerolled,
    /// Operator declined to continue after the real apply.
    Declined,
    /// The patch does not apply even at the operator-supplied date.
    NeedsOlderDate,
    /// Rebase hit conflicts; resolve and `git rebase --continue` by hand.
    RebasePaused,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::CleanApply | Outcome::Rerolled => 0,
            Outcome::Declined | Outcome::NeedsOlderDate | Outcome::RebasePaused => 1,
        }
    }
}

/// The states of the reroll procedure. Transitions consume operator input
/// via the prompter, so a scripted prompter drives the whole machine in
/// tests.
enum Step {
    Clean,
    Fetch,
    DryApply(PathBuf),
    OlderRevision(PathBuf),
    ApplyAndRebase(PathBuf),
}

pub fn run(
    repo: &GitRepo,
    url: &str,
    prompter: &mut dyn Prompter,
) -> Result<Outcome, RerollError> {
    let mut step = Step::Clean;
    loop {
        step = match step {
            Step::Clean => {
                repo.cleanup()?;
                Step::Fetch
            }

            Step::Fetch => {
                println!("Downloading patch...");
                let patch = download_patch(url, repo.workdir())?;
                Step::DryApply(patch)
            }

            Step::DryApply(patch) => {
                println!("Attempting to apply patch...");
                let check = repo.apply_check(&patch)?;
                if check.is_clean() {
                    println!("Patch applies cleanly, reverting working directory.");
                    repo.cleanup()?;
                    return Ok(Outcome::CleanApply);
                }
                println!("\x1b[1;33mPatch does not apply cleanly!\x1b[0m");
                print!("{}", check.stderr);
                Step::OlderRevision(patch)
            }

            Step::OlderRevision(patch) => {
                println!("Checking if the patch applies at an older revision...");
                let date = ask_date(prompter)?;
                let commit = repo.commit_at_date(&date)?;
                if commit.is_empty() {
                    return Err(RerollError::Generic(format!(
                        "No commit found at or before {}",
                        date
                    )));
                }
                println!("Looks like {} is the commit we need to roll back to...", commit);

                let branch = prompter.ask("Enter a branch name for the reroll:")?;
                repo.checkout_new(&branch, Some(&commit))?;

                let check = repo.apply_check(&patch)?;
                if !check.is_clean() {
                    println!(
                        "Patch doesn't apply cleanly at {} either, restart and try an older date.",
                        date
                    );
                    return Ok(Outcome::NeedsOlderDate);
                }
                println!("Patch applies cleanly at the old revision, applying with git.");
                Step::ApplyAndRebase(patch)
            }

            Step::ApplyAndRebase(patch) => {
                let code = repo.apply_patch(&patch)?;
                if code != 0 {
                    return Err(RerollError::Generic(format!(
                        "git apply exited with {} on a patch the dry run accepted",
                        code
                    )));
                }

                if !prompter.confirm("Wish to continue and rebase?")? {
                    println!("Exiting due to concerns.");
                    return Ok(Outcome::Declined);
                }

                let thread_url = prompter.ask("Thread URL (with comment anchor)?")?;
                repo.commit(&format!("Applying patch from {}", thread_url))?;

                let rebase = repo.rebase(repo.base_branch())?;
                print!("{}", rebase.output);
                editor::open_rebase_conflicts(repo.workdir(), &patch, &rebase.output)?;

                if rebase.is_clean() && prompter.confirm("Did the rebase come out clean?")? {
                    let filename = prompter.ask("Output patch filename:")?;
                    repo.diff_to_file(repo.base_branch(), &filename)?;
                    println!("Wrote {}.", filename);
                    return Ok(Outcome::Rerolled);
                }

                println!("Rebase paused, resolve conflicts and `git rebase --continue`.");
                return Ok(Outcome::RebasePaused);
            }
        };
    }
}

/// Keep asking until the operator produces a date git will understand.
fn ask_date(prompter: &mut dyn Prompter) -> Result<String, RerollError> {
    loop {
        let answer = prompter.ask("Enter the patch date (YYYY-MM-DD):")?;
        if NaiveDate::parse_from_str(&answer, "%Y-%m-%d").is_ok() {
            return Ok(answer);
        }
        println!("{:?} is not a YYYY-MM-DD date.", answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(Outcome::CleanApply.exit_code(), 0);
        assert_eq!(Outcome::Rerolled.exit_code(), 0);
        assert_eq!(Outcome::Declined.exit_code(), 1);
        assert_eq!(Outcome::NeedsOlderDate.exit_code(), 1);
        assert_eq!(Outcome::RebasePaused.exit_code(), 1);
    }

    #[test]
    fn test_ask_date_reprompts_until_valid() {
        let mut prompter = ScriptedPrompter::new(["yesterday", "March 9 2015", "2015-03-09"]);
        assert_eq!(ask_date(&mut prompter).unwrap(), "2015-03-09");
    }

    #[test]
    fn test_ask_date_errors_when_answers_run_out() {
        let mut prompter = ScriptedPrompter::new(["not a date"]);
        assert!(ask_date(&mut prompter).is_err());
    }
}
