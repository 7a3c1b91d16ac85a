use crate::error::RerollError;
use crate::git::GitRepo;
use crate::prompt::Prompter;

/// One-shot: emit the working branch as a fresh diff against the default
/// branch, once development is done.
pub fn run(repo: &GitRepo, prompter: &mut dyn Prompter) -> Result<(), RerollError> {
    let filename = prompter.ask("Enter the patch filename:")?;
    let code = repo.diff_to_file(repo.base_branch(), &filename)?;
    if code != 0 {
        return Err(RerollError::Generic(format!(
            "git diff {} exited with {}",
            repo.base_branch(),
            code
        )));
    }
    println!("Wrote {}.", filename);
    Ok(())
}
