use crate::download::download_patch;
use crate::editor;
use crate::error::RerollError;
use crate::git::GitRepo;

/// Stage a posted patch for further development: snapshot it on
/// `old_patch`, then branch `new_patch` off it and open the touched files.
/// `reroll new-patch` picks up from there once the work is committed.
pub fn run(repo: &GitRepo, url: &str) -> Result<(), RerollError> {
    repo.cleanup()?;

    println!("Downloading patch...");
    let patch = download_patch(url, repo.workdir())?;

    repo.checkout_new("old_patch", None)?;
    let code = repo.apply_patch(&patch)?;
    if code != 0 {
        return Err(RerollError::Generic(format!(
            "Patch did not apply at the tip of {} (git apply exited with {})",
            repo.base_branch(),
            code
        )));
    }
    repo.commit("Old Patch")?;

    repo.checkout_new("new_patch", None)?;
    editor::open_diff_files(repo.workdir(), &patch)?;

    println!(
        "Ready for development on new_patch. Stage your changes and run `reroll new-patch` when done."
    );
    Ok(())
}
