use crate::error::RerollError;
use crate::git::GitRepo;
use crate::prompt::Prompter;

/// Output filenames derived from the patch metadata the operator supplies.
#[derive(Debug, PartialEq, Eq)]
pub struct PatchNames {
    pub patch: String,
    pub interdiff: String,
}

/// `{issue}-{slug}-{new}-{context}.patch` and
/// `interdiff_{issue}_{old}-{new}.txt`.
pub fn derive_names(
    issue: &str,
    slug: &str,
    context: &str,
    old_ordinal: &str,
    new_ordinal: &str,
) -> PatchNames {
    PatchNames {
        patch: format!("{}-{}-{}-{}.patch", issue, slug, new_ordinal, context),
        interdiff: format!("interdiff_{}_{}-{}.txt", issue, old_ordinal, new_ordinal),
    }
}

/// Commit the work on `new_patch` and emit a fresh patch against the
/// default branch plus an interdiff against `old_patch`.
pub fn run(repo: &GitRepo, prompter: &mut dyn Prompter) -> Result<(), RerollError> {
    if !repo.is_ready_for_reroll()? {
        return Err(RerollError::Generic(
            "Something is wrong with the branches, are you on new_patch with old_patch present?"
                .to_string(),
        ));
    }

    if !repo.diff_text("old_patch")?.is_empty() {
        eprintln!(
            "\x1b[1;33mWarning:\x1b[0m the new_patch HEAD and old_patch are different"
        );
    }

    println!("Committing changes to new_patch");
    // Nothing staged is fine; git reports it and we move on.
    repo.commit("New Patch")?;

    let patch_files = repo.patch_files()?;
    if !patch_files.is_empty() {
        println!("Local patch files:");
        for file in &patch_files {
            println!("  {}", file.display());
        }
    }

    let issue = prompter.ask("Enter the issue #:")?;
    let slug = prompter.ask("Enter the issue slug:")?;
    let context = prompter.ask("Enter the arch/extra info:")?;
    let old_ordinal = prompter.ask("Enter the old patch comment #:")?;
    let new_ordinal = prompter.ask("Enter the new patch comment #:")?;

    let names = derive_names(&issue, &slug, &context, &old_ordinal, &new_ordinal);
    repo.diff_to_file(repo.base_branch(), &names.patch)?;
    repo.diff_to_file("old_patch", &names.interdiff)?;

    println!("Wrote {} and {}.", names.patch, names.interdiff);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_names() {
        let names = derive_names("1234", "foo-bar", "A", "2", "5");
        assert_eq!(names.patch, "1234-foo-bar-5-A.patch");
        assert_eq!(names.interdiff, "interdiff_1234_2-5.txt");
    }

    #[test]
    fn test_derive_names_is_deterministic() {
        assert_eq!(
            derive_names("99", "views-broken", "D8", "12", "14"),
            derive_names("99", "views-broken", "D8", "12", "14")
        );
    }
}
