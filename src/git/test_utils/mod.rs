use crate::error::RerollError;
use git2::{Repository, Signature};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

// Simple Linear Congruential Generator for generating random temporary
// directory names
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        // LCG parameters: a = 1664525, c = 1013904223, m = 2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    fn gen_random_string(&mut self, len: usize) -> String {
        const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut result = String::with_capacity(len);
        for _ in 0..len {
            let idx = (self.next() % CHARS.len() as u64) as usize;
            result.push(CHARS[idx] as char);
        }
        result
    }
}

/// A scratch repository for exercising the workflows against real git.
pub struct TmpRepo {
    path: PathBuf,
    repo: Repository,
}

/// Unix timestamp for 2023-01-01 12:00:00 UTC; commits default to this so
/// test results are stable.
pub const DEFAULT_COMMIT_EPOCH: i64 = 1672574400;

impl TmpRepo {
    /// Creates a new temporary repository with a randomly generated
    /// directory and test committer identity configured.
    pub fn new() -> Result<Self, RerollError> {
        let mut rng = SimpleRng::new();
        let random_suffix = rng.gen_random_string(8);
        let tmp_dir = std::env::temp_dir().join(format!("reroll-tmp-{}", random_suffix));
        fs::create_dir_all(&tmp_dir)?;

        let repo = Repository::init(&tmp_dir).map_err(git_err)?;

        let mut config = repo.config().map_err(git_err)?;
        config.set_str("user.name", "Test User").map_err(git_err)?;
        config
            .set_str("user.email", "test@example.com")
            .map_err(git_err)?;

        Ok(TmpRepo {
            path: tmp_dir,
            repo,
        })
    }

    /// A repository with two tracked files on an initial commit dated
    /// `DEFAULT_COMMIT_EPOCH`.
    pub fn new_with_base_commit() -> Result<Self, RerollError> {
        let repo = TmpRepo::new()?;
        repo.write_file(
            "notes.txt",
            "alpha\nbravo\ncharlie\ndelta\necho\nfoxtrot\n",
            true,
        )?;
        repo.write_file("README.txt", "A scratch project.\n", true)?;
        repo.commit_with_message("initial commit")?;
        Ok(repo)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Writes a file with the given contents, optionally adding it to the
    /// index.
    pub fn write_file(
        &self,
        filename: &str,
        contents: &str,
        add_to_git: bool,
    ) -> Result<(), RerollError> {
        let file_path = self.path.join(filename);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, contents)?;

        if add_to_git {
            let mut index = self.repo.index().map_err(git_err)?;
            index
                .add_path(std::path::Path::new(filename))
                .map_err(git_err)?;
            index.write().map_err(git_err)?;
        }
        Ok(())
    }

    pub fn read_file(&self, filename: &str) -> Result<String, RerollError> {
        Ok(fs::read_to_string(self.path.join(filename))?)
    }

    /// Stages everything and commits it at `DEFAULT_COMMIT_EPOCH`.
    pub fn commit_with_message(&self, message: &str) -> Result<String, RerollError> {
        self.commit_with_message_at(message, DEFAULT_COMMIT_EPOCH)
    }

    /// Stages everything and commits it with the given commit timestamp,
    /// so `commit_at_date` has distinct dates to resolve.
    pub fn commit_with_message_at(&self, message: &str, epoch: i64) -> Result<String, RerollError> {
        let mut index = self.repo.index().map_err(git_err)?;
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .map_err(git_err)?;
        index.write().map_err(git_err)?;

        let tree_id = index.write_tree().map_err(git_err)?;
        let tree = self.repo.find_tree(tree_id).map_err(git_err)?;

        let time = git2::Time::new(epoch, 0);
        let signature =
            Signature::new("Test User", "test@example.com", &time).map_err(git_err)?;

        let parent_commit = match self.repo.head() {
            Ok(head) => match head.target() {
                Some(target) => Some(self.repo.find_commit(target).map_err(git_err)?),
                None => None,
            },
            Err(_) => None,
        };

        let commit_id = match parent_commit {
            Some(parent) => self
                .repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])
                .map_err(git_err)?,
            None => self
                .repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &[])
                .map_err(git_err)?,
        };

        Ok(commit_id.to_string())
    }

    /// Creates a new branch at HEAD and switches to it.
    pub fn create_branch(&self, branch_name: &str) -> Result<(), RerollError> {
        let head = self.repo.head().map_err(git_err)?;
        let commit = self
            .repo
            .find_commit(head.target().expect("HEAD has no target"))
            .map_err(git_err)?;
        self.repo.branch(branch_name, &commit, false).map_err(git_err)?;
        self.switch_branch(branch_name)
    }

    /// Switches to an existing branch.
    pub fn switch_branch(&self, branch_name: &str) -> Result<(), RerollError> {
        let branch_ref = self
            .repo
            .find_reference(&format!("refs/heads/{}", branch_name))
            .map_err(git_err)?;
        self.repo
            .set_head(branch_ref.name().expect("branch ref has a name"))
            .map_err(git_err)?;

        let mut checkout_opts = git2::build::CheckoutBuilder::new();
        checkout_opts.force();
        self.repo
            .checkout_head(Some(&mut checkout_opts))
            .map_err(git_err)?;
        Ok(())
    }

    /// Name of the branch HEAD points at. Repositories created here get
    /// whatever the local git calls its initial branch, so tests ask
    /// instead of assuming.
    pub fn current_branch(&self) -> Result<String, RerollError> {
        let head = self.repo.head().map_err(git_err)?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    pub fn head_commit_id(&self) -> Result<String, RerollError> {
        let head = self.repo.head().map_err(git_err)?;
        Ok(head.target().expect("HEAD has no target").to_string())
    }

    /// All local branch names.
    pub fn branch_names(&self) -> Result<Vec<String>, RerollError> {
        let mut names = Vec::new();
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(git_err)?;
        for branch in branches {
            let (branch, _) = branch.map_err(git_err)?;
            if let Some(name) = branch.name().map_err(git_err)? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// `git status --porcelain`, for asserting whether an operation
    /// touched the tree or index.
    pub fn status_porcelain(&self) -> Result<String, RerollError> {
        let output = self.git(&["status", "--porcelain"])?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Overwrite a tracked file and capture the resulting `git diff` as a
    /// patch file, then put the working tree back. The patch applies
    /// cleanly at the commit the change was made against.
    pub fn make_patch(
        &self,
        target: &str,
        new_contents: &str,
        patch_filename: &str,
    ) -> Result<PathBuf, RerollError> {
        self.write_file(target, new_contents, false)?;
        let diff = self.git(&["diff"])?;
        let patch_path = self.path.join(patch_filename);
        fs::write(&patch_path, &diff.stdout)?;
        self.git(&["checkout", "--", target])?;
        Ok(patch_path)
    }

    /// Run the real git CLI against this repository.
    pub fn git(&self, args: &[&str]) -> Result<Output, RerollError> {
        Command::new(crate::config::Config::get().git_cmd())
            .current_dir(&self.path)
            .args(args)
            .output()
            .map_err(|e| RerollError::Generic(format!("Failed to run git {:?}: {}", args, e)))
    }
}

fn git_err(e: git2::Error) -> RerollError {
    RerollError::Generic(format!("git2: {}", e))
}
