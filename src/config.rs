use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Centralized configuration for the application.
///
/// Precedence for every value: environment variable, then the optional
/// config file, then the built-in default. The repository working directory
/// is deliberately NOT part of this config; it is passed explicitly to every
/// `GitRepo` so nothing depends on the ambient process cwd.
pub struct Config {
    git_path: String,
    editor_cmd: Option<String>,
    remote: String,
    base_branch: Option<String>,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Optional on-disk configuration, `~/.config/reroll.json`. All fields
/// optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    git: Option<String>,
    editor: Option<String>,
    remote: Option<String>,
    base: Option<String>,
}

impl Config {
    /// Access the global configuration, loading it on first use.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let file = load_config_file().unwrap_or_default();
            Config {
                git_path: pick(env_var("REROLL_GIT"), file.git, None)
                    .unwrap_or_else(resolve_git_path),
                editor_cmd: pick(env_var("REROLL_EDITOR"), file.editor, env_var("EDITOR")),
                remote: pick(env_var("REROLL_REMOTE"), file.remote, None)
                    .unwrap_or_else(|| "origin".to_string()),
                base_branch: pick(env_var("REROLL_BASE"), file.base, None),
            }
        })
    }

    /// Returns the command to invoke git.
    pub fn git_cmd(&self) -> &str {
        &self.git_path
    }

    /// Command line used to open files in the operator's editor, if any.
    pub fn editor_cmd(&self) -> Option<&str> {
        self.editor_cmd.as_deref()
    }

    /// Remote that the default branch is pulled from.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Configured default branch override, if any. When absent the branch
    /// is detected from the repository itself.
    pub fn base_branch(&self) -> Option<&str> {
        self.base_branch.as_deref()
    }
}

/// First Some wins: environment, then config file, then default.
fn pick(env: Option<String>, file: Option<String>, default: Option<String>) -> Option<String> {
    env.or(file).or(default)
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reroll.json"))
}

fn load_config_file() -> Option<ConfigFile> {
    let path = config_file_path()?;
    let contents = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            eprintln!("Warning: ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

fn resolve_git_path() -> String {
    // Probe common absolute locations; we rely on these plus the bare "git"
    // which allows PATH resolution. No heavy PATH search to keep startup fast.
    let candidates: &[&str] = &[
        // macOS Homebrew (ARM and Intel)
        "/opt/homebrew/bin/git",
        "/usr/local/bin/git",
        // Common Unix paths
        "/usr/bin/git",
        "/bin/git",
        "/usr/local/sbin/git",
        "/usr/sbin/git",
    ];

    if let Some(found) = candidates.iter().map(Path::new).find(|p| is_executable(p)) {
        return found.to_string_lossy().to_string();
    }

    // Fallback: rely on system PATH
    "git".to_string()
}

fn is_executable(path: &Path) -> bool {
    // Existence is sufficient for our purposes; the OS enforces exec perms.
    path.exists() && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_precedence() {
        assert_eq!(
            pick(
                Some("from-env".to_string()),
                Some("from-file".to_string()),
                Some("default".to_string())
            ),
            Some("from-env".to_string())
        );
        assert_eq!(
            pick(None, Some("from-file".to_string()), Some("default".to_string())),
            Some("from-file".to_string())
        );
        assert_eq!(pick(None, None, Some("default".to_string())), Some("default".to_string()));
        assert_eq!(pick(None, None, None), None);
    }

    #[test]
    fn test_config_file_parses_partial_fields() {
        let parsed: ConfigFile = serde_json::from_str(r#"{"editor": "code -g"}"#).unwrap();
        assert_eq!(parsed.editor.as_deref(), Some("code -g"));
        assert!(parsed.git.is_none());
        assert!(parsed.remote.is_none());
        assert!(parsed.base.is_none());
    }
}
