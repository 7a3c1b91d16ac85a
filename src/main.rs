use clap::{Parser, Subcommand};
use reroll::commands;
use reroll::error::RerollError;
use reroll::git::GitRepo;
use reroll::prompt::StdinPrompter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reroll")]
#[command(about = "patch reroll assistant", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Repository working directory
    #[arg(short = 'C', value_name = "DIR", default_value = ".", global = true)]
    repo: PathBuf,

    /// Override the default integration branch
    #[arg(long, value_name = "BRANCH", global = true)]
    base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a patch and walk it through a reroll
    Reroll {
        /// Patch URL
        url: Option<String>,
    },
    /// Download a patch and stage old_patch/new_patch branches for development
    Update {
        /// Patch URL
        url: Option<String>,
    },
    /// Commit work on new_patch and emit a fresh patch plus an interdiff
    NewPatch,
    /// Emit the working branch as a diff against the default branch
    Finish,
}

fn main() {
    let cli = Cli::parse();

    // URL presence is checked before anything touches the repository.
    if let Commands::Reroll { url: None } | Commands::Update { url: None } = &cli.command {
        eprintln!("Please specify a patch URL");
        std::process::exit(1);
    }

    let repo = match GitRepo::open(&cli.repo, cli.base.clone()) {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut prompter = StdinPrompter;

    match cli.command {
        Commands::Reroll { url } => {
            let url = require_url(url);
            match commands::reroll::run(&repo, &url, &mut prompter) {
                Ok(outcome) => std::process::exit(outcome.exit_code()),
                Err(e) => fail(e),
            }
        }
        Commands::Update { url } => {
            let url = require_url(url);
            if let Err(e) = commands::update::run(&repo, &url) {
                fail(e);
            }
        }
        Commands::NewPatch => {
            if let Err(e) = commands::new_patch::run(&repo, &mut prompter) {
                fail(e);
            }
        }
        Commands::Finish => {
            if let Err(e) = commands::finish::run(&repo, &mut prompter) {
                fail(e);
            }
        }
    }
}

fn require_url(url: Option<String>) -> String {
    match url {
        Some(url) => url,
        None => {
            eprintln!("Please specify a patch URL");
            std::process::exit(1);
        }
    }
}

fn fail(e: RerollError) -> ! {
    eprintln!("{}", e);
    std::process::exit(1);
}
