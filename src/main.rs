//! jit CLI - content-addressed version control commands

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use jit::ops::{self, MergeOutcome};
use jit::{Error, Index, Repo};

#[derive(Parser)]
#[command(name = "jit")]
#[command(about = "jit version control system - content-addressed snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a repository in the current directory
    Init,

    /// add a file or directory to the staging area
    Add {
        /// file or directory to stage
        path: PathBuf,
    },

    /// record the staged tree as a new commit
    Commit {
        /// commit message
        #[arg(short, long)]
        message: String,

        /// author recorded in the commit (defaults to the configured author)
        #[arg(long)]
        author: Option<String>,
    },

    /// display the log of the commits
    Log,

    /// compute differences between commits and files
    ///
    /// with no arguments, diffs the index against the HEAD commit. with
    /// one argument, diffs that commit against HEAD. with two arguments,
    /// diffs two files on disk.
    Diff {
        /// commit digest, or first file when a second path is given
        target: Option<String>,

        /// second file
        other: Option<PathBuf>,
    },

    /// show the tracked and untracked files in the working tree
    Status,

    /// switch to a branch or a commit
    Checkout {
        /// branch name or commit digest
        target: String,
    },

    /// list branches, or create one at the current HEAD
    Branch {
        /// name of the branch to create
        name: Option<String>,
    },

    /// merge a branch into the current one
    Merge {
        /// branch to merge
        branch: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        println!("{}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> jit::Result<()> {
    match cli.command {
        Commands::Init => {
            let repo = Repo::init(&current_dir()?)?;
            println!("initialized jit repository at {}", repo.path().display());
        }

        Commands::Add { path } => {
            let repo = discover()?;
            let _lock = repo.lock()?;
            let mut index = Index::load(&repo)?;
            index.add(&repo, &path)?;
            index.save(&repo)?;
        }

        Commands::Commit { message, author } => {
            let repo = discover()?;
            let _lock = repo.lock()?;
            ops::commit(&repo, &message, author.as_deref())?;
        }

        Commands::Log => {
            let repo = discover()?;
            match ops::log(&repo)? {
                None => println!("your current branch does not have any commits yet."),
                Some(entries) => {
                    for (_, message) in entries {
                        println!("{}", message);
                    }
                }
            }
        }

        Commands::Diff { target, other } => {
            let repo = discover()?;
            match (target, other) {
                (None, None) => {
                    let lines = ops::diff_index_head(&repo)?;
                    print_diff_banner();
                    for line in lines {
                        println!("{}", line);
                    }
                }
                (Some(target), None) => match ops::diff_commit_head(&repo, &target)? {
                    None => println!("Hash does not exits"),
                    Some(lines) => {
                        print_diff_banner();
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                },
                (Some(file1), Some(file2)) => {
                    print_diff_banner();
                    for line in ops::diff_files(Path::new(&file1), &file2)? {
                        println!("{}", line);
                    }
                }
                (None, Some(_)) => unreachable!("clap enforces argument order"),
            }
        }

        Commands::Status => {
            let repo = discover()?;
            let report = ops::status(&repo)?;
            if report.is_empty() {
                println!("Working tree clean.");
            } else {
                for (path, status) in report {
                    println!("{}: {}", status.label(), path);
                }
            }
        }

        Commands::Checkout { target } => {
            let repo = discover()?;
            let _lock = repo.lock()?;
            if !ops::checkout(&repo, &target)? {
                println!("no such branch or commit '{}'", target);
            }
        }

        Commands::Branch { name } => {
            let repo = discover()?;
            match name {
                None => {
                    let head = jit::refs::head(&repo)?;
                    for branch in jit::refs::list_refs(&repo)? {
                        let marker = if branch == head.name() { "+" } else { " " };
                        println!("{}{}", marker, branch);
                    }
                }
                Some(name) => {
                    let _lock = repo.lock()?;
                    jit::refs::update_ref(&repo, &name, "HEAD")?;
                }
            }
        }

        Commands::Merge { branch } => {
            let repo = discover()?;
            let _lock = repo.lock()?;
            match ops::merge(&repo, &branch)? {
                MergeOutcome::FastForward => println!("performed fast-forward merge"),
                MergeOutcome::Merged => {}
                MergeOutcome::DetachedHead => println!("head is detached"),
                MergeOutcome::UnknownBranch => println!("unknown branch '{}'", branch),
            }
        }
    }

    Ok(())
}

fn print_diff_banner() {
    println!("File Differences:");
    println!("================");
}

fn current_dir() -> jit::Result<PathBuf> {
    env::current_dir().map_err(|source| Error::Io {
        path: PathBuf::from("."),
        source,
    })
}

fn discover() -> jit::Result<Repo> {
    Repo::discover(&current_dir()?)
}
