use std::fs::File;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};

/// name of the repository directory inside the working tree
pub const REPO_DIR: &str = ".jit";

/// name of the branch created by `init`
pub const DEFAULT_BRANCH: &str = "main";

/// a jit repository: a working tree with a `.jit` directory inside it
pub struct Repo {
    work_dir: PathBuf,
    repo_dir: PathBuf,
    config: Config,
}

impl Repo {
    /// initialize a new repository inside the given working tree
    ///
    /// creates the `.jit` layout, the `main` branch (no commits yet) and an
    /// attached HEAD.
    pub fn init(work_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(work_dir).with_path(work_dir)?;
        let work_dir = work_dir.canonicalize().with_path(work_dir)?;
        let repo_dir = work_dir.join(REPO_DIR);
        if repo_dir.exists() {
            return Err(Error::RepoExists(repo_dir));
        }

        std::fs::create_dir_all(repo_dir.join("objects")).with_path(&repo_dir)?;
        std::fs::create_dir_all(repo_dir.join("refs")).with_path(&repo_dir)?;
        std::fs::create_dir_all(repo_dir.join("tmp")).with_path(&repo_dir)?;

        let config = Config::default();
        config.save(&repo_dir.join("config.toml"))?;

        let repo = Self {
            work_dir,
            repo_dir,
            config,
        };

        crate::refs::write_branch(&repo, DEFAULT_BRANCH, None)?;
        crate::refs::update_head(&repo, DEFAULT_BRANCH)?;

        Ok(repo)
    }

    /// open an existing repository rooted at the given working tree
    pub fn open(work_dir: &Path) -> Result<Self> {
        let work_dir = work_dir.canonicalize().with_path(work_dir)?;
        let repo_dir = work_dir.join(REPO_DIR);
        let config_path = repo_dir.join("config.toml");
        if !config_path.exists() {
            return Err(Error::NoRepo(work_dir));
        }

        let config = Config::load(&config_path)?;

        Ok(Self {
            work_dir,
            repo_dir,
            config,
        })
    }

    /// discover a repository by walking upward from the given directory
    pub fn discover(start: &Path) -> Result<Self> {
        let mut dir = start.canonicalize().with_path(start)?;
        loop {
            if dir.join(REPO_DIR).is_dir() {
                return Self::open(&dir);
            }
            if !dir.pop() {
                return Err(Error::NoRepo(start.to_path_buf()));
            }
        }
    }

    /// working tree root
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// repository directory (`<work_dir>/.jit`)
    pub fn path(&self) -> &Path {
        &self.repo_dir
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.repo_dir.join("config.toml")
    }

    /// path to objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.repo_dir.join("objects")
    }

    /// path to refs directory
    pub fn refs_path(&self) -> PathBuf {
        self.repo_dir.join("refs")
    }

    /// path to the HEAD file
    pub fn head_path(&self) -> PathBuf {
        self.repo_dir.join("HEAD")
    }

    /// path to the MERGE_HEAD file
    pub fn merge_head_path(&self) -> PathBuf {
        self.repo_dir.join("MERGE_HEAD")
    }

    /// path to the index file
    pub fn index_path(&self) -> PathBuf {
        self.repo_dir.join("index")
    }

    /// path to tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.repo_dir.join("tmp")
    }

    /// path to lock file
    pub fn lock_path(&self) -> PathBuf {
        self.repo_dir.join(".lock")
    }

    /// acquire exclusive lock on repository
    /// returns a guard that releases the lock on drop
    pub fn lock(&self) -> Result<RepoLock> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;

        let flock = Flock::lock(file, FlockArg::LockExclusiveNonblock)
            .map_err(|_| Error::LockContention)?;

        Ok(RepoLock { flock })
    }

    /// try to acquire exclusive lock, returning None if already locked
    pub fn try_lock(&self) -> Result<Option<RepoLock>> {
        let lock_path = self.lock_path();
        let file = File::create(&lock_path).with_path(&lock_path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(RepoLock { flock })),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Ok(None),
            Err(_) => Err(Error::LockContention),
        }
    }
}

/// guard that holds repository lock until dropped
pub struct RepoLock {
    #[allow(dead_code)]
    flock: Flock<File>,
}
// lock is released automatically when Flock is dropped
