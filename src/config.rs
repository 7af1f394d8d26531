// taskdesk/src/config.rs

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

/// Config is merged: defaults -> user -> workspace -> runtime (ephemeral)
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub load: LoadConfig,
    pub bootstrap: BootstrapConfig,
    pub session: SessionConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,              // defaults to the current directory
    pub tasks_file: Option<String>,        // tasks.txt
    pub users_file: Option<String>,        // user.txt
    pub task_report_file: Option<String>,  // task_overview.txt
    pub user_report_file: Option<String>,  // user_overview.txt
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoadConfig {
    /// Fail the whole load on a malformed line instead of skipping it.
    pub strict: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub admin_user: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope { User, Workspace, Runtime }

/// Resolved file locations for one data directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    pub tasks: PathBuf,
    pub users: PathBuf,
    pub task_report: PathBuf,
    pub user_report: PathBuf,
}

impl Paths {
    /// Default file names under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Config::default().paths_in(dir.as_ref())
    }
}

impl Config {
    pub fn strict(&self) -> bool { self.load.strict.unwrap_or(false) }

    pub fn admin_user(&self) -> &str { self.session.admin_user.as_deref().unwrap_or("admin") }

    pub fn bootstrap(&self) -> (&str, &str) {
        (
            self.bootstrap.username.as_deref().unwrap_or("admin"),
            self.bootstrap.password.as_deref().unwrap_or("password"),
        )
    }

    pub fn paths(&self) -> Paths {
        let dir = self.storage.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        self.paths_in(&dir)
    }

    fn paths_in(&self, dir: &Path) -> Paths {
        let s = &self.storage;
        let name = |v: &Option<String>, d: &str| dir.join(v.as_deref().unwrap_or(d));
        Paths {
            tasks: name(&s.tasks_file, "tasks.txt"),
            users: name(&s.users_file, "user.txt"),
            task_report: name(&s.task_report_file, "task_overview.txt"),
            user_report: name(&s.user_report_file, "user_overview.txt"),
        }
    }

    /// Sets one dotted key, e.g. `storage.dir` or `load.strict`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.to_string();
        match key {
            "storage.dir" => self.storage.dir = Some(value.into()),
            "storage.tasks_file" => self.storage.tasks_file = Some(value),
            "storage.users_file" => self.storage.users_file = Some(value),
            "storage.task_report_file" => self.storage.task_report_file = Some(value),
            "storage.user_report_file" => self.storage.user_report_file = Some(value),
            "load.strict" => self.load.strict = Some(value.parse::<bool>().context("load.strict expects true|false")?),
            "bootstrap.username" => self.bootstrap.username = Some(value),
            "bootstrap.password" => self.bootstrap.password = Some(value),
            "session.admin_user" => self.session.admin_user = Some(value),
            _ => anyhow::bail!("unsupported key: {}", key),
        }
        Ok(())
    }
}

pub fn merge(a: &mut Config, b: &Config) {
    let overlay = |dst: &mut Option<String>, src: &Option<String>| { if src.is_some() { *dst = src.clone(); } };
    if b.storage.dir.is_some() { a.storage.dir = b.storage.dir.clone(); }
    overlay(&mut a.storage.tasks_file, &b.storage.tasks_file);
    overlay(&mut a.storage.users_file, &b.storage.users_file);
    overlay(&mut a.storage.task_report_file, &b.storage.task_report_file);
    overlay(&mut a.storage.user_report_file, &b.storage.user_report_file);

    if let Some(v) = b.load.strict { a.load.strict = Some(v); }

    overlay(&mut a.bootstrap.username, &b.bootstrap.username);
    overlay(&mut a.bootstrap.password, &b.bootstrap.password);

    overlay(&mut a.session.admin_user, &b.session.admin_user);
}

fn config_paths(workspace_root: &Path) -> (Option<PathBuf>, PathBuf) {
    let user = ProjectDirs::from("dev", "taskdesk", "taskdesk").map(|p| p.config_dir().join("config.toml"));
    let workspace = workspace_root.join(".taskdesk").join("config.toml");
    (user, workspace)
}

#[derive(Clone, Debug)]
pub struct ConfigManager {
    merged: Config,
    user_path: Option<PathBuf>,
    workspace_path: PathBuf,
    runtime_overlay: Config,
}

impl ConfigManager {
    pub fn load(workspace_root: impl AsRef<Path>) -> Result<Self> {
        let (user_path, workspace_path) = config_paths(workspace_root.as_ref());
        Self::with_paths(user_path, workspace_path)
    }

    /// Explicit layer locations; `load` resolves them from the environment.
    pub fn with_paths(user_path: Option<PathBuf>, workspace_path: PathBuf) -> Result<Self> {
        let mut me = Self { merged: Config::default(), user_path, workspace_path, runtime_overlay: Config::default() };
        me.reload_all()?;
        Ok(me)
    }

    fn read_file(path: &Path) -> Result<Option<Config>> {
        if !path.exists() { return Ok(None); }
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(cfg))
    }

    pub fn reload_all(&mut self) -> Result<()> {
        let mut merged = Config::default();
        if let Some(p) = &self.user_path {
            if let Some(usr) = Self::read_file(p)? { merge(&mut merged, &usr); }
        }
        if let Some(ws) = Self::read_file(&self.workspace_path)? { merge(&mut merged, &ws); }
        merge(&mut merged, &self.runtime_overlay);
        tracing::debug!(?merged, "config loaded");
        self.merged = merged;
        Ok(())
    }

    pub fn get(&self) -> &Config { &self.merged }

    pub fn apply_runtime_overlay(&mut self, patch: Config) -> Result<()> {
        merge(&mut self.runtime_overlay, &patch);
        self.reload_all()
    }

    pub fn write_patch(&mut self, scope: Scope, patch: &Config) -> Result<PathBuf> {
        let path = match scope {
            Scope::User => self.user_path.clone().context("no user config directory on this platform")?,
            Scope::Workspace => self.workspace_path.clone(),
            Scope::Runtime => anyhow::bail!("Runtime scope is ephemeral; cannot persist"),
        };
        if let Some(dir) = path.parent() { fs::create_dir_all(dir)?; }
        let mut current = Self::read_file(&path)?.unwrap_or_default();
        merge(&mut current, patch);
        let text = toml::to_string_pretty(&current).context("serialize toml")?;
        fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
        self.reload_all()?;
        Ok(path)
    }
}
