// taskdesk/src/store.rs

use std::{fs, path::{Path, PathBuf}};
use tracing::{info, warn};

use crate::codec;
use crate::config::{Config, Paths};
use crate::error::{DecodeError, Result, TaskError};
use crate::task::{Credential, Field, Task, USER_DELIMITER};

/// A line that was left out of the in-memory state during a lenient load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skipped {
    pub path: PathBuf,
    pub line: usize,
    pub reason: DecodeError,
    /// The line as read; written back unchanged on the next save.
    pub raw: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub skipped: Vec<Skipped>,
}

/// Owns every task and credential for one data directory. Each mutation
/// rewrites the affected file in full; lines that failed to decode are
/// appended after the valid records so a save never drops them.
#[derive(Debug)]
pub struct Store {
    paths: Paths,
    tasks: Vec<Task>,
    credentials: Vec<Credential>,
    held_tasks: Vec<String>,
    held_users: Vec<String>,
}

impl Store {
    pub fn open(cfg: &Config) -> Result<(Self, LoadReport)> {
        Self::load(cfg.paths(), cfg.strict(), cfg.bootstrap())
    }

    /// Reads both files, creating them when absent: tasks empty, credentials
    /// seeded with the `bootstrap` account.
    pub fn load(paths: Paths, strict: bool, bootstrap: (&str, &str)) -> Result<(Self, LoadReport)> {
        let mut report = LoadReport::default();

        if !paths.tasks.exists() {
            write_lines(&paths.tasks, Vec::new())?;
        }
        let tasks = read_records(&paths.tasks, strict, &mut report, codec::decode)?;

        if !paths.users.exists() {
            let (username, password) = bootstrap;
            let admin = Credential { username: Field::username(username)?, password: password.to_string() };
            info!(path = %paths.users.display(), user = %admin.username, "seeding credential file");
            write_lines(&paths.users, vec![codec::encode_credential(&admin)])?;
        }
        let credentials = read_records(&paths.users, strict, &mut report, codec::decode_credential)?;

        let held = |p: &Path| -> Vec<String> { report.skipped.iter().filter(|s| s.path == p).map(|s| s.raw.clone()).collect() };
        let (held_tasks, held_users) = (held(&paths.tasks), held(&paths.users));
        info!(tasks = tasks.len(), users = credentials.len(), skipped = report.skipped.len(), "store loaded");
        Ok((Self { paths, tasks, credentials, held_tasks, held_users }, report))
    }

    pub fn paths(&self) -> &Paths { &self.paths }
    pub fn tasks(&self) -> &[Task] { &self.tasks }
    pub fn credentials(&self) -> &[Credential] { &self.credentials }

    /// Malformed task lines carried through saves untouched.
    pub fn held_task_lines(&self) -> &[String] { &self.held_tasks }

    pub(crate) fn tasks_mut(&mut self) -> &mut Vec<Task> { &mut self.tasks }

    pub fn has_user(&self, username: &str) -> bool {
        self.credentials.iter().any(|c| c.username == username)
    }

    /// Plain-text comparison; the caller decides how often to retry.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        let cred = self.credentials.iter().find(|c| c.username == username)
            .ok_or_else(|| TaskError::UserNotFound { username: username.to_string() })?;
        if cred.password != password { return Err(TaskError::WrongPassword); }
        Ok(())
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<()> {
        let username = Field::username(username)?;
        if password.contains(USER_DELIMITER) {
            return Err(TaskError::InvalidChars { field: "password", found: USER_DELIMITER });
        }
        if password.contains(['\n', '\r']) {
            return Err(TaskError::InvalidChars { field: "password", found: "a line break" });
        }
        if self.has_user(username.as_str()) {
            return Err(TaskError::AlreadyExists { username: username.to_string() });
        }
        info!(user = %username, "registering user");
        self.credentials.push(Credential { username, password: password.to_string() });
        self.save_credentials()
    }

    pub fn save_tasks(&self) -> Result<()> {
        let lines = self.tasks.iter().map(codec::encode).chain(self.held_tasks.iter().cloned()).collect();
        write_lines(&self.paths.tasks, lines)?;
        info!(path = %self.paths.tasks.display(), count = self.tasks.len(), "tasks saved");
        Ok(())
    }

    pub fn save_credentials(&self) -> Result<()> {
        let lines = self.credentials.iter().map(codec::encode_credential).chain(self.held_users.iter().cloned()).collect();
        write_lines(&self.paths.users, lines)?;
        info!(path = %self.paths.users.display(), count = self.credentials.len(), "credentials saved");
        Ok(())
    }
}

fn read_records<T>(
    path: &Path,
    strict: bool,
    report: &mut LoadReport,
    decode: impl Fn(&str) -> std::result::Result<T, DecodeError>,
) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).map_err(|e| TaskError::io(path, e))?;
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        match decode(line) {
            Ok(rec) => out.push(rec),
            Err(source) if strict => {
                return Err(TaskError::Decode { path: path.to_path_buf(), line: i + 1, source });
            }
            Err(reason) => {
                warn!(path = %path.display(), line = i + 1, %reason, "malformed line kept on disk, not loaded");
                report.skipped.push(Skipped { path: path.to_path_buf(), line: i + 1, reason, raw: line.to_string() });
            }
        }
    }
    Ok(out)
}

fn write_lines(path: &Path, lines: Vec<String>) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| TaskError::io(dir, e))?;
        }
    }
    fs::write(path, lines.join("\n")).map_err(|e| TaskError::io(path, e))
}
