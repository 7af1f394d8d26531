// taskdesk/src/report.rs
//
// Both reports are recomputed from the store and overwritten in full.

use chrono::{Local, NaiveDateTime};
use std::fs;
use tracing::info;

use crate::config::Paths;
use crate::error::{Result, TaskError};
use crate::ops::SEPARATOR;
use crate::store::Store;
use crate::task::{Credential, Task};

/// `part / whole * 100`, or `None` when there is nothing to divide by.
pub fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole != 0).then(|| part as f64 / whole as f64 * 100.0)
}

fn pct(v: f64) -> String { format!("{v:.2}%") }

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskOverview {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub overdue: usize,
}

impl TaskOverview {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: NaiveDateTime) -> Self {
        let mut o = Self::default();
        for t in tasks {
            o.total += 1;
            if t.completed { o.completed += 1; } else { o.incomplete += 1; }
            if t.is_overdue(now) { o.overdue += 1; }
        }
        o
    }

    pub fn completed_pct(&self) -> Option<f64> { percent(self.completed, self.total) }
    pub fn incomplete_pct(&self) -> Option<f64> { percent(self.incomplete, self.total) }
    pub fn overdue_pct(&self) -> Option<f64> { percent(self.overdue, self.total) }

    pub fn render(&self) -> String {
        let n = self.total;
        let or_none = |v: Option<f64>| v.map(pct).unwrap_or_else(|| "n/a - there are no tasks".into());
        let mut s = String::new();
        s.push_str(&format!("Total # of Tasks: \t\t {n}\n"));
        s.push_str(&format!("# of Completed Tasks: \t\t {} out of {n} tasks.\n", self.completed));
        s.push_str(&format!("# of Incomplete Tasks: \t\t {} out of {n} tasks.\n", self.incomplete));
        s.push_str(&format!("# of Overdue Tasks: \t\t {} out of {n} tasks.\n", self.overdue));
        s.push_str(&format!("% of Incomplete Tasks: \t\t {}\n", or_none(self.incomplete_pct())));
        s.push_str(&format!("% of Overdue Tasks: \t\t {}", or_none(self.overdue_pct())));
        s
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserOverview {
    pub username: String,
    /// Task count across every user, for the share-of-total line.
    pub all_tasks: usize,
    pub tasks: TaskOverview,
}

impl UserOverview {
    pub fn share_pct(&self) -> Option<f64> { percent(self.tasks.total, self.all_tasks) }
    pub fn completed_pct(&self) -> Option<f64> { self.tasks.completed_pct() }
    pub fn incomplete_pct(&self) -> Option<f64> { self.tasks.incomplete_pct() }
    /// Share of the user's incomplete tasks that are overdue.
    pub fn overdue_pct(&self) -> Option<f64> { percent(self.tasks.overdue, self.tasks.incomplete) }

    pub fn render(&self) -> String {
        let u = &self.username;
        let mut s = String::new();
        s.push_str(&format!("{u} has {} tasks.\n", self.tasks.total));
        match self.share_pct() {
            Some(p) => s.push_str(&format!("{u} is assigned {} of the tasks.\n", pct(p))),
            None => s.push_str(&format!("{u} is assigned 0 tasks - there are no tasks in the system.\n")),
        }
        match (self.completed_pct(), self.incomplete_pct()) {
            (Some(done), Some(left)) => {
                s.push_str(&format!("{u} has completed {} of their assigned tasks.\n", pct(done)));
                s.push_str(&format!("{u} has {} of their assigned tasks left to complete.\n", pct(left)));
                match self.overdue_pct() {
                    Some(p) => s.push_str(&format!("{u} has {} of their incomplete tasks overdue.\n", pct(p))),
                    None => s.push_str(&format!(
                        "{u} has 0 incomplete tasks - cannot compute percentage of incomplete tasks that are overdue.\n"
                    )),
                }
            }
            _ => {
                s.push_str(&format!("{u} has 0 tasks assigned - cannot compute percentage of task completion.\n"));
                s.push_str(&format!("{u} has 0 tasks assigned - cannot compute percentage of tasks still incomplete.\n"));
                s.push_str(&format!("{u} has 0 tasks assigned - cannot compute percentage of incomplete tasks that are overdue.\n"));
            }
        }
        s.push_str(SEPARATOR);
        s.push('\n');
        s
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportSet {
    pub tasks: TaskOverview,
    pub users: Vec<UserOverview>,
    pub task_report: String,
    pub user_report: String,
}

/// Statistics as of `now`; the same instant is used for every overdue check.
pub fn generate_at(tasks: &[Task], credentials: &[Credential], now: NaiveDateTime) -> ReportSet {
    let overview = TaskOverview::from_tasks(tasks, now);
    let users: Vec<UserOverview> = credentials.iter().map(|c| UserOverview {
        username: c.username.to_string(),
        all_tasks: tasks.len(),
        tasks: TaskOverview::from_tasks(tasks.iter().filter(|t| t.assignee == c.username), now),
    }).collect();

    let mut user_report = String::new();
    user_report.push_str(&format!("Number of Users: {}\n", credentials.len()));
    user_report.push_str(&format!("Number of Tasks: {}\n", tasks.len()));
    user_report.push_str(&format!("{SEPARATOR}\n"));
    for u in &users { user_report.push_str(&u.render()); }

    ReportSet { task_report: overview.render(), tasks: overview, users, user_report }
}

impl ReportSet {
    /// Overwrites both report files with this set's text.
    pub fn write(&self, paths: &Paths) -> Result<()> {
        for (path, text) in [(&paths.task_report, &self.task_report), (&paths.user_report, &self.user_report)] {
            fs::write(path, text).map_err(|e| TaskError::io(path, e))?;
        }
        info!(tasks = self.tasks.total, users = self.users.len(), "reports written");
        Ok(())
    }
}

pub fn generate(store: &Store) -> ReportSet {
    generate_at(store.tasks(), store.credentials(), Local::now().naive_local())
}

/// Regenerates both reports and overwrites their files.
pub fn write_reports(store: &Store) -> Result<ReportSet> {
    let set = generate(store);
    set.write(store.paths())?;
    Ok(set)
}

/// User and task counts followed by both report files, regenerating them
/// first when either is missing.
pub fn display_stats(store: &Store) -> Result<String> {
    let paths = store.paths();
    if !paths.task_report.exists() || !paths.user_report.exists() {
        write_reports(store)?;
    }
    let mut s = String::new();
    s.push_str(&format!("{SEPARATOR}\n"));
    s.push_str(&format!("Number of users: \t\t {}\n", store.credentials().len()));
    s.push_str(&format!("Number of tasks: \t\t {}\n", store.tasks().len()));
    s.push_str(&format!("{SEPARATOR}\n"));
    for path in [&paths.task_report, &paths.user_report] {
        let text = fs::read_to_string(path).map_err(|e| TaskError::io(path, e))?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        s.push_str(&format!("\n{name} Contents: \n\n{text}\n"));
    }
    Ok(s)
}
