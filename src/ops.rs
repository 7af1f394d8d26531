// taskdesk/src/ops.rs

use chrono::{Local, NaiveDate};
use std::fmt;
use tracing::debug;

use crate::error::{Result, TaskError};
use crate::store::Store;
use crate::task::{parse_date, Field, Task};

pub const SEPARATOR: &str = "-----------------------------------";

/// Appends a task assigned today and persists the task file.
pub fn add(store: &mut Store, assignee: &str, title: &str, description: &str, due_date: &str) -> Result<Task> {
    add_on(store, assignee, title, description, due_date, Local::now().date_naive())
}

/// [`add`] with an explicit assignment date.
pub fn add_on(
    store: &mut Store, assignee: &str, title: &str, description: &str, due_date: &str, today: NaiveDate,
) -> Result<Task> {
    let assignee = existing_user(store, assignee)?;
    let task = Task {
        assignee,
        title: Field::required("title", title)?,
        description: Field::new("description", description)?,
        assigned_date: today,
        due_date: parse_date(due_date)?,
        completed: false,
    };
    store.tasks_mut().push(task.clone());
    store.save_tasks()?;
    debug!(number = store.tasks().len(), assignee = %task.assignee, "task added");
    Ok(task)
}

fn existing_user(store: &Store, username: &str) -> Result<Field> {
    let username = username.trim();
    if !store.has_user(username) {
        return Err(TaskError::UserNotFound { username: username.to_string() });
    }
    Field::username(username)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    Empty,
    Blocks(Vec<String>),
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        match self {
            Listing::Empty => writeln!(f, "There are no tasks.\n{SEPARATOR}"),
            Listing::Blocks(blocks) => {
                for b in blocks { writeln!(f, "{b}\n{SEPARATOR}")?; }
                Ok(())
            }
        }
    }
}

/// Every task in insertion order, numbered from 1.
pub fn list_all(tasks: &[Task]) -> Listing {
    if tasks.is_empty() { return Listing::Empty; }
    Listing::Blocks(tasks.iter().enumerate().map(|(i, t)| t.display(i + 1)).collect())
}

/// Tasks assigned to `username`, keeping each task's 1-based position in the full list.
pub fn list_mine<'a>(tasks: &'a [Task], username: &str) -> Vec<(usize, &'a Task)> {
    tasks.iter().enumerate()
        .filter(|(_, t)| t.assignee == username)
        .map(|(i, t)| (i + 1, t))
        .collect()
}

/// What the user typed when asked which task to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Cancel,
    Index(usize),
    Invalid,
}

impl Selection {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "-1" => Self::Cancel,
            s => match s.parse::<usize>() {
                Ok(n) if n > 0 => Self::Index(n),
                _ => Self::Invalid,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Complete,
    Edit { assignee: String, due_date: String },
    Cancel,
    Invalid(String),
}

/// The verb chosen for a selected task, before any edit details are collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind { Complete, Edit, Invalid }

impl ActionKind {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "comp" | "complete" => Self::Complete,
            "edit" => Self::Edit,
            _ => Self::Invalid,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Edited,
    Cancelled,
    AlreadyCompleted,
    Invalid(String),
}

fn position(tasks: &[Task], index: usize) -> Result<usize> {
    if index == 0 || index > tasks.len() {
        return Err(TaskError::NotFound { index, len: tasks.len() });
    }
    Ok(index - 1)
}

/// Whether the task at `index` may still be edited. Lets the caller refuse
/// before asking for a new assignee and due date.
pub fn check_editable(tasks: &[Task], index: usize) -> Result<Option<Outcome>> {
    let task = &tasks[position(tasks, index)?];
    Ok(task.completed.then_some(Outcome::AlreadyCompleted))
}

/// Applies `action` to the task at 1-based `index` and persists on success.
pub fn select_and_mutate(store: &mut Store, index: usize, action: Action) -> Result<Outcome> {
    let outcome = match action {
        Action::Cancel => return Ok(Outcome::Cancelled),
        Action::Invalid(input) => return Ok(Outcome::Invalid(input)),
        Action::Complete => {
            let pos = position(store.tasks(), index)?;
            store.tasks_mut()[pos].completed = true;
            Outcome::Completed
        }
        Action::Edit { assignee, due_date } => {
            let pos = position(store.tasks(), index)?;
            if store.tasks()[pos].completed { return Ok(Outcome::AlreadyCompleted); }
            let assignee = existing_user(store, &assignee)?;
            let due_date = parse_date(&due_date)?;
            let task = &mut store.tasks_mut()[pos];
            task.assignee = assignee;
            task.due_date = due_date;
            Outcome::Edited
        }
    };
    store.save_tasks()?;
    debug!(index, ?outcome, "task updated");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Paths;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> Store {
        Store::load(Paths::in_dir(dir.path()), false, ("admin", "password")).unwrap().0
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

    #[test]
    fn add_assigns_today_and_lists_as_first() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        let t = add_on(&mut s, "admin", "T", "D", "18 Jun 2019", day(2024, 3, 1)).unwrap();
        assert_eq!(t.assigned_date, day(2024, 3, 1));
        assert_eq!(t.due_date, day(2019, 6, 18));
        assert!(!t.completed);
        match list_all(s.tasks()) {
            Listing::Blocks(b) => {
                assert_eq!(b.len(), 1);
                assert!(b[0].starts_with("Task 1: \t\t T\n"));
            }
            Listing::Empty => panic!("expected one task"),
        }
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("tasks.txt")).unwrap(),
            "admin, T, D, 18 Jun 2019, 01 Mar 2024, No"
        );
    }

    #[test]
    fn add_rejects_unknown_user_bad_text_and_bad_date() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        for who in ["bob", "", "Admin", "admin, x"] {
            assert!(matches!(add(&mut s, who, "T", "D", "18 Jun 2019"), Err(TaskError::UserNotFound { .. })), "{who}");
        }
        assert!(matches!(add(&mut s, "admin", "a, b", "D", "18 Jun 2019"), Err(TaskError::InvalidChars { .. })));
        assert!(matches!(add(&mut s, "admin", "T", "x, y", "18 Jun 2019"), Err(TaskError::InvalidChars { .. })));
        assert!(matches!(add(&mut s, "admin", "T", "D", "2019-06-18"), Err(TaskError::InvalidDate { .. })));
        assert!(s.tasks().is_empty());
    }

    #[test]
    fn add_requires_a_title_but_not_a_description() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        for title in ["", "   "] {
            assert!(matches!(add(&mut s, "admin", title, "D", "18 Jun 2019"), Err(TaskError::Empty { field: "title" })));
        }
        assert!(s.tasks().is_empty());
        assert_eq!(std::fs::read_to_string(tmp.path().join("tasks.txt")).unwrap(), "");
        add(&mut s, "admin", "T", "", "18 Jun 2019").unwrap();
        assert_eq!(s.tasks()[0].description, "");
    }

    #[test]
    fn empty_listing_says_so() {
        assert_eq!(list_all(&[]), Listing::Empty);
        assert!(Listing::Empty.to_string().contains("There are no tasks."));
    }

    #[test]
    fn list_mine_keeps_global_numbering() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        s.register("bob", "pw").unwrap();
        add(&mut s, "admin", "A1", "", "18 Jun 2019").unwrap();
        add(&mut s, "bob", "B1", "", "18 Jun 2019").unwrap();
        add(&mut s, "admin", "A2", "", "18 Jun 2019").unwrap();
        let mine: Vec<usize> = list_mine(s.tasks(), "admin").iter().map(|(i, _)| *i).collect();
        assert_eq!(mine, vec![1, 3]);
        assert_eq!(list_mine(s.tasks(), "bob")[0].1.title, "B1");
        assert!(list_mine(s.tasks(), "carol").is_empty());
    }

    #[test]
    fn selection_and_action_parsing() {
        assert_eq!(Selection::parse("-1"), Selection::Cancel);
        assert_eq!(Selection::parse(" 3 "), Selection::Index(3));
        assert_eq!(Selection::parse("0"), Selection::Invalid);
        assert_eq!(Selection::parse("x"), Selection::Invalid);
        assert_eq!(ActionKind::parse("comp"), ActionKind::Complete);
        assert_eq!(ActionKind::parse("EDIT"), ActionKind::Edit);
        assert_eq!(ActionKind::parse("delete"), ActionKind::Invalid);
    }

    #[test]
    fn complete_then_edit_is_refused() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        add(&mut s, "admin", "T", "D", "18 Jun 2019").unwrap();
        assert_eq!(select_and_mutate(&mut s, 1, Action::Complete).unwrap(), Outcome::Completed);
        assert!(s.tasks()[0].completed);

        assert_eq!(check_editable(s.tasks(), 1).unwrap(), Some(Outcome::AlreadyCompleted));
        let edit = Action::Edit { assignee: "admin".into(), due_date: "01 Jan 2030".into() };
        assert_eq!(select_and_mutate(&mut s, 1, edit).unwrap(), Outcome::AlreadyCompleted);
        assert_eq!(s.tasks()[0].due_date, day(2019, 6, 18));
    }

    #[test]
    fn edit_reassigns_and_moves_due_date() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        s.register("bob", "pw").unwrap();
        add(&mut s, "admin", "T", "D", "18 Jun 2019").unwrap();
        assert_eq!(check_editable(s.tasks(), 1).unwrap(), None);

        let bad = Action::Edit { assignee: "bob".into(), due_date: "soon".into() };
        assert!(matches!(select_and_mutate(&mut s, 1, bad), Err(TaskError::InvalidDate { .. })));
        let ghost = Action::Edit { assignee: "ghost".into(), due_date: "01 Jan 2030".into() };
        assert!(matches!(select_and_mutate(&mut s, 1, ghost), Err(TaskError::UserNotFound { .. })));
        assert_eq!(s.tasks()[0].assignee, "admin");

        let edit = Action::Edit { assignee: "bob".into(), due_date: "01 Jan 2030".into() };
        assert_eq!(select_and_mutate(&mut s, 1, edit).unwrap(), Outcome::Edited);
        assert_eq!(s.tasks()[0].assignee, "bob");
        assert_eq!(s.tasks()[0].due_date, day(2030, 1, 1));
        let reloaded = store(&tmp);
        assert_eq!(reloaded.tasks(), s.tasks());
    }

    #[test]
    fn out_of_range_cancel_and_invalid() {
        let tmp = TempDir::new().unwrap();
        let mut s = store(&tmp);
        add(&mut s, "admin", "T", "D", "18 Jun 2019").unwrap();
        assert!(matches!(select_and_mutate(&mut s, 2, Action::Complete), Err(TaskError::NotFound { index: 2, len: 1 })));
        assert!(matches!(check_editable(s.tasks(), 0), Err(TaskError::NotFound { .. })));
        assert_eq!(select_and_mutate(&mut s, 99, Action::Cancel).unwrap(), Outcome::Cancelled);
        assert_eq!(
            select_and_mutate(&mut s, 1, Action::Invalid("zap".into())).unwrap(),
            Outcome::Invalid("zap".into())
        );
        assert!(!s.tasks()[0].completed);
    }
}
