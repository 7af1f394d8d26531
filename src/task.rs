// taskdesk/src/task.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, TaskError};

/// Separates the six fields of a persisted task line.
pub const TASK_DELIMITER: &str = ", ";
/// Separates username and password in the credential file.
pub const USER_DELIMITER: &str = ";";
/// `18 Jun 2019`
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Text that is safe to write into a task line: trimmed, free of the field
/// delimiter and of line breaks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Field(String);

impl Field {
    pub fn new(field: &'static str, value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref().trim();
        if value.contains(TASK_DELIMITER) {
            return Err(TaskError::InvalidChars { field, found: TASK_DELIMITER });
        }
        if value.contains(['\n', '\r']) {
            return Err(TaskError::InvalidChars { field, found: "a line break" });
        }
        Ok(Self(value.to_string()))
    }

    /// Like [`Field::new`] but rejects empty text.
    pub fn required(field: &'static str, value: impl AsRef<str>) -> Result<Self> {
        let f = Self::new(field, value)?;
        if f.0.is_empty() { return Err(TaskError::Empty { field }); }
        Ok(f)
    }

    /// Usernames land in both files, so they must avoid both delimiters.
    pub fn username(value: impl AsRef<str>) -> Result<Self> {
        let f = Self::required("username", value)?;
        if f.0.contains(USER_DELIMITER) {
            return Err(TaskError::InvalidChars { field: "username", found: USER_DELIMITER });
        }
        Ok(f)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for Field {
    fn as_ref(&self) -> &str { &self.0 }
}

impl PartialEq<str> for Field {
    fn eq(&self, other: &str) -> bool { self.0 == other }
}

impl PartialEq<&str> for Field {
    fn eq(&self, other: &&str) -> bool { self.0 == *other }
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| TaskError::InvalidDate { input: input.trim().to_string() })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Task {
    pub assignee: Field,
    pub title: Field,
    pub description: Field,
    pub assigned_date: NaiveDate,
    pub due_date: NaiveDate,
    pub completed: bool,
}

impl Task {
    /// Incomplete and due strictly before `now`. The due date counts from its midnight.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.due_date.and_time(NaiveTime::MIN) < now
    }

    /// Human-readable block used by the task listings.
    pub fn display(&self, number: usize) -> String {
        let mut s = String::new();
        s.push_str(&format!("Task {number}: \t\t {}\n", self.title));
        s.push_str(&format!("Assigned to: \t {}\n", self.assignee));
        s.push_str(&format!("Date Assigned: \t {}\n", format_date(self.assigned_date)));
        s.push_str(&format!("Due Date: \t {}\n", format_date(self.due_date)));
        s.push_str(&format!("Task Description: \n {}\n", self.description));
        s.push_str(&format!("Task Completion Status: \n {}\n", if self.completed { "Yes" } else { "No" }));
        s
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub username: Field,
    pub password: String,
}
