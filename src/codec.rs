// taskdesk/src/codec.rs
//
// Line formats:
//   task:       assignee, title, description, due_date, assigned_date, Yes|No
//   credential: username;password

use crate::error::{DecodeError, TaskError};
use crate::task::{format_date, Credential, Field, Task, DATE_FORMAT, TASK_DELIMITER, USER_DELIMITER};
use chrono::NaiveDate;

const TASK_FIELDS: usize = 6;

fn field_err(field: &'static str) -> impl Fn(TaskError) -> DecodeError {
    move |e| DecodeError::Field { field, reason: e.to_string() }
}

fn date(text: &str) -> Result<NaiveDate, DecodeError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| DecodeError::Date(text.to_string()))
}

pub fn decode(line: &str) -> Result<Task, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let parts: Vec<&str> = line.split(TASK_DELIMITER).collect();
    if parts.len() != TASK_FIELDS {
        return Err(DecodeError::FieldCount { expected: TASK_FIELDS, found: parts.len() });
    }
    Ok(Task {
        assignee: Field::username(parts[0]).map_err(field_err("assignee"))?,
        title: Field::new("title", parts[1]).map_err(field_err("title"))?,
        description: Field::new("description", parts[2]).map_err(field_err("description"))?,
        due_date: date(parts[3])?,
        assigned_date: date(parts[4])?,
        completed: parts[5] == "Yes",
    })
}

pub fn encode(task: &Task) -> String {
    let due = format_date(task.due_date);
    let assigned = format_date(task.assigned_date);
    let fields: [&str; TASK_FIELDS] = [
        task.assignee.as_str(),
        task.title.as_str(),
        task.description.as_str(),
        &due,
        &assigned,
        if task.completed { "Yes" } else { "No" },
    ];
    fields.join(TASK_DELIMITER)
}

pub fn decode_credential(line: &str) -> Result<Credential, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (user, password) = line.split_once(USER_DELIMITER).ok_or(DecodeError::MissingSeparator)?;
    if password.contains(USER_DELIMITER) {
        return Err(DecodeError::Field { field: "password", reason: format!("cannot contain {USER_DELIMITER:?}") });
    }
    Ok(Credential {
        username: Field::username(user).map_err(field_err("username"))?,
        password: password.to_string(),
    })
}

pub fn encode_credential(cred: &Credential) -> String {
    format!("{}{USER_DELIMITER}{}", cred.username, cred.password)
}
