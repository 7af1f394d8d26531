// taskdesk/src/shell.rs
//
// Line-oriented login + menu loop. Owns every prompt and retry; the
// operations it calls never read input themselves.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

use crate::error::TaskError;
use crate::ops::{self, Action, ActionKind, Outcome, Selection, SEPARATOR};
use crate::report;
use crate::store::Store;
use crate::task::{parse_date, Field};

enum Flow { Continue, Quit }

pub struct Shell<'a, R, W> {
    store: &'a mut Store,
    admin: String,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a mut Store, admin: impl Into<String>, input: R, out: W) -> Self {
        Self { store, admin: admin.into(), input, out }
    }

    /// Runs until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        let Some(user) = self.login()? else { return Ok(()); };
        loop {
            writeln!(self.out)?;
            let menu = self.menu_text(&user);
            let Some(choice) = self.prompt(&menu)? else { return Ok(()); };
            let flow = match choice.trim().to_lowercase().as_str() {
                "r" => self.register(&user)?,
                "a" => self.add_task()?,
                "va" => self.view_all()?,
                "vm" => self.view_mine(&user)?,
                "gr" if self.is_admin(&user) => self.generate_reports()?,
                "ds" if self.is_admin(&user) => self.display_stats()?,
                "e" => {
                    writeln!(self.out, "Goodbye!!!")?;
                    Flow::Quit
                }
                _ => {
                    writeln!(self.out, "You have made a wrong choice, Please Try again")?;
                    Flow::Continue
                }
            };
            if let Flow::Quit = flow { return Ok(()); }
        }
    }

    fn is_admin(&self, user: &str) -> bool { user == self.admin }

    fn menu_text(&self, user: &str) -> String {
        let mut s = String::from("Select one of the following Options below:\n");
        s.push_str("r - Registering a user\na - Adding a task\nva - View all tasks\nvm - view my task\n");
        if self.is_admin(user) {
            s.push_str("gr - generate reports\nds - display statistics\n");
        }
        s.push_str("e - Exit\n: ");
        s
    }

    /// Prints `text` and reads one line; `None` once input is exhausted.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 { return Ok(None); }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Prints a recoverable error; fatal ones are returned.
    fn recover<T>(&mut self, r: std::result::Result<T, TaskError>) -> Result<Option<T>> {
        match r {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                Ok(None)
            }
        }
    }

    fn login(&mut self) -> Result<Option<String>> {
        loop {
            writeln!(self.out, "LOGIN")?;
            let Some(user) = self.prompt("Username: ")? else { return Ok(None); };
            let Some(pass) = self.prompt("Password: ")? else { return Ok(None); };
            match self.store.authenticate(&user, &pass) {
                Ok(()) => {
                    writeln!(self.out, "Login Successful!")?;
                    debug!(%user, "logged in");
                    return Ok(Some(user));
                }
                Err(TaskError::UserNotFound { .. }) => writeln!(self.out, "User does not exist")?,
                Err(TaskError::WrongPassword) => writeln!(self.out, "Wrong password")?,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn register(&mut self, user: &str) -> Result<Flow> {
        if !self.is_admin(user) {
            writeln!(self.out, "Registering new users requires admin privileges")?;
            return Ok(Flow::Continue);
        }
        let Some(username) = self.prompt("New Username: ")? else { return Ok(Flow::Quit); };
        if self.store.has_user(username.trim()) {
            writeln!(self.out, "Username already exists. Please try again with a different username.")?;
            return Ok(Flow::Continue);
        }
        let Some(password) = self.prompt("New Password: ")? else { return Ok(Flow::Quit); };
        let Some(confirm) = self.prompt("Confirm Password: ")? else { return Ok(Flow::Quit); };
        if password != confirm {
            writeln!(self.out, "Passwords do not match")?;
            return Ok(Flow::Continue);
        }
        let r = self.store.register(&username, &password);
        if self.recover(r)?.is_some() {
            writeln!(self.out, "New user added")?;
        }
        Ok(Flow::Continue)
    }

    /// Re-prompts until `check` accepts the input.
    fn prompt_until<T>(
        &mut self, text: &str, check: impl Fn(&str) -> std::result::Result<T, TaskError>,
    ) -> Result<Option<String>> {
        loop {
            let Some(input) = self.prompt(text)? else { return Ok(None); };
            match check(&input) {
                Ok(_) => return Ok(Some(input)),
                Err(e) => writeln!(self.out, "{e}")?,
            }
        }
    }

    fn add_task(&mut self) -> Result<Flow> {
        let Some(assignee) = self.prompt("Name of person assigned to task: ")? else { return Ok(Flow::Quit); };
        if !self.store.has_user(assignee.trim()) {
            writeln!(self.out, "User does not exist. Please enter a valid username")?;
            return Ok(Flow::Continue);
        }
        let Some(title) = self.prompt_until("Title of Task: ", |s| Field::required("title", s))? else { return Ok(Flow::Quit); };
        let Some(description) = self.prompt_until("Description of Task: ", |s| Field::new("description", s))?
        else { return Ok(Flow::Quit); };
        let Some(due) = self.prompt_until("Due date of task DD MMM YYYY (e.g. 18 Jun 2019): ", parse_date)?
        else { return Ok(Flow::Quit); };
        let r = ops::add(self.store, &assignee, &title, &description, &due);
        if self.recover(r)?.is_some() {
            writeln!(self.out, "Task successfully added.")?;
        }
        Ok(Flow::Continue)
    }

    fn view_all(&mut self) -> Result<Flow> {
        write!(self.out, "{}", ops::list_all(self.store.tasks()))?;
        Ok(Flow::Continue)
    }

    fn view_mine(&mut self, user: &str) -> Result<Flow> {
        writeln!(self.out, "{SEPARATOR}")?;
        let mine = ops::list_mine(self.store.tasks(), user);
        if mine.is_empty() {
            writeln!(self.out, "You have no tasks.\n{SEPARATOR}")?;
        }
        for (n, task) in mine {
            writeln!(self.out, "{}\n{SEPARATOR}", task.display(n))?;
        }

        let text = "\nEnter the number of the task you would like to view.\nOr else, enter '-1' to go back to the main menu.\n: ";
        let Some(selected) = self.prompt(text)? else { return Ok(Flow::Quit); };
        let index = match Selection::parse(&selected) {
            Selection::Cancel => return self.apply(0, Action::Cancel),
            Selection::Invalid => {
                writeln!(self.out, "Invalid selection")?;
                return Ok(Flow::Continue);
            }
            Selection::Index(n) => n,
        };
        let r = ops::check_editable(self.store.tasks(), index);
        let Some(already_done) = self.recover(r)? else { return Ok(Flow::Continue); };

        let Some(option) = self.prompt("Select an option:\nedit \t Edit Task\ncomp \t Mark as Complete\n: ")?
        else { return Ok(Flow::Quit); };
        let action = match ActionKind::parse(&option) {
            ActionKind::Complete => Action::Complete,
            ActionKind::Invalid => Action::Invalid(option),
            ActionKind::Edit if already_done.is_some() => {
                self.show_outcome(Outcome::AlreadyCompleted)?;
                return Ok(Flow::Continue);
            }
            ActionKind::Edit => {
                let Some(assignee) = self.prompt("Enter username of who you want to assign task to?: ")?
                else { return Ok(Flow::Quit); };
                let text = "Enter the new due date in the format 'DD MMM YYYY' (e.g. 18 Jun 2019): ";
                let Some(due_date) = self.prompt_until(text, parse_date)? else { return Ok(Flow::Quit); };
                Action::Edit { assignee, due_date }
            }
        };
        self.apply(index, action)
    }

    fn apply(&mut self, index: usize, action: Action) -> Result<Flow> {
        let r = ops::select_and_mutate(self.store, index, action);
        if let Some(outcome) = self.recover(r)? {
            self.show_outcome(outcome)?;
        }
        Ok(Flow::Continue)
    }

    fn show_outcome(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Completed => writeln!(self.out, "Task marked as complete.")?,
            Outcome::Edited => writeln!(self.out, "Task updated.")?,
            Outcome::Cancelled => {}
            Outcome::AlreadyCompleted => writeln!(self.out, "Task is already completed and cannot be edited.")?,
            Outcome::Invalid(_) => writeln!(self.out, "Something went wrong...")?,
        }
        Ok(())
    }

    fn generate_reports(&mut self) -> Result<Flow> {
        let r = report::write_reports(self.store);
        if self.recover(r)?.is_some() {
            writeln!(self.out, "Reports generated.")?;
        }
        Ok(Flow::Continue)
    }

    fn display_stats(&mut self) -> Result<Flow> {
        let r = report::display_stats(self.store);
        if let Some(text) = self.recover(r)? {
            write!(self.out, "{text}")?;
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Paths;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run(dir: &TempDir, script: &str) -> (Store, String) {
        let (mut store, _) = Store::load(Paths::in_dir(dir.path()), false, ("admin", "password")).unwrap();
        let mut out = Vec::new();
        Shell::new(&mut store, "admin", Cursor::new(script.to_string()), &mut out).run().unwrap();
        (store, String::from_utf8(out).unwrap())
    }

    #[test]
    fn login_retries_until_credentials_match() {
        let tmp = TempDir::new().unwrap();
        let (_, out) = run(&tmp, "bob\nx\nadmin\nnope\nadmin\npassword\ne\n");
        assert!(out.contains("User does not exist"));
        assert!(out.contains("Wrong password"));
        assert!(out.contains("Login Successful!"));
        assert!(out.contains("gr - generate reports"));
        assert!(out.ends_with("Goodbye!!!\n"));
    }

    #[test]
    fn eof_ends_the_session_quietly() {
        let tmp = TempDir::new().unwrap();
        let (_, out) = run(&tmp, "admin\n");
        assert!(!out.contains("Login Successful!"));
    }

    #[test]
    fn add_reprompts_for_bad_title_and_date() {
        let tmp = TempDir::new().unwrap();
        let script = "admin\npassword\na\nadmin\nbad, title\nGood\nDesc\n2019-06-18\n18 Jun 2019\ne\n";
        let (store, out) = run(&tmp, script);
        assert!(out.contains("title cannot contain \", \""));
        assert!(out.contains("invalid date"));
        assert!(out.contains("Task successfully added."));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].title, "Good");
    }

    #[test]
    fn add_reprompts_for_blank_title() {
        let tmp = TempDir::new().unwrap();
        let script = "admin\npassword\na\nadmin\n   \n\nT\n\n18 Jun 2019\ne\n";
        let (store, out) = run(&tmp, script);
        assert_eq!(out.matches("title cannot be empty").count(), 2);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].title, "T");
    }

    #[test]
    fn cancel_returns_to_menu_without_touching_tasks() {
        let tmp = TempDir::new().unwrap();
        let line = "admin, T, D, 18 Jun 2019, 01 Jun 2019, No";
        std::fs::write(tmp.path().join("tasks.txt"), line).unwrap();
        let (store, out) = run(&tmp, "admin\npassword\nvm\n-1\ne\n");
        assert!(!out.contains("Select an option"));
        assert!(out.ends_with("Goodbye!!!\n"));
        assert!(!store.tasks()[0].completed);
        assert_eq!(std::fs::read_to_string(tmp.path().join("tasks.txt")).unwrap(), line);
    }

    #[test]
    fn register_requires_matching_confirmation() {
        let tmp = TempDir::new().unwrap();
        let script = "admin\npassword\nr\nbob\npw\npx\nr\nbob\npw\npw\nr\nbob\ne\n";
        let (store, out) = run(&tmp, script);
        assert!(out.contains("Passwords do not match"));
        assert!(out.contains("New user added"));
        assert!(out.contains("Username already exists."));
        assert_eq!(store.credentials().len(), 2);
    }

    #[test]
    fn non_admin_cannot_register_or_report() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("user.txt"), "admin;password\nbob;pw").unwrap();
        let (_, out) = run(&tmp, "bob\npw\nr\ngr\ne\n");
        assert!(out.contains("Registering new users requires admin privileges"));
        assert!(out.contains("You have made a wrong choice"));
        assert!(!out.contains("ds - display statistics"));
        assert!(!tmp.path().join("task_overview.txt").exists());
    }

    #[test]
    fn view_mine_complete_then_refuse_edit() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("tasks.txt"), "admin, T, D, 18 Jun 2019, 01 Jun 2019, No").unwrap();
        let script = "admin\npassword\nvm\n1\ncomp\nvm\n1\nedit\nvm\n-1\nvm\n7\ne\n";
        let (store, out) = run(&tmp, script);
        assert!(out.contains("Task marked as complete."));
        assert!(out.contains("Task is already completed and cannot be edited."));
        assert!(out.contains("no task numbered 7"));
        assert!(store.tasks()[0].completed);
    }

    #[test]
    fn display_stats_generates_missing_reports() {
        let tmp = TempDir::new().unwrap();
        let (_, out) = run(&tmp, "admin\npassword\nds\ne\n");
        assert!(out.contains("Number of users: \t\t 1"));
        assert!(out.contains("task_overview.txt Contents:"));
        assert!(out.contains("user_overview.txt Contents:"));
        assert!(tmp.path().join("user_overview.txt").exists());
    }
}
