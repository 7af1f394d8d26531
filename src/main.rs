// taskdesk/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::{io, path::PathBuf};

use taskdesk::{
    config::{Config, ConfigManager, Scope},
    ops::{self, Action},
    report, Shell, Store, Task,
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ScopeArg { User, Workspace }

#[derive(Parser)]
#[command(name = "taskdesk", version, about = "Flat-file team task tracker")]
struct Args {
    /// Directory holding tasks.txt, user.txt and the reports (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Fail on malformed lines instead of skipping them
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Edit the layered configuration
    #[command(subcommand)]
    Config(ConfigCmd),
    #[command(flatten)]
    Store(StoreCmd),
}

#[derive(Subcommand)]
enum StoreCmd {
    /// Interactive login and menu (default)
    Shell,
    /// Add a user
    Register { username: String, password: String },
    /// Assign a task; the due date uses the form '18 Jun 2019'
    Add { assignee: String, title: String, description: String, due: String },
    /// List every task
    List {
        #[arg(long)]
        json: bool,
    },
    /// List the tasks assigned to one user
    Mine {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Mark task N (1-based) as complete
    Complete { index: usize },
    /// Reassign task N and move its due date
    Edit {
        index: usize,
        #[arg(long)]
        assignee: String,
        #[arg(long)]
        due: String,
    },
    /// Regenerate task_overview.txt and user_overview.txt
    Report,
    /// Print user/task counts and both reports
    Stats,
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Persist one key, e.g. `config set storage.dir /srv/tasks`
    Set {
        key: String,
        value: String,
        #[arg(long, value_enum, default_value_t = ScopeArg::Workspace)]
        scope: ScopeArg,
    },
    /// Print the merged configuration
    Show,
}

#[derive(Serialize)]
struct Numbered<'a> {
    number: usize,
    #[serde(flatten)]
    task: &'a Task,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = ConfigManager::load(std::env::current_dir()?)?;
    let mut overlay = Config::default();
    overlay.storage.dir = args.data_dir.clone();
    if args.strict { overlay.load.strict = Some(true); }
    cfg.apply_runtime_overlay(overlay)?;

    match args.cmd.unwrap_or(Cmd::Store(StoreCmd::Shell)) {
        Cmd::Config(c) => run_config(&mut cfg, c),
        Cmd::Store(c) => run_store(cfg.get(), c),
    }
}

fn run_store(cfg: &Config, cmd: StoreCmd) -> Result<()> {
    let (mut store, _) = Store::open(cfg).context("load store")?;

    match cmd {
        StoreCmd::Shell => {
            let stdin = io::stdin();
            Shell::new(&mut store, cfg.admin_user(), stdin.lock(), io::stdout()).run()?;
        }
        StoreCmd::Register { username, password } => {
            store.register(&username, &password)?;
            println!("New user added");
        }
        StoreCmd::Add { assignee, title, description, due } => {
            ops::add(&mut store, &assignee, &title, &description, &due)?;
            println!("Task {} successfully added.", store.tasks().len());
        }
        StoreCmd::List { json } => {
            if json {
                let all: Vec<Numbered> = store.tasks().iter().enumerate()
                    .map(|(i, task)| Numbered { number: i + 1, task }).collect();
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                print!("{}", ops::list_all(store.tasks()));
            }
        }
        StoreCmd::Mine { user, json } => {
            let mine = ops::list_mine(store.tasks(), &user);
            if json {
                let mine: Vec<Numbered> = mine.into_iter().map(|(number, task)| Numbered { number, task }).collect();
                println!("{}", serde_json::to_string_pretty(&mine)?);
            } else if mine.is_empty() {
                println!("{user} has no tasks.");
            } else {
                for (n, task) in mine { println!("{}\n{}", task.display(n), ops::SEPARATOR); }
            }
        }
        StoreCmd::Complete { index } => {
            let outcome = ops::select_and_mutate(&mut store, index, Action::Complete)?;
            println!("task {index}: {outcome:?}");
        }
        StoreCmd::Edit { index, assignee, due } => {
            let outcome = ops::select_and_mutate(&mut store, index, Action::Edit { assignee, due_date: due })?;
            println!("task {index}: {outcome:?}");
        }
        StoreCmd::Report => {
            let set = report::write_reports(&store)?;
            println!("{}\n\n{}", set.task_report, set.user_report);
        }
        StoreCmd::Stats => print!("{}", report::display_stats(&store)?),
    }
    Ok(())
}

fn run_config(cfg: &mut ConfigManager, cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Set { key, value, scope } => {
            let mut patch = Config::default();
            patch.set(&key, &value)?;
            let scope = match scope { ScopeArg::User => Scope::User, ScopeArg::Workspace => Scope::Workspace };
            let path = cfg.write_patch(scope, &patch)?;
            println!("{key} = {value} ({})", path.display());
        }
        ConfigCmd::Show => print!("{}", toml::to_string_pretty(cfg.get()).context("serialize toml")?),
    }
    Ok(())
}
