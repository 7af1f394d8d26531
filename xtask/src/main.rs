use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{fs, path::{Path, PathBuf}};
use taskdesk::{codec, Paths};

#[derive(Parser)]
#[command(name = "xtask", about = "taskdesk workspace tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Decode every line of tasks.txt and user.txt under DIR and report malformed ones
    CheckStore { dir: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::CheckStore { dir } => check_store(&dir),
    }
}

fn check_store(dir: &Path) -> Result<()> {
    let paths = Paths::in_dir(dir);
    let mut bad = 0;
    bad += check_file(&paths.tasks, |l| codec::decode(l).map(drop))?;
    bad += check_file(&paths.users, |l| codec::decode_credential(l).map(drop))?;
    if bad > 0 {
        eprintln!("{bad} malformed line(s) in {}", dir.display());
        std::process::exit(1);
    }
    println!("OK: {}", dir.display());
    Ok(())
}

fn check_file(path: &Path, decode: impl Fn(&str) -> Result<(), taskdesk::DecodeError>) -> Result<usize> {
    if !path.exists() {
        println!("missing (will be created on first run): {}", path.display());
        return Ok(0);
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut bad = 0;
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        if let Err(e) = decode(line) {
            eprintln!("- {}:{}: {}", path.display(), i + 1, e);
            bad += 1;
        }
    }
    Ok(bad)
}
