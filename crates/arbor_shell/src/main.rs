//! arbor - inspect and round-trip page files
//!
//! ```text
//! arbor [--config <file>] info <page>
//! arbor [--config <file>] tree <page>
//! arbor [--config <file>] roundtrip <in> <out>
//! ```

mod commands;
mod config;
mod error;

use arbor_res::Asset;
use commands::{PageReport, RoundTrip, Session, TreeView};
use config::ShellConfig;
use error::{Result, ShellError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "usage: arbor [--config <file>] (info <page> | tree <page> | roundtrip <in> <out>)";

/// A parsed command line
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Info(PathBuf),
    Tree(PathBuf),
    RoundTrip { input: PathBuf, output: PathBuf },
}

impl Command {
    /// Parse the arguments after the program name, `--config` already removed
    fn parse(args: &[String]) -> Result<Self> {
        let usage = || ShellError::Usage(USAGE.to_string());
        let (name, rest) = args.split_first().ok_or_else(usage)?;
        match (name.as_str(), rest) {
            ("info", [page]) => Ok(Command::Info(page.into())),
            ("tree", [page]) => Ok(Command::Tree(page.into())),
            ("roundtrip", [input, output]) => Ok(Command::RoundTrip {
                input: input.into(),
                output: output.into(),
            }),
            _ => Err(usage()),
        }
    }
}

/// Drop the program name and any `--config <file>` pair
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            iter.next();
        } else {
            out.push(arg.clone());
        }
    }
    out
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ShellError::Usage(usage)) => {
            eprintln!("{}", usage);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let command = Command::parse(&positional(args))?;
    let config = ShellConfig::load(ShellConfig::path_from_args(args).as_deref())?;
    let session = Session::new(config);

    match command {
        Command::Info(path) => {
            let page = session.import_path(&path)?;
            print!("{}", PageReport::of(&page));
        }
        Command::Tree(path) => {
            let page = session.import_path(&path)?;
            let tree = TreeView::new(session.project().namespace(), page.base().atom());
            print!("{}", tree);
        }
        Command::RoundTrip { input, output } => {
            let original = read(&input)?;
            let page = session.import_path(&input)?;
            let result = RoundTrip::run(&page, &original)?;
            std::fs::write(&output, &result.exported).map_err(|source| ShellError::Write {
                path: output.clone(),
                source,
            })?;
            if !result.is_identical() {
                log::warn!("Export of {} does not match its input", input.display());
            }
            println!("{} -> {}: {}", input.display(), output.display(), result);
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| ShellError::Read {
        path: path.to_path_buf(),
        source,
    })
}
