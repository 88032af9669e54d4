use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{config::Config as EditorConfig, Editor, Helper};
use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

mod input;
mod lang;
mod repl;

use lang::runtime::{self, Runtime};
use repl::{Command, ReplHelper};

const HISTORY_FILE: &str = ".jamalang_history";
const PROMPT: &str = "(jamalang) ";

#[derive(Parser)]
#[command(author, version, about)]
struct Opt {
    /// Show debug output
    #[arg(short, long)]
    debug: bool,
    /// Script to run. Starts an interactive session if omitted
    file: Option<PathBuf>,
}

fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Error
    };

    match SimpleLogger::init(filter, LogConfig::default()) {
        Ok(_) => Ok(()),
        Err(e) => bail!("Failed to init logger: {}", e),
    }
}

fn init_editor() -> Result<Editor<ReplHelper, DefaultHistory>> {
    let config = EditorConfig::builder().auto_add_history(true).build();
    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(ReplHelper::new()));

    Ok(editor)
}

fn init_history<H: Helper>(editor: &mut Editor<H, DefaultHistory>) {
    let _ = editor.load_history(HISTORY_FILE);
}

fn save_history<H: Helper>(editor: &mut Editor<H, DefaultHistory>) -> Result<()> {
    match editor.save_history(HISTORY_FILE) {
        Ok(_) => Ok(()),
        Err(e) => bail!("Failed to save history: {}", e),
    }
}

fn welcome() {
    println!(r#"jamalang v{}"#, env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for help");
    println!();
}

fn run_file(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    info!("loaded {}", path.display());

    runtime::run(&source)?;

    Ok(())
}

fn run_repl() -> Result<()> {
    let mut editor = init_editor()?;
    init_history(&mut editor);
    welcome();

    let mut sink = io::stdout();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut rt = Runtime::new(&mut sink, &mut input);

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                info!("read: {}", &line);

                match repl::command(&line) {
                    Some(Command::Quit) => break,
                    Some(Command::Help) => repl::print_help(&mut io::stdout())?,
                    Some(Command::Vars) => repl::print_vars(&mut io::stdout(), rt.environment())?,
                    None => {
                        if let Err(e) = rt.run(&line) {
                            eprintln!("{}", e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("Press Ctrl-D or type 'quit' to quit");
            }
            Err(ReadlineError::Eof) => {
                println!("quit");
                break;
            }
            Err(e) => {
                error!("Unexpected error: {}", e);
                println!("quit");
                break;
            }
        }
    }

    save_history(&mut editor)?;

    Ok(())
}

fn main() -> Result<()> {
    let opts = Opt::parse();
    init_logging(opts.debug)?;

    match opts.file {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}
