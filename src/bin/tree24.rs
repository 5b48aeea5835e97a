//! Line-oriented shell for exercising a [`Tree24`].
//!
//! Reads one command per line from stdin or from `--file`, applies it to a single tree and prints
//! one result line per command.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, info};
use thiserror::Error;
use tree24::{Key, Tree24};

const HELP: &str = "\
Commands:
  insert <key>      add a key
  delete <key>      remove a key
  search <key>      report whether a key is stored
  select <rank>     print the rank-th smallest key (alias: find)
  rank <key>        print the one-based rank of a key
  sort              print the node structure, then every key in order
  count             print the number of keys
  height            print the number of node levels
  clear             remove every key
  destroy           release the tree; clear revives it
  help              show this text
  exit              leave the shell (alias: quit)";

#[derive(Parser, Debug)]
#[command(name = "tree24")]
#[command(version)]
#[command(about = "Interactive shell over an order-statistic (2,4) tree")]
struct Args {
    /// Number of keys to reserve node storage for
    #[arg(short = 'c', long = "capacity", default_value = "0")]
    capacity: usize,

    /// Log level (off, error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(short = 'l', long = "log-level", default_value = "warn")]
    log_level: String,

    /// Read commands from a file instead of stdin
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// Suppress the banner and prompt
    #[arg(short = 'q', long = "quiet", default_value = "false")]
    quiet: bool,
}

/// One parsed shell line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Insert(Key),
    Delete(Key),
    Search(Key),
    Select(usize),
    Rank(Key),
    Sort,
    Count,
    Height,
    Clear,
    Destroy,
    Help,
    Exit,
}

#[derive(Error, Debug, PartialEq, Eq)]
enum ParseError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),

    #[error("`{0}` expects one argument")]
    MissingArgument(&'static str),

    #[error("`{command}` takes no more than one argument, got `{extra}`")]
    UnexpectedArgument { command: &'static str, extra: String },

    #[error("`{value}` is not a valid argument for `{command}`")]
    InvalidArgument { command: &'static str, value: String },
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

impl Command {
    /// Parses one line. Blank lines and `#` comments yield `Ok(None)`.
    fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let argument = words.next();
        let name = name.to_ascii_lowercase();

        let command = match name.as_str() {
            "insert" => Self::Insert(Self::argument("insert", argument)?),
            "delete" => Self::Delete(Self::argument("delete", argument)?),
            "search" => Self::Search(Self::argument("search", argument)?),
            "select" | "find" => Self::Select(Self::argument("select", argument)?),
            "rank" => Self::Rank(Self::argument("rank", argument)?),
            "sort" => Self::Sort,
            "count" => Self::Count,
            "height" => Self::Height,
            "clear" => Self::Clear,
            "destroy" => Self::Destroy,
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            _ => return Err(ParseError::Unknown(name)),
        };

        let command_name = command.name();
        let extra = if command.takes_argument() { words.next() } else { argument };
        if let Some(extra) = extra {
            return Err(ParseError::UnexpectedArgument {
                command: command_name,
                extra: extra.to_string(),
            });
        }
        Ok(Some(command))
    }

    fn argument<T: std::str::FromStr>(command: &'static str, argument: Option<&str>) -> Result<T, ParseError> {
        let value = argument.ok_or(ParseError::MissingArgument(command))?;
        value.parse().map_err(|_| ParseError::InvalidArgument {
            command,
            value: value.to_string(),
        })
    }

    fn takes_argument(self) -> bool {
        matches!(
            self,
            Self::Insert(_) | Self::Delete(_) | Self::Search(_) | Self::Select(_) | Self::Rank(_)
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Delete(_) => "delete",
            Self::Search(_) => "search",
            Self::Select(_) => "select",
            Self::Rank(_) => "rank",
            Self::Sort => "sort",
            Self::Count => "count",
            Self::Height => "height",
            Self::Clear => "clear",
            Self::Destroy => "destroy",
            Self::Help => "help",
            Self::Exit => "exit",
        }
    }
}

/// Applies `command` to `tree`, writing its result line(s) to `out`.
fn execute(tree: &mut Tree24, command: Command, out: &mut impl Write) -> io::Result<Flow> {
    let outcome = match command {
        Command::Insert(key) => tree.insert(key).map(|key| format!("Inserted {key}")),
        Command::Delete(key) => tree.delete(key).map(|key| format!("Deleted {key}")),
        Command::Search(key) => tree.search(key).map(|key| format!("{key} is in the tree")),
        Command::Select(rank) => tree.select(rank).map(|key| format!("Key at rank {rank} is {key}")),
        Command::Rank(key) => tree.rank_of(key).map(|rank| format!("{key} has rank {rank}")),
        Command::Count => tree.count().map(|count| format!("The tree holds {count} keys")),
        Command::Height => Ok(format!("Height {}", tree.height())),
        Command::Sort => {
            write!(out, "{}", tree.structure())?;
            let keys: Vec<String> = tree.iter().map(|key| key.to_string()).collect();
            Ok(format!("Sorted: {}", keys.join(" ")))
        }
        Command::Clear => {
            tree.clear();
            Ok("Cleared".to_string())
        }
        Command::Destroy => {
            tree.destroy();
            Ok("Destroyed".to_string())
        }
        Command::Help => Ok(HELP.to_string()),
        Command::Exit => return Ok(Flow::Exit),
    };

    match outcome {
        Ok(line) => writeln!(out, "{line}")?,
        Err(err) => writeln!(out, "Error: {err}")?,
    }
    Ok(Flow::Continue)
}

/// Runs every line of `input` against `tree` until it is exhausted or `exit` is read.
fn run(tree: &mut Tree24, input: impl BufRead, out: &mut impl Write, prompt: bool) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        if prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        match Command::parse(&line?) {
            Ok(Some(command)) => {
                if execute(tree, command, out)? == Flow::Exit {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => writeln!(out, "Error: {err}")?,
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let Ok(level) = args.log_level.parse::<LevelFilter>() else {
        eprintln!("Error: `{}` is not a log level", args.log_level);
        return ExitCode::FAILURE;
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();

    let mut tree = match Tree24::with_capacity(args.capacity) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("created tree with capacity hint {}", args.capacity);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match &args.file {
        Some(path) => match File::open(path) {
            Ok(file) => run(&mut tree, BufReader::new(file), &mut out, false),
            Err(e) => {
                eprintln!("Error opening file {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            let stdin = io::stdin();
            let interactive = !args.quiet && stdin.is_terminal();
            if interactive {
                println!("tree24 shell, type `help` for commands");
            }
            run(&mut tree, stdin.lock(), &mut out, interactive)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(script: &str) -> String {
        let mut tree = Tree24::new();
        let mut out = Vec::new();
        run(&mut tree, script.as_bytes(), &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_is_case_insensitive_and_skips_comments() {
        assert_eq!(Command::parse("INSERT 5"), Ok(Some(Command::Insert(5))));
        assert_eq!(Command::parse("  delete   -7 "), Ok(Some(Command::Delete(-7))));
        assert_eq!(Command::parse("Find 3"), Ok(Some(Command::Select(3))));
        assert_eq!(Command::parse("quit"), Ok(Some(Command::Exit)));
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(Command::parse("# insert 5"), Ok(None));
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        assert_eq!(Command::parse("insert"), Err(ParseError::MissingArgument("insert")));
        assert_eq!(
            Command::parse("insert five"),
            Err(ParseError::InvalidArgument { command: "insert", value: "five".to_string() })
        );
        assert_eq!(
            Command::parse("select -1"),
            Err(ParseError::InvalidArgument { command: "select", value: "-1".to_string() })
        );
        assert_eq!(
            Command::parse("insert 1 2"),
            Err(ParseError::UnexpectedArgument { command: "insert", extra: "2".to_string() })
        );
        assert_eq!(
            Command::parse("count now"),
            Err(ParseError::UnexpectedArgument { command: "count", extra: "now".to_string() })
        );
        assert_eq!(Command::parse("frobnicate"), Err(ParseError::Unknown("frobnicate".to_string())));
    }

    #[test]
    fn session_reports_one_line_per_command() {
        let output = transcript(
            "insert 5\ninsert 5\nsearch 5\nsearch 6\ncount\nselect 1\nrank 5\ndelete 5\ncount\nbogus\n",
        );
        assert_eq!(
            output,
            "Inserted 5\n\
             Error: key 5 is already present\n\
             5 is in the tree\n\
             Error: key 6 is not present\n\
             The tree holds 1 keys\n\
             Key at rank 1 is 5\n\
             5 has rank 1\n\
             Deleted 5\n\
             Error: tree is empty\n\
             Error: unknown command `bogus`, type `help` for a list\n"
        );
    }

    #[test]
    fn sort_prints_structure_then_keys() {
        let output = transcript("insert 30\ninsert 10\ninsert 20\ninsert 40\nsort\n");
        assert!(output.ends_with(
            "[root] 1 keys: 30\n    [root.0] 2 keys: 10 20\n    [root.1] 1 keys: 40\nSorted: 10 20 30 40\n"
        ));
    }

    #[test]
    fn exit_stops_reading() {
        let output = transcript("insert 1\nexit\ninsert 2\n");
        assert_eq!(output, "Inserted 1\n");
    }

    #[test]
    fn destroy_then_clear_revives_the_tree() {
        let output = transcript("insert 1\ndestroy\ninsert 2\ndestroy\nclear\ninsert 2\nheight\n");
        assert_eq!(
            output,
            "Inserted 1\nDestroyed\nError: tree is not initialized\nDestroyed\nCleared\nInserted 2\nHeight 1\n"
        );
    }
}
