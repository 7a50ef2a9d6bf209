//! Inspect the compactor and persona pipeline from the command line.
//!
//! Reads JSON from a file or stdin and prints what the library would hand to
//! the chat backend — useful for eyeballing what a given history compacts to
//! or which signals a message fires, without standing up the full service.
//!
//! # Examples
//!
//! ```sh
//! # Compact a message transcript under a 4000-token budget
//! tote compact --input transcript.json --max-tokens 4000
//!
//! # Which signals does a statement fire?
//! tote extract --text "I'm vegan and my budget is $150"
//!
//! # Render a stored persona document as a prompt block
//! tote render --input persona.json
//!
//! # Pipe from stdin
//! cat transcript.json | tote compact
//! ```

use clap::{Parser, Subcommand};
use std::io::Read;
use std::process;
use tote_rs::context::{DEFAULT_MAX_TOKENS, HistoryCompactor, estimate_messages};
use tote_rs::persona::{extract_chat_signals, render_persona};
use tote_rs::{Message, persona::PersonaRecord};

/// Inspect history compaction and persona inference.
#[derive(Parser)]
#[command(name = "tote")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compact a message transcript to fit a token budget
    Compact {
        /// Path to a JSON array of messages (stdin if omitted)
        #[arg(long)]
        input: Option<String>,

        /// Token budget for the compacted history
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: f64,
    },
    /// Extract persona signals from a chat statement
    Extract {
        /// The statement to scan (stdin if omitted)
        #[arg(long)]
        text: Option<String>,
    },
    /// Render a persona document as a prompt context block
    Render {
        /// Path to a persona JSON document (stdin if omitted)
        #[arg(long)]
        input: Option<String>,
    },
}

/// Read from a path, or from stdin when no path was given.
fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(buffer)
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Compact { input, max_tokens } => {
            let raw = read_input(input.as_deref())?;
            let messages: Vec<Message> = serde_json::from_str(&raw)
                .map_err(|e| format!("failed to parse messages: {e}"))?;

            let compactor = HistoryCompactor::new().with_max_tokens(max_tokens);
            let reduced = compactor.compact(&messages);

            eprintln!(
                "{} -> {} messages, ~{:.0} estimated tokens",
                messages.len(),
                reduced.len(),
                estimate_messages(&reduced),
            );
            let json = serde_json::to_string_pretty(&reduced)
                .map_err(|e| format!("failed to serialize output: {e}"))?;
            println!("{json}");
        }
        Command::Extract { text } => {
            let text = match text {
                Some(text) => text,
                None => read_input(None)?,
            };
            let signals = extract_chat_signals(&text);
            eprintln!("{} signal(s)", signals.len());
            let json = serde_json::to_string_pretty(&signals)
                .map_err(|e| format!("failed to serialize signals: {e}"))?;
            println!("{json}");
        }
        Command::Render { input } => {
            let raw = read_input(input.as_deref())?;
            let record: PersonaRecord = serde_json::from_str(&raw)
                .map_err(|e| format!("failed to parse persona: {e}"))?;
            println!("{}", render_persona(&record));
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
