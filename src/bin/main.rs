use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use codetrans::codegen::{transforming, CodeBuffer, CodeBuilder, CodeRelabeler, CodeStackTracker, StackState};
use codetrans::parser::{parse_listing_file, Lexer, ListingPrinter};
use codetrans::Config;

#[derive(Parser)]
#[command(name = "codetrans")]
#[command(about = "Relabel and stack-track JVM assembly listings")]
#[command(version)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the operand stack through a listing and report its max depth
    Track {
        /// Input listing file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Entry stack as concatenated field descriptors, bottom first (e.g. "ILjava/lang/String;")
        #[arg(long, value_name = "DESC")]
        initial_stack: Option<String>,
    },

    /// Inject a listing several times, each copy with fresh labels
    Relabel {
        /// Input listing file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Number of copies to emit
        #[arg(short, long, default_value_t = 2)]
        copies: usize,
    },

    /// Lexically analyze a listing file
    Lex {
        /// Input listing file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show token locations
        #[arg(short, long)]
        locations: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::default().with_verbosity(cli.verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level().to_string()))
        .init();

    match &cli.command {
        Commands::Track { input, initial_stack } => {
            let config = match initial_stack {
                Some(desc) => config.with_initial_stack_descriptor(desc)?,
                None => config,
            };
            track_file(input, &config)?;
        }
        Commands::Relabel { input, copies } => {
            let config = config.with_copies(*copies)?;
            relabel_file(input, &config)?;
        }
        Commands::Lex { input, locations } => {
            lex_file(input, *locations)?;
        }
    }

    Ok(())
}

fn track_file(input: &Path, config: &Config) -> Result<()> {
    let mut buffer = CodeBuffer::new();
    let elements = parse_listing_file(input, &mut buffer)
        .with_context(|| format!("failed to read listing {}", input.display()))?;
    info!("tracking {} elements from {}", elements.len(), input.display());

    let mut tracker = CodeStackTracker::with_initial_stack(&config.initial_stack);
    let mut printer = ListingPrinter::new();
    for element in &elements {
        let line = printer.format_element(element);
        tracker.track(element);
        match tracker.state() {
            StackState::Known(stack) => println!("{:<60} {}", line, stack),
            StackState::Unknown => println!("{:<60} -", line),
        }
    }

    match tracker.max_stack_size() {
        Some(max) => println!("max_stack: {}", max),
        None => println!("max_stack: unknown"),
    }
    Ok(())
}

fn relabel_file(input: &Path, config: &Config) -> Result<()> {
    let mut printer = ListingPrinter::new();
    let elements = parse_listing_file(input, &mut printer)
        .with_context(|| format!("failed to read listing {}", input.display()))?;

    for copy in 0..config.copies {
        info!("emitting copy {}", copy + 1);
        let mut relabeler = CodeRelabeler::new();
        let block = elements.clone();
        transforming(&mut printer, &mut relabeler, |builder: &mut dyn CodeBuilder| builder.emit_all(block));
    }

    print!("{}", printer.finish());
    Ok(())
}

fn lex_file(input: &Path, locations: bool) -> Result<()> {
    let source = fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let tokens = Lexer::new(&source).tokenize()?;

    for token in tokens {
        if locations {
            println!("{:?} at {}:{}", token.token_type(), token.location().line, token.location().column);
        } else {
            println!("{:?}: '{}'", token.token_type(), token.lexeme().escape_debug());
        }
    }

    Ok(())
}
