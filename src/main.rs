use std::fs;
use std::io::{self, Read};
use std::process;

use clap::{Parser, Subcommand};
use log::info;

use blocklang::compiler::DEFAULT_INDENT;
use blocklang::{json, scope, BlockId, Diagnostic, LanguageService, Python, Result};

#[derive(Parser)]
#[command(name = "blocklang", version, about = "Translate block trees to and from Python source")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a JSON block tree to source
    Compile {
        /// Input file (stdin when omitted)
        file: Option<String>,

        /// Spaces per indentation level
        #[arg(long, default_value_t = DEFAULT_INDENT)]
        indent: usize,
    },

    /// Parse source into a JSON block tree
    Parse {
        /// Input file (stdin when omitted)
        file: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Parse source and compile it back
    Roundtrip {
        /// Input file (stdin when omitted)
        file: Option<String>,

        /// Spaces per indentation level
        #[arg(long, default_value_t = DEFAULT_INDENT)]
        indent: usize,
    },

    /// List the variable names visible in a JSON block tree
    Scope {
        /// Input file (stdin when omitted)
        file: Option<String>,

        /// Stop before the block with this id
        #[arg(long)]
        before: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Compile { file, indent } => {
            let blocks = json::from_json(&read_input(file.as_deref())?)?;
            println!("{}", Python::with_indent(indent).compile(&blocks)?);
        }
        Command::Parse { file, pretty } => {
            let input = read_input(file.as_deref())?;
            let output = Python::default().parse_with_diagnostics(&input);
            report(&input, &output.diagnostics);
            let out = if pretty {
                json::to_json_pretty(&output.blocks)?
            } else {
                json::to_json(&output.blocks)?
            };
            println!("{}", out);
        }
        Command::Roundtrip { file, indent } => {
            let input = read_input(file.as_deref())?;
            let language = Python::with_indent(indent);
            let output = language.parse_with_diagnostics(&input);
            report(&input, &output.diagnostics);
            info!("parsed {} top-level blocks", output.blocks.len());
            println!("{}", language.compile(&output.blocks)?);
        }
        Command::Scope { file, before } => {
            let blocks = json::from_json(&read_input(file.as_deref())?)?;
            let names = match before {
                Some(id) => scope::names_visible_at(&blocks, &BlockId::new(id)),
                None => scope::visible_names(&blocks, None, &[]),
            };
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn read_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Print each diagnostic with the line it refers to.
fn report(input: &str, diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}", diag.render(input));
        eprintln!();
    }
}
