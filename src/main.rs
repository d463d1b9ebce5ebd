use std::fs;
use std::path::PathBuf;

use calculator::{Lexer, SyntaxError};
use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};
use tracing::{Level, debug};

#[derive(Parser, Debug)]
#[command(version, about = "Integer calculator with a traced evaluator")]
struct Cli {
    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the token table
    Tokenize {
        #[command(flatten)]
        input: Input,
    },
    /// Print the syntax tree
    Parse {
        #[command(flatten)]
        input: Input,

        /// Parse an `int` declaration instead of an expression
        #[arg(long)]
        declaration: bool,
    },
    /// Print the syntax tree and evaluation trace, then the result
    Eval {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Source text
    script: Option<String>,

    /// Read the source text from a file
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl Input {
    fn read(self) -> miette::Result<String> {
        match (self.script, self.file) {
            (Some(script), _) => Ok(script),
            (None, Some(filename)) => fs::read_to_string(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading `{}` failed", filename.display())),
            (None, None) => Err(miette::miette!("no source text given")),
        }
    }
}

fn main() -> miette::Result<()> {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    match args.command {
        Commands::Tokenize { input } => {
            let source = input.read()?;
            print!("{}", Lexer::new(&source).tokenize());
        }
        Commands::Parse { input, declaration } => {
            let source = input.read()?;
            let mut parser = calculator::Parser::new(&source);
            let ast = if declaration {
                parser
                    .parse_int_declaration()?
                    .ok_or_else(|| miette::miette!("a declaration must start with `int`"))?
            } else {
                parser.parse_program()?
            };
            print!("{}", ast.dump());
        }
        Commands::Eval { input } => {
            let source = input.read()?;
            let value = match calculator::execute(&source) {
                Ok(value) => value,
                Err(e) => {
                    if let Some(syntax_error) = e.downcast_ref::<SyntaxError>() {
                        debug!(rule = syntax_error.rule(), "parsing failed");
                    }
                    return Err(e);
                }
            };
            println!("{value}");
        }
    }
    Ok(())
}
