use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, Report, WrapErr};
use paren_calc::parser::{Grouping, ParseOptions};
use paren_calc::*;
use std::path::{Path, PathBuf};
use std::{
    fs,
    io::{self, Write},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_INPUT: &str = "((13+4)-(12+1)) + (12 + 7)";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Fold `a + b - c` left to right instead of overwriting the pending operand
    #[arg(long, global = true)]
    left_fold: bool,

    /// Reject input with parentheses nested deeper than this
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Tokenize { filename: PathBuf },
    Parse { filename: PathBuf },
    Eval { expression: String },
    Calc,
    Demo,
}

impl Cli {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            grouping: if self.left_fold {
                Grouping::LeftFold
            } else {
                Grouping::TwoSlot
            },
            max_depth: self.max_depth,
        }
    }
}

fn directive_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "paren_calc=debug",
        _ => "paren_calc=trace",
    }
}

fn read_source(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading '{}' failed", filename.display()))
}

fn evaluate(input: &str, options: ParseOptions) -> miette::Result<i64> {
    calc_eval(input, options).map_err(|e| Report::new(e).with_source_code(input.to_string()))
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(io::stderr)
        .init();

    let options = cli.parse_options();

    match cli.command {
        Commands::Tokenize { filename } => {
            let file_contents = read_source(&filename)?;

            for token in Lexer::new(&file_contents) {
                println!("{:?}", token);
            }
        }
        Commands::Parse { filename } => {
            let file_contents = read_source(&filename)?;

            let tokens = lex(&file_contents);
            match parser::Parser::with_options(&tokens, options).parse() {
                Ok(tree) => println!("{tree}"),
                Err(e) => {
                    return Err(Report::new(e).with_source_code(file_contents));
                }
            }
        }
        Commands::Eval { expression } => {
            let value = evaluate(&expression, options)?;
            println!("{expression} = {value}");
        }
        Commands::Calc => {
            info!(?options, "starting calculator");
            let stdin = io::stdin();
            loop {
                print!("calc> ");
                io::stdout().flush().into_diagnostic()?;

                let mut input = String::new();
                let read = stdin
                    .read_line(&mut input)
                    .into_diagnostic()
                    .wrap_err("reading from stdin failed")?;
                if read == 0 {
                    println!();
                    break;
                }
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match evaluate(input, options) {
                    Ok(res) => println!("{res}"),
                    Err(report) => eprintln!("{report:?}"),
                }
            }
        }
        Commands::Demo => {
            let lines = transcript(DEMO_INPUT, options)
                .map_err(|e| Report::new(e).with_source_code(DEMO_INPUT))?;
            for line in lines {
                println!("{line}");
            }
        }
    }

    Ok(())
}
