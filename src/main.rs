use cfg_eps::present::render_symbols;
use cfg_eps::{
    Grammar, GrammarConfig, RandomGrammarConfig, Report, compute_nullable, eliminate_epsilon,
    random_grammar, render_grammar, render_nullable,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::info;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

/// Find nullable symbols and remove ε-productions from a grammar
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar file (prompted for when omitted)
    #[arg(help = "Path to the grammar file")]
    grammar_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Accept `->` as well as `→`
    #[arg(long)]
    ascii_arrow: bool,

    /// Skip lines starting with `#`
    #[arg(long)]
    comments: bool,

    /// Merge alternatives of a non-terminal defined on several lines
    #[arg(long)]
    merge: bool,

    /// Also print the non-terminal and terminal alphabets
    #[arg(long)]
    symbols: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random grammar file
    Random {
        /// Seed for the random number generator
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of non-terminals (at most 26)
        #[arg(long, default_value = "4")]
        non_terminals: usize,

        /// Maximum alternatives per non-terminal
        #[arg(long, default_value = "3")]
        max_alternatives: usize,

        /// Maximum symbols per alternative
        #[arg(long, default_value = "4")]
        max_length: usize,

        /// Chance that an alternative is ε
        #[arg(long, default_value = "0.2")]
        epsilon_probability: f64,

        /// Output file path (stdout when omitted)
        #[arg(help = "Output file path")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(Commands::Random {
        seed,
        non_terminals,
        max_alternatives,
        max_length,
        epsilon_probability,
        output,
    }) = cli.command
    {
        let config = RandomGrammarConfig {
            non_terminals,
            max_alternatives,
            max_length,
            epsilon_probability,
            seed,
            ..RandomGrammarConfig::default()
        };
        let text = render_grammar(&random_grammar(&config)) + "\n";

        match output {
            Some(path) => {
                fs::write(&path, text)?;
                println!("Created random grammar at: {}", path.display());
            }
            None => print!("{}", text),
        }
        return Ok(());
    }

    let grammar_file = match cli.grammar_file {
        Some(path) => path,
        None => prompt_for_file()?,
    };

    let config = GrammarConfig {
        allow_ascii_arrow: cli.ascii_arrow,
        allow_comments: cli.comments,
        merge_repeated_rules: cli.merge,
    };

    info!("Loading grammar from {}", grammar_file.display());
    let grammar = Grammar::from_file(&grammar_file, &config)?;
    let nullable = compute_nullable(&grammar);
    let eliminated = eliminate_epsilon(&grammar, &nullable);

    match cli.format {
        OutputFormat::Json => {
            println!("{}", Report::new(&grammar, &nullable, &eliminated).to_json()?);
        }
        OutputFormat::Text => {
            println!("Original grammar:");
            println!("{}", render_grammar(&grammar));
            if cli.symbols {
                println!();
                println!("Non-terminals: {}", render_symbols(&grammar.non_terminals()));
                println!("Terminals: {}", render_symbols(&grammar.terminals()));
            }
            println!();
            println!("Nullable symbols: {}", render_nullable(&nullable));
            println!();
            println!("Grammar without ε-productions:");
            println!("{}", render_grammar(&eliminated));
        }
    }

    Ok(())
}

fn prompt_for_file() -> Result<PathBuf, Box<dyn Error>> {
    print!("Grammar file name: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let name = line.trim();
    if name.is_empty() {
        return Err("Grammar file path required".into());
    }
    Ok(PathBuf::from(name))
}
