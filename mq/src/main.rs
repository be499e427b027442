//! mq: explain how a single mail search clause compiles.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "mq")]
#[command(about = "Mail Query - explain how a search clause compiles")]
#[command(version)]
struct Cli {
    /// Log clause construction and compilation to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    /// Config file (defaults to $MAILQ_CONFIG, then built-in defaults)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one clause and show its dumps and compiled operation
    #[command(visible_alias = "x")]
    Explain {
        /// Clause keyword (date, size, from, content, field, item, tag, in, is, ...)
        kind: String,

        /// Clause value, e.g. ">=10kb" or "john sm*"
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Compile as if preceded by NOT
        #[arg(short = 'n', long = "negate")]
        negate: bool,

        /// Match the last text token as a prefix
        #[arg(short = 'q', long = "quick")]
        quick: bool,

        /// Requesting account id
        #[arg(short = 'a', long = "account", default_value = "local")]
        account: String,

        /// Primary address of the account
        #[arg(long = "address", default_value = "me@localhost")]
        address: String,

        /// Additional account address (repeatable)
        #[arg(long = "alias")]
        aliases: Vec<String>,

        /// User tag defined in the mailbox, as name=id (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Folder defined in the mailbox, as name=id (repeatable)
        #[arg(long = "folder")]
        folders: Vec<String>,

        /// Account timezone, minutes east of UTC
        #[arg(short = 'z', long = "tz-offset", allow_hyphen_values = true)]
        tz_offset: Option<i32>,

        /// Account timezone by name, e.g. Europe/Berlin
        #[arg(long = "timezone", conflicts_with = "tz_offset")]
        timezone: Option<String>,

        /// Account locale for absolute dates (en, de, ja, ...)
        #[arg(short = 'l', long = "locale")]
        locale: Option<String>,

        /// Resolve relative dates against this epoch-millisecond instant
        #[arg(long = "now")]
        now: Option<i64>,

        /// Print a single JSON object
        #[arg(short = 'j', long = "json")]
        json: bool,
    },

    /// List built-in `is:` shortcuts
    Builtins,

    /// Show the effective config, or write it to a file
    Config {
        /// Write the config here instead of printing it
        #[arg(short = 'w', long = "write")]
        write: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }

    let result = match cli.command {
        Commands::Explain {
            kind,
            value,
            negate,
            quick,
            account,
            address,
            aliases,
            tags,
            folders,
            tz_offset,
            timezone,
            locale,
            now,
            json,
        } => {
            let account = commands::AccountOptions {
                account,
                address,
                aliases,
                tags,
                folders,
                tz_offset,
                timezone,
                locale,
                now,
            };
            let opts = commands::ExplainOptions { negate, quick, json };
            commands::explain(cli.config.as_deref(), &account, &kind, &value, &opts)
        }
        Commands::Builtins => commands::builtins(),
        Commands::Config { write } => commands::config(cli.config.as_deref(), write.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
