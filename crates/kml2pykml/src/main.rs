//! kml2pykml - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[cfg(windows)]
const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: char = ':';

#[derive(Parser)]
#[command(name = "kml2pykml")]
#[command(version)]
#[command(about = "Generate pyKML scripts from KML documents", long_about = None)]
struct Cli {
    /// Directory to look for schema files in (repeatable)
    #[arg(
        long = "schema-path",
        global = true,
        env = "KML_SCHEMA_PATH",
        value_delimiter = PATH_LIST_SEPARATOR
    )]
    schema_path: Vec<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a pyKML script that rebuilds the document
    Script {
        /// KML file ('-' for stdin)
        input: String,

        /// Write the script to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Validate against this schema before generating
        #[arg(long)]
        schema: Option<String>,
    },

    /// Validate a KML file against an XML Schema
    Validate {
        /// KML file ('-' for stdin)
        input: String,

        /// Schema file name, path or URL (looked up locally)
        #[arg(long)]
        schema: Option<String>,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Count the elements of a KML file by namespace and name
    Count {
        /// KML file ('-' for stdin)
        input: String,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Write the parsed document back as XML
    Xml {
        /// KML file ('-' for stdin)
        input: String,

        /// Write to FILE instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Write description, text, linkDescription and displayName as CDATA
        #[arg(long)]
        cdata: bool,

        /// Write everything on one line
        #[arg(long)]
        compact: bool,
    },

    /// Print every polygon as Well-Known Text
    Wkt {
        /// KML file ('-' for stdin)
        input: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries only command output
    let default_filter = if cli.verbose {
        "kml2pykml=debug,kml_xml=debug,kml_script=debug,kml_schema=debug"
    } else {
        "kml2pykml=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let resolver = kml_schema::SchemaResolver::new().with_search_paths(cli.schema_path);

    match cli.command {
        Commands::Script {
            input,
            output,
            schema,
        } => commands::script::execute(commands::script::ScriptArgs {
            input,
            output,
            schema,
            resolver,
        }),
        Commands::Validate {
            input,
            schema,
            format,
        } => commands::validate::execute(commands::validate::ValidateArgs {
            input,
            schema,
            format,
            resolver,
        }),
        Commands::Count { input, format } => {
            commands::count::execute(commands::count::CountArgs { input, format })
        }
        Commands::Xml {
            input,
            output,
            cdata,
            compact,
        } => commands::xml::execute(commands::xml::XmlArgs {
            input,
            output,
            cdata,
            compact,
        }),
        Commands::Wkt { input, format } => {
            commands::wkt::execute(commands::wkt::WktArgs { input, format })
        }
    }
}
