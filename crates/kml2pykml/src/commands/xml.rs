//! Xml command implementation.

use anyhow::{Context, Result};
use kml_xml::{WriteOptions, to_string};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use super::input::{Input, report};

/// Arguments for the xml command
#[derive(Debug)]
pub struct XmlArgs {
    pub input: String,
    pub output: Option<PathBuf>,
    /// Write HTML-bearing KML elements as CDATA
    pub cdata: bool,
    pub compact: bool,
}

/// Execute the xml command
pub fn execute(args: XmlArgs) -> Result<ExitCode> {
    let input = Input::read(&args.input)?;
    let doc = match input.parse() {
        Ok(doc) => doc,
        Err(diagnostics) => {
            report(&diagnostics, Some(input.context()));
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut options = WriteOptions::default();
    if args.compact {
        options.indent = None;
    }
    if args.cdata {
        options = options.with_kml_cdata();
    }

    let xml = match to_string(&doc, &options) {
        Ok(xml) => xml,
        Err(error) => {
            report(&[error.to_diagnostic()], None);
            return Ok(ExitCode::FAILURE);
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &xml)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!(output = %path.display(), "wrote document");
        }
        None => print!("{}", xml),
    }
    Ok(ExitCode::SUCCESS)
}
