//! Script command implementation.

use anyhow::{Context, Result};
use kml_schema::{Schema, SchemaResolver};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

use super::input::{Input, report};

/// Arguments for the script command
#[derive(Debug)]
pub struct ScriptArgs {
    pub input: String,
    pub output: Option<PathBuf>,
    /// Validate against this schema first
    pub schema: Option<String>,
    pub resolver: SchemaResolver,
}

/// Execute the script command
pub fn execute(args: ScriptArgs) -> Result<ExitCode> {
    let input = Input::read(&args.input)?;
    let doc = match input.parse() {
        Ok(doc) => doc,
        Err(diagnostics) => {
            report(&diagnostics, Some(input.context()));
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(source) = &args.schema {
        let schema = match Schema::load(source, &args.resolver) {
            Ok(schema) => schema,
            Err(error) => {
                report(&[error.to_diagnostic()], None);
                return Ok(ExitCode::FAILURE);
            }
        };
        if let Err(error) = schema.assert_valid(&doc) {
            report(&error.to_diagnostics(), Some(input.context()));
            return Ok(ExitCode::FAILURE);
        }
        debug!(schema = %source, "document is valid");
    }

    let script = match kml_script::transpile(&doc) {
        Ok(script) => script,
        Err(error) => {
            report(&[error.to_diagnostic()], Some(input.context()));
            return Ok(ExitCode::FAILURE);
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &script)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!(output = %path.display(), "wrote script");
        }
        None => print!("{}", script),
    }
    Ok(ExitCode::SUCCESS)
}
