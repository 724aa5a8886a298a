//! Validate command implementation.

use anyhow::Result;
use kml_schema::{DEFAULT_SCHEMA, Schema, SchemaResolver};
use std::process::ExitCode;

use super::input::{Input, report_as};
use crate::Format;

/// Arguments for the validate command
#[derive(Debug)]
pub struct ValidateArgs {
    pub input: String,
    /// Defaults to the OGC KML 2.2 schema
    pub schema: Option<String>,
    pub format: Format,
    pub resolver: SchemaResolver,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<ExitCode> {
    let input = Input::read(&args.input)?;
    let text = args.format == Format::Text;

    let source = match &args.schema {
        Some(source) => source.as_str(),
        None => {
            if text {
                println!("Validating against the default schema: {}", DEFAULT_SCHEMA);
            }
            DEFAULT_SCHEMA
        }
    };

    let doc = match input.parse() {
        Ok(doc) => doc,
        Err(diagnostics) => {
            report_as(&diagnostics, Some(input.context()), args.format);
            return Ok(ExitCode::FAILURE);
        }
    };

    let schema = match Schema::load(source, &args.resolver) {
        Ok(schema) => schema,
        Err(error) => {
            report_as(&[error.to_diagnostic()], None, args.format);
            return Ok(ExitCode::FAILURE);
        }
    };

    if text {
        println!("Validating document...");
    }
    match schema.assert_valid(&doc) {
        Ok(()) => {
            match args.format {
                Format::Text => println!("Congratulations! The file is valid."),
                Format::Json => println!(
                    "{}",
                    serde_json::json!({ "valid": true, "diagnostics": [] })
                ),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if text {
                println!("Uh-oh! The KML file is invalid.");
            }
            report_as(&error.to_diagnostics(), Some(input.context()), args.format);
            Ok(ExitCode::FAILURE)
        }
    }
}
