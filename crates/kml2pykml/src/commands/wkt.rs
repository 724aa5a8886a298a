//! Wkt command implementation.

use anyhow::Result;
use kml_xml::to_wkt_list;
use std::process::ExitCode;

use super::input::{Input, report_as};
use crate::Format;

/// Arguments for the wkt command
#[derive(Debug)]
pub struct WktArgs {
    pub input: String,
    pub format: Format,
}

/// Execute the wkt command
pub fn execute(args: WktArgs) -> Result<ExitCode> {
    let input = Input::read(&args.input)?;
    let doc = match input.parse() {
        Ok(doc) => doc,
        Err(diagnostics) => {
            report_as(&diagnostics, Some(input.context()), args.format);
            return Ok(ExitCode::FAILURE);
        }
    };

    let polygons = to_wkt_list(&doc);
    match args.format {
        Format::Text => {
            for polygon in &polygons {
                println!("{}", polygon);
            }
        }
        Format::Json => println!("{}", serde_json::Value::from(polygons)),
    }
    Ok(ExitCode::SUCCESS)
}
