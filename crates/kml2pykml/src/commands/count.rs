//! Count command implementation.

use anyhow::Result;
use kml_xml::{ElementCounts, count_elements};
use std::process::ExitCode;

use super::input::{Input, report_as};
use crate::Format;

/// Arguments for the count command
#[derive(Debug)]
pub struct CountArgs {
    pub input: String,
    pub format: Format,
}

/// Execute the count command
pub fn execute(args: CountArgs) -> Result<ExitCode> {
    let input = Input::read(&args.input)?;
    let doc = match input.parse() {
        Ok(doc) => doc,
        Err(diagnostics) => {
            report_as(&diagnostics, Some(input.context()), args.format);
            return Ok(ExitCode::FAILURE);
        }
    };

    let counts = count_elements(&doc);
    match args.format {
        Format::Text => print!("{}", render_text(&counts)),
        Format::Json => println!("{}", render_json(&counts)),
    }
    Ok(ExitCode::SUCCESS)
}

/// One block per namespace, names sorted, elements without a namespace first.
fn render_text(counts: &ElementCounts) -> String {
    let mut out = String::new();
    for (namespace, names) in counts {
        out.push_str(namespace.as_deref().unwrap_or("(no namespace)"));
        out.push('\n');
        for (name, count) in names {
            out.push_str(&format!("  {}: {}\n", name, count));
        }
    }
    out
}

fn render_json(counts: &ElementCounts) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (namespace, names) in counts {
        let names: serde_json::Map<String, serde_json::Value> = names
            .iter()
            .map(|(name, count)| (name.clone(), serde_json::Value::from(*count)))
            .collect();
        object.insert(namespace.clone().unwrap_or_default(), names.into());
    }
    serde_json::Value::Object(object)
}
