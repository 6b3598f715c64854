use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::client::ClientError;
use crate::models::Resource;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "ok": true,
                "message": message
            });
            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a list of rows: a JSON array, or one described row per line
pub fn output_rows<R: Resource>(output_format: OutputFormat, rows: &[R::Row]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(&rows)?,
        OutputFormat::Text if rows.is_empty() => println!("No {} yet", R::PATH),
        OutputFormat::Text => {
            for row in rows {
                println!("{}", R::describe(row));
            }
        }
    }
    Ok(())
}

pub fn output_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A client error with any per-field messages folded into the text
pub fn client_error(err: ClientError) -> anyhow::Error {
    let Some(fields) = err.field_errors() else {
        return err.into();
    };

    let mut details: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    details.sort();
    anyhow::anyhow!("{} ({})", err, details.join(", "))
}
