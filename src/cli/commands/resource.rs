use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{client_error, output_json, output_rows, output_success};
use crate::cli::OutputFormat;
use crate::client::ResourceApi;
use crate::models::Resource;
use crate::validate::{parse_id, Payload};

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "List rows, newest first")]
    List,

    #[command(about = "Add a row; values follow the resource's field order")]
    Add {
        #[arg(required = true, help = "Field values, e.g. a title, or a name and a phone")]
        values: Vec<String>,
    },

    #[command(about = "Replace the fields of a row")]
    Update {
        #[arg(help = "Row id")]
        id: String,
        #[arg(required = true, help = "Field values, in the same order as for add")]
        values: Vec<String>,
    },

    #[command(about = "Delete a row")]
    Delete {
        #[arg(help = "Row id")]
        id: String,
    },

    #[command(about = "Interactive list with inline add/edit/delete")]
    Shell,
}

/// Validate positional values with the same rules the server applies
fn fields_from_args<R: Resource>(values: &[String]) -> anyhow::Result<R::Fields> {
    let payload = Payload::from_pairs(R::TABLE.columns, values);
    R::fields_from_payload(&payload).map_err(|e| client_error(e.into()))
}

fn local_id(raw: &str) -> anyhow::Result<i64> {
    parse_id(raw).map_err(|e| anyhow::anyhow!("{}: {}", e, raw))
}

pub async fn handle<R, A>(cmd: ResourceCommands, api: A, output_format: OutputFormat) -> anyhow::Result<()>
where
    R: Resource,
    A: ResourceApi<R>,
{
    match cmd {
        ResourceCommands::List => {
            let rows = api.list().await.map_err(client_error)?;
            output_rows::<R>(output_format, &rows)
        }
        ResourceCommands::Add { values } => {
            let fields = fields_from_args::<R>(&values)?;
            let row = api.create(&fields).await.map_err(client_error)?;

            match (output_format, row) {
                (OutputFormat::Json, Some(row)) => output_json(&row),
                (_, Some(row)) => output_success(output_format, &format!("Added {}", R::describe(&row)), None),
                (_, None) => output_success(output_format, &format!("Added {}", R::SINGULAR), None),
            }
        }
        ResourceCommands::Update { id, values } => {
            let id = local_id(&id)?;
            let fields = fields_from_args::<R>(&values)?;
            api.update(id, &fields).await.map_err(client_error)?;

            output_success(
                output_format,
                &format!("Updated {} {}", R::SINGULAR, id),
                Some(json!({ "id": id })),
            )
        }
        ResourceCommands::Delete { id } => {
            let id = local_id(&id)?;
            api.delete(id).await.map_err(client_error)?;

            output_success(
                output_format,
                &format!("Deleted {} {}", R::SINGULAR, id),
                Some(json!({ "id": id })),
            )
        }
        ResourceCommands::Shell => super::shell::run::<R, A>(api).await,
    }
}
