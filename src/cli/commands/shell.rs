use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::utils::client_error;
use crate::client::ResourceApi;
use crate::models::Resource;
use crate::presenter::ListPresenter;
use crate::validate::parse_id;

const HELP: &str = "\
commands:
  list                      refetch and show the list
  add <field>=<value> ...   add a row (the draft is kept if it is rejected)
  edit <id>                 open a row for editing, or close it
  set <field> <value>       change a field of the open row
  save                      save the open row
  delete <id>               delete a row
  help | quit";

#[derive(Debug, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Add(Vec<(String, String)>),
    Edit(i64),
    Set(String, String),
    Save,
    Delete(i64),
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let id = |raw: &str| parse_id(raw).map_err(|e| format!("{}: {}", e, raw));

    let command = match word {
        "" => return Ok(None),
        "list" | "ls" => ShellCommand::List,
        "add" => {
            let pairs = rest
                .split_whitespace()
                .map(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .ok_or_else(|| format!("expected field=value, got {}", pair))
                })
                .collect::<Result<Vec<_>, _>>()?;
            ShellCommand::Add(pairs)
        }
        "edit" => ShellCommand::Edit(id(rest)?),
        "set" => match rest.split_once(char::is_whitespace) {
            Some((field, value)) => ShellCommand::Set(field.to_string(), value.trim().to_string()),
            None if !rest.is_empty() => ShellCommand::Set(rest.to_string(), String::new()),
            None => return Err("usage: set <field> <value>".to_string()),
        },
        "save" => ShellCommand::Save,
        "delete" | "rm" => ShellCommand::Delete(id(rest)?),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

async fn apply<R, A>(presenter: &mut ListPresenter<R, A>, command: ShellCommand) -> anyhow::Result<()>
where
    R: Resource,
    A: ResourceApi<R>,
{
    match command {
        ShellCommand::List => presenter.refresh().await,
        ShellCommand::Add(pairs) => {
            for (field, value) in &pairs {
                presenter.set_add_field(field, value).map_err(client_error)?;
            }
            presenter.submit_add().await.map_err(client_error)?;
        }
        ShellCommand::Edit(id) => {
            if !presenter.toggle_edit(id) {
                anyhow::bail!("no {} {} in the list", R::SINGULAR, id);
            }
        }
        ShellCommand::Set(field, value) => {
            if presenter.editing_id().is_none() {
                anyhow::bail!("nothing is open for editing");
            }
            presenter.set_edit_field(&field, &value).map_err(client_error)?;
        }
        ShellCommand::Save => presenter.save_edit().await.map_err(client_error)?,
        ShellCommand::Delete(id) => presenter.delete(id).await.map_err(client_error)?,
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => {}
    }
    Ok(())
}

pub async fn run<R, A>(api: A) -> anyhow::Result<()>
where
    R: Resource,
    A: ResourceApi<R>,
{
    let mut presenter: ListPresenter<R, A> = ListPresenter::new(api);
    println!("{}", presenter.render());
    presenter.refresh_if_stale().await;
    println!("{}", presenter.render());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{}> ", R::PATH);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }

        let redraw = command != ShellCommand::Help;
        if let Err(e) = apply(&mut presenter, command).await {
            eprintln!("Error: {}", e);
        }
        if redraw {
            println!("{}", presenter.render());
        }
    }
    Ok(())
}
