pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::HttpApi;
use crate::models::{Contact, Note, Todo};
use commands::resource::ResourceCommands;

#[derive(Parser)]
#[command(name = "pocket")]
#[command(about = "Pocket CLI - notes, contacts and todos from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "POCKET_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the Pocket API"
    )]
    pub url: String,

    #[arg(long, global = true, env = "POCKET_TOKEN", hide_env_values = true, help = "Session token")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Your private notes")]
    Notes {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Your phonebook")]
    Contacts {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "The shared todo list")]
    Todos {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Fetch a random cat fact")]
    Fact {
        #[arg(long, default_value = commands::fact::DEFAULT_URL, help = "Cat fact endpoint")]
        url: String,
    },

    #[command(about = "Mint a development session token")]
    Token {
        #[command(flatten)]
        args: commands::token::TokenArgs,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let api = || HttpApi::new(&cli.url, cli.token.clone());

    match cli.command {
        Commands::Notes { cmd } => commands::resource::handle::<Note, _>(cmd, api()?, output_format).await,
        Commands::Contacts { cmd } => commands::resource::handle::<Contact, _>(cmd, api()?, output_format).await,
        Commands::Todos { cmd } => commands::resource::handle::<Todo, _>(cmd, api()?, output_format).await,
        Commands::Fact { url } => commands::fact::handle(&url, output_format).await,
        Commands::Token { args } => commands::token::handle(args, output_format),
    }
}
