use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{sign_token, Claims};
use crate::cli::utils::output_json;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, env = "POCKET_JWT_SECRET", hide_env_values = true, help = "Secret shared with the server's JWT_SECRET")]
    pub secret: String,

    #[arg(long, help = "User id (random if omitted)")]
    pub user: Option<Uuid>,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,

    #[arg(long, default_value_t = 24, help = "Hours until the token expires")]
    pub hours: i64,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = args.user.unwrap_or_else(Uuid::new_v4);
    let claims = Claims::for_hours(user, args.email, args.hours)?;
    let token = sign_token(&claims, &args.secret)?;

    match output_format {
        OutputFormat::Json => output_json(&json!({
            "token": token,
            "user_id": user,
            "expires_at": claims.exp,
        }))?,
        OutputFormat::Text => {
            eprintln!("Token for user {} (valid {}h)", user, args.hours);
            println!("{}", token);
        }
    }
    Ok(())
}
