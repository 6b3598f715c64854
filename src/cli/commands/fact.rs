use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cli::utils::output_json;
use crate::cli::OutputFormat;

pub const DEFAULT_URL: &str = "https://catfact.ninja/fact";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatFact {
    pub fact: String,
    pub length: usize,
}

pub async fn fetch_fact(client: &reqwest::Client, url: &str) -> anyhow::Result<CatFact> {
    let response = client
        .get(url)
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("{} answered {}", url, response.status());
    }
    Ok(response.json().await?)
}

pub async fn handle(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let fact = fetch_fact(&reqwest::Client::new(), url).await?;

    match output_format {
        OutputFormat::Json => output_json(&fact)?,
        OutputFormat::Text => println!("{} ({} characters)", fact.fact, fact.length),
    }
    Ok(())
}
