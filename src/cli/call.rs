use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncReadExt;

use super::context::CliContext;
use super::runtime::build_adapter;

#[derive(Args, Clone)]
pub struct CallArgs {
    /// File holding the JSON webhook body ("-" reads stdin)
    #[arg(default_value = "-")]
    pub input: String,

    /// Pretty-print the response envelope
    #[arg(long)]
    pub pretty: bool,
}

/// Runs one body through the same pipeline the HTTP handler uses. Works
/// without an API key for `get_datetime`.
pub async fn cmd_call(args: CallArgs, ctx: &CliContext) -> Result<()> {
    let body = read_input(&args.input).await?;
    let pipeline = build_adapter(ctx.config(), true)?.pipeline();
    let envelope = pipeline.handle(&body).await;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{rendered}");
    Ok(())
}

async fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buffer = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buffer)
            .await
            .context("failed to read webhook body from stdin")?;
        Ok(buffer)
    } else {
        tokio::fs::read(input)
            .await
            .with_context(|| format!("failed to read webhook body from {input}"))
    }
}
