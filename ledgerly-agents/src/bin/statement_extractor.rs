use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use extractors::{render_csv, PdfExtractBackend, PdfTextExtractor};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use ledgerly_agents::settings::{build_config, default_config_path, LlmSettings};
use ledgerly_agents::{LlmClient, OpenAiCompatibleClient, StatementExtractor};

#[derive(Parser, Debug)]
#[command(
    name = "statement-extractor",
    about = "Extract transactions from a bank statement with an LLM"
)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["pdf", "text"]),
))]
struct Cli {
    /// Path to a PDF bank statement
    #[arg(long, value_name = "PATH", group = "input")]
    pdf: Option<PathBuf>,

    /// Path to statement text that was already extracted
    #[arg(long, value_name = "PATH", group = "input")]
    text: Option<PathBuf>,

    /// Also write the transactions as CSV to this path
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Override the configured model ID
    #[arg(long)]
    model: Option<String>,

    /// Config file (defaults to the ledgerly API config)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct CliConfig {
    #[serde(default)]
    llm: LlmSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config: CliConfig = build_config(&config_path)
        .and_then(|c| c.try_deserialize())
        .with_context(|| format!("Failed to load config at {:?}", config_path))?;

    let mut llm = config.llm.with_env_fallbacks();
    if let Some(model) = cli.model.clone() {
        llm.model = Some(model);
    }

    let raw_text = match (&cli.pdf, &cli.text) {
        (Some(path), None) => read_pdf_text(path.clone()).await?,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text file {:?}", path))?,
        _ => unreachable!("clap enforces exactly one input"),
    };
    tracing::info!("Statement text: {} chars", raw_text.len());

    let llm_client: Arc<dyn LlmClient> = Arc::new(
        OpenAiCompatibleClient::new(llm.client_config())
            .with_context(|| format!("Invalid LLM settings in {:?}", config_path))?,
    );
    let extractor = StatementExtractor::new(llm_client, llm.extraction_options());

    let result = extractor.extract_transactions(&raw_text).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    let transactions = match result.into_result() {
        Ok(transactions) => transactions,
        Err(error) => anyhow::bail!("Extraction failed: {}", error),
    };

    if let Some(csv_path) = &cli.csv {
        let csv = render_csv(&transactions).context("Failed to render CSV")?;
        std::fs::write(csv_path, csv)
            .with_context(|| format!("Failed to write CSV to {:?}", csv_path))?;
        tracing::info!("Wrote {} transactions to {:?}", transactions.len(), csv_path);
    }

    Ok(())
}

async fn read_pdf_text(path: PathBuf) -> Result<String> {
    let bytes =
        std::fs::read(&path).with_context(|| format!("Failed to read PDF file {:?}", path))?;
    tokio::task::spawn_blocking(move || PdfExtractBackend.extract_text(&bytes))
        .await
        .context("PDF text extraction panicked")?
        .with_context(|| format!("Failed to extract text from {:?}", path))
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
