//! sales-documents entry point.

use clap::{Parser, Subcommand, ValueEnum};
use sales_documents::config::SalesDocumentsConfig;
use sales_documents::models::{DocumentHeader, DocumentKind, InvoiceHeader, QuotationHeader};
use sales_documents::services::{init_metrics, ApiClient, DocumentEditor, DocumentStore};
use service_core::error::AppError;
use service_core::observability::{init_tracing, shutdown_tracing};

#[derive(Parser)]
#[command(name = "sales-documents")]
#[command(about = "Recompute and inspect quotation and invoice totals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reload a document, recompute its totals and store them back
    Recalc {
        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        id: String,

        /// Only report the difference, do not save
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a document's recomputed totals as JSON
    Show {
        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Quotation,
    Invoice,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Quotation => DocumentKind::Quotation,
            KindArg::Invoice => DocumentKind::Invoice,
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match SalesDocumentsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.api.base_url,
        quotation_tax_rate = %config.tax.quotation,
        invoice_tax_rate = %config.tax.invoice,
        "Configuration loaded"
    );

    let result = run(cli.command, &config).await;
    let code = match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Command failed");
            eprintln!("{}", e);
            std::process::ExitCode::FAILURE
        }
    };

    shutdown_tracing();
    code
}

async fn run(command: Commands, config: &SalesDocumentsConfig) -> Result<(), AppError> {
    let client = ApiClient::new(&config.api)?;

    match command {
        Commands::Recalc { kind, id, dry_run } => match DocumentKind::from(kind) {
            DocumentKind::Quotation => {
                recalc::<QuotationHeader, _>(&client, config, &id, dry_run).await
            }
            DocumentKind::Invoice => {
                recalc::<InvoiceHeader, _>(&client, config, &id, dry_run).await
            }
        },
        Commands::Show { kind, id } => match DocumentKind::from(kind) {
            DocumentKind::Quotation => show::<QuotationHeader, _>(&client, config, &id).await,
            DocumentKind::Invoice => show::<InvoiceHeader, _>(&client, config, &id).await,
        },
    }
}

async fn recalc<H, St>(
    store: &St,
    config: &SalesDocumentsConfig,
    id: &str,
    dry_run: bool,
) -> Result<(), AppError>
where
    H: DocumentHeader,
    St: DocumentStore,
{
    let stored = store.load::<H>(id).await?;
    let previous = (stored.subtotal, stored.iva, stored.total);

    let mut editor = DocumentEditor::<H>::from_stored(stored, config.tax.rate_for(H::KIND))?;
    let totals = editor.document().totals();
    let changed = previous != (totals.subtotal, totals.tax_amount, totals.total);

    tracing::info!(
        kind = H::KIND.as_str(),
        id,
        stored_total = %previous.2,
        recomputed_total = %totals.total,
        changed,
        "Totals recomputed"
    );

    if changed && !dry_run {
        editor.save(store).await?;
    }
    Ok(())
}

async fn show<H, St>(store: &St, config: &SalesDocumentsConfig, id: &str) -> Result<(), AppError>
where
    H: DocumentHeader,
    St: DocumentStore,
{
    let editor = DocumentEditor::<H>::open(store, id, config.tax.rate_for(H::KIND)).await?;
    let document = editor.document();

    let output = serde_json::json!({
        "kind": H::KIND,
        "id": document.id(),
        "items": document.items(),
        "tax_rate": document.tax_rate(),
        "totals": document.totals(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?
    );
    Ok(())
}
