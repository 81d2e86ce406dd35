use clap::{Args, Parser, Subcommand};
use engine::{Engine, InvoiceAudit, WalletAudit};
use migration::{Migrator, MigratorTrait};
use settings::Database;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Maintenance utilities for the ledger database")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, env = "LEDGER_SETTINGS", default_value = "settings")]
    settings: String,

    /// Print audits as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations.
    Migrate,
    /// Compare a wallet balance with its movements.
    AuditWallet(WalletArgs),
    /// Rewrite a wallet balance from its movements.
    RecalculateWallet(WalletArgs),
    /// Compare an invoice amount with its movements.
    AuditInvoice(InvoiceArgs),
}

#[derive(Args, Debug)]
struct WalletArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    wallet: Uuid,
}

#[derive(Args, Debug)]
struct InvoiceArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    invoice: Uuid,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.settings)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledger={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = Engine::builder().database(db).build().await?;
    match cli.command {
        Command::Migrate => tracing::info!("database is up to date"),
        Command::AuditWallet(args) => {
            let audit = engine.audit_wallet(&args.user, args.wallet).await?;
            print_wallet_audit(&audit, cli.json)?;
        }
        Command::RecalculateWallet(args) => {
            let audit = engine.recalculate_wallet(&args.user, args.wallet).await?;
            print_wallet_audit(&audit, cli.json)?;
            if audit.drift != 0 && !cli.json {
                println!("balance rewritten to {}", audit.computed);
            }
        }
        Command::AuditInvoice(args) => {
            let audit = engine.audit_invoice(&args.user, args.invoice).await?;
            print_invoice_audit(&audit, cli.json)?;
        }
    }

    Ok(())
}

fn print_wallet_audit(audit: &WalletAudit, json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(audit)?);
    } else {
        println!(
            "wallet {}: stored {} computed {} drift {}",
            audit.wallet_id, audit.stored, audit.computed, audit.drift
        );
    }
    Ok(())
}

fn print_invoice_audit(audit: &InvoiceAudit, json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(audit)?);
    } else {
        println!(
            "invoice {}: stored {} computed {} drift {}",
            audit.invoice_id, audit.stored, audit.computed, audit.drift
        );
    }
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
