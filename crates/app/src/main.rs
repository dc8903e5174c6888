use std::{error::Error, path::PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{Actor, Engine, NewClientCmd, PendingBillRow, ReconStatus};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde::Serialize;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "stockbook")]
#[command(about = "Stock, receivables and invoice bookkeeping")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./stockbook.db?mode=rwc"
    )]
    database_url: String,

    /// Optional settings file (TOML, YAML or JSON).
    #[arg(long)]
    config: Option<String>,

    /// Name recorded as author of the changes.
    #[arg(long, default_value = "admin")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Client(ClientArgs),
    Material(MaterialArgs),
    Pending(PendingArgs),
    /// Per-material opening, in, out and closing stock of a day.
    Summary {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// All-time stock per material.
    Stock,
    /// Rebuild the reconciliation baskets and print them.
    Reconcile {
        /// Only print baskets of this status (green, yellow, red, blue).
        #[arg(long)]
        status: Option<String>,
    },
    /// Dual ledger of a client.
    Ledger {
        /// Client code or name.
        client: String,
    },
    /// Issue the next bill number.
    NextBill,
    /// Apply or roll back schema migrations. Other commands apply pending ones.
    Migrate {
        #[arg(value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MigrateAction {
    Up,
    Down,
    Fresh,
    Status,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[command(subcommand)]
    command: ClientCommand,
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    Add {
        #[arg(long)]
        name: String,
        /// Left empty, a `tmpc-` code is generated.
        #[arg(long, default_value = "")]
        code: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        manual_invoice: bool,
    },
    List {
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args, Debug)]
struct MaterialArgs {
    #[command(subcommand)]
    command: MaterialCommand,
}

#[derive(Subcommand, Debug)]
enum MaterialCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        code: String,
        /// Unit price, e.g. `12.50`.
        #[arg(long, default_value = "0")]
        price: engine::Money,
    },
    List,
}

#[derive(Args, Debug)]
struct PendingArgs {
    #[command(subcommand)]
    command: PendingCommand,
}

#[derive(Subcommand, Debug)]
enum PendingCommand {
    /// Import receivables from a CSV file with `ClientCode,ClientName,BillNo,Amount,Reason,NimbusNo` columns.
    Import { file: PathBuf },
    /// Export every receivable to a CSV file.
    Export { file: PathBuf },
    List {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        all: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_rows(file: &PathBuf) -> Result<Vec<PendingBillRow>, Box<dyn Error + Send + Sync>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(file)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn write_rows(file: &PathBuf, rows: &[PendingBillRow]) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut writer = csv::Writer::from_path(file)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_status(raw: &str) -> Result<ReconStatus, Box<dyn Error + Send + Sync>> {
    Ok(ReconStatus::try_from(raw)?)
}

async fn migrate(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match action {
        MigrateAction::Up => Migrator::up(db, None).await?,
        MigrateAction::Down => Migrator::down(db, Some(1)).await?,
        MigrateAction::Fresh => Migrator::fresh(db).await?,
        MigrateAction::Status => Migrator::status(db).await?,
    }
    tracing::info!(?action, "migrations done");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "stockbook={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = settings.database.url().unwrap_or(cli.database_url);
    let db = sea_orm::Database::connect(&url).await?;
    if let Command::Migrate { action } = cli.command {
        return migrate(&db, action).await;
    }
    Migrator::up(&db, None).await?;
    let mut builder = Engine::builder()
        .database(db)
        .bill_counter_seed(settings.ledger.bill_counter_seed);
    if let Some(today) = settings.ledger.today {
        builder = builder.today(today);
    }
    let engine = builder.build().await?;
    let actor = Actor::admin(cli.user);

    match cli.command {
        Command::Client(ClientArgs { command }) => match command {
            ClientCommand::Add {
                name,
                code,
                category,
                manual_invoice,
            } => {
                let mut cmd = NewClientCmd::new(name, code).require_manual_invoice(manual_invoice);
                if let Some(category) = category {
                    cmd = cmd.category(category);
                }
                print_json(&engine.new_client(cmd).await?)?;
            }
            ClientCommand::List { all } => print_json(&engine.clients(all).await?)?,
        },
        Command::Material(MaterialArgs { command }) => match command {
            MaterialCommand::Add { name, code, price } => {
                print_json(&engine.new_material(&name, &code, price.minor()).await?)?;
            }
            MaterialCommand::List => print_json(&engine.materials().await?)?,
        },
        Command::Pending(PendingArgs { command }) => match command {
            PendingCommand::Import { file } => {
                let rows = read_rows(&file)?;
                tracing::info!(rows = rows.len(), file = %file.display(), "importing receivables");
                print_json(&engine.import_pending_bills(rows, &actor).await?)?;
            }
            PendingCommand::Export { file } => {
                let rows = engine.export_pending_bills().await?;
                write_rows(&file, &rows)?;
                tracing::info!(rows = rows.len(), file = %file.display(), "receivables exported");
            }
            PendingCommand::List { client, all } => {
                let code = match client {
                    Some(key) => match engine.resolve_client(&key).await? {
                        Some(client) => Some(client.code),
                        None => {
                            eprintln!("client not found: {key}");
                            std::process::exit(1);
                        }
                    },
                    None => None,
                };
                print_json(&engine.pending_bills(code.as_deref(), all).await?)?;
            }
        },
        Command::Summary { date } => {
            let date = date.unwrap_or_else(|| engine.today());
            print_json(&engine.daily_summary(date).await?)?;
        }
        Command::Stock => print_json(&engine.stock_overview().await?)?,
        Command::Reconcile { status } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let summary = engine.rebuild_reconciliation().await?;
            tracing::info!(total = summary.total(), "reconciliation rebuilt");
            print_json(&engine.recon_baskets(status).await?)?;
        }
        Command::Ledger { client } => {
            let Some(found) = engine.resolve_client(&client).await? else {
                eprintln!("client not found: {client}");
                std::process::exit(1);
            };
            print_json(&engine.client_ledger(found.id).await?)?;
        }
        Command::NextBill => println!("{}", engine.next_bill_number().await?),
        Command::Migrate { .. } => {}
    }

    Ok(())
}
