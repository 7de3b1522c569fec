//! Command-line shell over `expense_core`.
//!
//! # Responsibility
//! - Collect manual input, receipt paths and configuration from the user.
//! - Render core results; all validation and persistence live in core.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use expense_core::{
    AnalysisError, AnalyzerConfig, Expense, ExpenseService, ExpenseStore, ReceiptAnalyzer,
    ServiceError, SqliteExpenseStore,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "expense", version = expense_core::core_version(), about = "Track expenses and scan receipts")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "EXPENSE_DB", default_value = "expenses.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "EXPENSE_LOG_DIR")]
    log_dir: Option<String>,

    #[arg(long, env = "EXPENSE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add an expense from manual input.
    Add {
        name: String,
        amount: String,
        category: String,
    },
    /// List stored expenses.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Delete an expense by id (unknown ids are ignored).
    Delete { id: i64 },
    /// Extract an expense from a receipt image.
    Scan {
        image: PathBuf,

        /// Persist the extracted expense.
        #[arg(long)]
        save: bool,

        /// Expense date (`yyyy-mm-dd`) used with `--save`; defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long, env = "GEMINI_MODEL")]
        model: Option<String>,

        #[arg(long, env = "GEMINI_ENDPOINT")]
        endpoint: Option<String>,

        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

impl Cli {
    fn effective_log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| expense_core::default_log_level())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        expense_core::init_logging(cli.effective_log_level(), log_dir)
            .map_err(anyhow::Error::msg)
            .context("failed to initialize logging")?;
    }

    let store = SqliteExpenseStore::open(&cli.db)
        .with_context(|| format!("failed to open expense database `{}`", cli.db.display()))?;
    store.initialize().context("failed to initialize expense database")?;
    let service = ExpenseService::new(store);

    match cli.command {
        Command::Add {
            name,
            amount,
            category,
        } => {
            let id = service.add_manual(&name, &amount, &category)?;
            println!("added expense {id}");
        }
        Command::List { json } => {
            let expenses = service.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&expenses)?);
            } else {
                print_table(&expenses);
                println!("total: {:.2}", service.store().total_amount()?);
            }
        }
        Command::Delete { id } => {
            service.remove(id)?;
            println!("deleted expense {id}");
        }
        Command::Scan {
            image,
            save,
            date,
            api_key,
            model,
            endpoint,
            timeout_secs,
        } => {
            let config = api_key.map(|key| {
                let mut config =
                    AnalyzerConfig::new(key).with_timeout(Duration::from_secs(timeout_secs));
                if let Some(model) = model {
                    config = config.with_model(model);
                }
                if let Some(endpoint) = endpoint {
                    config = config.with_endpoint(endpoint);
                }
                config
            });
            let analyzer = ReceiptAnalyzer::new(config);

            let scanned = if save {
                service.import_receipt_file(&analyzer, &image, date)
            } else {
                analyzer.analyze_file(&image).map_err(ServiceError::from)
            };
            let expense = match scanned {
                Ok(expense) => expense,
                Err(ServiceError::Analysis(AnalysisError::ConfigurationMissing(what))) => {
                    bail!("receipt scanning unavailable: set GEMINI_API_KEY ({what} missing)")
                }
                Err(err) => return Err(err.into()),
            };

            if let Some(id) = expense.id {
                println!("saved expense {id}");
            }
            print_table(std::slice::from_ref(&expense));
        }
    }

    Ok(())
}

fn print_table(expenses: &[Expense]) {
    println!(
        "{:>5}  {:<24}  {:>10}  {:<16}  {:<10}",
        "ID", "NAME", "AMOUNT", "CATEGORY", "DATE"
    );
    for expense in expenses {
        let id = expense
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<24}  {:>10.2}  {:<16}  {:<10}",
            id, expense.name, expense.amount, expense.category, expense.date
        );
    }
}
