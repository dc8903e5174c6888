use chrono::{Local, NaiveDate, NaiveTime};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use tracing::warn;

use crate::{Actor, EngineError, ResultEngine};

mod clients;
mod counter;
mod import;
mod invoices;
mod ledger;
mod materials;
mod movements;
mod receivables;
mod reconcile;
mod sales;

pub use clients::{ClientProfile, RenamePropagation, TransferOutcome};
pub use materials::MaterialUpdate;
pub use movements::MovementEdit;
pub use sales::PaymentReceipt;

/// First value of the bill counter on a fresh ledger.
pub const DEFAULT_BILL_COUNTER_SEED: i64 = 1000;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    bill_counter_seed: i64,
    today: Option<NaiveDate>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The business day, used for back-dating checks and new records.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Non-admins may only touch records of the current day.
    fn ensure_same_day(&self, actor: &Actor, date: NaiveDate, action: &str) -> ResultEngine<()> {
        if actor.is_admin() || date == self.today() {
            return Ok(());
        }
        warn!(user = %actor.username, %date, action, "back-dated change rejected");
        Err(EngineError::PolicyViolation(format!(
            "only admins can {action} records dated {date}"
        )))
    }
}

fn now_time() -> NaiveTime {
    Local::now().time()
}

/// Rows belonging to `client`: matched by code, or by name when the row
/// predates client codes.
fn owned_by<C: ColumnTrait>(code_col: C, name_col: C, client: &crate::clients::Model) -> Condition {
    Condition::any().add(code_col.eq(client.code.clone())).add(
        Condition::all()
            .add(code_col.is_null())
            .add(name_col.eq(client.name.clone())),
    )
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    bill_counter_seed: i64,
    today: Option<NaiveDate>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            bill_counter_seed: DEFAULT_BILL_COUNTER_SEED,
            today: None,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Value the bill counter starts from when the ledger has none yet.
    pub fn bill_counter_seed(mut self, seed: i64) -> EngineBuilder {
        self.bill_counter_seed = seed;
        self
    }

    /// Pin the business day instead of reading the local clock.
    pub fn today(mut self, date: NaiveDate) -> EngineBuilder {
        self.today = Some(date);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            bill_counter_seed: self.bill_counter_seed,
            today: self.today,
        })
    }
}
