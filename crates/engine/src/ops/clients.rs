use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    Client, EngineError, NewClientCmd, ResultEngine,
    clients::{self, DEFAULT_CATEGORY},
    bookings, direct_sales, entry, invoices, payments, pending_bills,
    util::{CLIENT_CODE_PREFIX, next_client_code, normalize_optional, normalize_required},
};

use super::{Engine, with_tx};

/// Contact and policy fields of a client; identity (name, code) is changed
/// through [`Engine::rename_or_recode`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientProfile {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub require_manual_invoice: bool,
}

/// Rows rewritten by a rename or recode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenamePropagation {
    pub pending_bills: u64,
    pub entries_by_code: u64,
    /// Legacy movements that had no code and matched by name.
    pub entries_by_name: u64,
    pub invoices: u64,
    pub bookings: u64,
    pub direct_sales: u64,
    pub payments: u64,
}

/// Rows moved by a transfer or a reclaim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub entries: u64,
    pub pending_bills: u64,
    /// Clients previously merged into the source that now point at the target.
    pub redirected_clients: u64,
}

impl Engine {
    /// Register a client. A blank code is replaced by a generated one.
    pub async fn new_client(&self, cmd: NewClientCmd) -> ResultEngine<Client> {
        let name = normalize_required(&cmd.name, "client name")?;
        with_tx!(self, |db_tx| {
            let code = match normalize_optional(Some(&cmd.code)) {
                Some(code) => code,
                None => self.generate_client_code(&db_tx).await?,
            };
            if self.find_client_by_code(&db_tx, &code).await?.is_some() {
                return Err(EngineError::DuplicateCode(code));
            }

            let model = clients::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                code: ActiveValue::Set(code),
                phone: ActiveValue::Set(normalize_optional(cmd.phone.as_deref())),
                address: ActiveValue::Set(normalize_optional(cmd.address.as_deref())),
                category: ActiveValue::Set(
                    normalize_optional(cmd.category.as_deref())
                        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                ),
                is_active: ActiveValue::Set(true),
                require_manual_invoice: ActiveValue::Set(cmd.require_manual_invoice),
                transferred_to_id: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            info!(code = %model.code, name = %model.name, "client created");
            Ok(Client::from(model))
        })
    }

    pub async fn client(&self, client_id: i32) -> ResultEngine<Client> {
        with_tx!(self, |db_tx| {
            let model = self.require_client_by_id(&db_tx, client_id).await?;
            Ok(Client::from(model))
        })
    }

    pub async fn client_by_code(&self, code: &str) -> ResultEngine<Option<Client>> {
        with_tx!(self, |db_tx| {
            let model = self.find_client_by_code(&db_tx, code.trim()).await?;
            Ok(model.map(Client::from))
        })
    }

    /// Look a client up by code, falling back to the (first) client with that
    /// name.
    pub async fn resolve_client(&self, code_or_name: &str) -> ResultEngine<Option<Client>> {
        with_tx!(self, |db_tx| {
            let model = self.lookup_client(&db_tx, code_or_name).await?;
            Ok(model.map(Client::from))
        })
    }

    /// Clients sorted by name; merged ones only when `include_inactive`.
    pub async fn clients(&self, include_inactive: bool) -> ResultEngine<Vec<Client>> {
        with_tx!(self, |db_tx| {
            let mut query = clients::Entity::find().order_by_asc(clients::Column::Name);
            if !include_inactive {
                query = query.filter(clients::Column::IsActive.eq(true));
            }
            let models = query.all(&db_tx).await?;
            Ok(models.into_iter().map(Client::from).collect())
        })
    }

    /// Next free generated client code (`tmpc-NNNNNN`).
    pub async fn next_client_code(&self) -> ResultEngine<String> {
        with_tx!(self, |db_tx| self.generate_client_code(&db_tx).await)
    }

    pub async fn update_client_profile(
        &self,
        client_id: i32,
        profile: ClientProfile,
    ) -> ResultEngine<Client> {
        with_tx!(self, |db_tx| {
            self.require_client_by_id(&db_tx, client_id).await?;
            let model = clients::ActiveModel {
                id: ActiveValue::Set(client_id),
                phone: ActiveValue::Set(normalize_optional(profile.phone.as_deref())),
                address: ActiveValue::Set(normalize_optional(profile.address.as_deref())),
                category: ActiveValue::Set(
                    normalize_optional(profile.category.as_deref())
                        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                ),
                require_manual_invoice: ActiveValue::Set(profile.require_manual_invoice),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(Client::from(model))
        })
    }

    /// Change a client's name and/or code and carry the new pair to every
    /// record that pointed at the old code: receivables, movements, invoices,
    /// bookings, direct sales and payments.
    pub async fn rename_or_recode(
        &self,
        client_id: i32,
        new_name: &str,
        new_code: &str,
    ) -> ResultEngine<RenamePropagation> {
        let new_name = normalize_required(new_name, "client name")?;
        let new_code = normalize_required(new_code, "client code")?;
        with_tx!(self, |db_tx| {
            let client = self.require_client_by_id(&db_tx, client_id).await?;
            if client.name == new_name && client.code == new_code {
                return Ok(RenamePropagation::default());
            }

            let taken = clients::Entity::find()
                .filter(clients::Column::Code.eq(new_code.clone()))
                .filter(clients::Column::Id.ne(client_id))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::DuplicateCode(new_code));
            }

            let pending_bills = pending_bills::Entity::update_many()
                .col_expr(pending_bills::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(pending_bills::Column::ClientName, Expr::value(new_name.clone()))
                .filter(pending_bills::Column::ClientCode.eq(client.code.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let entries_by_code = entry::Entity::update_many()
                .col_expr(entry::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(entry::Column::Client, Expr::value(new_name.clone()))
                .filter(entry::Column::ClientCode.eq(client.code.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let entries_by_name = entry::Entity::update_many()
                .col_expr(entry::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(entry::Column::Client, Expr::value(new_name.clone()))
                .filter(entry::Column::ClientCode.is_null())
                .filter(entry::Column::Client.eq(client.name.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let invoices = invoices::Entity::update_many()
                .col_expr(invoices::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(invoices::Column::ClientName, Expr::value(new_name.clone()))
                .filter(invoices::Column::ClientCode.eq(client.code.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let bookings = bookings::Entity::update_many()
                .col_expr(bookings::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(bookings::Column::ClientName, Expr::value(new_name.clone()))
                .filter(bookings::Column::ClientCode.eq(client.code.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let direct_sales = direct_sales::Entity::update_many()
                .col_expr(direct_sales::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(direct_sales::Column::ClientName, Expr::value(new_name.clone()))
                .filter(direct_sales::Column::ClientCode.eq(client.code.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            let payments = payments::Entity::update_many()
                .col_expr(payments::Column::ClientCode, Expr::value(new_code.clone()))
                .col_expr(payments::Column::ClientName, Expr::value(new_name.clone()))
                .filter(payments::Column::ClientCode.eq(client.code.clone()))
                .exec(&db_tx)
                .await?
                .rows_affected;

            clients::ActiveModel {
                id: ActiveValue::Set(client_id),
                name: ActiveValue::Set(new_name.clone()),
                code: ActiveValue::Set(new_code.clone()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            let propagation = RenamePropagation {
                pending_bills,
                entries_by_code,
                entries_by_name,
                invoices,
                bookings,
                direct_sales,
                payments,
            };
            info!(
                old_code = %client.code,
                %new_code,
                %new_name,
                ?propagation,
                "client renamed"
            );
            Ok(propagation)
        })
    }

    /// Merge `source_id` into `target_id`: its movements and receivables move
    /// to the target and the source is deactivated.
    pub async fn transfer_client(
        &self,
        source_id: i32,
        target_id: i32,
    ) -> ResultEngine<TransferOutcome> {
        with_tx!(self, |db_tx| {
            let source = self.require_client_by_id(&db_tx, source_id).await?;
            let target = self.require_client_by_id(&db_tx, target_id).await?;
            if source.id == target.id {
                return Err(EngineError::PolicyViolation(
                    "cannot transfer a client to itself".to_string(),
                ));
            }
            if !target.is_active {
                return Err(EngineError::PolicyViolation(format!(
                    "cannot transfer to inactive client {}",
                    target.code
                )));
            }

            let outcome = TransferOutcome {
                entries: move_entries(&db_tx, &source.code, None, &target).await?,
                pending_bills: move_pending_bills(&db_tx, &source.code, None, &target).await?,
                redirected_clients: clients::Entity::update_many()
                    .col_expr(clients::Column::TransferredToId, Expr::value(target.id))
                    .filter(clients::Column::TransferredToId.eq(source.id))
                    .exec(&db_tx)
                    .await?
                    .rows_affected,
            };

            clients::ActiveModel {
                id: ActiveValue::Set(source.id),
                is_active: ActiveValue::Set(false),
                transferred_to_id: ActiveValue::Set(Some(target.id)),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            info!(from = %source.code, to = %target.code, ?outcome, "client transferred");
            Ok(outcome)
        })
    }

    /// Undo a transfer: reactivate the source and take back from the target
    /// every movement and receivable carrying the target's exact code and
    /// name.
    ///
    /// Rows are not tagged with their original owner, so the target's own
    /// records are taken along too.
    pub async fn reclaim_client(&self, source_id: i32) -> ResultEngine<TransferOutcome> {
        with_tx!(self, |db_tx| {
            let source = self.require_client_by_id(&db_tx, source_id).await?;
            let target_id = match (source.is_active, source.transferred_to_id) {
                (false, Some(target_id)) => target_id,
                _ => {
                    return Err(EngineError::PolicyViolation(format!(
                        "client {} is not transferred",
                        source.code
                    )));
                }
            };
            let target = self.require_client_by_id(&db_tx, target_id).await?;

            let outcome = TransferOutcome {
                entries: move_entries(&db_tx, &target.code, Some(&target.name), &source).await?,
                pending_bills: move_pending_bills(
                    &db_tx,
                    &target.code,
                    Some(&target.name),
                    &source,
                )
                .await?,
                redirected_clients: 0,
            };

            clients::ActiveModel {
                id: ActiveValue::Set(source.id),
                is_active: ActiveValue::Set(true),
                transferred_to_id: ActiveValue::Set(None),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            warn!(
                client = %source.code,
                from = %target.code,
                ?outcome,
                "client reclaimed; all rows of the target were taken back"
            );
            Ok(outcome)
        })
    }

    /// Delete a client. Clients merged into it must be reclaimed first.
    pub async fn delete_client(&self, client_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let client = self.require_client_by_id(&db_tx, client_id).await?;
            let merged = clients::Entity::find()
                .filter(clients::Column::TransferredToId.eq(client_id))
                .one(&db_tx)
                .await?;
            if let Some(merged) = merged {
                return Err(EngineError::PolicyViolation(format!(
                    "client {} was transferred into {}",
                    merged.code, client.code
                )));
            }
            clients::Entity::delete_by_id(client_id).exec(&db_tx).await?;
            info!(code = %client.code, "client deleted");
            Ok(())
        })
    }

    pub(super) async fn require_client_by_id(
        &self,
        db_tx: &DatabaseTransaction,
        client_id: i32,
    ) -> ResultEngine<clients::Model> {
        clients::Entity::find_by_id(client_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("client {client_id}")))
    }

    pub(super) async fn find_client_by_code(
        &self,
        db_tx: &DatabaseTransaction,
        code: &str,
    ) -> ResultEngine<Option<clients::Model>> {
        Ok(clients::Entity::find()
            .filter(clients::Column::Code.eq(code))
            .one(db_tx)
            .await?)
    }

    /// Code first, then the oldest client with that exact name.
    pub(super) async fn lookup_client(
        &self,
        db_tx: &DatabaseTransaction,
        code_or_name: &str,
    ) -> ResultEngine<Option<clients::Model>> {
        let key = code_or_name.trim();
        if key.is_empty() {
            return Ok(None);
        }
        if let Some(model) = self.find_client_by_code(db_tx, key).await? {
            return Ok(Some(model));
        }
        Ok(clients::Entity::find()
            .filter(clients::Column::Name.eq(key))
            .order_by_asc(clients::Column::Id)
            .one(db_tx)
            .await?)
    }

    /// Like [`Engine::lookup_client`] but an unknown client is an error.
    pub(super) async fn require_client(
        &self,
        db_tx: &DatabaseTransaction,
        code_or_name: &str,
    ) -> ResultEngine<clients::Model> {
        self.lookup_client(db_tx, code_or_name)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidReference(format!("unknown client \"{}\"", code_or_name.trim()))
            })
    }

    pub(super) async fn generate_client_code(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<String> {
        let last = clients::Entity::find()
            .filter(clients::Column::Code.starts_with(CLIENT_CODE_PREFIX))
            .order_by_desc(clients::Column::Code)
            .one(db_tx)
            .await?;
        Ok(next_client_code(last.as_ref().map(|m| m.code.as_str())))
    }
}

/// Point movements of `(code[, name])` at `to`.
async fn move_entries(
    db_tx: &DatabaseTransaction,
    code: &str,
    name: Option<&str>,
    to: &clients::Model,
) -> ResultEngine<u64> {
    let mut filter = Condition::all().add(entry::Column::ClientCode.eq(code));
    if let Some(name) = name {
        filter = filter.add(entry::Column::Client.eq(name));
    }
    Ok(entry::Entity::update_many()
        .col_expr(entry::Column::ClientCode, Expr::value(to.code.clone()))
        .col_expr(entry::Column::Client, Expr::value(to.name.clone()))
        .filter(filter)
        .exec(db_tx)
        .await?
        .rows_affected)
}

/// Point receivables of `(code[, name])` at `to`.
async fn move_pending_bills(
    db_tx: &DatabaseTransaction,
    code: &str,
    name: Option<&str>,
    to: &clients::Model,
) -> ResultEngine<u64> {
    let mut filter = Condition::all().add(pending_bills::Column::ClientCode.eq(code));
    if let Some(name) = name {
        filter = filter.add(pending_bills::Column::ClientName.eq(name));
    }
    Ok(pending_bills::Entity::update_many()
        .col_expr(pending_bills::Column::ClientCode, Expr::value(to.code.clone()))
        .col_expr(pending_bills::Column::ClientName, Expr::value(to.name.clone()))
        .filter(filter)
        .exec(db_tx)
        .await?
        .rows_affected)
}
