//! The module contains `PendingBill`, an outstanding receivable, and the pure
//! settlement logic that distributes a payment across open bills.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Client code carried by receivables of walk-in (cash) customers.
pub(crate) const CASH_CLIENT_CODE: &str = "CASH";

/// An amount a client still owes.
///
/// `amount_minor` is the unpaid remainder, not the original bill total. At
/// most one row exists per non-empty `(bill_no, client_code)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingBill {
    pub id: i32,
    pub client_code: String,
    pub client_name: String,
    pub bill_no: String,
    pub nimbus_no: Option<String>,
    pub amount_minor: i64,
    pub date: Option<NaiveDate>,
    pub reason: String,
    pub photo_url: Option<String>,
    pub is_paid: bool,
    pub is_cash: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub client_code: String,
    pub client_name: String,
    pub bill_no: String,
    pub nimbus_no: Option<String>,
    pub amount_minor: i64,
    pub date: Option<Date>,
    pub reason: String,
    pub photo_url: Option<String>,
    pub is_paid: bool,
    pub is_cash: bool,
    pub created_at: DateTimeUtc,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PendingBill {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            client_code: model.client_code,
            client_name: model.client_name,
            bill_no: model.bill_no,
            nimbus_no: model.nimbus_no,
            amount_minor: model.amount_minor,
            date: model.date,
            reason: model.reason,
            photo_url: model.photo_url,
            is_paid: model.is_paid,
            is_cash: model.is_cash,
            created_at: model.created_at,
            created_by: model.created_by,
        }
    }
}

/// What a payment did to one bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// The bill is fully covered.
    Paid,
    /// The payment ran out; `remaining_minor` is still owed on the bill.
    Partial { remaining_minor: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentApplication {
    pub bill_id: i32,
    pub bill_no: String,
    pub applied_minor: i64,
    pub outcome: SettlementOutcome,
}

/// An open bill as seen by [`settle`].
#[derive(Clone, Debug)]
pub(crate) struct OpenBill {
    pub id: i32,
    pub bill_no: String,
    pub amount_minor: i64,
}

/// Spread `payment_minor` over `open` in the given order.
///
/// Each bill is fully paid while the payment lasts; the first bill it cannot
/// cover is reduced and the walk stops. Bills after that are untouched.
pub(crate) fn settle(payment_minor: i64, open: &[OpenBill]) -> Vec<PaymentApplication> {
    let mut remaining = payment_minor;
    let mut applications = Vec::new();

    for bill in open {
        if remaining <= 0 {
            break;
        }
        if remaining >= bill.amount_minor {
            remaining -= bill.amount_minor;
            applications.push(PaymentApplication {
                bill_id: bill.id,
                bill_no: bill.bill_no.clone(),
                applied_minor: bill.amount_minor,
                outcome: SettlementOutcome::Paid,
            });
        } else {
            applications.push(PaymentApplication {
                bill_id: bill.id,
                bill_no: bill.bill_no.clone(),
                applied_minor: remaining,
                outcome: SettlementOutcome::Partial {
                    remaining_minor: bill.amount_minor - remaining,
                },
            });
            break;
        }
    }

    applications
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(id: i32, amount_minor: i64) -> OpenBill {
        OpenBill {
            id,
            bill_no: format!("#{id}"),
            amount_minor,
        }
    }

    #[test]
    fn pays_oldest_first_then_reduces_the_next() {
        let open = [bill(1, 3000), bill(2, 5000), bill(3, 2000)];
        let applied = settle(6000, &open);

        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].bill_id, 1);
        assert_eq!(applied[0].outcome, SettlementOutcome::Paid);
        assert_eq!(applied[0].applied_minor, 3000);
        assert_eq!(applied[1].bill_id, 2);
        assert_eq!(
            applied[1].outcome,
            SettlementOutcome::Partial {
                remaining_minor: 2000
            }
        );
        assert_eq!(applied[1].applied_minor, 3000);
    }

    #[test]
    fn exact_amount_settles_without_touching_later_bills() {
        let open = [bill(1, 3000), bill(2, 5000)];
        let applied = settle(3000, &open);

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].outcome, SettlementOutcome::Paid);
    }

    #[test]
    fn overpayment_pays_everything() {
        let open = [bill(1, 3000), bill(2, 5000)];
        let applied = settle(10_000, &open);

        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|a| a.outcome == SettlementOutcome::Paid));
        let total: i64 = applied.iter().map(|a| a.applied_minor).sum();
        assert_eq!(total, 8000);
    }

    #[test]
    fn nothing_to_apply() {
        assert!(settle(0, &[bill(1, 100)]).is_empty());
        assert!(settle(500, &[]).is_empty());
    }
}
