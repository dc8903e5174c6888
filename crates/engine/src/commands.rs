//! Command structs for engine operations.
//!
//! These types group parameters for write operations (movements, sales,
//! receivables), keeping call sites readable and avoiding long argument
//! lists. Every command carries the acting [`Actor`].

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Actor, MovementKind};

/// One line of a booking, sale or goods receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub qty: f64,
    pub price_minor: i64,
}

impl LineItem {
    #[must_use]
    pub fn new(name: impl Into<String>, qty: f64, price_minor: i64) -> Self {
        Self {
            name: name.into(),
            qty,
            price_minor,
        }
    }
}

/// Register a new client.
#[derive(Clone, Debug)]
pub struct NewClientCmd {
    pub name: String,
    pub code: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub require_manual_invoice: bool,
}

impl NewClientCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            phone: None,
            address: None,
            category: None,
            require_manual_invoice: false,
        }
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn require_manual_invoice(mut self, required: bool) -> Self {
        self.require_manual_invoice = required;
        self
    }
}

/// Record a stock movement.
#[derive(Clone, Debug)]
pub struct RecordMovementCmd {
    pub date: NaiveDate,
    pub kind: MovementKind,
    /// Material name or code.
    pub material: String,
    /// Client code or name.
    pub client: Option<String>,
    pub qty: f64,
    pub bill_no: Option<String>,
    pub nimbus_no: Option<String>,
    /// Issue an invoice for the dispatch.
    pub create_invoice: bool,
    /// Receivable to open (or update) for the dispatch's bill number.
    pub pending_amount_minor: Option<i64>,
    pub actor: Actor,
}

impl RecordMovementCmd {
    #[must_use]
    pub fn new(
        kind: MovementKind,
        material: impl Into<String>,
        qty: f64,
        date: NaiveDate,
        actor: Actor,
    ) -> Self {
        Self {
            date,
            kind,
            material: material.into(),
            client: None,
            qty,
            bill_no: None,
            nimbus_no: None,
            create_invoice: false,
            pending_amount_minor: None,
            actor,
        }
    }

    #[must_use]
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    #[must_use]
    pub fn bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.bill_no = Some(bill_no.into());
        self
    }

    #[must_use]
    pub fn nimbus_no(mut self, nimbus_no: impl Into<String>) -> Self {
        self.nimbus_no = Some(nimbus_no.into());
        self
    }

    #[must_use]
    pub fn create_invoice(mut self, create: bool) -> Self {
        self.create_invoice = create;
        self
    }

    #[must_use]
    pub fn pending_amount(mut self, amount_minor: i64) -> Self {
        self.pending_amount_minor = Some(amount_minor);
        self
    }
}

/// Edit a stock movement.
///
/// Unset fields keep their value. The optional references (`client`,
/// `bill_no`, `nimbus_no`) can also be cleared with `Some(None)`.
#[derive(Clone, Debug)]
pub struct EditMovementCmd {
    pub entry_id: i32,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub kind: Option<MovementKind>,
    pub material: Option<String>,
    pub qty: Option<f64>,
    pub client: Option<Option<String>>,
    pub bill_no: Option<Option<String>>,
    pub nimbus_no: Option<Option<String>>,
    pub actor: Actor,
}

impl EditMovementCmd {
    #[must_use]
    pub fn new(entry_id: i32, actor: Actor) -> Self {
        Self {
            entry_id,
            date: None,
            time: None,
            kind: None,
            material: None,
            qty: None,
            client: None,
            bill_no: None,
            nimbus_no: None,
            actor,
        }
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: MovementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    #[must_use]
    pub fn qty(mut self, qty: f64) -> Self {
        self.qty = Some(qty);
        self
    }

    #[must_use]
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(Some(client.into()));
        self
    }

    #[must_use]
    pub fn clear_client(mut self) -> Self {
        self.client = Some(None);
        self
    }

    #[must_use]
    pub fn bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.bill_no = Some(Some(bill_no.into()));
        self
    }

    #[must_use]
    pub fn clear_bill_no(mut self) -> Self {
        self.bill_no = Some(None);
        self
    }

    #[must_use]
    pub fn nimbus_no(mut self, nimbus_no: impl Into<String>) -> Self {
        self.nimbus_no = Some(Some(nimbus_no.into()));
        self
    }
}

/// Open or update the receivable keyed by `(bill_no, client_code)`.
#[derive(Clone, Debug)]
pub struct UpsertPendingBillCmd {
    /// Client code, or `None` for a walk-in cash customer.
    pub client_code: Option<String>,
    /// Display name; required for cash customers, looked up otherwise.
    pub client_name: Option<String>,
    pub bill_no: String,
    pub amount_minor: i64,
    pub reason: Option<String>,
    pub nimbus_no: Option<String>,
    pub photo_url: Option<String>,
    pub actor: Actor,
}

impl UpsertPendingBillCmd {
    #[must_use]
    pub fn new(
        client_code: impl Into<String>,
        bill_no: impl Into<String>,
        amount_minor: i64,
        actor: Actor,
    ) -> Self {
        Self {
            client_code: Some(client_code.into()),
            client_name: None,
            bill_no: bill_no.into(),
            amount_minor,
            reason: None,
            nimbus_no: None,
            photo_url: None,
            actor,
        }
    }

    /// Receivable of a walk-in customer without a client account.
    #[must_use]
    pub fn cash(
        customer_name: impl Into<String>,
        bill_no: impl Into<String>,
        amount_minor: i64,
        actor: Actor,
    ) -> Self {
        Self {
            client_code: None,
            client_name: Some(customer_name.into()),
            bill_no: bill_no.into(),
            amount_minor,
            reason: None,
            nimbus_no: None,
            photo_url: None,
            actor,
        }
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn nimbus_no(mut self, nimbus_no: impl Into<String>) -> Self {
        self.nimbus_no = Some(nimbus_no.into());
        self
    }

    #[must_use]
    pub fn photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }
}

/// Replacement values for an existing receivable.
#[derive(Clone, Debug)]
pub struct PendingBillEdit {
    pub client_code: String,
    pub bill_no: String,
    pub amount_minor: i64,
    pub nimbus_no: Option<String>,
    pub reason: Option<String>,
    pub photo_url: Option<String>,
}

impl PendingBillEdit {
    #[must_use]
    pub fn new(client_code: impl Into<String>, bill_no: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            client_code: client_code.into(),
            bill_no: bill_no.into(),
            amount_minor,
            nimbus_no: None,
            reason: None,
            photo_url: None,
        }
    }

    #[must_use]
    pub fn nimbus_no(mut self, nimbus_no: impl Into<String>) -> Self {
        self.nimbus_no = Some(nimbus_no.into());
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Issue (or for a manual number, update) an invoice.
#[derive(Clone, Debug)]
pub struct AllocateInvoiceCmd {
    /// Client code or name.
    pub client: String,
    pub candidate_no: Option<String>,
    pub is_manual: bool,
    pub total_minor: i64,
    pub balance_minor: i64,
    pub is_cash: bool,
    pub actor: Actor,
}

impl AllocateInvoiceCmd {
    /// Auto-numbered invoice with nothing paid yet.
    #[must_use]
    pub fn new(client: impl Into<String>, total_minor: i64, actor: Actor) -> Self {
        Self {
            client: client.into(),
            candidate_no: None,
            is_manual: false,
            total_minor,
            balance_minor: total_minor,
            is_cash: false,
            actor,
        }
    }

    /// Use a hand-written invoice number.
    #[must_use]
    pub fn manual(mut self, invoice_no: impl Into<String>) -> Self {
        self.candidate_no = Some(invoice_no.into());
        self.is_manual = true;
        self
    }

    /// Suggest a number for an auto invoice; a taken one is replaced.
    #[must_use]
    pub fn candidate(mut self, invoice_no: impl Into<String>) -> Self {
        self.candidate_no = Some(invoice_no.into());
        self.is_manual = false;
        self
    }

    #[must_use]
    pub fn balance(mut self, balance_minor: i64) -> Self {
        self.balance_minor = balance_minor;
        self
    }

    #[must_use]
    pub fn cash(mut self, is_cash: bool) -> Self {
        self.is_cash = is_cash;
        self
    }
}

/// Create or replace a booking.
#[derive(Clone, Debug)]
pub struct BookingCmd {
    /// Client code or name.
    pub client: String,
    pub location: Option<String>,
    pub items: Vec<LineItem>,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub manual_bill_no: Option<String>,
    pub photo_path: Option<String>,
    pub actor: Actor,
}

impl BookingCmd {
    #[must_use]
    pub fn new(client: impl Into<String>, amount_minor: i64, actor: Actor) -> Self {
        Self {
            client: client.into(),
            location: None,
            items: Vec::new(),
            amount_minor,
            paid_minor: 0,
            manual_bill_no: None,
            photo_path: None,
            actor,
        }
    }

    #[must_use]
    pub fn item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn paid(mut self, paid_minor: i64) -> Self {
        self.paid_minor = paid_minor;
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn manual_bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.manual_bill_no = Some(bill_no.into());
        self
    }

    #[must_use]
    pub fn photo_path(mut self, path: impl Into<String>) -> Self {
        self.photo_path = Some(path.into());
        self
    }
}

/// Who a direct sale is made to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaleCustomer {
    /// A client account, by code or name.
    Registered(String),
    /// A walk-in customer without an account.
    Cash { name: String },
}

/// Create or replace a direct sale.
#[derive(Clone, Debug)]
pub struct DirectSaleCmd {
    pub customer: SaleCustomer,
    pub category: Option<String>,
    pub items: Vec<LineItem>,
    pub amount_minor: i64,
    pub paid_minor: i64,
    pub manual_bill_no: Option<String>,
    pub photo_path: Option<String>,
    /// Whether the unpaid part becomes a receivable.
    pub has_bill: bool,
    pub create_invoice: bool,
    pub actor: Actor,
}

impl DirectSaleCmd {
    #[must_use]
    pub fn new(customer: SaleCustomer, amount_minor: i64, actor: Actor) -> Self {
        Self {
            customer,
            category: None,
            items: Vec::new(),
            amount_minor,
            paid_minor: 0,
            manual_bill_no: None,
            photo_path: None,
            has_bill: true,
            create_invoice: false,
            actor,
        }
    }

    #[must_use]
    pub fn item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn paid(mut self, paid_minor: i64) -> Self {
        self.paid_minor = paid_minor;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn manual_bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.manual_bill_no = Some(bill_no.into());
        self
    }

    #[must_use]
    pub fn photo_path(mut self, path: impl Into<String>) -> Self {
        self.photo_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn has_bill(mut self, has_bill: bool) -> Self {
        self.has_bill = has_bill;
        self
    }

    #[must_use]
    pub fn create_invoice(mut self, create: bool) -> Self {
        self.create_invoice = create;
        self
    }
}

/// Record a payment.
#[derive(Clone, Debug)]
pub struct PaymentCmd {
    /// Client code or name.
    pub client: String,
    pub amount_minor: i64,
    pub method: Option<String>,
    /// Bill the payment settles; without it the oldest open bills are paid.
    pub manual_bill_no: Option<String>,
    pub photo_path: Option<String>,
    pub actor: Actor,
}

impl PaymentCmd {
    #[must_use]
    pub fn new(client: impl Into<String>, amount_minor: i64, actor: Actor) -> Self {
        Self {
            client: client.into(),
            amount_minor,
            method: None,
            manual_bill_no: None,
            photo_path: None,
            actor,
        }
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn manual_bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.manual_bill_no = Some(bill_no.into());
        self
    }

    #[must_use]
    pub fn photo_path(mut self, path: impl Into<String>) -> Self {
        self.photo_path = Some(path.into());
        self
    }
}

/// Create or replace a goods receipt note.
#[derive(Clone, Debug)]
pub struct GrnCmd {
    pub supplier: Option<String>,
    pub items: Vec<LineItem>,
    pub manual_bill_no: Option<String>,
    pub photo_path: Option<String>,
    pub actor: Actor,
}

impl GrnCmd {
    #[must_use]
    pub fn new(actor: Actor) -> Self {
        Self {
            supplier: None,
            items: Vec::new(),
            manual_bill_no: None,
            photo_path: None,
            actor,
        }
    }

    #[must_use]
    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    #[must_use]
    pub fn item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn manual_bill_no(mut self, bill_no: impl Into<String>) -> Self {
        self.manual_bill_no = Some(bill_no.into());
        self
    }
}
