//! Bookkeeping engine for a materials trading operation.
//!
//! The engine keeps stock movements ([`Entry`]), receivables
//! ([`PendingBill`]), [`Invoice`]s, [`Booking`]s, [`Payment`]s and
//! [`DirectSale`]s mutually consistent while records are created, edited,
//! moved between clients or deleted. Every public operation runs inside a
//! single database transaction.

pub use actor::{Actor, Role};
pub use bills::{Bill, BillKind, BillRef};
pub use bookings::Booking;
pub use clients::Client;
pub use commands::{
    AllocateInvoiceCmd, BookingCmd, DirectSaleCmd, EditMovementCmd, GrnCmd, LineItem,
    NewClientCmd, PaymentCmd, PendingBillEdit, RecordMovementCmd, SaleCustomer,
    UpsertPendingBillCmd,
};
pub use direct_sales::DirectSale;
pub use entry::{Entry, MovementKind};
pub use error::EngineError;
pub use grns::Grn;
pub use import::{ImportSummary, PendingBillRow};
pub use invoices::{Invoice, InvoiceStatus};
pub use ledger::{ClientLedger, DeliverySource, FinancialLine, MaterialDelivery, MaterialLedgerLine};
pub use materials::Material;
pub use money::Money;
pub use ops::{
    ClientProfile, Engine, EngineBuilder, MaterialUpdate, MovementEdit, PaymentReceipt,
    RenamePropagation, TransferOutcome,
};
pub use payments::Payment;
pub use pending_bills::{PaymentApplication, PendingBill, SettlementOutcome};
pub use recon_baskets::{ReconBasket, ReconStatus, ReconSummary};
pub use stock::{MaterialDaySummary, MaterialStock};

mod actor;
mod bill_counter;
mod bills;
mod booking_items;
mod bookings;
mod clients;
mod commands;
mod direct_sale_items;
mod direct_sales;
mod entry;
mod error;
mod grn_items;
mod grns;
mod import;
mod invoices;
mod ledger;
mod materials;
mod money;
mod ops;
mod payments;
mod pending_bills;
mod recon_baskets;
mod reconcile;
mod stock;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
