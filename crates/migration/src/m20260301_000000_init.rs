//! Initial schema migration.
//!
//! Creates the complete schema for Stockbook:
//!
//! - `clients`: customer directory (code is the natural key)
//! - `materials`: traded materials (name is the stock-ledger join key)
//! - `bill_counter`: single-row sequential bill number source
//! - `invoices`: globally unique numbered billing documents
//! - `entries`: IN/OUT stock movements
//! - `pending_bills`: outstanding receivables per client and bill
//! - `bookings` / `booking_items`: material reservations
//! - `payments`: money received
//! - `direct_sales` / `direct_sale_items`: counter sales
//! - `grns` / `grn_items`: goods receipt notes
//! - `recon_baskets`: finance vs inventory reconciliation projection

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Clients {
    Table,
    Id,
    Name,
    Code,
    Phone,
    Address,
    Category,
    IsActive,
    RequireManualInvoice,
    TransferredToId,
}

#[derive(Iden)]
enum Materials {
    Table,
    Id,
    Name,
    Code,
    UnitPriceMinor,
}

#[derive(Iden)]
enum BillCounter {
    Table,
    Id,
    Count,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    ClientCode,
    ClientName,
    InvoiceNo,
    IsManual,
    Date,
    DueDate,
    TotalMinor,
    BalanceMinor,
    Status,
    IsCash,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    Date,
    Time,
    Kind,
    Material,
    Client,
    ClientCode,
    ClientCategory,
    Qty,
    BillNo,
    AutoBillNo,
    NimbusNo,
    InvoiceId,
    CreatedBy,
}

#[derive(Iden)]
enum PendingBills {
    Table,
    Id,
    ClientCode,
    ClientName,
    BillNo,
    NimbusNo,
    AmountMinor,
    Date,
    Reason,
    PhotoUrl,
    IsPaid,
    IsCash,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    ClientCode,
    ClientName,
    Location,
    AmountMinor,
    PaidMinor,
    ManualBillNo,
    AutoBillNo,
    InvoiceId,
    PhotoPath,
    DatePosted,
    CreatedBy,
}

#[derive(Iden)]
enum BookingItems {
    Table,
    Id,
    BookingId,
    MaterialName,
    Qty,
    PriceMinor,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    ClientCode,
    ClientName,
    AmountMinor,
    Method,
    ManualBillNo,
    AutoBillNo,
    PhotoPath,
    DatePosted,
    CreatedBy,
}

#[derive(Iden)]
enum DirectSales {
    Table,
    Id,
    ClientCode,
    ClientName,
    Category,
    AmountMinor,
    PaidMinor,
    ManualBillNo,
    AutoBillNo,
    InvoiceId,
    PhotoPath,
    DatePosted,
    CreatedBy,
}

#[derive(Iden)]
enum DirectSaleItems {
    Table,
    Id,
    SaleId,
    ProductName,
    Qty,
    PriceMinor,
}

#[derive(Iden)]
enum Grns {
    Table,
    Id,
    Supplier,
    ManualBillNo,
    AutoBillNo,
    PhotoPath,
    DatePosted,
    CreatedBy,
}

#[derive(Iden)]
enum GrnItems {
    Table,
    Id,
    GrnId,
    MatName,
    Qty,
    PriceMinor,
}

#[derive(Iden)]
enum ReconBaskets {
    Table,
    Id,
    BillNo,
    FinKind,
    FinDate,
    FinClient,
    FinCode,
    FinAmountMinor,
    FinQty,
    InvDate,
    InvClient,
    InvCode,
    InvMaterial,
    InvQty,
    Status,
    MatchScore,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Clients
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clients::Name).string().not_null())
                    .col(ColumnDef::new(Clients::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Clients::Phone).string())
                    .col(ColumnDef::new(Clients::Address).string())
                    .col(
                        ColumnDef::new(Clients::Category)
                            .string()
                            .not_null()
                            .default("General"),
                    )
                    .col(
                        ColumnDef::new(Clients::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Clients::RequireManualInvoice)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Clients::TransferredToId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-clients-transferred_to_id")
                            .from(Clients::Table, Clients::TransferredToId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-clients-name")
                    .table(Clients::Table)
                    .col(Clients::Name)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Materials
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Materials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Materials::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Materials::Name).string().not_null())
                    .col(
                        ColumnDef::new(Materials::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Materials::UnitPriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Bill counter (single row, seeded lazily by the allocator)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BillCounter::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillCounter::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BillCounter::Count).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Invoices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invoices::ClientCode).string().not_null())
                    .col(ColumnDef::new(Invoices::ClientName).string().not_null())
                    .col(
                        ColumnDef::new(Invoices::InvoiceNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invoices::IsManual).boolean().not_null())
                    .col(ColumnDef::new(Invoices::Date).date().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).date())
                    .col(ColumnDef::new(Invoices::TotalMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invoices::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::Status)
                            .string()
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(
                        ColumnDef::new(Invoices::IsCash)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoices::CreatedBy).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-client_code")
                    .table(Invoices::Table)
                    .col(Invoices::ClientCode)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Entries (stock movements)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entries::Date).date().not_null())
                    .col(ColumnDef::new(Entries::Time).time().not_null())
                    .col(ColumnDef::new(Entries::Kind).string().not_null())
                    .col(ColumnDef::new(Entries::Material).string().not_null())
                    .col(ColumnDef::new(Entries::Client).string())
                    .col(ColumnDef::new(Entries::ClientCode).string())
                    .col(ColumnDef::new(Entries::ClientCategory).string())
                    .col(ColumnDef::new(Entries::Qty).double().not_null())
                    .col(ColumnDef::new(Entries::BillNo).string())
                    .col(ColumnDef::new(Entries::AutoBillNo).string())
                    .col(ColumnDef::new(Entries::NimbusNo).string())
                    .col(ColumnDef::new(Entries::InvoiceId).integer())
                    .col(ColumnDef::new(Entries::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-invoice_id")
                            .from(Entries::Table, Entries::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-date-material")
                    .table(Entries::Table)
                    .col(Entries::Date)
                    .col(Entries::Material)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-client_code")
                    .table(Entries::Table)
                    .col(Entries::ClientCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-client")
                    .table(Entries::Table)
                    .col(Entries::Client)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-bill_no")
                    .table(Entries::Table)
                    .col(Entries::BillNo)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Pending bills
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PendingBills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingBills::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PendingBills::ClientCode).string().not_null())
                    .col(ColumnDef::new(PendingBills::ClientName).string().not_null())
                    .col(
                        ColumnDef::new(PendingBills::BillNo)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(PendingBills::NimbusNo).string())
                    .col(
                        ColumnDef::new(PendingBills::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PendingBills::Date).date())
                    .col(
                        ColumnDef::new(PendingBills::Reason)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(PendingBills::PhotoUrl).string())
                    .col(
                        ColumnDef::new(PendingBills::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PendingBills::IsCash)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PendingBills::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingBills::CreatedBy).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_bills-bill_no-client_code")
                    .table(PendingBills::Table)
                    .col(PendingBills::BillNo)
                    .col(PendingBills::ClientCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pending_bills-client_code")
                    .table(PendingBills::Table)
                    .col(PendingBills::ClientCode)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Bookings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::ClientCode).string())
                    .col(ColumnDef::new(Bookings::ClientName).string().not_null())
                    .col(ColumnDef::new(Bookings::Location).string())
                    .col(ColumnDef::new(Bookings::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::PaidMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::ManualBillNo).string())
                    .col(ColumnDef::new(Bookings::AutoBillNo).string().not_null())
                    .col(ColumnDef::new(Bookings::InvoiceId).integer())
                    .col(ColumnDef::new(Bookings::PhotoPath).string())
                    .col(
                        ColumnDef::new(Bookings::DatePosted)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-invoice_id")
                            .from(Bookings::Table, Bookings::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookingItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookingItems::BookingId).integer().not_null())
                    .col(
                        ColumnDef::new(BookingItems::MaterialName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingItems::Qty)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(BookingItems::PriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-booking_items-booking_id")
                            .from(BookingItems::Table, BookingItems::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-booking_items-booking_id")
                    .table(BookingItems::Table)
                    .col(BookingItems::BookingId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::ClientCode).string())
                    .col(ColumnDef::new(Payments::ClientName).string().not_null())
                    .col(ColumnDef::new(Payments::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Method).string())
                    .col(ColumnDef::new(Payments::ManualBillNo).string())
                    .col(ColumnDef::new(Payments::AutoBillNo).string().not_null())
                    .col(ColumnDef::new(Payments::PhotoPath).string())
                    .col(
                        ColumnDef::new(Payments::DatePosted)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::CreatedBy).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Direct sales
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(DirectSales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DirectSales::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DirectSales::ClientCode).string())
                    .col(ColumnDef::new(DirectSales::ClientName).string().not_null())
                    .col(ColumnDef::new(DirectSales::Category).string())
                    .col(
                        ColumnDef::new(DirectSales::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DirectSales::PaidMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DirectSales::ManualBillNo).string())
                    .col(ColumnDef::new(DirectSales::AutoBillNo).string().not_null())
                    .col(ColumnDef::new(DirectSales::InvoiceId).integer())
                    .col(ColumnDef::new(DirectSales::PhotoPath).string())
                    .col(
                        ColumnDef::new(DirectSales::DatePosted)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DirectSales::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-direct_sales-invoice_id")
                            .from(DirectSales::Table, DirectSales::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DirectSaleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DirectSaleItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DirectSaleItems::SaleId).integer().not_null())
                    .col(
                        ColumnDef::new(DirectSaleItems::ProductName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DirectSaleItems::Qty)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(DirectSaleItems::PriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-direct_sale_items-sale_id")
                            .from(DirectSaleItems::Table, DirectSaleItems::SaleId)
                            .to(DirectSales::Table, DirectSales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-direct_sale_items-sale_id")
                    .table(DirectSaleItems::Table)
                    .col(DirectSaleItems::SaleId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Goods receipt notes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Grns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Grns::Supplier).string())
                    .col(ColumnDef::new(Grns::ManualBillNo).string())
                    .col(ColumnDef::new(Grns::AutoBillNo).string().not_null())
                    .col(ColumnDef::new(Grns::PhotoPath).string())
                    .col(
                        ColumnDef::new(Grns::DatePosted)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Grns::CreatedBy).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GrnItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GrnItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GrnItems::GrnId).integer().not_null())
                    .col(ColumnDef::new(GrnItems::MatName).string().not_null())
                    .col(
                        ColumnDef::new(GrnItems::Qty)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(GrnItems::PriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-grn_items-grn_id")
                            .from(GrnItems::Table, GrnItems::GrnId)
                            .to(Grns::Table, Grns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Reconciliation baskets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ReconBaskets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReconBaskets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReconBaskets::BillNo).string().not_null())
                    .col(ColumnDef::new(ReconBaskets::FinKind).string())
                    .col(ColumnDef::new(ReconBaskets::FinDate).date())
                    .col(ColumnDef::new(ReconBaskets::FinClient).string())
                    .col(ColumnDef::new(ReconBaskets::FinCode).string())
                    .col(
                        ColumnDef::new(ReconBaskets::FinAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReconBaskets::FinQty)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(ReconBaskets::InvDate).date())
                    .col(ColumnDef::new(ReconBaskets::InvClient).string())
                    .col(ColumnDef::new(ReconBaskets::InvCode).string())
                    .col(ColumnDef::new(ReconBaskets::InvMaterial).string())
                    .col(
                        ColumnDef::new(ReconBaskets::InvQty)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ReconBaskets::Status)
                            .string()
                            .not_null()
                            .default("RED"),
                    )
                    .col(
                        ColumnDef::new(ReconBaskets::MatchScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ReconBaskets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recon_baskets-status")
                    .table(ReconBaskets::Table)
                    .col(ReconBaskets::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ReconBaskets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GrnItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DirectSaleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DirectSales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BookingItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PendingBills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BillCounter::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Materials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        Ok(())
    }
}
