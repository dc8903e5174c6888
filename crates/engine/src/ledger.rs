//! Read-side views: the client dual ledger and the material ledger.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    BillRef, Booking, Client, DirectSale, Entry, Grn, MovementKind, Payment, PendingBill,
};

/// Client statement: money on one side, material on the other.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClientLedger {
    pub client: Client,
    pub pending_bills: Vec<PendingBill>,
    /// Sum of unpaid receivables.
    pub outstanding_minor: i64,
    pub financial: Vec<FinancialLine>,
    pub deliveries: Vec<MaterialDelivery>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FinancialLine {
    pub date: DateTime<Utc>,
    pub bill: BillRef,
    pub bill_no: String,
    pub description: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverySource {
    Dispatch,
    DirectSale,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialDelivery {
    pub date: NaiveDate,
    pub material: String,
    pub qty: f64,
    pub bill_no: Option<String>,
    pub nimbus_no: Option<String>,
    pub source: DeliverySource,
}

/// One receipt or sale line of a material with the running stock after it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialLedgerLine {
    pub date: DateTime<Utc>,
    pub bill: BillRef,
    pub bill_no: String,
    pub added: f64,
    pub delivered: f64,
    pub balance: f64,
}

/// Money lines of a client, newest first.
pub(crate) fn financial_lines(
    bookings: &[Booking],
    payments: &[Payment],
    sales: &[DirectSale],
) -> Vec<FinancialLine> {
    let mut lines = Vec::with_capacity(bookings.len() + payments.len() + sales.len());

    for booking in bookings {
        let first = booking.items.first().map_or("", |i| i.name.as_str());
        lines.push(FinancialLine {
            date: booking.date_posted,
            bill: BillRef::Booking(booking.id),
            bill_no: booking.effective_bill_no().to_string(),
            description: format!("Booking: {first}"),
            debit_minor: booking.amount_minor,
            credit_minor: booking.paid_minor,
        });
    }
    for payment in payments {
        lines.push(FinancialLine {
            date: payment.date_posted,
            bill: BillRef::Payment(payment.id),
            bill_no: payment.effective_bill_no().to_string(),
            description: match payment.method.as_deref() {
                Some(method) => format!("Payment ({method})"),
                None => "Payment".to_string(),
            },
            debit_minor: 0,
            credit_minor: payment.amount_minor,
        });
    }
    for sale in sales {
        lines.push(FinancialLine {
            date: sale.date_posted,
            bill: BillRef::DirectSale(sale.id),
            bill_no: sale.effective_bill_no().to_string(),
            description: format!("Direct sale ({} items)", sale.items.len()),
            debit_minor: sale.amount_minor,
            credit_minor: sale.paid_minor,
        });
    }

    lines.sort_by(|a, b| b.date.cmp(&a.date));
    lines
}

/// Material delivered to a client, newest first.
///
/// Direct-sale items are only listed when none of the sale's movements is
/// already among `entries`, so a sale is never counted twice.
pub(crate) fn merge_deliveries(entries: &[Entry], sales: &[DirectSale]) -> Vec<MaterialDelivery> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut deliveries = Vec::new();

    for entry in entries.iter().filter(|e| e.kind == MovementKind::Out) {
        if let Some(bill_no) = entry.bill_no.as_deref() {
            seen.insert(bill_no);
        }
        if let Some(auto) = entry.auto_bill_no.as_deref() {
            seen.insert(auto);
        }
        deliveries.push(MaterialDelivery {
            date: entry.date,
            material: entry.material.clone(),
            qty: entry.qty,
            bill_no: entry.bill_no.clone(),
            nimbus_no: entry.nimbus_no.clone(),
            source: if entry.auto_bill_no.is_some() {
                DeliverySource::DirectSale
            } else {
                DeliverySource::Dispatch
            },
        });
    }

    for sale in sales {
        if seen.contains(sale.auto_bill_no.as_str()) || seen.contains(sale.effective_bill_no()) {
            continue;
        }
        for item in &sale.items {
            deliveries.push(MaterialDelivery {
                date: sale.date_posted.date_naive(),
                material: item.name.clone(),
                qty: item.qty,
                bill_no: Some(sale.effective_bill_no().to_string()),
                nimbus_no: None,
                source: DeliverySource::DirectSale,
            });
        }
    }

    deliveries.sort_by(|a, b| b.date.cmp(&a.date));
    deliveries
}

/// Goods receipts (adds) and direct-sale lines (deliveries) of `material`
/// in date order, with the running balance.
pub(crate) fn material_ledger_lines(
    material: &str,
    grns: &[Grn],
    sales: &[DirectSale],
) -> Vec<MaterialLedgerLine> {
    let mut lines = Vec::new();
    for grn in grns {
        for item in grn.items.iter().filter(|i| i.name == material) {
            lines.push(MaterialLedgerLine {
                date: grn.date_posted,
                bill: BillRef::Grn(grn.id),
                bill_no: grn.auto_bill_no.clone(),
                added: item.qty,
                delivered: 0.0,
                balance: 0.0,
            });
        }
    }
    for sale in sales {
        for item in sale.items.iter().filter(|i| i.name == material) {
            lines.push(MaterialLedgerLine {
                date: sale.date_posted,
                bill: BillRef::DirectSale(sale.id),
                bill_no: sale.auto_bill_no.clone(),
                added: 0.0,
                delivered: item.qty,
                balance: 0.0,
            });
        }
    }

    lines.sort_by(|a, b| a.date.cmp(&b.date));
    let mut balance = 0.0;
    for line in &mut lines {
        balance += line.added - line.delivered;
        line.balance = balance;
    }
    lines
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone};

    use super::*;
    use crate::LineItem;

    fn entry(id: i32, kind: MovementKind, qty: f64, bill_no: Option<&str>, auto: Option<&str>) -> Entry {
        Entry {
            id,
            date: NaiveDate::from_ymd_opt(2026, 3, id as u32).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            kind,
            material: "Cement".to_string(),
            client: Some("Acme".to_string()),
            client_code: Some("C1".to_string()),
            client_category: None,
            qty,
            bill_no: bill_no.map(ToString::to_string),
            auto_bill_no: auto.map(ToString::to_string),
            nimbus_no: None,
            invoice_id: None,
            created_by: "tester".to_string(),
        }
    }

    fn sale(id: i32, auto: &str, manual: Option<&str>) -> DirectSale {
        DirectSale {
            id,
            client_code: Some("C1".to_string()),
            client_name: "Acme".to_string(),
            category: None,
            amount_minor: 5000,
            paid_minor: 5000,
            manual_bill_no: manual.map(ToString::to_string),
            auto_bill_no: auto.to_string(),
            invoice_id: None,
            photo_path: None,
            date_posted: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
            created_by: "tester".to_string(),
            items: vec![LineItem::new("Sand", 2.0, 2500)],
        }
    }

    #[test]
    fn sale_movements_are_not_counted_twice() {
        let entries = vec![entry(5, MovementKind::Out, 2.0, Some("#1001"), Some("#1001"))];
        let sales = vec![sale(1, "#1001", None), sale(2, "#1002", None)];

        let merged = merge_deliveries(&entries, &sales);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].bill_no.as_deref(), Some("#1002"));
        assert_eq!(merged[1].source, DeliverySource::DirectSale);
    }

    #[test]
    fn manual_sale_number_also_deduplicates() {
        let entries = vec![entry(5, MovementKind::Out, 2.0, Some("M-7"), None)];
        let merged = merge_deliveries(&entries, &[sale(1, "#1001", Some("M-7"))]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, DeliverySource::Dispatch);
    }

    #[test]
    fn receipts_are_not_deliveries() {
        let entries = vec![entry(1, MovementKind::In, 9.0, None, None)];
        assert!(merge_deliveries(&entries, &[]).is_empty());
    }

    #[test]
    fn material_ledger_runs_receipts_against_sales() {
        let grn = Grn {
            id: 4,
            supplier: Some("Quarry".to_string()),
            manual_bill_no: None,
            auto_bill_no: "#1000".to_string(),
            photo_path: None,
            date_posted: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            created_by: "tester".to_string(),
            items: vec![LineItem::new("Sand", 10.0, 100), LineItem::new("Cement", 3.0, 900)],
        };
        let lines = material_ledger_lines("Sand", &[grn], &[sale(1, "#1001", None)]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].bill, BillRef::Grn(4));
        assert_eq!(lines[0].balance, 10.0);
        assert_eq!(lines[1].bill, BillRef::DirectSale(1));
        assert_eq!(lines[1].delivered, 2.0);
        assert_eq!(lines[1].balance, 8.0);
    }

    #[test]
    fn financial_lines_are_newest_first() {
        let payment = Payment {
            id: 3,
            client_code: Some("C1".to_string()),
            client_name: "Acme".to_string(),
            amount_minor: 700,
            method: Some("cash".to_string()),
            manual_bill_no: None,
            auto_bill_no: "#1003".to_string(),
            photo_path: None,
            date_posted: Utc.with_ymd_and_hms(2026, 3, 12, 8, 0, 0).unwrap(),
            created_by: "tester".to_string(),
        };
        let lines = financial_lines(&[], &[payment], &[sale(1, "#1001", None)]);
        assert_eq!(lines[0].bill, BillRef::Payment(3));
        assert_eq!(lines[0].credit_minor, 700);
        assert_eq!(lines[1].debit_minor, 5000);
    }
}
