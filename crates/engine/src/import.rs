//! Spreadsheet import and export rows for receivables.
//!
//! Rows arrive from CSV files exported by other tools, so every cell is
//! optional text and the cleaning rules below decide what survives.

use serde::{Deserialize, Serialize};

use crate::{
    Money, PendingBill,
    util::{is_code_placeholder, is_placeholder, normalize_optional},
};

/// Name given to receivables whose row carries no usable client name.
pub(crate) const UNKNOWN_CLIENT: &str = "Unknown";

/// One receivable as it appears in an import or export file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PendingBillRow {
    #[serde(default)]
    pub client_code: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub bill_no: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub nimbus_no: Option<String>,
}

impl From<&PendingBill> for PendingBillRow {
    fn from(bill: &PendingBill) -> Self {
        Self {
            client_code: Some(bill.client_code.clone()),
            client_name: Some(bill.client_name.clone()),
            bill_no: Some(bill.bill_no.clone()),
            amount: Some(Money::new(bill.amount_minor).to_string()),
            reason: Some(bill.reason.clone()),
            nimbus_no: bill.nimbus_no.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Receivables inserted or updated.
    pub imported: usize,
    /// Rows dropped for lack of a bill number.
    pub skipped: usize,
    pub clients_created: usize,
}

/// A row that passed cleaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CleanRow {
    pub client_code: Option<String>,
    pub client_name: String,
    pub bill_no: String,
    pub amount_minor: i64,
    pub reason: String,
    pub nimbus_no: Option<String>,
}

impl CleanRow {
    /// Whether the name is specific enough to look a client up by.
    pub(crate) fn has_lookup_name(&self) -> bool {
        !matches!(
            self.client_name.to_ascii_uppercase().as_str(),
            "UNKNOWN" | "EMPTY" | "NO NAME"
        )
    }
}

fn cell(value: Option<&String>) -> Option<String> {
    normalize_optional(value.map(String::as_str)).filter(|v| !is_placeholder(v))
}

/// Apply the import rules to one row; `None` means the row is skipped.
pub(crate) fn clean_row(row: &PendingBillRow) -> Option<CleanRow> {
    let bill_no = cell(row.bill_no.as_ref())?;
    if bill_no.eq_ignore_ascii_case("NO BILL") {
        return None;
    }

    let client_name = cell(row.client_name.as_ref())
        .filter(|name| !name.eq_ignore_ascii_case("EMPTY"))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    let client_code = normalize_optional(row.client_code.as_deref())
        .filter(|code| !is_code_placeholder(code) && !code.eq_ignore_ascii_case("NA"));

    Some(CleanRow {
        client_code,
        client_name,
        bill_no,
        amount_minor: row
            .amount
            .as_deref()
            .map_or(Money::ZERO, Money::parse_lenient)
            .minor(),
        reason: cell(row.reason.as_ref()).unwrap_or_default(),
        nimbus_no: cell(row.nimbus_no.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, name: &str, bill_no: &str, amount: &str) -> PendingBillRow {
        PendingBillRow {
            client_code: Some(code.to_string()),
            client_name: Some(name.to_string()),
            bill_no: Some(bill_no.to_string()),
            amount: Some(amount.to_string()),
            reason: None,
            nimbus_no: Some("nan".to_string()),
        }
    }

    #[test]
    fn rows_without_a_bill_are_skipped() {
        assert_eq!(clean_row(&row("C1", "Acme", "", "10")), None);
        assert_eq!(clean_row(&row("C1", "Acme", "nan", "10")), None);
        assert_eq!(clean_row(&row("C1", "Acme", "NO BILL", "10")), None);
    }

    #[test]
    fn amounts_and_placeholders_are_cleaned() {
        let clean = clean_row(&row("NA", "EMPTY", "B-1", "1,250.50")).unwrap();
        assert_eq!(clean.client_code, None);
        assert_eq!(clean.client_name, UNKNOWN_CLIENT);
        assert_eq!(clean.amount_minor, 125_050);
        assert_eq!(clean.nimbus_no, None);
        assert!(!clean.has_lookup_name());
    }

    #[test]
    fn bad_amount_becomes_zero() {
        let clean = clean_row(&row("C1", "Acme", "B-2", "abc")).unwrap();
        assert_eq!(clean.amount_minor, 0);
        assert_eq!(clean.client_code.as_deref(), Some("C1"));
        assert!(clean.has_lookup_name());
    }
}
