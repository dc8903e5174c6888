//! Basket classification for bill-number reconciliation.
//!
//! The finance side of a bill comes from bookings, direct sales and
//! payments; the inventory side from `OUT` movements carrying that bill
//! number. Both are folded per bill before [`classify`] compares them.

use chrono::NaiveDate;

use crate::{
    BillKind, ReconStatus,
    util::{names_match, qty_eq},
};

const SCORE_BASE: i32 = 40;
const SCORE_CLIENT: i32 = 30;
const SCORE_QTY: i32 = 30;
const SCORE_UNMATCHED: i32 = 50;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FinanceSide {
    pub kind: BillKind,
    pub date: NaiveDate,
    pub client: String,
    pub code: Option<String>,
    pub amount_minor: i64,
    pub qty: f64,
}

impl FinanceSide {
    /// Fold another record sharing the bill number into this one.
    pub(crate) fn absorb(&mut self, other: FinanceSide) {
        self.amount_minor += other.amount_minor;
        self.qty += other.qty;
        if other.date < self.date {
            self.date = other.date;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InventorySide {
    pub date: NaiveDate,
    pub client: Option<String>,
    pub code: Option<String>,
    pub materials: Vec<String>,
    pub qty: f64,
}

impl InventorySide {
    pub(crate) fn absorb(&mut self, other: InventorySide) {
        self.qty += other.qty;
        if other.date < self.date {
            self.date = other.date;
        }
        for material in other.materials {
            if !self.materials.contains(&material) {
                self.materials.push(material);
            }
        }
        if self.code.is_none() {
            self.code = other.code;
        }
        if self.client.is_none() {
            self.client = other.client;
        }
    }

    pub(crate) fn material_label(&self) -> String {
        self.materials.join(", ")
    }
}

fn same_client(fin: &FinanceSide, inv: &InventorySide) -> bool {
    match (fin.code.as_deref(), inv.code.as_deref()) {
        (Some(a), Some(b)) => a == b,
        _ => inv
            .client
            .as_deref()
            .is_some_and(|client| names_match(&fin.client, client)),
    }
}

/// Status and score of one basket.
///
/// `has_receivable` tells whether a receivable with this bill number exists,
/// which explains an inventory movement that has no finance record.
pub(crate) fn classify(
    fin: Option<&FinanceSide>,
    inv: Option<&InventorySide>,
    has_receivable: bool,
) -> (ReconStatus, i32) {
    match (fin, inv) {
        (Some(fin), _) if fin.kind == BillKind::Payment => (ReconStatus::Blue, SCORE_UNMATCHED),
        (Some(fin), Some(inv)) => {
            let mut score = SCORE_BASE;
            if same_client(fin, inv) {
                score += SCORE_CLIENT;
            }
            if qty_eq(fin.qty, inv.qty) {
                score += SCORE_QTY;
            }
            if score == SCORE_BASE + SCORE_CLIENT + SCORE_QTY {
                (ReconStatus::Green, score)
            } else {
                (ReconStatus::Yellow, score)
            }
        }
        (None, Some(_)) if has_receivable => (ReconStatus::Blue, SCORE_UNMATCHED),
        _ => (ReconStatus::Red, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn fin(kind: BillKind, code: &str, qty: f64) -> FinanceSide {
        FinanceSide {
            kind,
            date: date(),
            client: "Acme".to_string(),
            code: Some(code.to_string()),
            amount_minor: 10_000,
            qty,
        }
    }

    fn inv(code: Option<&str>, client: &str, qty: f64) -> InventorySide {
        InventorySide {
            date: date(),
            client: Some(client.to_string()),
            code: code.map(ToString::to_string),
            materials: vec!["Cement".to_string()],
            qty,
        }
    }

    #[test]
    fn matching_sides_are_green() {
        let f = fin(BillKind::DirectSale, "C1", 5.0);
        let i = inv(Some("C1"), "Acme", 5.0);
        assert_eq!(classify(Some(&f), Some(&i), false), (ReconStatus::Green, 100));
    }

    #[test]
    fn mismatches_are_yellow_with_partial_score() {
        let f = fin(BillKind::Booking, "C1", 5.0);
        let qty_off = inv(Some("C1"), "Acme", 4.0);
        assert_eq!(classify(Some(&f), Some(&qty_off), false), (ReconStatus::Yellow, 70));

        let both_off = inv(Some("C2"), "Other", 4.0);
        assert_eq!(classify(Some(&f), Some(&both_off), false), (ReconStatus::Yellow, 40));
    }

    #[test]
    fn client_falls_back_to_name_without_codes() {
        let f = fin(BillKind::DirectSale, "C1", 2.0);
        let i = inv(None, " acme ", 2.0);
        assert_eq!(classify(Some(&f), Some(&i), false).0, ReconStatus::Green);
    }

    #[test]
    fn missing_side_is_red() {
        let f = fin(BillKind::Booking, "C1", 5.0);
        let i = inv(Some("C1"), "Acme", 5.0);
        assert_eq!(classify(Some(&f), None, false), (ReconStatus::Red, 0));
        assert_eq!(classify(None, Some(&i), false), (ReconStatus::Red, 0));
    }

    #[test]
    fn payments_and_receivable_backed_movements_are_blue() {
        let p = fin(BillKind::Payment, "C1", 0.0);
        let i = inv(Some("C1"), "Acme", 5.0);
        assert_eq!(classify(Some(&p), None, false).0, ReconStatus::Blue);
        assert_eq!(classify(None, Some(&i), true).0, ReconStatus::Blue);
    }

    #[test]
    fn absorb_merges_materials_and_earliest_date() {
        let mut a = inv(Some("C1"), "Acme", 1.0);
        let mut b = inv(Some("C1"), "Acme", 2.0);
        b.materials = vec!["Sand".to_string(), "Cement".to_string()];
        b.date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        a.absorb(b);
        assert!(qty_eq(a.qty, 3.0));
        assert_eq!(a.material_label(), "Cement, Sand");
        assert_eq!(a.date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    }
}
