//! Typed references to the four kinds of numbered transactions.

use serde::Serialize;

use crate::{Booking, DirectSale, EngineError, Grn, Payment};

/// Kind of a numbered transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillKind {
    Booking,
    Payment,
    Grn,
    DirectSale,
}

impl BillKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BillKind::Booking => "booking",
            BillKind::Payment => "payment",
            BillKind::Grn => "grn",
            BillKind::DirectSale => "direct_sale",
        }
    }
}

impl TryFrom<&str> for BillKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "booking" => Ok(BillKind::Booking),
            "payment" => Ok(BillKind::Payment),
            "grn" => Ok(BillKind::Grn),
            "direct_sale" | "sale" => Ok(BillKind::DirectSale),
            other => Err(EngineError::InvalidInput(format!(
                "invalid bill kind: {other}"
            ))),
        }
    }
}

/// Addresses one transaction by kind and id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BillRef {
    Booking(i32),
    Payment(i32),
    Grn(i32),
    DirectSale(i32),
}

impl BillRef {
    pub fn new(kind: BillKind, id: i32) -> Self {
        match kind {
            BillKind::Booking => BillRef::Booking(id),
            BillKind::Payment => BillRef::Payment(id),
            BillKind::Grn => BillRef::Grn(id),
            BillKind::DirectSale => BillRef::DirectSale(id),
        }
    }

    pub fn kind(self) -> BillKind {
        match self {
            BillRef::Booking(_) => BillKind::Booking,
            BillRef::Payment(_) => BillKind::Payment,
            BillRef::Grn(_) => BillKind::Grn,
            BillRef::DirectSale(_) => BillKind::DirectSale,
        }
    }

    pub fn id(self) -> i32 {
        match self {
            BillRef::Booking(id)
            | BillRef::Payment(id)
            | BillRef::Grn(id)
            | BillRef::DirectSale(id) => id,
        }
    }
}

/// A loaded transaction.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "bill", rename_all = "snake_case")]
pub enum Bill {
    Booking(Booking),
    Payment(Payment),
    Grn(Grn),
    DirectSale(DirectSale),
}

impl Bill {
    pub fn reference(&self) -> BillRef {
        match self {
            Bill::Booking(b) => BillRef::Booking(b.id),
            Bill::Payment(p) => BillRef::Payment(p.id),
            Bill::Grn(g) => BillRef::Grn(g.id),
            Bill::DirectSale(s) => BillRef::DirectSale(s.id),
        }
    }

    pub fn auto_bill_no(&self) -> &str {
        match self {
            Bill::Booking(b) => &b.auto_bill_no,
            Bill::Payment(p) => &p.auto_bill_no,
            Bill::Grn(g) => &g.auto_bill_no,
            Bill::DirectSale(s) => &s.auto_bill_no,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_keeps_kind_and_id() {
        let r = BillRef::new(BillKind::DirectSale, 7);
        assert_eq!(r, BillRef::DirectSale(7));
        assert_eq!(r.kind(), BillKind::DirectSale);
        assert_eq!(r.id(), 7);
    }

    #[test]
    fn kind_round_trips_through_storage() {
        for kind in [
            BillKind::Booking,
            BillKind::Payment,
            BillKind::Grn,
            BillKind::DirectSale,
        ] {
            assert_eq!(BillKind::try_from(kind.as_str()).unwrap(), kind);
        }
    }
}
