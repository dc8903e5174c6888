//! Stock figures derived from movements.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::MovementKind;

/// One material's figures for a day.
///
/// `opening` already includes the day's receipts: it is the stock available
/// for dispatch on that day. `closing = opening - out`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialDaySummary {
    pub material: String,
    pub opening: f64,
    #[serde(rename = "in")]
    pub qty_in: f64,
    #[serde(rename = "out")]
    pub qty_out: f64,
    pub closing: f64,
}

/// All-time totals for one material.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialStock {
    pub material: String,
    pub qty_in: f64,
    pub qty_out: f64,
    pub stock: f64,
}

/// The fields of a movement the summaries look at.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Movement<'a> {
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub material: &'a str,
    pub qty: f64,
}

#[derive(Default)]
struct DayTotals {
    prior_net: f64,
    day_in: f64,
    day_out: f64,
}

/// Per-material summary for `day`, sorted by material name.
///
/// Every name in `registered` gets a row even without movements.
pub(crate) fn daily_summary<'a>(
    day: NaiveDate,
    movements: impl IntoIterator<Item = Movement<'a>>,
    registered: impl IntoIterator<Item = &'a str>,
) -> Vec<MaterialDaySummary> {
    let mut totals: BTreeMap<&str, DayTotals> = BTreeMap::new();
    for name in registered {
        totals.entry(name).or_default();
    }

    for movement in movements {
        if movement.date > day {
            continue;
        }
        let t = totals.entry(movement.material).or_default();
        match (movement.date < day, movement.kind) {
            (true, MovementKind::In) => t.prior_net += movement.qty,
            (true, MovementKind::Out) => t.prior_net -= movement.qty,
            (false, MovementKind::In) => t.day_in += movement.qty,
            (false, MovementKind::Out) => t.day_out += movement.qty,
        }
    }

    totals
        .into_iter()
        .map(|(material, t)| {
            let opening = t.prior_net + t.day_in;
            MaterialDaySummary {
                material: material.to_string(),
                opening,
                qty_in: t.day_in,
                qty_out: t.day_out,
                closing: opening - t.day_out,
            }
        })
        .collect()
}

/// Lifetime in/out totals per material, sorted by material name.
pub(crate) fn stock_overview<'a>(
    movements: impl IntoIterator<Item = Movement<'a>>,
    registered: impl IntoIterator<Item = &'a str>,
) -> Vec<MaterialStock> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for name in registered {
        totals.entry(name).or_default();
    }
    for movement in movements {
        let t = totals.entry(movement.material).or_default();
        match movement.kind {
            MovementKind::In => t.0 += movement.qty,
            MovementKind::Out => t.1 += movement.qty,
        }
    }

    totals
        .into_iter()
        .map(|(material, (qty_in, qty_out))| MaterialStock {
            material: material.to_string(),
            qty_in,
            qty_out,
            stock: qty_in - qty_out,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn mv(date: NaiveDate, kind: MovementKind, material: &str, qty: f64) -> Movement<'_> {
        Movement {
            date,
            kind,
            material,
            qty,
        }
    }

    #[test]
    fn opening_includes_the_days_receipts() {
        let movements = vec![
            mv(d(1), MovementKind::In, "Cement", 100.0),
            mv(d(2), MovementKind::Out, "Cement", 30.0),
            mv(d(3), MovementKind::In, "Cement", 10.0),
            mv(d(3), MovementKind::Out, "Cement", 5.0),
            mv(d(4), MovementKind::In, "Cement", 999.0),
        ];

        let summary = daily_summary(d(3), movements, ["Cement"]);
        assert_eq!(
            summary,
            vec![MaterialDaySummary {
                material: "Cement".to_string(),
                opening: 80.0,
                qty_in: 10.0,
                qty_out: 5.0,
                closing: 75.0,
            }]
        );
    }

    #[test]
    fn registered_materials_without_movements_are_listed_sorted() {
        let movements = vec![mv(d(1), MovementKind::In, "Sand", 4.0)];
        let summary = daily_summary(d(1), movements, ["Steel", "Bricks"]);

        let names: Vec<&str> = summary.iter().map(|s| s.material.as_str()).collect();
        assert_eq!(names, vec!["Bricks", "Sand", "Steel"]);
        assert_eq!(summary[0].closing, 0.0);
        assert_eq!(summary[1].closing, 4.0);
    }

    #[test]
    fn overview_nets_all_movements() {
        let movements = vec![
            mv(d(1), MovementKind::In, "Cement", 10.0),
            mv(d(2), MovementKind::Out, "Cement", 4.0),
        ];
        let overview = stock_overview(movements, ["Cement", "Sand"]);
        assert_eq!(overview[0].stock, 6.0);
        assert_eq!(overview[1].material, "Sand");
        assert_eq!(overview[1].stock, 0.0);
    }
}
