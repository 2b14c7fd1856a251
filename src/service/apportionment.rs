//! Rateio: spreads document-level charges over the line items by value share.
//!
//! Each charge is apportioned independently and rounded to cents. The
//! rounding remainder is not redistributed, so the per-item sum can differ
//! from the document total by up to half a cent per item.

use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

use super::quantity::round_half_up;
use crate::models::DocumentTotals;

pub const MONEY_SCALE: i64 = 2;
pub const UNIT_COST_SCALE: i64 = 4;

/// Document-level charges subject to apportionment.
#[derive(Debug, Clone, Default)]
pub struct ChargeTotals {
    pub freight: BigDecimal,
    pub ipi: BigDecimal,
    pub other_expenses: BigDecimal,
}

impl From<&DocumentTotals> for ChargeTotals {
    fn from(totals: &DocumentTotals) -> Self {
        Self {
            freight: totals.freight_total.clone(),
            ipi: totals.ipi_total.clone(),
            other_expenses: totals.other_expenses_total.clone(),
        }
    }
}

/// Share of the document charges assigned to one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Apportionment {
    pub freight: BigDecimal,
    pub ipi: BigDecimal,
    pub other_expenses: BigDecimal,
}

impl Apportionment {
    pub fn total(&self) -> BigDecimal {
        &self.freight + &self.ipi + &self.other_expenses
    }
}

/// Apportions `charges` over `line_values`, one result per value, same order.
pub fn apportion(charges: &ChargeTotals, line_values: &[BigDecimal]) -> Vec<Apportionment> {
    let subtotal = line_values
        .iter()
        .fold(BigDecimal::zero(), |acc, v| acc + v);

    line_values
        .iter()
        .map(|value| {
            if subtotal.is_zero() {
                return Apportionment::default();
            }
            let ratio = value / &subtotal;
            Apportionment {
                freight: round_half_up(&(&charges.freight * &ratio), MONEY_SCALE),
                ipi: round_half_up(&(&charges.ipi * &ratio), MONEY_SCALE),
                other_expenses: round_half_up(&(&charges.other_expenses * &ratio), MONEY_SCALE),
            }
        })
        .collect()
}

/// `(line value + apportioned charges) / received quantity`; the invoiced
/// unit price when nothing was received.
pub fn landed_unit_cost(
    line_value: &BigDecimal,
    apportionment: &Apportionment,
    received_quantity: &BigDecimal,
    unit_price: &BigDecimal,
) -> BigDecimal {
    if received_quantity.is_zero() {
        return unit_price.clone();
    }
    let landed_total = line_value + &apportionment.total();
    round_half_up(&(landed_total / received_quantity), UNIT_COST_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn freight(total: &str) -> ChargeTotals {
        ChargeTotals {
            freight: dec(total),
            ..Default::default()
        }
    }

    #[test]
    fn single_item_takes_whole_freight() {
        let shares = apportion(&freight("10"), &[dec("100")]);
        assert_eq!(shares[0].freight, dec("10.00"));

        let cost = landed_unit_cost(&dec("100"), &shares[0], &dec("10"), &dec("10"));
        assert_eq!(cost, dec("11.00"));
    }

    #[test]
    fn freight_split_by_value_share() {
        let shares = apportion(&freight("10"), &[dec("60"), dec("40")]);
        assert_eq!(shares[0].freight, dec("6.00"));
        assert_eq!(shares[1].freight, dec("4.00"));
    }

    #[test]
    fn charges_are_apportioned_independently() {
        let charges = ChargeTotals {
            freight: dec("10"),
            ipi: dec("5"),
            other_expenses: dec("1"),
        };
        let shares = apportion(&charges, &[dec("75"), dec("25")]);
        assert_eq!(shares[0], Apportionment {
            freight: dec("7.50"),
            ipi: dec("3.75"),
            other_expenses: dec("0.75"),
        });
        assert_eq!(shares[1].total(), dec("4.00"));
    }

    #[test]
    fn remainder_is_left_unreconciled() {
        let shares = apportion(&freight("10"), &[dec("1"), dec("1"), dec("1")]);
        let sum = shares.iter().fold(BigDecimal::zero(), |acc, s| acc + &s.freight);
        assert_eq!(shares[0].freight, dec("3.33"));
        assert_eq!(sum, dec("9.99"));
    }

    #[test]
    fn zero_subtotal_apportions_nothing() {
        let shares = apportion(&freight("10"), &[dec("0"), dec("0")]);
        assert!(shares.iter().all(|s| s.total().is_zero()));
    }

    #[test]
    fn zero_received_falls_back_to_unit_price() {
        let share = Apportionment {
            freight: dec("1"),
            ..Default::default()
        };
        let cost = landed_unit_cost(&dec("50"), &share, &BigDecimal::zero(), &dec("12.5"));
        assert_eq!(cost, dec("12.5"));
    }

    #[test]
    fn landed_cost_uses_received_not_invoiced_quantity() {
        let share = Apportionment {
            freight: dec("10"),
            ..Default::default()
        };
        // 110 spread over 8 received units
        let cost = landed_unit_cost(&dec("100"), &share, &dec("8"), &dec("10"));
        assert_eq!(cost, dec("13.75"));
    }
}
