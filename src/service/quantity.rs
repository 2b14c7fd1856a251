use bigdecimal::{BigDecimal, Zero};
use serde::Serialize;

/// Decimal precision class of a unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionClass {
    /// Pieces, boxes, packages: whole numbers only.
    Count,
    /// Length, area and volume.
    Measure,
    /// Mass and liquids.
    MassOrLiquid,
    Unrecognized,
}

const COUNT_UNITS: &[&str] = &[
    "UN", "UND", "UNID", "UNIDADE", "PC", "PÇ", "PCA", "PECA", "PEÇA", "CX", "CAIXA", "PCT",
    "PACOTE", "FD", "FARDO", "SC", "SACO", "KIT", "JG", "JOGO", "PAR", "DZ", "CJ", "CONJ", "BD",
    "GL", "LATA", "RL", "ROLO", "FR", "FRASCO", "TB", "TUBO", "BL",
];

const MEASURE_UNITS: &[&str] = &["M", "MT", "METRO", "CM", "MM", "KM", "M2", "M²", "M3", "M³"];

const MASS_OR_LIQUID_UNITS: &[&str] = &["KG", "G", "GR", "MG", "TON", "T", "L", "LT", "LITRO", "ML"];

impl PrecisionClass {
    pub fn of(unit_of_measure: &str) -> Self {
        let unit = unit_of_measure.trim().to_uppercase();
        if COUNT_UNITS.contains(&unit.as_str()) {
            PrecisionClass::Count
        } else if MEASURE_UNITS.contains(&unit.as_str()) {
            PrecisionClass::Measure
        } else if MASS_OR_LIQUID_UNITS.contains(&unit.as_str()) {
            PrecisionClass::MassOrLiquid
        } else {
            PrecisionClass::Unrecognized
        }
    }

    pub fn decimals(self) -> i64 {
        match self {
            PrecisionClass::Count => 0,
            PrecisionClass::Measure | PrecisionClass::Unrecognized => 2,
            PrecisionClass::MassOrLiquid => 3,
        }
    }
}

/// Bound on the decimal exponent of quantities typed by the user. Rounding
/// rescales by `10^scale`, so larger exponents are refused up front.
pub const MAX_INPUT_SCALE: i64 = 32;

pub fn within_input_scale(value: &BigDecimal) -> bool {
    let (_, scale) = value.as_bigint_and_exponent();
    scale.abs() <= MAX_INPUT_SCALE
}

/// Rounds `raw` to the precision of `unit_of_measure`.
pub fn normalize_quantity(raw: &BigDecimal, unit_of_measure: &str) -> BigDecimal {
    round_half_up(raw, PrecisionClass::of(unit_of_measure).decimals())
}

/// Commercial rounding: midpoints go away from zero.
pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    // with_scale truncates toward zero, so shift by half an ulp first
    let half = BigDecimal::new(5.into(), scale + 1);
    if *value < BigDecimal::zero() {
        (value - &half).with_scale(scale)
    } else {
        (value + &half).with_scale(scale)
    }
}
