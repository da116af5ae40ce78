//! Stock quantity type with decimal precision and unit of measure.
//!
//! CRITICAL: Never use floating-point for stock quantities.
//! This type wraps `rust_decimal::Decimal` so fractional units (kilograms,
//! litres) stay exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stock quantity expressed in a unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    /// The amount of stock.
    pub amount: Decimal,
    /// The unit the amount is counted in.
    pub unit: UnitOfMeasure,
}

/// Units of measure supported by the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitOfMeasure {
    /// Single piece.
    #[default]
    Each,
    /// Box of pieces.
    Box,
    /// Case of boxes.
    Case,
    /// Full pallet.
    Pallet,
    /// Kilogram.
    Kg,
    /// Litre.
    Liter,
    /// Metre.
    Meter,
}

impl Quantity {
    /// Creates a new quantity.
    #[must_use]
    pub const fn new(amount: Decimal, unit: UnitOfMeasure) -> Self {
        Self { amount, unit }
    }

    /// Creates a zero quantity in the specified unit.
    #[must_use]
    pub const fn zero(unit: UnitOfMeasure) -> Self {
        Self {
            amount: Decimal::ZERO,
            unit,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns the same quantity with its sign flipped.
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            amount: -self.amount,
            unit: self.unit,
        }
    }
}

impl UnitOfMeasure {
    /// Returns the canonical code of the unit.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Each => "EACH",
            Self::Box => "BOX",
            Self::Case => "CASE",
            Self::Pallet => "PALLET",
            Self::Kg => "KG",
            Self::Liter => "LITER",
            Self::Meter => "METER",
        }
    }
}

impl std::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

impl std::str::FromStr for UnitOfMeasure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EACH" | "EA" | "PCS" => Ok(Self::Each),
            "BOX" => Ok(Self::Box),
            "CASE" => Ok(Self::Case),
            "PALLET" => Ok(Self::Pallet),
            "KG" => Ok(Self::Kg),
            "LITER" | "L" => Ok(Self::Liter),
            "METER" | "M" => Ok(Self::Meter),
            _ => Err(format!("Unknown unit of measure: {s}")),
        }
    }
}
