//! Attributes shared by all capacity-bearing assets: processes, storage and transmission.
use crate::global::Period;
use crate::units::Dimensionless;
use anyhow::{Result, ensure};
use std::fmt::Display;
use std::hash::Hash;

/// The key of an asset row, which is always partitioned by period
pub trait AssetKey: Clone + Eq + Hash + Ord + Display {
    /// The period of this row
    fn period(&self) -> Period;

    /// The same asset in a different period
    fn with_period(&self, period: Period) -> Self;
}

/// Installed capacity and the bounds on total capacity for one asset row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityBounds {
    /// Capacity already installed
    pub installed: f64,
    /// Lower bound on total capacity
    pub lower: f64,
    /// Upper bound on total capacity
    pub upper: f64,
}

impl CapacityBounds {
    /// Whether new capacity may be built (i.e. installed capacity is below the upper bound)
    pub fn is_expandable(&self) -> bool {
        self.installed < self.upper
    }

    /// Check the bounds are sensible
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.installed >= 0.0 && self.installed.is_finite(),
            "Installed capacity must be a finite, non-negative number"
        );
        ensure!(
            self.lower >= 0.0 && self.lower <= self.upper,
            "Capacity bounds must satisfy 0 <= lower <= upper"
        );

        Ok(())
    }
}

/// Investment parameters for an asset row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Financing {
    /// Weighted average cost of capital (interest rate)
    pub wacc: Dimensionless,
    /// Depreciation period in years
    pub depreciation: u32,
    /// Remaining lifetime of installed capacity in years (needed for intertemporal runs)
    pub lifetime: Option<u32>,
}

impl Financing {
    /// Check the parameters are sensible
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.wacc.is_finite() && self.wacc >= Dimensionless(0.0),
            "wacc must be a finite, non-negative number"
        );
        ensure!(self.depreciation > 0, "depreciation must be at least one year");

        Ok(())
    }
}
