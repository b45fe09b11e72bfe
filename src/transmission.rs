//! Transmission links move a commodity between two sites.
use crate::asset::{AssetKey, CapacityBounds, Financing};
use crate::global::Period;
use crate::id::{CommodityID, SiteID, TransmissionID};
use anyhow::{Result, ensure};
use indexmap::IndexMap;

/// A map of [`Transmission`] rows, keyed by period, sites, technology and commodity
pub type TransmissionMap = IndexMap<TransmissionKey, Transmission>;

/// Identifies one direction of a transmission link in a given period
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {site_in}, {site_out}, {transmission}, {commodity})")]
pub struct TransmissionKey {
    /// The period
    pub period: Period,
    /// The site the commodity leaves
    pub site_in: SiteID,
    /// The site the commodity arrives at
    pub site_out: SiteID,
    /// The transmission technology
    pub transmission: TransmissionID,
    /// The transported commodity
    pub commodity: CommodityID,
}

impl TransmissionKey {
    /// The same link in the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            site_in: self.site_out.clone(),
            site_out: self.site_in.clone(),
            ..self.clone()
        }
    }
}

impl AssetKey for TransmissionKey {
    fn period(&self) -> Period {
        self.period
    }

    fn with_period(&self, period: Period) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

/// One direction of a transmission link in a given period
#[derive(PartialEq, Debug, Clone)]
pub struct Transmission {
    /// Installed capacity and capacity bounds (MW)
    pub capacity: CapacityBounds,
    /// Fraction of the input which arrives at the other end
    pub eff: f64,
    /// Investment cost per unit of new capacity
    pub inv_cost: f64,
    /// Annual fixed cost per unit of total capacity
    pub fix_cost: f64,
    /// Variable cost per unit of transported commodity
    pub var_cost: f64,
    /// Interest rate, depreciation period and remaining lifetime
    pub financing: Financing,
}

impl Transmission {
    /// Check the transmission attributes are sensible
    pub fn validate(&self) -> Result<()> {
        self.capacity.validate()?;
        self.financing.validate()?;
        ensure!(
            self.eff > 0.0 && self.eff <= 1.0,
            "eff must be in the range (0, 1]"
        );

        Ok(())
    }
}
