//! Storage units shift a commodity through time at a site.
use crate::asset::{AssetKey, CapacityBounds, Financing};
use crate::global::Period;
use crate::id::{CommodityID, SiteID, StorageID};
use anyhow::{Result, ensure};
use indexmap::IndexMap;

/// A map of [`Storage`] rows, keyed by period, site, storage and commodity
pub type StorageMap = IndexMap<StorageKey, Storage>;

/// Identifies a storage unit in a given period
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {site}, {storage}, {commodity})")]
pub struct StorageKey {
    /// The period
    pub period: Period,
    /// The site
    pub site: SiteID,
    /// The storage technology
    pub storage: StorageID,
    /// The stored commodity
    pub commodity: CommodityID,
}

impl AssetKey for StorageKey {
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

/// A storage unit in a given period
#[derive(PartialEq, Debug, Clone)]
pub struct Storage {
    /// Power (charge/discharge rate) capacity in MW
    pub power: CapacityBounds,
    /// Energy (content) capacity in MWh
    pub energy: CapacityBounds,
    /// Charging efficiency
    pub eff_in: f64,
    /// Discharging efficiency
    pub eff_out: f64,
    /// Fraction of content lost per timestep
    pub discharge: f64,
    /// Initial (and minimum final) content as a fraction of energy capacity.
    ///
    /// `None` leaves the initial content free.
    pub init: Option<f64>,
    /// Fixed ratio of energy capacity to power capacity
    pub ep_ratio: Option<f64>,
    /// Investment cost per unit of new power capacity
    pub inv_cost_p: f64,
    /// Investment cost per unit of new energy capacity
    pub inv_cost_c: f64,
    /// Annual fixed cost per unit of power capacity
    pub fix_cost_p: f64,
    /// Annual fixed cost per unit of energy capacity
    pub fix_cost_c: f64,
    /// Variable cost per unit of energy charged or discharged
    pub var_cost_p: f64,
    /// Variable cost per unit of stored content per timestep
    pub var_cost_c: f64,
    /// Interest rate, depreciation period and remaining lifetime
    pub financing: Financing,
}

impl Storage {
    /// Check the storage attributes are sensible
    pub fn validate(&self) -> Result<()> {
        self.power.validate()?;
        self.energy.validate()?;
        self.financing.validate()?;
        ensure!(
            self.eff_in > 0.0 && self.eff_in <= 1.0,
            "eff-in must be in the range (0, 1]"
        );
        ensure!(
            self.eff_out > 0.0 && self.eff_out <= 1.0,
            "eff-out must be in the range (0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.discharge),
            "discharge must be between 0 and 1"
        );
        if let Some(init) = self.init {
            ensure!((0.0..=1.0).contains(&init), "init must be between 0 and 1");
        }
        if let Some(ep_ratio) = self.ep_ratio {
            ensure!(
                ep_ratio > 0.0 && ep_ratio.is_finite(),
                "ep-ratio must be a positive number"
            );
        }

        Ok(())
    }
}
