//! Demand-side management (DSM) resources allow demand to be shifted in time.
use crate::global::Period;
use crate::id::{CommodityID, SiteID};
use anyhow::{Result, ensure};
use indexmap::IndexMap;

/// A map of [`DsmResource`]s, keyed by period, site and commodity
pub type DsmMap = IndexMap<DsmKey, DsmResource>;

/// Identifies a DSM resource
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {site}, {commodity})")]
pub struct DsmKey {
    /// The period
    pub period: Period,
    /// The site
    pub site: SiteID,
    /// The commodity whose demand can be shifted
    pub commodity: CommodityID,
}

/// Parameters of a demand-side management resource
#[derive(PartialEq, Debug, Clone)]
pub struct DsmResource {
    /// Number of timesteps within which an upward shift must be compensated
    pub delay: u32,
    /// Number of timesteps over which cumulative upward shifts are limited
    pub recovery: u32,
    /// Efficiency of shifting (compensating downward shift per unit of upward shift)
    pub eff: f64,
    /// Maximum upward shift per timestep
    pub cap_max_up: f64,
    /// Maximum downward shift per timestep
    pub cap_max_down: f64,
}

impl DsmResource {
    /// Check the resource attributes are sensible
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.eff > 0.0 && self.eff <= 1.0,
            "eff must be in the range (0, 1]"
        );
        ensure!(
            self.cap_max_up >= 0.0 && self.cap_max_down >= 0.0,
            "cap-max-up and cap-max-do must be non-negative"
        );

        Ok(())
    }
}
