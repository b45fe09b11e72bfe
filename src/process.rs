//! Processes convert input commodities into output commodities. The data structures in this
//! module describe processes at each site together with their conversion ratios.
use crate::asset::{AssetKey, CapacityBounds, Financing};
use crate::global::Period;
use crate::id::{CommodityID, ProcessID, SiteID};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;

/// A map of [`Process`] rows, keyed by period, site and process
pub type ProcessMap = IndexMap<ProcessKey, Process>;

/// A map of conversion ratios, keyed by period, process, commodity and direction
pub type ProcessCommodityMap = IndexMap<ProcessCommodityKey, ProcessCommodity>;

/// Identifies a process at a site in a given period
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {site}, {process})")]
pub struct ProcessKey {
    /// The period
    pub period: Period,
    /// The site
    pub site: SiteID,
    /// The process
    pub process: ProcessID,
}

impl ProcessKey {
    /// Create a new [`ProcessKey`]
    pub fn new(period: Period, site: &SiteID, process: &ProcessID) -> Self {
        Self {
            period,
            site: site.clone(),
            process: process.clone(),
        }
    }
}

impl AssetKey for ProcessKey {
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

/// A conversion process at a site in a given period
#[derive(PartialEq, Debug, Clone)]
pub struct Process {
    /// Installed capacity and capacity bounds (MW)
    pub capacity: CapacityBounds,
    /// Maximum change in throughput per hour, as a fraction of capacity
    pub max_grad: f64,
    /// Minimum load as a fraction of capacity (used for partial-load operation)
    pub min_fraction: f64,
    /// Investment cost per unit of new capacity
    pub inv_cost: f64,
    /// Annual fixed cost per unit of total capacity
    pub fix_cost: f64,
    /// Variable cost per unit of throughput
    pub var_cost: f64,
    /// Interest rate, depreciation period and remaining lifetime
    pub financing: Financing,
    /// Land area used per unit of capacity. `None` means the process uses no area.
    pub area_per_cap: Option<f64>,
}

impl Process {
    /// Check the process attributes are sensible
    pub fn validate(&self) -> Result<()> {
        self.capacity.validate()?;
        self.financing.validate()?;
        ensure!(
            self.max_grad >= 0.0,
            "max-grad must be a non-negative number"
        );
        ensure!(
            (0.0..=1.0).contains(&self.min_fraction),
            "min-fraction must be between 0 and 1"
        );

        Ok(())
    }
}

/// Whether a commodity flows into or out of a process
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, DeserializeLabeledStringEnum)]
pub enum FlowDirection {
    /// Consumed by the process
    #[string = "In"]
    In,
    /// Produced by the process
    #[string = "Out"]
    Out,
}

/// Identifies one conversion ratio of a process
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {process}, {commodity}, {direction:?})")]
pub struct ProcessCommodityKey {
    /// The period
    pub period: Period,
    /// The process
    pub process: ProcessID,
    /// The commodity
    pub commodity: CommodityID,
    /// Whether the commodity is an input or an output
    pub direction: FlowDirection,
}

/// The conversion ratio of a commodity relative to process throughput
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ProcessCommodity {
    /// Flow per unit of throughput at full load
    pub ratio: f64,
    /// Flow per unit of throughput at minimum load, for partial-load processes
    pub ratio_min: Option<f64>,
}
