//! The model: every input table for one scenario, bundled together.
use crate::commodity::{CommodityKey, CommodityMap, CommodityType, PriceKey};
use crate::dsm::DsmMap;
use crate::features::FeatureFlags;
use crate::global::{GlobalPropertiesMap, Period};
use crate::input::load_model;
use crate::process::{ProcessCommodityMap, ProcessKey, ProcessMap};
use crate::site::SiteMap;
use crate::storage::StorageMap;
use crate::time::{TimeInfo, TimeSeriesMap};
use crate::transmission::TransmissionMap;
use anyhow::Result;
use std::path::Path;

pub mod parameters;
pub use parameters::{ModelParameters, Objective};

/// Model definition.
///
/// A model is loaded once per scenario and is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Model {
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The modelled timesteps
    pub time: TimeInfo,
    /// Which optional features are enabled
    pub features: FeatureFlags,
    /// Global properties for each period
    pub global: GlobalPropertiesMap,
    /// Sites
    pub sites: SiteMap,
    /// Commodities
    pub commodities: CommodityMap,
    /// Processes
    pub processes: ProcessMap,
    /// Conversion ratios of processes
    pub process_commodities: ProcessCommodityMap,
    /// Transmission links
    pub transmissions: TransmissionMap,
    /// Storage units
    pub storages: StorageMap,
    /// Demand-side management resources
    pub dsm: DsmMap,
    /// Demand time series
    pub demand: TimeSeriesMap<CommodityKey>,
    /// Intermittent supply (capacity factor) time series
    pub supim: TimeSeriesMap<CommodityKey>,
    /// Buy and sell price time series
    pub buy_sell_price: TimeSeriesMap<PriceKey>,
    /// Time-varying efficiency factors for processes
    pub eff_factor: TimeSeriesMap<ProcessKey>,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        load_model(model_dir)
    }

    /// All modelled periods in ascending order
    pub fn periods(&self) -> Vec<Period> {
        self.global.periods()
    }

    /// Work out which optional features the tables call for
    pub fn detect_features(&self) -> FeatureFlags {
        FeatureFlags {
            intertemporal: self.global.periods().len() > 1,
            transmission: !self.transmissions.is_empty(),
            storage: !self.storages.is_empty(),
            dsm: !self.dsm.is_empty(),
            buy_sell_price: !self.buy_sell_price.is_empty(),
            time_var_eff: !self.eff_factor.is_empty(),
        }
    }

    /// Iterate over commodities of the given type
    pub fn iter_commodities_of_type(
        &self,
        kind: CommodityType,
    ) -> impl Iterator<Item = &CommodityKey> {
        self.commodities
            .iter()
            .filter(move |(_, commodity)| commodity.is(kind))
            .map(|(key, _)| key)
    }
}
