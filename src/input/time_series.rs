//! Code for reading time series tables (demand, intermittent supply, prices and efficiency
//! factors) from CSV files.
use super::{input_err_msg, read_csv, read_csv_optional};
use crate::commodity::{CommodityKey, PriceKey};
use crate::global::Period;
use crate::id::{CommodityID, IDCollection, ProcessID, SiteID};
use crate::process::ProcessKey;
use crate::time::{TimeSeriesMap, Timestep};
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";
const SUPIM_FILE_NAME: &str = "supim.csv";
const BUY_SELL_PRICE_FILE_NAME: &str = "buy_sell_price.csv";
const EFF_FACTOR_FILE_NAME: &str = "eff_factor.csv";

/// A time series value for a commodity at a site
#[derive(PartialEq, Debug, Deserialize)]
struct CommoditySeriesRaw {
    period: Period,
    site: String,
    commodity: String,
    timestep: Timestep,
    value: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct PriceRaw {
    period: Period,
    commodity: String,
    timestep: Timestep,
    value: f64,
}

#[derive(PartialEq, Debug, Deserialize)]
struct EffFactorRaw {
    period: Period,
    site: String,
    process: String,
    timestep: Timestep,
    value: f64,
}

/// Read the demand time series from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
/// * `commodity_ids` - All known commodities
pub fn read_demand(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<TimeSeriesMap<CommodityKey>> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let rows = read_csv(&file_path)?;
    read_commodity_series_from_iter(rows.into_iter(), periods, site_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

/// Read intermittent supply (capacity factor) time series from the specified model directory.
///
/// The file is optional, though any process consuming a `SupIm` commodity needs a series.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
/// * `commodity_ids` - All known commodities
pub fn read_supim(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<TimeSeriesMap<CommodityKey>> {
    let file_path = model_dir.join(SUPIM_FILE_NAME);
    let rows = read_csv_optional(&file_path)?;
    read_commodity_series_from_iter(rows.into_iter(), periods, site_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_commodity_series_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<TimeSeriesMap<CommodityKey>>
where
    I: Iterator<Item = CommoditySeriesRaw>,
{
    let mut map = TimeSeriesMap::default();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Time series given for unknown period {}",
            row.period
        );
        let key = CommodityKey {
            period: row.period,
            site: site_ids.get_id(&row.site)?,
            commodity: commodity_ids.get_id(&row.commodity)?,
        };
        map.insert(key, row.timestep, row.value)?;
    }

    Ok(map)
}

/// Read buy/sell price time series from the specified model directory.
///
/// Series are named either `site.commodity` or `commodity`. The file is optional.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
pub fn read_buy_sell_prices(
    model_dir: &Path,
    periods: &[Period],
) -> Result<TimeSeriesMap<PriceKey>> {
    let file_path = model_dir.join(BUY_SELL_PRICE_FILE_NAME);
    let rows = read_csv_optional(&file_path)?;
    read_buy_sell_prices_from_iter(rows.into_iter(), periods)
        .with_context(|| input_err_msg(&file_path))
}

fn read_buy_sell_prices_from_iter<I>(iter: I, periods: &[Period]) -> Result<TimeSeriesMap<PriceKey>>
where
    I: Iterator<Item = PriceRaw>,
{
    let mut map = TimeSeriesMap::default();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Price series {} given for unknown period {}",
            row.commodity,
            row.period
        );
        let key = PriceKey {
            period: row.period,
            name: row.commodity,
        };
        map.insert(key, row.timestep, row.value)?;
    }

    Ok(map)
}

/// Read time-varying efficiency factors from the specified model directory.
///
/// The file is optional.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
/// * `process_ids` - All known processes
pub fn read_eff_factors(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    process_ids: &IndexSet<ProcessID>,
) -> Result<TimeSeriesMap<ProcessKey>> {
    let file_path = model_dir.join(EFF_FACTOR_FILE_NAME);
    let rows = read_csv_optional(&file_path)?;
    read_eff_factors_from_iter(rows.into_iter(), periods, site_ids, process_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_eff_factors_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    process_ids: &IndexSet<ProcessID>,
) -> Result<TimeSeriesMap<ProcessKey>>
where
    I: Iterator<Item = EffFactorRaw>,
{
    let mut map = TimeSeriesMap::default();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Efficiency factor for {} given for unknown period {}",
            row.process,
            row.period
        );
        ensure!(
            row.value >= 0.0,
            "Efficiency factors must be non-negative"
        );
        let key = ProcessKey {
            period: row.period,
            site: site_ids.get_id(&row.site)?,
            process: process_ids.get_id(&row.process)?,
        };
        map.insert(key, row.timestep, row.value)?;
    }

    Ok(map)
}
