//! Code for reading processes and their conversion ratios from CSV files.
use super::{deserialise_optional_non_negative, input_err_msg, read_csv};
use crate::asset::{CapacityBounds, Financing};
use crate::global::Period;
use crate::id::{CommodityID, IDCollection, ProcessID, SiteID};
use crate::process::{
    FlowDirection, Process, ProcessCommodity, ProcessCommodityKey, ProcessCommodityMap,
    ProcessKey, ProcessMap,
};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const PROCESSES_FILE_NAME: &str = "processes.csv";
const PROCESS_COMMODITIES_FILE_NAME: &str = "process_commodities.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ProcessRaw {
    period: Period,
    site: String,
    process: String,
    inst_cap: f64,
    cap_lo: f64,
    cap_up: f64,
    #[serde(default)]
    max_grad: Option<f64>,
    #[serde(default)]
    min_fraction: Option<f64>,
    inv_cost: f64,
    fix_cost: f64,
    var_cost: f64,
    wacc: f64,
    depreciation: u32,
    #[serde(default, deserialize_with = "deserialise_optional_non_negative")]
    area_per_cap: Option<f64>,
    #[serde(default)]
    lifetime: Option<u32>,
}

#[derive(PartialEq, Debug, Deserialize)]
struct ProcessCommodityRaw {
    period: Period,
    process: String,
    commodity: String,
    direction: FlowDirection,
    ratio: f64,
    #[serde(default)]
    ratio_min: Option<f64>,
}

/// Read processes from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
pub fn read_processes(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
) -> Result<ProcessMap> {
    let file_path = model_dir.join(PROCESSES_FILE_NAME);
    let rows = read_csv(&file_path)?;
    read_processes_from_iter(rows.into_iter(), periods, site_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_processes_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
) -> Result<ProcessMap>
where
    I: Iterator<Item = ProcessRaw>,
{
    let mut map = ProcessMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Process {} given for unknown period {}",
            row.process,
            row.period
        );
        let key = ProcessKey {
            period: row.period,
            site: site_ids.get_id(&row.site)?,
            process: row.process.into(),
        };
        let process = Process {
            capacity: CapacityBounds {
                installed: row.inst_cap,
                lower: row.cap_lo,
                upper: row.cap_up,
            },
            max_grad: row.max_grad.unwrap_or(f64::INFINITY),
            min_fraction: row.min_fraction.unwrap_or(0.0),
            inv_cost: row.inv_cost,
            fix_cost: row.fix_cost,
            var_cost: row.var_cost,
            financing: Financing {
                wacc: Dimensionless(row.wacc),
                depreciation: row.depreciation,
                lifetime: row.lifetime,
            },
            area_per_cap: row.area_per_cap,
        };
        process
            .validate()
            .with_context(|| format!("Invalid parameters for process {key}"))?;
        ensure!(
            map.insert(key.clone(), process).is_none(),
            "Duplicate entry for process {key}"
        );
    }

    Ok(map)
}

/// Read process conversion ratios from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `process_ids` - All known processes
/// * `commodity_ids` - All known commodities
pub fn read_process_commodities(
    model_dir: &Path,
    periods: &[Period],
    process_ids: &IndexSet<ProcessID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<ProcessCommodityMap> {
    let file_path = model_dir.join(PROCESS_COMMODITIES_FILE_NAME);
    let rows = read_csv(&file_path)?;
    read_process_commodities_from_iter(rows.into_iter(), periods, process_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_process_commodities_from_iter<I>(
    iter: I,
    periods: &[Period],
    process_ids: &IndexSet<ProcessID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<ProcessCommodityMap>
where
    I: Iterator<Item = ProcessCommodityRaw>,
{
    let mut map = ProcessCommodityMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Ratio for process {} given for unknown period {}",
            row.process,
            row.period
        );
        let key = ProcessCommodityKey {
            period: row.period,
            process: process_ids.get_id(&row.process)?,
            commodity: commodity_ids.get_id(&row.commodity)?,
            direction: row.direction,
        };
        ensure!(
            row.ratio.is_finite() && row.ratio >= 0.0,
            "Ratio for {key} must be a finite, non-negative number"
        );
        if let Some(ratio_min) = row.ratio_min {
            ensure!(
                ratio_min.is_finite() && ratio_min >= 0.0,
                "Minimum-load ratio for {key} must be a finite, non-negative number"
            );
        }
        let ratio = ProcessCommodity {
            ratio: row.ratio,
            ratio_min: row.ratio_min,
        };
        ensure!(
            map.insert(key.clone(), ratio).is_none(),
            "Duplicate entry for ratio {key}"
        );
    }

    Ok(map)
}
