//! Code for reading demand-side management resources from a CSV file.
use super::{input_err_msg, read_csv_optional};
use crate::dsm::{DsmKey, DsmMap, DsmResource};
use crate::global::Period;
use crate::id::{CommodityID, IDCollection, SiteID};
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const DSM_FILE_NAME: &str = "dsm.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct DsmRaw {
    period: Period,
    site: String,
    commodity: String,
    delay: u32,
    recov: u32,
    eff: f64,
    cap_max_up: f64,
    cap_max_do: f64,
}

/// Read DSM resources from the specified model directory.
///
/// The file is optional. If it is absent or empty, DSM is disabled.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
/// * `commodity_ids` - All known commodities
pub fn read_dsm(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<DsmMap> {
    let file_path = model_dir.join(DSM_FILE_NAME);
    let rows = read_csv_optional(&file_path)?;
    read_dsm_from_iter(rows.into_iter(), periods, site_ids, commodity_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_dsm_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
    commodity_ids: &IndexSet<CommodityID>,
) -> Result<DsmMap>
where
    I: Iterator<Item = DsmRaw>,
{
    let mut map = DsmMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "DSM resource given for unknown period {}",
            row.period
        );
        let key = DsmKey {
            period: row.period,
            site: site_ids.get_id(&row.site)?,
            commodity: commodity_ids.get_id(&row.commodity)?,
        };
        let resource = DsmResource {
            delay: row.delay,
            recovery: row.recov,
            eff: row.eff,
            cap_max_up: row.cap_max_up,
            cap_max_down: row.cap_max_do,
        };
        resource
            .validate()
            .with_context(|| format!("Invalid parameters for DSM resource {key}"))?;
        ensure!(
            map.insert(key.clone(), resource).is_none(),
            "Duplicate entry for DSM resource {key}"
        );
    }

    Ok(map)
}
