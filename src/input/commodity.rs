//! Code for reading commodities from a CSV file.
use super::{input_err_msg, read_csv};
use crate::commodity::{Commodity, CommodityKey, CommodityMap, CommodityType};
use crate::global::Period;
use crate::id::{IDCollection, SiteID};
use anyhow::{Context, Result, ensure};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const COMMODITIES_FILE_NAME: &str = "commodities.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct CommodityRaw {
    period: Period,
    site: String,
    commodity: String,
    #[serde(rename = "type")]
    kind: Option<CommodityType>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    max_per_step: Option<f64>,
}

/// Read commodities from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
/// * `site_ids` - All known sites
pub fn read_commodities(
    model_dir: &Path,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
) -> Result<CommodityMap> {
    let file_path = model_dir.join(COMMODITIES_FILE_NAME);
    let rows = read_csv(&file_path)?;
    read_commodities_from_iter(rows.into_iter(), periods, site_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_commodities_from_iter<I>(
    iter: I,
    periods: &[Period],
    site_ids: &IndexSet<SiteID>,
) -> Result<CommodityMap>
where
    I: Iterator<Item = CommodityRaw>,
{
    let mut map = CommodityMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Commodity {} given for unknown period {}",
            row.commodity,
            row.period
        );
        let key = CommodityKey {
            period: row.period,
            site: site_ids.get_id(&row.site)?,
            commodity: row.commodity.into(),
        };
        // Missing limits mean unlimited
        let commodity = Commodity {
            kind: row.kind,
            price: row.price.unwrap_or(0.0),
            max: row.max.unwrap_or(f64::INFINITY),
            max_per_step: row.max_per_step.unwrap_or(f64::INFINITY),
        };
        ensure!(
            commodity.price.is_finite(),
            "Commodity {key} must have a finite price"
        );
        ensure!(
            commodity.max >= 0.0 && commodity.max_per_step >= 0.0,
            "Commodity {key} must have non-negative limits"
        );
        ensure!(
            map.insert(key.clone(), commodity).is_none(),
            "Duplicate entry for commodity {key}"
        );
    }

    Ok(map)
}
