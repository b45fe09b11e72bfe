//! Code for reading site information from a CSV file.
use super::{deserialise_optional_non_negative, input_err_msg, read_csv};
use crate::global::Period;
use crate::id::SiteID;
use crate::site::{Site, SiteMap};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const SITES_FILE_NAME: &str = "sites.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct SiteRaw {
    period: Period,
    site: String,
    #[serde(default, deserialize_with = "deserialise_optional_non_negative")]
    area: Option<f64>,
}

/// Read sites from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `periods` - All modelled periods
pub fn read_sites(model_dir: &Path, periods: &[Period]) -> Result<SiteMap> {
    let file_path = model_dir.join(SITES_FILE_NAME);
    let rows = read_csv(&file_path)?;
    read_sites_from_iter(rows.into_iter(), periods).with_context(|| input_err_msg(&file_path))
}

fn read_sites_from_iter<I>(iter: I, periods: &[Period]) -> Result<SiteMap>
where
    I: Iterator<Item = SiteRaw>,
{
    let mut map = SiteMap::new();
    for row in iter {
        ensure!(
            periods.contains(&row.period),
            "Site {} given for unknown period {}",
            row.site,
            row.period
        );
        let key = (row.period, SiteID::from(row.site));
        ensure!(
            !map.contains_key(&key),
            "Duplicate entry for site {} in period {}",
            key.1,
            key.0
        );
        map.insert(key, Site { area: row.area });
    }

    Ok(map)
}
