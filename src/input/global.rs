//! Code for reading global properties from a CSV file.
use super::{input_err_msg, read_csv};
use crate::global::{GlobalPropertiesMap, Period};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const GLOBAL_FILE_NAME: &str = "global.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct GlobalPropertyRaw {
    period: Period,
    property: String,
    value: f64,
}

/// Read global properties from the specified model directory.
///
/// The set of periods in this file defines the periods of the model.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_global_properties(model_dir: &Path) -> Result<GlobalPropertiesMap> {
    let file_path = model_dir.join(GLOBAL_FILE_NAME);
    let rows = read_csv(&file_path)?;
    read_global_properties_from_iter(rows.into_iter()).with_context(|| input_err_msg(&file_path))
}

fn read_global_properties_from_iter<I>(iter: I) -> Result<GlobalPropertiesMap>
where
    I: Iterator<Item = GlobalPropertyRaw>,
{
    let mut map = GlobalPropertiesMap::default();
    for row in iter {
        map.entry(row.period)
            .set(&row.property, row.value)
            .with_context(|| format!("Invalid global property for period {}", row.period))?;
    }

    Ok(map)
}
