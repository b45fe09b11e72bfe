//! Common routines for handling input data.
use crate::features::FeatureFlags;
use crate::model::{Model, ModelParameters};
use crate::time::TimeInfo;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::info;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

mod commodity;
use commodity::read_commodities;
mod dsm;
use dsm::read_dsm;
mod global;
use global::read_global_properties;
mod process;
use process::{read_process_commodities, read_processes};
mod site;
use site::read_sites;
mod storage;
use storage::read_storages;
mod time_series;
use time_series::{read_buy_sell_prices, read_demand, read_eff_factors, read_supim};
mod transmission;
use transmission::read_transmissions;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_optional(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec)
}

/// Read a series of type `T`s from a CSV file.
///
/// A missing file is treated like an empty one.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.is_file() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;
    reader
        .deserialize::<T>()
        .process_results(|iter| iter.collect())
        .with_context(|| input_err_msg(file_path))
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(value)
}

/// Read an optional f64 where an empty, negative or NaN value means "not set"
pub fn deserialise_optional_non_negative<'de, D>(deserialiser: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Deserialize::deserialize(deserialiser)?;
    Ok(value.filter(|value| *value >= 0.0))
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;

    let global = read_global_properties(model_dir)?;
    let periods = global.periods();
    let sites = read_sites(model_dir, &periods)?;
    let site_ids = sites.keys().map(|(_, site)| site.clone()).collect();
    let commodities = read_commodities(model_dir, &periods, &site_ids)?;
    let commodity_ids = commodities
        .keys()
        .map(|key| key.commodity.clone())
        .collect();
    let processes = read_processes(model_dir, &periods, &site_ids)?;
    let process_ids = processes.keys().map(|key| key.process.clone()).collect();
    let process_commodities =
        read_process_commodities(model_dir, &periods, &process_ids, &commodity_ids)?;
    let transmissions = read_transmissions(model_dir, &periods, &site_ids, &commodity_ids)?;
    let storages = read_storages(model_dir, &periods, &site_ids, &commodity_ids)?;
    let dsm = read_dsm(model_dir, &periods, &site_ids, &commodity_ids)?;
    let demand = read_demand(model_dir, &periods, &site_ids, &commodity_ids)?;
    let supim = read_supim(model_dir, &periods, &site_ids, &commodity_ids)?;
    let buy_sell_price = read_buy_sell_prices(model_dir, &periods)?;
    let eff_factor = read_eff_factors(model_dir, &periods, &site_ids, &process_ids)?;

    // Default to every timestep for which there is demand data
    let timesteps = match parameters.timesteps {
        Some([first, last]) => (first..=last).collect(),
        None => demand.timesteps().sorted().dedup().collect(),
    };
    let time = TimeInfo::new(timesteps, parameters.dt)
        .context("Invalid timesteps (check model.toml and demand.csv)")?;

    let mut model = Model {
        parameters,
        time,
        features: FeatureFlags::default(),
        global,
        sites,
        commodities,
        processes,
        process_commodities,
        transmissions,
        storages,
        dsm,
        demand,
        supim,
        buy_sell_price,
        eff_factor,
    };
    model.features = model.detect_features();
    info!("Enabled features: {}", model.features);

    Ok(model)
}
