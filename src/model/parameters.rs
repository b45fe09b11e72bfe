//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::id::CommodityID;
use crate::input::{input_err_msg, read_toml};
use crate::time::Timestep;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_dt, f64, 1.0);
define_param_default!(default_emission_commodity, CommodityID, CommodityID::new("CO2"));

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ModelParameters {
    /// Length of a timestep in hours
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// First and last timestep to model (inclusive). The first is the initialisation step.
    ///
    /// Defaults to every timestep in the demand table.
    #[serde(default)]
    pub timesteps: Option<[Timestep; 2]>,
    /// What to minimise
    #[serde(default)]
    pub objective: Objective,
    /// The commodity limited by the global CO2 limit and minimised by the CO2 objective
    #[serde(default = "default_emission_commodity")]
    pub emission_commodity: CommodityID,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            timesteps: None,
            objective: Objective::default(),
            emission_commodity: default_emission_commodity(),
        }
    }
}

/// The quantity minimised by the optimisation
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Eq, Default, Clone, Copy)]
pub enum Objective {
    /// Minimise the sum of all cost categories
    #[default]
    #[string = "cost"]
    Cost,
    /// Minimise total creation of the emission commodity
    #[string = "CO2"]
    Environmental,
}

/// Check that the `dt` parameter is valid
fn check_dt(dt: f64) -> Result<()> {
    ensure!(
        dt.is_finite() && dt > 0.0,
        "dt must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the `timesteps` parameter is valid
fn check_timesteps(timesteps: Option<[Timestep; 2]>) -> Result<()> {
    if let Some([first, last]) = timesteps {
        ensure!(
            first < last,
            "timesteps must be given as [first, last] with first < last"
        );
    }

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_dt(self.dt)?;
        check_timesteps(self.timesteps)?;

        Ok(())
    }
}
