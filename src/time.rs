//! The modelled time horizon.
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// A timestep index, as used in the time series tables
pub type Timestep = u32;

/// Hours in a year, used to annualise results from a shorter horizon
const HOURS_PER_YEAR: f64 = 8760.0;

/// The ordered, consecutive timesteps of a model run.
///
/// The first timestep is an initialisation step: only storage content and process throughput
/// exist there. All flows are defined over the remaining *modelled* timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeInfo {
    timesteps: Vec<Timestep>,
    dt: f64,
}

impl TimeInfo {
    /// Create a new [`TimeInfo`].
    ///
    /// # Arguments
    ///
    /// * `timesteps` - All timesteps, including the initialisation step
    /// * `dt` - Length of one timestep in hours
    pub fn new(timesteps: Vec<Timestep>, dt: f64) -> Result<Self> {
        ensure!(
            timesteps.len() >= 2,
            "At least two timesteps are required (an initial step and one modelled step)"
        );
        ensure!(
            timesteps.iter().tuple_windows().all(|(a, b)| *b == a + 1),
            "Timesteps must be consecutive integers"
        );
        ensure!(dt > 0.0 && dt.is_finite(), "dt must be a positive number");

        Ok(Self { timesteps, dt })
    }

    /// All timesteps, including the initialisation step
    pub fn all(&self) -> &[Timestep] {
        &self.timesteps
    }

    /// The modelled timesteps (all but the first)
    pub fn modelled(&self) -> &[Timestep] {
        &self.timesteps[1..]
    }

    /// The initialisation timestep
    pub fn initial(&self) -> Timestep {
        self.timesteps[0]
    }

    /// The final timestep
    pub fn last(&self) -> Timestep {
        self.timesteps[self.timesteps.len() - 1]
    }

    /// Iterate over modelled timesteps together with the timestep preceding each
    pub fn iter_with_previous(&self) -> impl Iterator<Item = (Timestep, Timestep)> + '_ {
        self.timesteps.iter().copied().tuple_windows()
    }

    /// Length of a timestep in hours
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Factor scaling results over the modelled horizon up to a full year
    pub fn weight(&self) -> f64 {
        HOURS_PER_YEAR / (self.modelled().len() as f64 * self.dt)
    }
}

/// Time series values for a set of keys (e.g. demand per site and commodity)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesMap<K: Eq + Hash>(HashMap<K, HashMap<Timestep, f64>>);

impl<K: Eq + Hash> Default for TimeSeriesMap<K> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<K: Eq + Hash + Display> TimeSeriesMap<K> {
    /// Add a value to the series for `key`, checking for duplicates
    pub fn insert(&mut self, key: K, t: Timestep, value: f64) -> Result<()> {
        ensure!(value.is_finite(), "Non-finite value for {key} at timestep {t}");
        let series = self.0.entry(key).or_default();
        ensure!(
            series.insert(t, value).is_none(),
            "Duplicate value for timestep {t}"
        );

        Ok(())
    }

    /// Whether there is a series for `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.0.contains_key(key)
    }

    /// The value for `key` at timestep `t`, if any
    pub fn get<Q>(&self, key: &Q, t: Timestep) -> Option<f64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.0.get(key)?.get(&t).copied()
    }

    /// Whether the map contains no series
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keys of all series
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.keys()
    }

    /// Iterate over every timestep present in any series
    pub fn timesteps(&self) -> impl Iterator<Item = Timestep> + '_ {
        self.0.values().flat_map(|series| series.keys().copied())
    }
}
