//! Global, per-period model properties.
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use std::collections::BTreeMap;

/// A modelled planning year (support timeframe)
pub type Period = u32;

/// Global properties for a single period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalProperties {
    /// Cap on annual creation of the emission commodity
    pub co2_limit: Option<f64>,
    /// Cap on emissions summed over the whole horizon (intertemporal only)
    pub co2_budget: Option<f64>,
    /// Cap on the total of all cost categories
    pub cost_limit: Option<f64>,
    /// Discount rate used to bring future costs to present value
    pub discount_rate: Option<Dimensionless>,
    /// Number of years represented by this period (required for the last period)
    pub weight: Option<f64>,
}

impl GlobalProperties {
    /// Set a property from its name in the global table.
    ///
    /// # Arguments
    ///
    /// * `property` - The property name (e.g. `CO2 limit`)
    /// * `value` - The value of the property
    pub fn set(&mut self, property: &str, value: f64) -> Result<()> {
        let slot = match property {
            "CO2 limit" => &mut self.co2_limit,
            "CO2 budget" => &mut self.co2_budget,
            "Cost limit" => &mut self.cost_limit,
            "Weight" => &mut self.weight,
            "Discount rate" => {
                ensure!(
                    self.discount_rate.is_none(),
                    "Property {property} given more than once"
                );
                self.discount_rate = Some(Dimensionless(value));
                return Ok(());
            }
            _ => anyhow::bail!("Unknown global property: {property}"),
        };
        ensure!(slot.is_none(), "Property {property} given more than once");
        *slot = Some(value);

        Ok(())
    }
}

/// Global properties for every period, ordered by period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalPropertiesMap(BTreeMap<Period, GlobalProperties>);

impl GlobalPropertiesMap {
    /// Get a mutable reference to the properties of a period, adding the period if necessary
    pub fn entry(&mut self, period: Period) -> &mut GlobalProperties {
        self.0.entry(period).or_default()
    }

    /// Get the properties of a period
    pub fn get(&self, period: Period) -> Option<&GlobalProperties> {
        self.0.get(&period)
    }

    /// All modelled periods in ascending order
    pub fn periods(&self) -> Vec<Period> {
        self.0.keys().copied().collect()
    }

    /// The first modelled period
    pub fn first_period(&self) -> Option<Period> {
        self.0.keys().next().copied()
    }

    /// Properties of the first modelled period, which hold horizon-wide settings
    pub fn first(&self) -> Option<&GlobalProperties> {
        self.0.values().next()
    }

    /// The configured weight (number of years represented) of the last period
    pub fn last_period_weight(&self) -> Result<f64> {
        let (period, props) = self
            .0
            .iter()
            .next_back()
            .context("No periods defined in global properties")?;
        props
            .weight
            .with_context(|| format!("Missing global property Weight for period {period}"))
    }

    /// The discount rate, which is read from the first period
    pub fn discount_rate(&self) -> Result<Dimensionless> {
        let first = self
            .first_period()
            .context("No periods defined in global properties")?;
        self.0[&first]
            .discount_rate
            .with_context(|| format!("Missing global property Discount rate for period {first}"))
    }
}

/// The ordered periods of a run and the year in which the planning horizon ends
#[derive(Debug, Clone, PartialEq)]
pub struct Horizon {
    periods: Vec<Period>,
    last_weight: f64,
}

impl Horizon {
    /// Create a [`Horizon`] from the global properties.
    ///
    /// The last period must have a `Weight`, giving the number of years it represents.
    pub fn new(global: &GlobalPropertiesMap) -> Result<Self> {
        let periods = global.periods();
        ensure!(!periods.is_empty(), "No periods defined in global properties");
        let last_weight = global.last_period_weight()?;
        ensure!(
            last_weight >= 1.0,
            "Weight of the last period must be at least one year"
        );

        Ok(Self {
            periods,
            last_weight,
        })
    }

    /// All periods in ascending order
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The first period
    pub fn first(&self) -> Period {
        self.periods[0]
    }

    /// The last year covered by the horizon
    pub fn end(&self) -> f64 {
        f64::from(self.periods[self.periods.len() - 1]) + self.last_weight - 1.0
    }

    /// The period following `period`, if any
    pub fn next(&self, period: Period) -> Option<Period> {
        self.periods.iter().copied().find(|p| *p > period)
    }

    /// Number of years represented by `period`: the gap to the next period or, for the last
    /// period, its weight
    pub fn distance(&self, period: Period) -> f64 {
        self.next(period)
            .map_or(self.last_weight, |next| f64::from(next - period))
    }
}
