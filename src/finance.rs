//! General functions related to finance: annualising investments and discounting costs incurred
//! in later periods.
use crate::asset::{AssetKey, Financing};
use crate::global::Period;
use crate::index::ModelIndex;
use crate::model::Model;
use crate::process::ProcessKey;
use crate::storage::StorageKey;
use crate::transmission::TransmissionKey;
use crate::units::Dimensionless;
use anyhow::Result;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Calculates the annuity factor for a given depreciation period and interest rate.
///
/// The annuity factor is used to annualise capital costs over the depreciation period of an asset.
pub fn annuity_factor(depreciation: u32, interest_rate: Dimensionless) -> Dimensionless {
    if depreciation == 0 {
        return Dimensionless(0.0);
    }
    if interest_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(f64::from(depreciation));
    }
    let factor = (Dimensionless(1.0) + interest_rate).powf(f64::from(depreciation));
    (interest_rate * factor) / (factor - Dimensionless(1.0))
}

/// Present value of one unit of cost paid in `period`, relative to the first period
pub fn discount_factor(period: Period, first: Period, discount_rate: Dimensionless) -> Dimensionless {
    let years = f64::from(period) - f64::from(first);
    (Dimensionless(1.0) + discount_rate).powf(1.0 - years)
}

/// The discounted number of years represented by a period of length `distance`.
///
/// Degenerates to the distance itself when the discount rate is zero.
pub fn effective_distance(distance: f64, discount_rate: Dimensionless) -> Dimensionless {
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(distance);
    }
    (Dimensionless(1.0) - (Dimensionless(1.0) + discount_rate).powf(-distance)) / discount_rate
}

/// Sum of the discounted annuity payments over `years` years, for an asset built in `built`
fn discounted_payments(
    depreciation: u32,
    interest_rate: Dimensionless,
    discount_rate: Dimensionless,
    built: Period,
    first: Period,
    years: f64,
) -> Dimensionless {
    let n = f64::from(depreciation);
    let (i, j) = (interest_rate, discount_rate);
    let one = Dimensionless(1.0);

    if j == Dimensionless(0.0) {
        return if i == Dimensionless(0.0) {
            Dimensionless(years / n)
        } else {
            Dimensionless(years) * annuity_factor(depreciation, i)
        };
    }

    let discount = discount_factor(built, first, j);
    let payments = (one + j).powf(years) - one;
    if i == Dimensionless(0.0) {
        discount * payments / (Dimensionless(n) * j * (one + j).powf(n))
    } else {
        discount * (i * (one + i).powf(n) * payments)
            / (j * (one + j).powf(n) * ((one + i).powf(n) - one))
    }
}

/// Present value of all annuity payments for one unit of investment, for intertemporal runs.
///
/// # Arguments
///
/// * `depreciation` - Depreciation period in years
/// * `interest_rate` - Interest rate of the investment (WACC)
/// * `discount_rate` - Discount rate of the run
/// * `built` - Period in which the asset is built
/// * `first` - First period of the run
pub fn invcost_factor(
    depreciation: u32,
    interest_rate: Dimensionless,
    discount_rate: Dimensionless,
    built: Period,
    first: Period,
) -> Dimensionless {
    discounted_payments(
        depreciation,
        interest_rate,
        discount_rate,
        built,
        first,
        f64::from(depreciation),
    )
}

/// Present value of the annuity payments owed after the end of the horizon, for one unit of
/// investment.
///
/// Assets fully depreciated within the horizon owe nothing, so the factor is clamped to zero.
///
/// # Arguments
///
/// * `depreciation` - Depreciation period in years
/// * `interest_rate` - Interest rate of the investment (WACC)
/// * `discount_rate` - Discount rate of the run
/// * `built` - Period in which the asset is built
/// * `first` - First period of the run
/// * `horizon_end` - Last year of the horizon
pub fn overpay_factor(
    depreciation: u32,
    interest_rate: Dimensionless,
    discount_rate: Dimensionless,
    built: Period,
    first: Period,
    horizon_end: f64,
) -> Dimensionless {
    let remaining = f64::from(built) + f64::from(depreciation) - horizon_end - 1.0;
    let factor = discounted_payments(
        depreciation,
        interest_rate,
        discount_rate,
        built,
        first,
        remaining,
    );
    if factor.value().is_nan() || factor < Dimensionless(0.0) {
        Dimensionless(0.0)
    } else {
        factor
    }
}

/// Economic factors for every asset row and period of a model
#[derive(Debug, Clone, PartialEq)]
pub struct EconomicFactors {
    cost_factors: HashMap<Period, f64>,
    distances: HashMap<Period, f64>,
    /// Investment cost multiplier for each expandable process row
    pub process_invest: IndexMap<ProcessKey, f64>,
    /// Investment cost multiplier for each storage row (power and content)
    pub storage_invest: IndexMap<StorageKey, f64>,
    /// Investment cost multiplier for each expandable transmission row
    pub transmission_invest: IndexMap<TransmissionKey, f64>,
}

impl EconomicFactors {
    /// Calculate the economic factors for a model.
    ///
    /// For a single period, investment costs are annualised and every other cost is counted once.
    /// For intertemporal runs, costs are discounted to the first period and multiplied by the
    /// number of years each period represents.
    pub fn new(model: &Model, index: &ModelIndex) -> Result<Self> {
        let Some(horizon) = &index.horizon else {
            let annuity = |financing: &Financing| {
                annuity_factor(financing.depreciation, financing.wacc).value()
            };
            return Ok(Self {
                cost_factors: model.periods().into_iter().map(|p| (p, 1.0)).collect(),
                distances: model.periods().into_iter().map(|p| (p, 1.0)).collect(),
                process_invest: invest_factors(index.processes.expandable.iter(), |key| {
                    annuity(&model.processes[key].financing)
                }),
                storage_invest: invest_factors(model.storages.keys(), |key| {
                    annuity(&model.storages[key].financing)
                }),
                transmission_invest: invest_factors(index.transmissions.expandable.iter(), |key| {
                    annuity(&model.transmissions[key].financing)
                }),
            });
        };

        let discount_rate = model.global.discount_rate()?;
        let intertemporal = |built: Period, financing: &Financing| {
            let (n, i) = (financing.depreciation, financing.wacc);
            let invest = invcost_factor(n, i, discount_rate, built, horizon.first());
            let overpay =
                overpay_factor(n, i, discount_rate, built, horizon.first(), horizon.end());
            (invest - overpay).value()
        };

        Ok(Self {
            cost_factors: horizon
                .periods()
                .iter()
                .map(|&period| {
                    let factor = discount_factor(period, horizon.first(), discount_rate)
                        * effective_distance(horizon.distance(period), discount_rate);
                    (period, factor.value())
                })
                .collect(),
            distances: horizon
                .periods()
                .iter()
                .map(|&period| (period, horizon.distance(period)))
                .collect(),
            process_invest: invest_factors(index.processes.expandable.iter(), |key| {
                intertemporal(key.period(), &model.processes[key].financing)
            }),
            storage_invest: invest_factors(model.storages.keys(), |key| {
                intertemporal(key.period(), &model.storages[key].financing)
            }),
            transmission_invest: invest_factors(index.transmissions.expandable.iter(), |key| {
                intertemporal(key.period(), &model.transmissions[key].financing)
            }),
        })
    }

    /// Multiplier for costs incurred every year of `period` (fixed, variable, fuel, revenue,
    /// purchase and environmental costs)
    pub fn cost_factor(&self, period: Period) -> f64 {
        self.cost_factors.get(&period).copied().unwrap_or(1.0)
    }

    /// Number of years represented by `period` (1 for a single-period run)
    pub fn distance(&self, period: Period) -> f64 {
        self.distances.get(&period).copied().unwrap_or(1.0)
    }
}

fn invest_factors<'a, K, I, F>(keys: I, factor: F) -> IndexMap<K, f64>
where
    K: AssetKey + 'a,
    I: Iterator<Item = &'a K>,
    F: Fn(&K) -> f64,
{
    keys.map(|key| (key.clone(), factor(key))).collect()
}
