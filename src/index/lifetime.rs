//! Capacity bookkeeping for asset rows: which rows may be expanded and in which periods built
//! or previously installed capacity is available.
use crate::asset::{AssetKey, CapacityBounds, Financing};
use crate::global::{Horizon, Period};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use log::warn;

/// Capacity bookkeeping for one family of asset rows
#[derive(Debug, Clone, PartialEq)]
pub struct AssetIndex<K: AssetKey> {
    /// Rows which may be expanded, i.e. which have a new-capacity variable
    pub expandable: IndexSet<K>,
    /// For every row, the expandable rows whose new capacity is available in it
    pub built: IndexMap<K, Vec<K>>,
    /// For every row, the previously installed capacity still available in it
    pub installed: IndexMap<K, f64>,
}

impl<K: AssetKey> AssetIndex<K> {
    /// Every row, in input order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.built.keys()
    }

    /// Whether the total capacity of the row is a decision variable.
    ///
    /// This is the case when new capacity from any period is available in the row. Otherwise the
    /// capacity is a constant equal to [`AssetIndex::installed_capacity`].
    pub fn is_variable(&self, key: &K) -> bool {
        self.built.get(key).is_some_and(|built| !built.is_empty())
    }

    /// The previously installed capacity available in the row
    pub fn installed_capacity(&self, key: &K) -> f64 {
        self.installed.get(key).copied().unwrap_or(0.0)
    }

    /// The expandable rows whose new capacity is available in the row
    pub fn built_in(&self, key: &K) -> &[K] {
        self.built.get(key).map_or(&[], Vec::as_slice)
    }
}

/// The periods in which a unit built in `built` is still operating.
///
/// A unit is operating in a period if it lasts until the start of the following period. For the
/// last period, it must last until the end of the horizon.
///
/// # Arguments
///
/// * `horizon` - The periods of the run
/// * `built` - The period in which the unit was built (or the first period, for installed units)
/// * `span` - The number of years for which the unit operates
/// * `strict_last` - Whether the unit must outlast the end of the horizon, rather than just reach it
pub fn operational_periods(
    horizon: &Horizon,
    built: Period,
    span: u32,
    strict_last: bool,
) -> Vec<Period> {
    let end_of_life = f64::from(built + span);
    horizon
        .periods()
        .iter()
        .copied()
        .filter(|&period| period >= built)
        .filter(|&period| match horizon.next(period) {
            Some(next) => f64::from(next) <= end_of_life,
            None if strict_last => horizon.end() < end_of_life,
            None => horizon.end() <= end_of_life,
        })
        .collect()
}

/// Derive the capacity bookkeeping for a family of asset rows.
///
/// # Arguments
///
/// * `rows` - Every row with its capacity bounds and financing parameters
/// * `horizon` - The periods of an intertemporal run, or `None` for a single period
pub fn derive_asset_index<'a, K, I>(rows: I, horizon: Option<&Horizon>) -> Result<AssetIndex<K>>
where
    K: AssetKey + 'a,
    I: Iterator<Item = (&'a K, &'a CapacityBounds, &'a Financing)>,
{
    let rows: Vec<_> = rows.collect();
    for (key, bounds, _) in &rows {
        if bounds.installed > bounds.upper {
            warn!(
                "{key} has installed capacity {} above its upper bound {}, so its capacity is \
                 fixed at the installed capacity",
                bounds.installed, bounds.upper
            );
        }
    }

    let expandable: IndexSet<K> = rows
        .iter()
        .filter(|(_, bounds, _)| bounds.is_expandable())
        .map(|(key, _, _)| (*key).clone())
        .collect();

    let Some(horizon) = horizon else {
        return Ok(AssetIndex {
            built: rows
                .iter()
                .map(|(key, _, _)| {
                    let built = if expandable.contains(*key) {
                        vec![(*key).clone()]
                    } else {
                        Vec::new()
                    };
                    ((*key).clone(), built)
                })
                .collect(),
            installed: rows
                .iter()
                .map(|(key, bounds, _)| ((*key).clone(), bounds.installed))
                .collect(),
            expandable,
        });
    };

    let mut built: IndexMap<K, Vec<K>> = rows
        .iter()
        .map(|(key, _, _)| ((*key).clone(), Vec::new()))
        .collect();
    let mut installed: IndexMap<K, f64> = rows
        .iter()
        .map(|(key, _, _)| ((*key).clone(), 0.0))
        .collect();

    for (key, _, financing) in rows.iter().filter(|(key, _, _)| expandable.contains(*key)) {
        let periods = operational_periods(horizon, key.period(), financing.depreciation, false);
        ensure!(
            !periods.is_empty(),
            "{key} can be expanded, but new capacity would not operate in any period as its \
             depreciation period of {} years ends too early",
            financing.depreciation
        );
        for period in periods {
            if let Some(operating) = built.get_mut(&key.with_period(period)) {
                operating.push((*key).clone());
            }
        }
    }

    // Only capacity installed before the first period carries over
    for (key, bounds, financing) in rows
        .iter()
        .filter(|(key, bounds, _)| key.period() == horizon.first() && bounds.installed > 0.0)
    {
        let lifetime = financing
            .lifetime
            .with_context(|| format!("{key} has installed capacity but no lifetime"))?;
        for period in operational_periods(horizon, horizon.first(), lifetime, true) {
            if let Some(value) = installed.get_mut(&key.with_period(period)) {
                *value = bounds.installed;
            }
        }
    }

    Ok(AssetIndex {
        expandable,
        built,
        installed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::global::GlobalPropertiesMap;
    use crate::process::ProcessKey;
    use crate::units::Dimensionless;
    use rstest::{fixture, rstest};

    #[fixture]
    fn horizon() -> Horizon {
        let mut global = GlobalPropertiesMap::default();
        global.entry(2020).set("Discount rate", 0.03).unwrap();
        global.entry(2030).set("Discount rate", 0.03).unwrap();
        global.entry(2040).set("Weight", 10.0).unwrap();
        Horizon::new(&global).unwrap()
    }

    fn financing(depreciation: u32, lifetime: Option<u32>) -> Financing {
        Financing {
            wacc: Dimensionless(0.07),
            depreciation,
            lifetime,
        }
    }

    fn bounds(installed: f64, upper: f64) -> CapacityBounds {
        CapacityBounds {
            installed,
            lower: 0.0,
            upper,
        }
    }

    #[rstest]
    #[case(2020, 30, false, vec![2020, 2030, 2040])]
    #[case(2020, 20, false, vec![2020, 2030])]
    #[case(2020, 29, false, vec![2020, 2030, 2040])]
    #[case(2030, 10, false, vec![2030])]
    #[case(2030, 5, false, vec![])]
    #[case(2040, 10, false, vec![2040])]
    #[case(2040, 8, false, vec![])]
    #[case(2020, 29, true, vec![2020, 2030])]
    #[case(2020, 30, true, vec![2020, 2030, 2040])]
    fn test_operational_periods(
        horizon: Horizon,
        #[case] built: Period,
        #[case] span: u32,
        #[case] strict_last: bool,
        #[case] expected: Vec<Period>,
    ) {
        assert_eq!(
            operational_periods(&horizon, built, span, strict_last),
            expected
        );
    }

    #[test]
    fn test_derive_single_period() {
        let fixed = ProcessKey::new(2020, &"North".into(), &"Coal plant".into());
        let expandable = ProcessKey::new(2020, &"North".into(), &"Photovoltaics".into());
        let rows = [
            (fixed.clone(), bounds(100.0, 100.0), financing(40, None)),
            (expandable.clone(), bounds(0.0, f64::INFINITY), financing(25, None)),
        ];
        let index =
            derive_asset_index(rows.iter().map(|(k, b, f)| (k, b, f)), None).unwrap();

        assert!(!index.is_variable(&fixed));
        assert_eq!(index.installed_capacity(&fixed), 100.0);
        assert!(index.is_variable(&expandable));
        assert_eq!(index.built_in(&expandable), [expandable.clone()]);
        assert_eq!(index.expandable.len(), 1);
    }

    #[rstest]
    fn test_derive_intertemporal(horizon: Horizon) {
        let key = |period| ProcessKey::new(period, &"North".into(), &"Gas plant".into());
        let rows = [
            (key(2020), bounds(50.0, f64::INFINITY), financing(20, Some(15))),
            (key(2030), bounds(0.0, f64::INFINITY), financing(10, None)),
            (key(2040), bounds(0.0, 0.0), financing(20, None)),
        ];
        let index =
            derive_asset_index(rows.iter().map(|(k, b, f)| (k, b, f)), Some(&horizon)).unwrap();

        assert_eq!(index.built_in(&key(2020)), [key(2020)]);
        assert_eq!(index.built_in(&key(2030)), [key(2020), key(2030)]);
        assert!(index.built_in(&key(2040)).is_empty());
        assert!(!index.is_variable(&key(2040)));

        // Installed capacity lasts 15 years, so only reaches the start of 2030
        assert_eq!(index.installed_capacity(&key(2020)), 50.0);
        assert_eq!(index.installed_capacity(&key(2030)), 0.0);
    }

    #[rstest]
    fn test_derive_intertemporal_missing_lifetime(horizon: Horizon) {
        let key = ProcessKey::new(2020, &"North".into(), &"Gas plant".into());
        let rows = [(key, bounds(50.0, 50.0), financing(20, None))];
        assert_error!(
            derive_asset_index(rows.iter().map(|(k, b, f)| (k, b, f)), Some(&horizon)),
            "(2020, North, Gas plant) has installed capacity but no lifetime"
        );
    }

    #[rstest]
    #[case(2030, 5)]
    #[case(2040, 8)]
    fn test_derive_intertemporal_short_depreciation(
        horizon: Horizon,
        #[case] period: Period,
        #[case] depreciation: u32,
    ) {
        let key = ProcessKey::new(period, &"North".into(), &"Gas plant".into());
        let rows = [(key, bounds(0.0, f64::INFINITY), financing(depreciation, None))];
        assert_error!(
            derive_asset_index(rows.iter().map(|(k, b, f)| (k, b, f)), Some(&horizon)),
            format!(
                "({period}, North, Gas plant) can be expanded, but new capacity would not \
                 operate in any period as its depreciation period of {depreciation} years ends \
                 too early"
            )
        );
    }

    #[test]
    fn test_derive_installed_above_upper() {
        let key = ProcessKey::new(2020, &"North".into(), &"Coal plant".into());
        let rows = [(key.clone(), bounds(120.0, 100.0), financing(40, None))];
        let index =
            derive_asset_index(rows.iter().map(|(k, b, f)| (k, b, f)), None).unwrap();

        // The row cannot be expanded and keeps its installed capacity
        assert!(index.expandable.is_empty());
        assert!(!index.is_variable(&key));
        assert_eq!(index.installed_capacity(&key), 120.0);
    }
}
