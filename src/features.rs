//! The optional features which are enabled for a model.
use std::fmt;

/// Which optional features are enabled for a model.
///
/// Each flag activates one group of variables and constraints during assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Multiple periods with discounting and capacity carried between periods (`int`)
    pub intertemporal: bool,
    /// Transmission links between sites (`tra`)
    pub transmission: bool,
    /// Storage units (`sto`)
    pub storage: bool,
    /// Demand-side management (`dsm`)
    pub dsm: bool,
    /// Buy/sell commodities with price time series (`bsp`)
    pub buy_sell_price: bool,
    /// Time-varying process efficiency (`tve`)
    pub time_var_eff: bool,
}

impl FeatureFlags {
    /// Short names of the enabled features
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            (self.intertemporal, "int"),
            (self.transmission, "tra"),
            (self.storage, "sto"),
            (self.dsm, "dsm"),
            (self.buy_sell_price, "bsp"),
            (self.time_var_eff, "tve"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}

impl fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = self.enabled();
        if enabled.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", enabled.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(FeatureFlags::default().to_string(), "none");
        let flags = FeatureFlags {
            storage: true,
            dsm: true,
            ..Default::default()
        };
        assert_eq!(flags.to_string(), "sto, dsm");
    }
}
