//! Sites are the locations at which commodities are balanced.
use crate::global::Period;
use crate::id::SiteID;
use indexmap::IndexMap;

/// A map of [`Site`]s, keyed by period and site ID
pub type SiteMap = IndexMap<(Period, SiteID), Site>;

/// A site in a given period
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Site {
    /// Land area available to processes with an area requirement. `None` means unlimited.
    pub area: Option<f64>,
}
