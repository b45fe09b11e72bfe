//! Commodities are the goods (energy carriers, materials, emissions) that flow through the system.
use crate::global::Period;
use crate::id::{CommodityID, SiteID};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;

/// A map of [`Commodity`] rows, keyed by period, site and commodity
pub type CommodityMap = IndexMap<CommodityKey, Commodity>;

/// Identifies a commodity at a site in a given period
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {site}, {commodity})")]
pub struct CommodityKey {
    /// The period
    pub period: Period,
    /// The site
    pub site: SiteID,
    /// The commodity
    pub commodity: CommodityID,
}

impl CommodityKey {
    /// Create a new [`CommodityKey`]
    pub fn new(period: Period, site: &SiteID, commodity: &CommodityID) -> Self {
        Self {
            period,
            site: site.clone(),
            commodity: commodity.clone(),
        }
    }
}

/// Identifies a buy/sell price series.
///
/// The name is either `site.commodity` or just `commodity`, the latter applying at every site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("({period}, {name})")]
pub struct PriceKey {
    /// The period
    pub period: Period,
    /// The name of the price series
    pub name: String,
}

impl PriceKey {
    /// Candidate keys for a commodity at a site, most specific first
    pub fn candidates(key: &CommodityKey) -> [Self; 2] {
        [
            Self {
                period: key.period,
                name: format!("{}.{}", key.site, key.commodity),
            },
            Self {
                period: key.period,
                name: key.commodity.to_string(),
            },
        ]
    }
}

/// The role a commodity plays in the commodity balance
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, DeserializeLabeledStringEnum)]
pub enum CommodityType {
    /// Can be bought from outside the system at a fixed price
    #[string = "Stock"]
    Stock,
    /// Intermittent supply (e.g. solar irradiation) following a time series
    #[string = "SupIm"]
    SupIm,
    /// Has an exogenous demand time series which must be met
    #[string = "Demand"]
    Demand,
    /// Environmental output (e.g. CO2), whose creation may be limited and priced
    #[string = "Env"]
    Env,
    /// Can be sold to an external market
    #[string = "Sell"]
    Sell,
    /// Can be bought from an external market
    #[string = "Buy"]
    Buy,
}

/// A commodity at a site in a given period
#[derive(PartialEq, Debug, Clone)]
pub struct Commodity {
    /// The type of commodity, if any. Untyped commodities are intermediate products.
    pub kind: Option<CommodityType>,
    /// Price per unit (fuel price, emission price or base market price)
    pub price: f64,
    /// Maximum annual quantity
    pub max: f64,
    /// Maximum quantity per timestep
    pub max_per_step: f64,
}

impl Commodity {
    /// Whether the commodity is of the given type
    pub fn is(&self, kind: CommodityType) -> bool {
        self.kind == Some(kind)
    }

    /// Whether the commodity is subject to the vertex (balance) equation.
    ///
    /// Intermittent supply and environmental commodities are not balanced.
    pub fn is_balanced(&self) -> bool {
        !matches!(self.kind, Some(CommodityType::Env | CommodityType::SupIm))
    }
}
