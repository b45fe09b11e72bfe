//! Fixtures for tests
use crate::asset::{AssetKey, CapacityBounds, Financing};
use crate::commodity::{Commodity, CommodityKey, CommodityType};
use crate::features::FeatureFlags;
use crate::global::GlobalPropertiesMap;
use crate::model::{Model, ModelParameters};
use crate::process::{
    FlowDirection, Process, ProcessCommodity, ProcessCommodityKey, ProcessKey,
};
use crate::site::Site;
use crate::storage::{Storage, StorageKey};
use crate::time::{TimeInfo, TimeSeriesMap};
use crate::units::Dimensionless;
use indexmap::{IndexMap, indexmap};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Demand for electricity at each modelled timestep
pub const ELEC_DEMAND: [f64; 4] = [50.0, 60.0, 70.0, 60.0];

/// Solar availability at each modelled timestep
pub const SOLAR_SUPPLY: [f64; 4] = [0.0, 0.5, 0.8, 0.3];

/// Financing of a new asset
pub fn financing() -> Financing {
    Financing {
        wacc: Dimensionless(0.07),
        depreciation: 25,
        lifetime: None,
    }
}

fn commodity(kind: CommodityType, price: f64) -> Commodity {
    Commodity {
        kind: Some(kind),
        price,
        max: f64::INFINITY,
        max_per_step: f64::INFINITY,
    }
}

/// An expandable battery on the electricity commodity
pub fn battery() -> Storage {
    let bounds = CapacityBounds {
        installed: 0.0,
        lower: 0.0,
        upper: f64::INFINITY,
    };
    Storage {
        power: bounds,
        energy: bounds,
        eff_in: 0.9,
        eff_out: 0.9,
        discharge: 0.0,
        init: Some(0.5),
        ep_ratio: None,
        inv_cost_p: 100_000.0,
        inv_cost_c: 50_000.0,
        fix_cost_p: 1000.0,
        fix_cost_c: 500.0,
        var_cost_p: 0.01,
        var_cost_c: 0.0,
        financing: financing(),
    }
}

/// A single-period model of one site, with a fixed coal plant, expandable solar and a battery.
///
/// Timestep 0 is the initialisation step and 1 to 4 are modelled.
#[fixture]
pub fn model() -> Model {
    let north = "North".into();
    let key = |name: &str| CommodityKey::new(2020, &north, &name.into());
    let process = |name: &str| ProcessKey::new(2020, &north, &name.into());
    let flow = |process: &str, commodity: &str, direction, ratio| {
        (
            ProcessCommodityKey {
                period: 2020,
                process: process.into(),
                commodity: commodity.into(),
                direction,
            },
            ProcessCommodity {
                ratio,
                ratio_min: None,
            },
        )
    };

    let mut global = GlobalPropertiesMap::default();
    global.entry(2020);

    let mut demand = TimeSeriesMap::default();
    let mut supim = TimeSeriesMap::default();
    for (t, (elec, solar)) in (1..).zip(ELEC_DEMAND.into_iter().zip(SOLAR_SUPPLY)) {
        demand.insert(key("Elec"), t, elec).unwrap();
        supim.insert(key("Solar"), t, solar).unwrap();
    }

    Model {
        parameters: ModelParameters::default(),
        time: TimeInfo::new((0..=4).collect(), 1.0).unwrap(),
        features: FeatureFlags {
            storage: true,
            ..FeatureFlags::default()
        },
        global,
        sites: indexmap! { (2020, north.clone()) => Site::default() },
        commodities: indexmap! {
            key("Coal") => commodity(CommodityType::Stock, 7.0),
            key("Solar") => commodity(CommodityType::SupIm, 0.0),
            key("Elec") => commodity(CommodityType::Demand, 0.0),
            key("CO2") => commodity(CommodityType::Env, 0.0),
        },
        processes: indexmap! {
            process("Coal plant") => Process {
                capacity: CapacityBounds {
                    installed: 100.0,
                    lower: 0.0,
                    upper: 100.0,
                },
                max_grad: f64::INFINITY,
                min_fraction: 0.0,
                inv_cost: 600_000.0,
                fix_cost: 10_000.0,
                var_cost: 0.6,
                financing: financing(),
                area_per_cap: None,
            },
            process("Photovoltaics") => Process {
                capacity: CapacityBounds {
                    installed: 0.0,
                    lower: 0.0,
                    upper: 1000.0,
                },
                max_grad: f64::INFINITY,
                min_fraction: 0.0,
                inv_cost: 800_000.0,
                fix_cost: 1000.0,
                var_cost: 0.0,
                financing: financing(),
                area_per_cap: Some(10.0),
            },
        },
        process_commodities: IndexMap::from_iter([
            flow("Coal plant", "Coal", FlowDirection::In, 2.2),
            flow("Coal plant", "Elec", FlowDirection::Out, 1.0),
            flow("Coal plant", "CO2", FlowDirection::Out, 0.8),
            flow("Photovoltaics", "Solar", FlowDirection::In, 1.0),
            flow("Photovoltaics", "Elec", FlowDirection::Out, 1.0),
        ]),
        transmissions: IndexMap::new(),
        storages: indexmap! {
            StorageKey {
                period: 2020,
                site: north.clone(),
                storage: "Battery".into(),
                commodity: "Elec".into(),
            } => battery(),
        },
        dsm: IndexMap::new(),
        demand,
        supim,
        buy_sell_price: TimeSeriesMap::default(),
        eff_factor: TimeSeriesMap::default(),
    }
}

/// The [`model`] fixture repeated for 2030, with each period representing ten years.
///
/// The battery is left out. Installed coal capacity lasts 30 years, so it carries over to 2030.
#[fixture]
pub fn two_period_model(mut model: Model) -> Model {
    let later = |key: &CommodityKey| CommodityKey {
        period: 2030,
        ..key.clone()
    };

    model.features.intertemporal = true;
    model.features.storage = false;
    model.storages.clear();
    model.global.entry(2020).discount_rate = Some(Dimensionless(0.03));
    model.global.entry(2030).weight = Some(10.0);
    model.sites.insert((2030, "North".into()), Site::default());
    model.processes[&ProcessKey::new(2020, &"North".into(), &"Coal plant".into())]
        .financing
        .lifetime = Some(30);

    let commodities: Vec<_> = model
        .commodities
        .iter()
        .map(|(key, commodity)| (later(key), commodity.clone()))
        .collect();
    model.commodities.extend(commodities);
    let processes: Vec<_> = model
        .processes
        .iter()
        .map(|(key, process)| (key.with_period(2030), process.clone()))
        .collect();
    model.processes.extend(processes);
    let flows: Vec<_> = model
        .process_commodities
        .iter()
        .map(|(key, flow)| {
            let key = ProcessCommodityKey {
                period: 2030,
                ..key.clone()
            };
            (key, *flow)
        })
        .collect();
    model.process_commodities.extend(flows);

    let north = "North".into();
    let key = |name: &str| CommodityKey::new(2030, &north, &name.into());
    for (t, (elec, solar)) in (1..).zip(ELEC_DEMAND.into_iter().zip(SOLAR_SUPPLY)) {
        model.demand.insert(key("Elec"), t, elec).unwrap();
        model.supim.insert(key("Solar"), t, solar).unwrap();
    }

    model
}
