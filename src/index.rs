//! Derivation of the index sets used when assembling the optimisation problem.
//!
//! Everything here is a pure function of the [`Model`]: no variables or constraints are created.
use crate::commodity::{CommodityKey, CommodityType};
use crate::dsm::DsmKey;
use crate::global::{Horizon, Period};
use crate::id::{CommodityID, SiteID};
use crate::model::Model;
use crate::process::{FlowDirection, ProcessKey};
use crate::storage::StorageKey;
use crate::transmission::TransmissionKey;
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use log::debug;

pub mod dsm;
pub use dsm::DsmWindows;
pub mod lifetime;
pub use lifetime::{AssetIndex, derive_asset_index, operational_periods};

/// One commodity flow of a process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessFlow {
    /// The commodity
    pub commodity: CommodityID,
    /// Flow per unit of throughput at full load
    pub ratio: f64,
    /// Flow per unit of throughput at minimum load, if the flow has a partial-load ratio
    pub ratio_min: Option<f64>,
}

/// The entities contributing to the balance of a commodity at a site
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceTerms {
    /// Processes consuming the commodity
    pub process_inputs: Vec<ProcessKey>,
    /// Processes producing the commodity
    pub process_outputs: Vec<ProcessKey>,
    /// Transmission links leaving the site
    pub transmission_out: Vec<TransmissionKey>,
    /// Transmission links arriving at the site
    pub transmission_in: Vec<TransmissionKey>,
    /// Storage units at the site
    pub storages: Vec<StorageKey>,
}

/// Every index set consumed by the constraint assemblers
#[derive(Debug, Clone)]
pub struct ModelIndex {
    /// The periods of an intertemporal run, or `None` for a single period
    pub horizon: Option<Horizon>,
    /// Capacity bookkeeping for processes
    pub processes: AssetIndex<ProcessKey>,
    /// Capacity bookkeeping for storage power
    pub storage_power: AssetIndex<StorageKey>,
    /// Capacity bookkeeping for storage content
    pub storage_energy: AssetIndex<StorageKey>,
    /// Capacity bookkeeping for transmission links
    pub transmissions: AssetIndex<TransmissionKey>,
    /// Input flows of every process
    pub inputs: IndexMap<ProcessKey, Vec<ProcessFlow>>,
    /// Output flows of every process
    pub outputs: IndexMap<ProcessKey, Vec<ProcessFlow>>,
    /// Processes operating with partial-load efficiency
    pub partial: IndexSet<ProcessKey>,
    /// For each site with a limited area, the processes using that area
    pub area: IndexMap<(Period, SiteID), Vec<ProcessKey>>,
    /// Pairs of processes buying and selling over the same connection
    pub buy_sell_pairs: Vec<(ProcessKey, ProcessKey)>,
    /// Both directions of each transmission link, listed once
    pub transmission_pairs: Vec<(TransmissionKey, TransmissionKey)>,
    /// Balance contributions for every commodity
    pub balance: IndexMap<CommodityKey, BalanceTerms>,
    /// Time windows of every DSM resource
    pub dsm: IndexMap<DsmKey, DsmWindows>,
}

impl ModelIndex {
    /// Derive every index set for the model.
    ///
    /// Fails if the tables are inconsistent with one another or with the enabled features.
    pub fn derive(model: &Model) -> Result<Self> {
        check_features(model)?;
        let horizon = model
            .features
            .intertemporal
            .then(|| Horizon::new(&model.global))
            .transpose()?;

        let processes = derive_asset_index(
            model
                .processes
                .iter()
                .map(|(key, process)| (key, &process.capacity, &process.financing)),
            horizon.as_ref(),
        )?;
        let storage_power = derive_asset_index(
            model
                .storages
                .iter()
                .map(|(key, storage)| (key, &storage.power, &storage.financing)),
            horizon.as_ref(),
        )?;
        let storage_energy = derive_asset_index(
            model
                .storages
                .iter()
                .map(|(key, storage)| (key, &storage.energy, &storage.financing)),
            horizon.as_ref(),
        )?;
        let transmissions = derive_asset_index(
            model
                .transmissions
                .iter()
                .map(|(key, transmission)| (key, &transmission.capacity, &transmission.financing)),
            horizon.as_ref(),
        )?;

        let (inputs, outputs) = derive_flows(model)?;
        let partial = derive_partial(model, &inputs, &outputs)?;
        let index = Self {
            area: derive_area(model),
            buy_sell_pairs: derive_buy_sell_pairs(model, &inputs, &outputs),
            transmission_pairs: derive_transmission_pairs(model, &transmissions)?,
            balance: derive_balance(model, &inputs, &outputs)?,
            dsm: derive_dsm(model)?,
            horizon,
            processes,
            storage_power,
            storage_energy,
            transmissions,
            inputs,
            outputs,
            partial,
        };

        debug!(
            "Derived index sets: {} expandable processes, {} partial-load processes, \
             {} area-limited sites, {} buy/sell pairs, {} transmission pairs",
            index.processes.expandable.len(),
            index.partial.len(),
            index.area.len(),
            index.buy_sell_pairs.len(),
            index.transmission_pairs.len()
        );

        Ok(index)
    }
}

/// Check that the tables are consistent with the enabled features
fn check_features(model: &Model) -> Result<()> {
    if !model.features.buy_sell_price {
        for kind in [CommodityType::Buy, CommodityType::Sell] {
            if let Some(key) = model.iter_commodities_of_type(kind).next() {
                anyhow::bail!("Commodity {key} is bought or sold but no buy/sell prices were given");
            }
        }
    }
    if model.features.intertemporal {
        model
            .global
            .discount_rate()
            .context("A discount rate is required when modelling more than one period")?;
    }

    Ok(())
}

type FlowMap = IndexMap<ProcessKey, Vec<ProcessFlow>>;

/// Gather the input and output flows of every process, checking each commodity is known at the
/// process's site
fn derive_flows(model: &Model) -> Result<(FlowMap, FlowMap)> {
    let mut inputs = FlowMap::new();
    let mut outputs = FlowMap::new();
    for key in model.processes.keys() {
        let mut process_inputs = Vec::new();
        let mut process_outputs = Vec::new();
        for (pc_key, ratio) in model
            .process_commodities
            .iter()
            .filter(|(pc_key, _)| pc_key.period == key.period && pc_key.process == key.process)
        {
            let commodity_key = CommodityKey::new(key.period, &key.site, &pc_key.commodity);
            ensure!(
                model.commodities.contains_key(&commodity_key),
                "Process {key} uses commodity {}, which is not defined at site {}",
                pc_key.commodity,
                key.site
            );

            // Only strictly positive minimum-load ratios enable partial-load operation
            let flow = ProcessFlow {
                commodity: pc_key.commodity.clone(),
                ratio: ratio.ratio,
                ratio_min: ratio.ratio_min.filter(|ratio_min| *ratio_min > 0.0),
            };
            match pc_key.direction {
                FlowDirection::In => process_inputs.push(flow),
                FlowDirection::Out => process_outputs.push(flow),
            }
        }
        inputs.insert(key.clone(), process_inputs);
        outputs.insert(key.clone(), process_outputs);
    }

    Ok((inputs, outputs))
}

/// Find processes with partial-load flows, rejecting those which cannot use the interpolation
fn derive_partial(model: &Model, inputs: &FlowMap, outputs: &FlowMap) -> Result<IndexSet<ProcessKey>> {
    let mut partial = IndexSet::new();
    for (key, process) in model.processes.iter() {
        let has_partial = inputs[key]
            .iter()
            .chain(outputs[key].iter())
            .any(|flow| flow.ratio_min.is_some());
        if !has_partial {
            continue;
        }

        ensure!(
            process.min_fraction < 1.0,
            "Process {key} has min-fraction {}, which must be below 1",
            process.min_fraction
        );
        partial.insert(key.clone());
    }

    Ok(partial)
}

/// Find sites whose area limits the capacity of the processes there
fn derive_area(model: &Model) -> IndexMap<(Period, SiteID), Vec<ProcessKey>> {
    let mut area = IndexMap::new();
    for ((period, site), site_data) in model.sites.iter() {
        if site_data.area.is_none() {
            continue;
        }

        let (processes, total): (Vec<_>, f64) = model
            .processes
            .iter()
            .filter(|(key, _)| key.period == *period && key.site == *site)
            .filter_map(|(key, process)| Some((key.clone(), process.area_per_cap?)))
            .fold((Vec::new(), 0.0), |(mut keys, total), (key, area_per_cap)| {
                keys.push(key);
                (keys, total + area_per_cap)
            });

        // Processes which use no area cannot be limited by it
        if total > 0.0 {
            area.insert((*period, site.clone()), processes);
        }
    }

    area
}

/// Pair each process buying a commodity with a process selling over the same connection.
///
/// The buy process takes a `Buy` commodity as input. Its partner takes one of the buy process's
/// outputs as input and produces a `Sell` commodity, at the same site and period.
fn derive_buy_sell_pairs(
    model: &Model,
    inputs: &FlowMap,
    outputs: &FlowMap,
) -> Vec<(ProcessKey, ProcessKey)> {
    let is_kind = |key: &ProcessKey, flow: &ProcessFlow, kind| {
        model
            .commodities
            .get(&CommodityKey::new(key.period, &key.site, &flow.commodity))
            .is_some_and(|commodity| commodity.is(kind))
    };

    let mut pairs = Vec::new();
    for buy in model.processes.keys() {
        if !inputs[buy]
            .iter()
            .any(|flow| is_kind(buy, flow, CommodityType::Buy))
        {
            continue;
        }

        let sell = model.processes.keys().find(|sell| {
            *sell != buy
                && sell.period == buy.period
                && sell.site == buy.site
                && outputs[*sell]
                    .iter()
                    .any(|flow| is_kind(sell, flow, CommodityType::Sell))
                && inputs[*sell].iter().any(|sell_input| {
                    outputs[buy]
                        .iter()
                        .any(|buy_output| buy_output.commodity == sell_input.commodity)
                })
        });
        if let Some(sell) = sell {
            pairs.push((buy.clone(), sell.clone()));
        }
    }

    pairs
}

/// List each transmission link once with its reverse direction
#[allow(clippy::float_cmp)]
fn derive_transmission_pairs(
    model: &Model,
    index: &AssetIndex<TransmissionKey>,
) -> Result<Vec<(TransmissionKey, TransmissionKey)>> {
    let mut pairs = Vec::new();
    for key in model.transmissions.keys() {
        let reversed = key.reversed();
        ensure!(
            model.transmissions.contains_key(&reversed),
            "Transmission {key} has no reverse direction"
        );
        if key.site_in > key.site_out {
            continue;
        }

        if !index.is_variable(key) && !index.is_variable(&reversed) {
            let (forward, backward) = (
                index.installed_capacity(key),
                index.installed_capacity(&reversed),
            );
            ensure!(
                forward == backward,
                "Transmission {key} has fixed capacity {forward} but its reverse direction has \
                 fixed capacity {backward}"
            );
        }
        pairs.push((key.clone(), reversed));
    }

    Ok(pairs)
}

/// Work out which entities contribute to the balance of each commodity
fn derive_balance(
    model: &Model,
    inputs: &FlowMap,
    outputs: &FlowMap,
) -> Result<IndexMap<CommodityKey, BalanceTerms>> {
    let mut balance: IndexMap<CommodityKey, BalanceTerms> = model
        .commodities
        .keys()
        .map(|key| (key.clone(), BalanceTerms::default()))
        .collect();

    for (key, flows) in inputs.iter() {
        for flow in flows {
            let commodity_key = CommodityKey::new(key.period, &key.site, &flow.commodity);
            balance[&commodity_key].process_inputs.push(key.clone());
        }
    }
    for (key, flows) in outputs.iter() {
        for flow in flows {
            let commodity_key = CommodityKey::new(key.period, &key.site, &flow.commodity);
            balance[&commodity_key].process_outputs.push(key.clone());
        }
    }

    for key in model.transmissions.keys() {
        for (site, outgoing) in [(&key.site_in, true), (&key.site_out, false)] {
            let commodity_key = CommodityKey::new(key.period, site, &key.commodity);
            let terms = balance.get_mut(&commodity_key).with_context(|| {
                format!(
                    "Transmission {key} carries commodity {}, which is not defined at site {site}",
                    key.commodity
                )
            })?;
            if outgoing {
                terms.transmission_out.push(key.clone());
            } else {
                terms.transmission_in.push(key.clone());
            }
        }
    }

    for key in model.storages.keys() {
        let commodity_key = CommodityKey::new(key.period, &key.site, &key.commodity);
        balance
            .get_mut(&commodity_key)
            .with_context(|| {
                format!(
                    "Storage {key} stores commodity {}, which is not defined at site {}",
                    key.commodity, key.site
                )
            })?
            .storages
            .push(key.clone());
    }

    Ok(balance)
}

/// Derive the time windows of every DSM resource
fn derive_dsm(model: &Model) -> Result<IndexMap<DsmKey, DsmWindows>> {
    model
        .dsm
        .iter()
        .map(|(key, resource)| {
            let commodity_key = CommodityKey::new(key.period, &key.site, &key.commodity);
            let commodity = model.commodities.get(&commodity_key).with_context(|| {
                format!("DSM resource {key} shifts a commodity which is not defined at its site")
            })?;
            ensure!(
                commodity.is_balanced(),
                "DSM resource {key} must shift a balanced commodity"
            );

            Ok((key.clone(), DsmWindows::new(resource, &model.time)))
        })
        .collect()
}
