//! Cost categories, their definitions and the objective.
use super::AssemblyContext;
use super::commodity::annual_emissions;
use crate::commodity::{CommodityKey, CommodityType, PriceKey};
use crate::model::{Model, Objective};
use crate::problem::{
    Constraint, ConstraintIndex, ConstraintKind, LinExpr, ProblemBuilder, VariableDefinition,
    VariableKey,
};
use crate::time::Timestep;
use anyhow::{Context, Result, bail};
use strum::IntoEnumIterator;

/// A category of cost, each with its own cost variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter)]
pub enum CostType {
    /// Annualised investment in new capacity
    Invest,
    /// Fixed operation and maintenance, proportional to capacity
    Fixed,
    /// Variable costs, proportional to operation
    Variable,
    /// Purchase of stock commodities
    Fuel,
    /// Income from selling commodities (a negative cost)
    Revenue,
    /// Buying commodities from a market
    Purchase,
    /// Taxes on environmental commodities
    Environmental,
}

/// Declare one free variable per cost category
pub fn add_variables(builder: &mut ProblemBuilder) {
    for cost_type in CostType::iter() {
        builder.add_variable(VariableKey::Cost(cost_type), VariableDefinition::free());
    }
}

/// Define every cost variable and apply the global cost limit
pub fn constraints(ctx: &AssemblyContext) -> Result<Vec<Constraint>> {
    let mut constraints = Vec::new();
    for cost_type in CostType::iter() {
        let mut expr = LinExpr::term(ctx.var(VariableKey::Cost(cost_type)), 1.0);
        expr.add_scaled(&cost_expression(ctx, cost_type)?, -1.0);
        constraints.push(Constraint::equal(
            ConstraintKind::DefCosts,
            ConstraintIndex::Cost(cost_type),
            expr,
            0.0,
        ));
    }

    if let Some(limit) = ctx
        .model
        .global
        .first()
        .and_then(|props| props.cost_limit)
        .filter(|limit| limit.is_finite())
    {
        let mut total = LinExpr::new();
        for cost_type in CostType::iter() {
            total.add_term(ctx.var(VariableKey::Cost(cost_type)), 1.0);
        }
        constraints.push(Constraint::at_most(
            ConstraintKind::ResGlobalCostLimit,
            ConstraintIndex::Global(ctx.model.periods()[0]),
            total,
            limit,
        ));
    }

    Ok(constraints)
}

/// The objective: total cost or total emissions
pub fn objective(ctx: &AssemblyContext) -> LinExpr {
    let mut expr = LinExpr::new();
    match ctx.model.parameters.objective {
        Objective::Cost => {
            for cost_type in CostType::iter() {
                expr.add_term(ctx.var(VariableKey::Cost(cost_type)), 1.0);
            }
        }
        Objective::Environmental => {
            for period in ctx.model.periods() {
                expr.add_scaled(&annual_emissions(ctx, period), ctx.factors.distance(period));
            }
        }
    }

    expr
}

/// The sum of all contributions to a cost category
fn cost_expression(ctx: &AssemblyContext, cost_type: CostType) -> Result<LinExpr> {
    let mut expr = LinExpr::new();
    match cost_type {
        CostType::Invest => add_invest_costs(ctx, &mut expr),
        CostType::Fixed => add_fixed_costs(ctx, &mut expr),
        CostType::Variable => add_variable_costs(ctx, &mut expr),
        CostType::Fuel => add_commodity_costs(ctx, CommodityType::Stock, &mut expr)?,
        CostType::Revenue => add_commodity_costs(ctx, CommodityType::Sell, &mut expr)?,
        CostType::Purchase => add_commodity_costs(ctx, CommodityType::Buy, &mut expr)?,
        CostType::Environmental => add_commodity_costs(ctx, CommodityType::Env, &mut expr)?,
    }

    Ok(expr)
}

fn add_invest_costs(ctx: &AssemblyContext, expr: &mut LinExpr) {
    let (model, factors) = (ctx.model, ctx.factors);
    for (key, factor) in &factors.process_invest {
        expr.add_term(
            ctx.var(VariableKey::ProcessNewCapacity(key.clone())),
            model.processes[key].inv_cost * factor,
        );
    }

    if model.features.transmission {
        for (key, factor) in &factors.transmission_invest {
            expr.add_term(
                ctx.var(VariableKey::TransmissionNewCapacity(key.clone())),
                model.transmissions[key].inv_cost * factor,
            );
        }
    }

    if model.features.storage {
        for (key, factor) in &factors.storage_invest {
            let storage = &model.storages[key];
            if ctx.index.storage_power.expandable.contains(key) {
                expr.add_term(
                    ctx.var(VariableKey::StorageNewPower(key.clone())),
                    storage.inv_cost_p * factor,
                );
            }
            if ctx.index.storage_energy.expandable.contains(key) {
                expr.add_term(
                    ctx.var(VariableKey::StorageNewEnergy(key.clone())),
                    storage.inv_cost_c * factor,
                );
            }
        }
    }
}

fn add_fixed_costs(ctx: &AssemblyContext, expr: &mut LinExpr) {
    let model = ctx.model;
    for (key, process) in &model.processes {
        let factor = ctx.factors.cost_factor(key.period);
        expr.add_capacity(ctx.process_capacity(key), process.fix_cost * factor);
    }

    if model.features.transmission {
        for (key, transmission) in &model.transmissions {
            let factor = ctx.factors.cost_factor(key.period);
            expr.add_capacity(
                ctx.transmission_capacity(key),
                transmission.fix_cost * factor,
            );
        }
    }

    if model.features.storage {
        for (key, storage) in &model.storages {
            let factor = ctx.factors.cost_factor(key.period);
            expr.add_capacity(ctx.storage_power(key), storage.fix_cost_p * factor)
                .add_capacity(ctx.storage_energy(key), storage.fix_cost_c * factor);
        }
    }
}

fn add_variable_costs(ctx: &AssemblyContext, expr: &mut LinExpr) {
    let model = ctx.model;
    let time = &model.time;
    let (dt, weight) = (time.dt(), time.weight());

    for &t in time.modelled() {
        for (key, process) in &model.processes {
            let factor = ctx.factors.cost_factor(key.period);
            expr.add_term(
                ctx.var(VariableKey::ProcessThroughput(t, key.clone())),
                dt * weight * process.var_cost * factor,
            );
        }

        if model.features.transmission {
            for (key, transmission) in &model.transmissions {
                let factor = ctx.factors.cost_factor(key.period);
                expr.add_term(
                    ctx.var(VariableKey::TransmissionInput(t, key.clone())),
                    dt * weight * transmission.var_cost * factor,
                );
            }
        }

        if model.features.storage {
            for (key, storage) in &model.storages {
                let factor = ctx.factors.cost_factor(key.period);
                let power_cost = dt * weight * storage.var_cost_p * factor;
                expr.add_term(
                    ctx.var(VariableKey::StorageContent(t, key.clone())),
                    weight * storage.var_cost_c * factor,
                )
                .add_term(ctx.var(VariableKey::StorageInput(t, key.clone())), power_cost)
                .add_term(ctx.var(VariableKey::StorageOutput(t, key.clone())), power_cost);
            }
        }
    }
}

/// Costs of stock purchase, selling, buying and environmental taxes.
///
/// Selling yields revenue, so its contribution is negative. Environmental costs are charged on
/// net creation of the commodity.
fn add_commodity_costs(
    ctx: &AssemblyContext,
    kind: CommodityType,
    expr: &mut LinExpr,
) -> Result<()> {
    let time = &ctx.model.time;
    for (key, commodity) in ctx
        .model
        .commodities
        .iter()
        .filter(|(_, commodity)| commodity.is(kind))
    {
        let price_key = match kind {
            CommodityType::Sell | CommodityType::Buy => Some(price_series(ctx.model, key)?),
            _ => None,
        };
        let factor = ctx.factors.cost_factor(key.period);

        for &t in time.modelled() {
            let mut price = commodity.price * time.dt() * time.weight() * factor;
            if let Some(price_key) = &price_key {
                price *= market_price(ctx.model, price_key, t)?;
            }

            match kind {
                CommodityType::Stock => {
                    expr.add_term(ctx.var(VariableKey::StockSource(t, key.clone())), price);
                }
                CommodityType::Sell => {
                    expr.add_term(ctx.var(VariableKey::SellSource(t, key.clone())), -price);
                }
                CommodityType::Buy => {
                    expr.add_term(ctx.var(VariableKey::BuySource(t, key.clone())), price);
                }
                CommodityType::Env => {
                    expr.add_scaled(&ctx.balance(key, t), -price);
                }
                CommodityType::Demand | CommodityType::SupIm => {}
            }
        }
    }

    Ok(())
}

/// Find the buy/sell price series of a commodity.
///
/// A series named `site.commodity` takes precedence over one named after the commodity alone.
pub fn price_series(model: &Model, key: &CommodityKey) -> Result<PriceKey> {
    let candidates = PriceKey::candidates(key);
    if let Some(found) = candidates
        .iter()
        .find(|candidate| model.buy_sell_price.contains_key(*candidate))
    {
        return Ok(found.clone());
    }

    let [specific, generic] = &candidates;
    bail!(
        "Missing buy/sell price series for commodity {} (tried keys {}, {})",
        key.commodity,
        specific.name,
        generic.name
    )
}

fn market_price(model: &Model, key: &PriceKey, t: Timestep) -> Result<f64> {
    model
        .buy_sell_price
        .get(key, t)
        .with_context(|| format!("Buy/sell price series {key} has no value for timestep {t}"))
}
