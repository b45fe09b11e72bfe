//! Commodity balance and commodity limits.
use super::AssemblyContext;
use crate::commodity::{Commodity, CommodityKey, CommodityType};
use crate::dsm::DsmKey;
use crate::global::Period;
use crate::model::Model;
use crate::problem::{Constraint, ConstraintIndex, ConstraintKind, LinExpr, ProblemBuilder, VariableKey};
use crate::time::Timestep;
use anyhow::Result;
use log::warn;

/// The source variable of a commodity type, if the type has one
fn source_variable(kind: CommodityType) -> Option<fn(Timestep, CommodityKey) -> VariableKey> {
    match kind {
        CommodityType::Stock => Some(VariableKey::StockSource),
        CommodityType::Sell => Some(VariableKey::SellSource),
        CommodityType::Buy => Some(VariableKey::BuySource),
        _ => None,
    }
}

/// Declare stock, sell and buy source variables
pub fn add_variables(builder: &mut ProblemBuilder, model: &Model) {
    for (key, commodity) in &model.commodities {
        let Some(variable) = commodity.kind.and_then(source_variable) else {
            continue;
        };
        builder.add_per_timestep(model.time.modelled(), |t| variable(t, key.clone()));
    }
}

/// Generate the vertex equations and the commodity limits
pub fn constraints(ctx: &AssemblyContext) -> Result<Vec<Constraint>> {
    let mut constraints = Vec::new();
    for (key, commodity) in &ctx.model.commodities {
        if commodity.is_balanced() {
            add_vertex(ctx, key, commodity, &mut constraints);
        }
        add_limits(ctx, key, commodity, &mut constraints);
    }

    for period in ctx.model.periods() {
        add_global_co2_limit(ctx, period, &mut constraints);
    }
    if ctx.index.horizon.is_some() {
        add_global_co2_budget(ctx, &mut constraints);
    }

    Ok(constraints)
}

/// Add the vertex equation for every modelled timestep.
///
/// Production, imports, discharging, stock purchase and buying must cover consumption, exports,
/// charging, selling and demand. Shifted demand moves consumption between timesteps.
fn add_vertex(
    ctx: &AssemblyContext,
    key: &CommodityKey,
    commodity: &Commodity,
    constraints: &mut Vec<Constraint>,
) {
    let dsm_key = DsmKey {
        period: key.period,
        site: key.site.clone(),
        commodity: key.commodity.clone(),
    };
    let windows = ctx
        .model
        .features
        .dsm
        .then(|| ctx.index.dsm.get(&dsm_key))
        .flatten();

    for &t in ctx.model.time.modelled() {
        let mut expr = LinExpr::new();
        expr.add_scaled(&ctx.balance(key, t), -1.0);
        match commodity.kind {
            Some(CommodityType::Stock) => {
                expr.add_term(ctx.var(VariableKey::StockSource(t, key.clone())), 1.0);
            }
            Some(CommodityType::Sell) => {
                expr.add_term(ctx.var(VariableKey::SellSource(t, key.clone())), -1.0);
            }
            Some(CommodityType::Buy) => {
                expr.add_term(ctx.var(VariableKey::BuySource(t, key.clone())), 1.0);
            }
            _ => {}
        }
        if let Some(windows) = windows {
            expr.add_term(ctx.var(VariableKey::DsmUp(t, dsm_key.clone())), -1.0);
            for tt in windows.incoming(t) {
                expr.add_term(ctx.var(VariableKey::DsmDown(tt, t, dsm_key.clone())), 1.0);
            }
        }

        let demand = if commodity.is(CommodityType::Demand) {
            ctx.model.demand.get(key, t).unwrap_or(0.0)
        } else {
            0.0
        };
        constraints.push(Constraint::equal(
            ConstraintKind::ResVertex,
            ConstraintIndex::CommodityStep(t, key.clone()),
            expr,
            demand,
        ));
    }
}

/// Add per-step and annualised limits for stock, sell, buy and environmental commodities.
///
/// Infinite limits are omitted.
fn add_limits(
    ctx: &AssemblyContext,
    key: &CommodityKey,
    commodity: &Commodity,
    constraints: &mut Vec<Constraint>,
) {
    let Some(kind) = commodity.kind else {
        return;
    };
    let (step_kind, total_kind) = match kind {
        CommodityType::Stock => (ConstraintKind::ResStockStep, ConstraintKind::ResStockTotal),
        CommodityType::Sell => (ConstraintKind::ResSellStep, ConstraintKind::ResSellTotal),
        CommodityType::Buy => (ConstraintKind::ResBuyStep, ConstraintKind::ResBuyTotal),
        CommodityType::Env => (ConstraintKind::ResEnvStep, ConstraintKind::ResEnvTotal),
        CommodityType::Demand | CommodityType::SupIm => return,
    };

    // The limited quantity at each timestep: the source variable or, for environmental
    // commodities, net creation
    let quantity = |t| match source_variable(kind) {
        Some(variable) => LinExpr::term(ctx.var(variable(t, key.clone())), 1.0),
        None => {
            let mut expr = LinExpr::new();
            expr.add_scaled(&ctx.balance(key, t), -1.0);
            expr
        }
    };
    let time = &ctx.model.time;

    if commodity.max_per_step.is_finite() {
        for &t in time.modelled() {
            let expr = quantity(t);
            if expr.has_no_terms() {
                continue;
            }
            constraints.push(Constraint::at_most(
                step_kind,
                ConstraintIndex::CommodityStep(t, key.clone()),
                expr,
                commodity.max_per_step,
            ));
        }
    }

    if commodity.max.is_finite() {
        let mut total = LinExpr::new();
        for &t in time.modelled() {
            total.add_scaled(&quantity(t), time.dt() * time.weight());
        }
        if !total.has_no_terms() {
            constraints.push(Constraint::at_most(
                total_kind,
                ConstraintIndex::Commodity(key.clone()),
                total,
                commodity.max,
            ));
        }
    }
}

/// Annualised net creation of the emission commodity over all sites in a period
pub fn annual_emissions(ctx: &AssemblyContext, period: Period) -> LinExpr {
    let time = &ctx.model.time;
    let mut expr = LinExpr::new();
    for key in ctx.model.commodities.keys().filter(|key| {
        key.period == period && key.commodity == ctx.model.parameters.emission_commodity
    }) {
        for &t in time.modelled() {
            expr.add_scaled(&ctx.balance(key, t), -time.dt() * time.weight());
        }
    }

    expr
}

/// Limit annual emissions in a period.
///
/// The constraint is omitted if there is no finite, non-negative limit.
fn add_global_co2_limit(ctx: &AssemblyContext, period: Period, constraints: &mut Vec<Constraint>) {
    let Some(limit) = ctx
        .model
        .global
        .get(period)
        .and_then(|props| props.co2_limit)
        .filter(|limit| limit.is_finite())
    else {
        return;
    };
    if limit < 0.0 {
        warn!("Ignoring negative CO2 limit {limit} for period {period}");
        return;
    }

    let emissions = annual_emissions(ctx, period);
    if emissions.has_no_terms() {
        return;
    }
    constraints.push(Constraint::at_most(
        ConstraintKind::ResGlobalCo2Limit,
        ConstraintIndex::Global(period),
        emissions,
        limit,
    ));
}

/// Limit emissions over the whole horizon, weighting each period by the years it represents
fn add_global_co2_budget(ctx: &AssemblyContext, constraints: &mut Vec<Constraint>) {
    let Some(budget) = ctx
        .model
        .global
        .first()
        .and_then(|props| props.co2_budget)
        .filter(|budget| budget.is_finite())
    else {
        return;
    };
    if budget < 0.0 {
        warn!("Ignoring negative CO2 budget {budget}");
        return;
    }

    let periods = ctx.model.periods();
    let mut emissions = LinExpr::new();
    for &period in &periods {
        emissions.add_scaled(&annual_emissions(ctx, period), ctx.factors.distance(period));
    }
    if emissions.has_no_terms() {
        return;
    }
    constraints.push(Constraint::at_most(
        ConstraintKind::ResGlobalCo2Budget,
        ConstraintIndex::Global(periods[0]),
        emissions,
        budget,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::assemble;
    use crate::fixture::{ELEC_DEMAND, model};
    use crate::problem::{Problem, VarId};
    use crate::process::ProcessKey;
    use crate::storage::StorageKey;
    use crate::units::Dimensionless;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn commodity_key(name: &str) -> CommodityKey {
        CommodityKey::new(2020, &"North".into(), &name.into())
    }

    fn process_key(name: &str) -> ProcessKey {
        ProcessKey::new(2020, &"North".into(), &name.into())
    }

    fn var(problem: &Problem, key: VariableKey) -> VarId {
        problem.variables().get(&key)
    }

    #[rstest]
    fn test_demand_vertex(model: Model) {
        let problem = assemble(&model).unwrap();
        let elec = commodity_key("Elec");
        let battery = StorageKey {
            period: 2020,
            site: "North".into(),
            storage: "Battery".into(),
            commodity: "Elec".into(),
        };

        for (&t, demand) in model.time.modelled().iter().zip(ELEC_DEMAND) {
            let constraint = problem
                .find_constraint(
                    ConstraintKind::ResVertex,
                    &ConstraintIndex::CommodityStep(t, elec.clone()),
                )
                .unwrap();
            assert!(constraint.is_equality());
            assert_approx_eq!(f64, *constraint.bounds.start(), demand);

            // Production and discharging add to supply, charging takes from it
            for (key, coeff) in [
                (
                    VariableKey::ProcessOutput(t, process_key("Coal plant"), "Elec".into()),
                    1.0,
                ),
                (
                    VariableKey::ProcessOutput(t, process_key("Photovoltaics"), "Elec".into()),
                    1.0,
                ),
                (VariableKey::StorageOutput(t, battery.clone()), 1.0),
                (VariableKey::StorageInput(t, battery.clone()), -1.0),
            ] {
                assert_approx_eq!(f64, constraint.coefficient(var(&problem, key)), coeff);
            }
            assert_eq!(constraint.terms.len(), 4);
        }
    }

    #[rstest]
    fn test_stock_vertex(model: Model) {
        let problem = assemble(&model).unwrap();
        let coal = commodity_key("Coal");
        let t = model.time.modelled()[0];
        let constraint = problem
            .find_constraint(
                ConstraintKind::ResVertex,
                &ConstraintIndex::CommodityStep(t, coal.clone()),
            )
            .unwrap();

        let source = var(&problem, VariableKey::StockSource(t, coal));
        let input = var(
            &problem,
            VariableKey::ProcessInput(t, process_key("Coal plant"), "Coal".into()),
        );
        assert_approx_eq!(f64, constraint.coefficient(source), 1.0);
        assert_approx_eq!(f64, constraint.coefficient(input), -1.0);
        assert_approx_eq!(f64, *constraint.bounds.start(), 0.0);
    }

    #[rstest]
    fn test_unbalanced_commodities(model: Model) {
        let problem = assemble(&model).unwrap();
        for name in ["Solar", "CO2"] {
            assert!(
                problem
                    .constraints_of(ConstraintKind::ResVertex)
                    .all(|c| !matches!(&c.index, ConstraintIndex::CommodityStep(_, key)
                        if key.commodity.to_string() == name))
            );
        }
    }

    #[rstest]
    fn test_limits(mut model: Model) {
        let problem = assemble(&model).unwrap();
        assert_eq!(
            problem.constraints_of(ConstraintKind::ResStockStep).count(),
            0
        );
        assert_eq!(problem.constraints_of(ConstraintKind::ResEnvTotal).count(), 0);

        model.commodities[&commodity_key("Coal")].max_per_step = 100.0;
        model.commodities[&commodity_key("CO2")].max = 5000.0;
        let problem = assemble(&model).unwrap();
        assert_eq!(
            problem.constraints_of(ConstraintKind::ResStockStep).count(),
            4
        );

        // Annual emissions are the CO2 output of the coal plant, scaled to a year
        let constraint = problem
            .find_constraint(
                ConstraintKind::ResEnvTotal,
                &ConstraintIndex::Commodity(commodity_key("CO2")),
            )
            .unwrap();
        let scale = model.time.dt() * model.time.weight();
        assert_eq!(constraint.terms.len(), 4);
        for &t in model.time.modelled() {
            let output = var(
                &problem,
                VariableKey::ProcessOutput(t, process_key("Coal plant"), "CO2".into()),
            );
            assert_approx_eq!(f64, constraint.coefficient(output), scale);
        }
        assert_approx_eq!(f64, *constraint.bounds.end(), 5000.0);
    }

    #[rstest]
    fn test_global_co2_budget(mut model: Model) {
        let problem = assemble(&model).unwrap();
        assert_eq!(
            problem
                .constraints_of(ConstraintKind::ResGlobalCo2Budget)
                .count(),
            0
        );

        // A single period representing ten years
        model.features.intertemporal = true;
        let global = model.global.entry(2020);
        global.discount_rate = Some(Dimensionless(0.03));
        global.weight = Some(10.0);
        global.co2_budget = Some(1e6);
        model.processes[&process_key("Coal plant")].financing.lifetime = Some(30);
        let problem = assemble(&model).unwrap();

        let constraint = problem
            .find_constraint(
                ConstraintKind::ResGlobalCo2Budget,
                &ConstraintIndex::Global(2020),
            )
            .unwrap();
        let t = model.time.modelled()[0];
        let output = var(
            &problem,
            VariableKey::ProcessOutput(t, process_key("Coal plant"), "CO2".into()),
        );
        let scale = model.time.dt() * model.time.weight() * 10.0;
        assert_approx_eq!(f64, constraint.coefficient(output), scale);
        assert_approx_eq!(f64, *constraint.bounds.end(), 1e6);
    }
}
