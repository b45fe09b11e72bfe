//! Process capacity, conversion and operating constraints.
use super::AssemblyContext;
use crate::commodity::{CommodityKey, CommodityType};
use crate::index::{ModelIndex, ProcessFlow};
use crate::model::Model;
use crate::problem::{
    CapacitySource, Constraint, ConstraintIndex, ConstraintKind, LinExpr, ProblemBuilder, VarId,
    VariableKey,
};
use crate::process::{Process, ProcessKey};
use crate::time::Timestep;
use anyhow::{Context, Result, bail};

/// Declare capacity, throughput and flow variables for every process row
pub fn add_variables(builder: &mut ProblemBuilder, model: &Model, index: &ModelIndex) {
    for key in model.processes.keys() {
        builder.add_non_negative(VariableKey::ProcessCapacity(key.clone()));
        if index.processes.expandable.contains(key) {
            builder.add_non_negative(VariableKey::ProcessNewCapacity(key.clone()));
        }

        // Throughput also exists in the initial timestep, as the reference for ramping
        builder.add_per_timestep(model.time.all(), |t| {
            VariableKey::ProcessThroughput(t, key.clone())
        });
        for flow in &index.inputs[key] {
            builder.add_per_timestep(model.time.modelled(), |t| {
                VariableKey::ProcessInput(t, key.clone(), flow.commodity.clone())
            });
        }
        for flow in &index.outputs[key] {
            builder.add_per_timestep(model.time.modelled(), |t| {
                VariableKey::ProcessOutput(t, key.clone(), flow.commodity.clone())
            });
        }
    }
}

/// Generate the constraints for every process row
pub fn constraints(ctx: &AssemblyContext) -> Result<Vec<Constraint>> {
    let mut constraints = Vec::new();
    for (key, process) in &ctx.model.processes {
        let capacity = ctx.process_capacity(key);
        add_capacity(ctx, key, process, &mut constraints);
        add_flows(ctx, key, process, capacity, &mut constraints)?;
        add_operation(ctx, key, process, capacity, &mut constraints);
    }
    add_area(ctx, &mut constraints);
    add_sell_buy_symmetry(ctx, &mut constraints)?;

    Ok(constraints)
}

/// Define total capacity and bound it
fn add_capacity(
    ctx: &AssemblyContext,
    key: &ProcessKey,
    process: &Process,
    constraints: &mut Vec<Constraint>,
) {
    let capacity = ctx.var(VariableKey::ProcessCapacity(key.clone()));
    let mut expr = LinExpr::term(capacity, 1.0);
    expr.add_scaled(
        &ctx.capacity_definition(&ctx.index.processes, key, VariableKey::ProcessNewCapacity),
        -1.0,
    );
    constraints.push(Constraint::equal(
        ConstraintKind::DefProcessCapacity,
        ConstraintIndex::Process(key.clone()),
        expr,
        0.0,
    ));

    // Fixed rows are pinned by the definition above
    if ctx.index.processes.is_variable(key) {
        constraints.push(Constraint::between(
            ConstraintKind::ResProcessCapacity,
            ConstraintIndex::Process(key.clone()),
            LinExpr::term(capacity, 1.0),
            process.capacity.lower,
            process.capacity.upper,
        ));
    }
}

/// Coefficients of capacity and throughput in the flow equation of a partial-load flow.
///
/// This is the line through the minimum-load point (throughput `f * cap`, flow `r * f * cap`)
/// and the full-load point (throughput `cap`, flow `R * cap`).
pub fn partial_load_coefficients(ratio: f64, ratio_min: f64, min_fraction: f64) -> (f64, f64) {
    let online = min_fraction * (ratio_min - ratio) / (1.0 - min_fraction);
    let throughput = (ratio - min_fraction * ratio_min) / (1.0 - min_fraction);
    (online, throughput)
}

/// Tie every input and output flow to throughput (and capacity, for partial-load flows)
fn add_flows(
    ctx: &AssemblyContext,
    key: &ProcessKey,
    process: &Process,
    capacity: CapacitySource,
    constraints: &mut Vec<Constraint>,
) -> Result<()> {
    let partial = ctx.index.partial.contains(key);
    let time_varying = ctx.model.features.time_var_eff && ctx.model.eff_factor.contains_key(key);

    for &t in ctx.model.time.modelled() {
        let throughput = ctx.var(VariableKey::ProcessThroughput(t, key.clone()));

        for flow in &ctx.index.inputs[key] {
            let var = ctx.var(VariableKey::ProcessInput(t, key.clone(), flow.commodity.clone()));
            let commodity_key = CommodityKey::new(key.period, &key.site, &flow.commodity);
            // Intermittent inputs follow capacity times availability. The plain input definition
            // below still applies, so throughput tracks the available supply.
            if ctx.model.commodities[&commodity_key].is(CommodityType::SupIm) {
                let supim = ctx.model.supim.get(&commodity_key, t).with_context(|| {
                    format!("Missing intermittent supply for {commodity_key} at timestep {t}")
                })?;
                let mut expr = LinExpr::term(var, 1.0);
                expr.add_capacity(capacity, -supim);
                constraints.push(Constraint::equal(
                    ConstraintKind::DefIntermittentSupply,
                    ConstraintIndex::ProcessFlow(t, key.clone(), flow.commodity.clone()),
                    expr,
                    0.0,
                ));
            }

            constraints.push(flow_definition(
                (t, key, flow),
                var,
                throughput,
                partial.then_some((capacity, process.min_fraction)),
                1.0,
                (ConstraintKind::DefProcessInput, ConstraintKind::DefPartialProcessInput),
            ));
        }

        for flow in &ctx.index.outputs[key] {
            let var = ctx.var(VariableKey::ProcessOutput(t, key.clone(), flow.commodity.clone()));
            let commodity_key = CommodityKey::new(key.period, &key.site, &flow.commodity);
            let efficiency = if time_varying
                && !ctx.model.commodities[&commodity_key].is(CommodityType::Env)
            {
                ctx.model.eff_factor.get(key, t).with_context(|| {
                    format!("Missing efficiency factor for process {key} at timestep {t}")
                })?
            } else {
                1.0
            };

            constraints.push(flow_definition(
                (t, key, flow),
                var,
                throughput,
                partial.then_some((capacity, process.min_fraction)),
                efficiency,
                (ConstraintKind::DefProcessOutput, ConstraintKind::DefPartialProcessOutput),
            ));
        }
    }

    Ok(())
}

/// `flow == efficiency * ratio * throughput`, or the partial-load interpolation if the process
/// operates at partial load and the flow has a minimum-load ratio
fn flow_definition(
    (t, key, flow): (Timestep, &ProcessKey, &ProcessFlow),
    var: VarId,
    throughput: VarId,
    partial: Option<(CapacitySource, f64)>,
    efficiency: f64,
    (plain_kind, partial_kind): (ConstraintKind, ConstraintKind),
) -> Constraint {
    let index = ConstraintIndex::ProcessFlow(t, key.clone(), flow.commodity.clone());
    let mut expr = LinExpr::term(var, 1.0);

    if let (Some((capacity, min_fraction)), Some(ratio_min)) = (partial, flow.ratio_min) {
        let (online, per_throughput) =
            partial_load_coefficients(flow.ratio, ratio_min, min_fraction);
        expr.add_capacity(capacity, -online * efficiency)
            .add_term(throughput, -per_throughput * efficiency);
        return Constraint::equal(partial_kind, index, expr, 0.0);
    }

    expr.add_term(throughput, -flow.ratio * efficiency);
    Constraint::equal(plain_kind, index, expr, 0.0)
}

/// Limit throughput by capacity, minimum load and ramp rate
fn add_operation(
    ctx: &AssemblyContext,
    key: &ProcessKey,
    process: &Process,
    capacity: CapacitySource,
    constraints: &mut Vec<Constraint>,
) {
    let time = &ctx.model.time;
    let throughput = |t| ctx.var(VariableKey::ProcessThroughput(t, key.clone()));

    for &t in time.modelled() {
        let mut expr = LinExpr::term(throughput(t), 1.0);
        expr.add_capacity(capacity, -1.0);
        constraints.push(Constraint::at_most(
            ConstraintKind::ResProcessThroughputByCapacity,
            ConstraintIndex::ProcessStep(t, key.clone()),
            expr,
            0.0,
        ));
    }

    if ctx.index.partial.contains(key) {
        for &t in time.modelled() {
            let mut expr = LinExpr::term(throughput(t), 1.0);
            expr.add_capacity(capacity, -process.min_fraction);
            constraints.push(Constraint::at_least(
                ConstraintKind::ResProcessThroughputMinimum,
                ConstraintIndex::ProcessStep(t, key.clone()),
                expr,
                0.0,
            ));
        }
    }

    // A gradient of at least 1/dt allows going from zero to full load within one timestep
    if process.max_grad < 1.0 / time.dt() {
        let max_change = process.max_grad * time.dt();
        for (previous, t) in time.iter_with_previous() {
            for (kind, sign) in [
                (ConstraintKind::ResProcessRampUp, 1.0),
                (ConstraintKind::ResProcessRampDown, -1.0),
            ] {
                let mut expr = LinExpr::term(throughput(t), sign);
                expr.add_term(throughput(previous), -sign)
                    .add_capacity(capacity, -max_change);
                constraints.push(Constraint::at_most(
                    kind,
                    ConstraintIndex::ProcessStep(t, key.clone()),
                    expr,
                    0.0,
                ));
            }
        }
    }
}

/// Limit the area used by processes at each site with an area budget
fn add_area(ctx: &AssemblyContext, constraints: &mut Vec<Constraint>) {
    for (site_key, processes) in &ctx.index.area {
        let Some(area) = ctx.model.sites[site_key].area else {
            continue;
        };

        let mut expr = LinExpr::new();
        for key in processes {
            let area_per_cap = ctx.model.processes[key].area_per_cap.unwrap_or(0.0);
            expr.add_capacity(ctx.process_capacity(key), area_per_cap);
        }
        constraints.push(Constraint::at_most(
            ConstraintKind::ResArea,
            ConstraintIndex::Site(site_key.0, site_key.1.clone()),
            expr,
            area,
        ));
    }
}

/// Give paired buy and sell processes the same capacity
#[allow(clippy::float_cmp)]
fn add_sell_buy_symmetry(ctx: &AssemblyContext, constraints: &mut Vec<Constraint>) -> Result<()> {
    for (buy, sell) in &ctx.index.buy_sell_pairs {
        match (ctx.process_capacity(buy), ctx.process_capacity(sell)) {
            (CapacitySource::Fixed(buy_cap), CapacitySource::Fixed(sell_cap)) => {
                if buy_cap != sell_cap {
                    bail!(
                        "Processes {buy} and {sell} buy and sell over the same connection but \
                         have different fixed capacities ({buy_cap} and {sell_cap})"
                    );
                }
            }
            (buy_cap, sell_cap) => {
                let mut expr = LinExpr::new();
                expr.add_capacity(buy_cap, 1.0).add_capacity(sell_cap, -1.0);
                constraints.push(Constraint::equal(
                    ConstraintKind::ResSellBuySymmetry,
                    ConstraintIndex::ProcessPair(buy.clone(), sell.clone()),
                    expr,
                    0.0,
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::CapacityBounds;
    use crate::assembly::assemble;
    use crate::commodity::{Commodity, PriceKey};
    use crate::fixture::{assert_error, financing, model, two_period_model};
    use crate::global::Period;
    use crate::id::SiteID;
    use crate::problem::Problem;
    use crate::process::{FlowDirection, ProcessCommodity, ProcessCommodityKey};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn process_key(name: &str) -> ProcessKey {
        ProcessKey::new(2020, &"North".into(), &name.into())
    }

    fn set_area(model: &mut Model, area: f64) {
        let key: (Period, SiteID) = (2020, "North".into());
        model.sites[&key].area = Some(area);
    }

    fn var(problem: &Problem, key: VariableKey) -> VarId {
        problem.variables().get(&key)
    }

    fn capacity(problem: &Problem, name: &str) -> VarId {
        var(problem, VariableKey::ProcessCapacity(process_key(name)))
    }

    fn throughput(problem: &Problem, t: Timestep, name: &str) -> VarId {
        var(problem, VariableKey::ProcessThroughput(t, process_key(name)))
    }

    /// Add a process with the given capacity bounds and unit-ratio flows
    fn add_process(
        model: &mut Model,
        name: &str,
        (installed, upper): (f64, f64),
        flows: &[(&str, FlowDirection)],
    ) {
        model.processes.insert(
            process_key(name),
            Process {
                capacity: CapacityBounds {
                    installed,
                    lower: 0.0,
                    upper,
                },
                max_grad: f64::INFINITY,
                min_fraction: 0.0,
                inv_cost: 1000.0,
                fix_cost: 10.0,
                var_cost: 0.0,
                financing: financing(),
                area_per_cap: None,
            },
        );
        for &(commodity, direction) in flows {
            model.process_commodities.insert(
                ProcessCommodityKey {
                    period: 2020,
                    process: name.into(),
                    commodity: commodity.into(),
                    direction,
                },
                ProcessCommodity {
                    ratio: 1.0,
                    ratio_min: None,
                },
            );
        }
    }

    /// Add an electricity market with an import and an export process
    fn add_market(model: &mut Model, import: (f64, f64), export: (f64, f64)) {
        let markets = [("Elec buy", CommodityType::Buy), ("Elec sell", CommodityType::Sell)];
        for (name, kind) in markets {
            model.commodities.insert(
                CommodityKey::new(2020, &"North".into(), &name.into()),
                Commodity {
                    kind: Some(kind),
                    price: 1.0,
                    max: f64::INFINITY,
                    max_per_step: f64::INFINITY,
                },
            );
            for &t in model.time.all() {
                model
                    .buy_sell_price
                    .insert(
                        PriceKey {
                            period: 2020,
                            name: name.into(),
                        },
                        t,
                        0.5,
                    )
                    .unwrap();
            }
        }
        model.features.buy_sell_price = true;
        add_process(
            model,
            "Import",
            import,
            &[("Elec buy", FlowDirection::In), ("Elec", FlowDirection::Out)],
        );
        add_process(
            model,
            "Export",
            export,
            &[("Elec", FlowDirection::In), ("Elec sell", FlowDirection::Out)],
        );
    }

    #[rstest]
    #[case(2.0, 3.0, 0.0, 0.0, 2.0)]
    #[case(2.0, 3.0, 0.5, 1.0, 1.0)]
    #[case(1.0, 1.0, 0.3, 0.0, 1.0)]
    fn test_partial_load_coefficients(
        #[case] ratio: f64,
        #[case] ratio_min: f64,
        #[case] min_fraction: f64,
        #[case] online: f64,
        #[case] throughput: f64,
    ) {
        let (result_online, result_throughput) =
            partial_load_coefficients(ratio, ratio_min, min_fraction);
        assert_approx_eq!(f64, result_online, online);
        assert_approx_eq!(f64, result_throughput, throughput);
    }

    #[test]
    fn test_partial_load_endpoints() {
        // Flow at minimum load is r * f * cap and at full load is R * cap
        let (ratio, ratio_min, min_fraction, cap) = (2.2, 2.6, 0.4, 50.0);
        let (online, throughput) = partial_load_coefficients(ratio, ratio_min, min_fraction);
        assert_approx_eq!(
            f64,
            cap * online + min_fraction * cap * throughput,
            ratio_min * min_fraction * cap,
            epsilon = 1e-9
        );
        assert_approx_eq!(f64, cap * online + cap * throughput, ratio * cap, epsilon = 1e-9);
    }

    #[rstest]
    fn test_time_varying_efficiency(mut model: Model) {
        let coal = ProcessKey::new(2020, &"North".into(), &"Coal plant".into());
        for &t in model.time.modelled() {
            model.eff_factor.insert(coal.clone(), t, 0.9).unwrap();
        }
        model.features.time_var_eff = true;
        let problem = assemble(&model).unwrap();
        let t = model.time.modelled()[0];
        let throughput = problem
            .variables()
            .get(&VariableKey::ProcessThroughput(t, coal.clone()));

        // Electricity output is scaled by the factor, but emissions are not
        for (commodity, coeff) in [("Elec", -0.9), ("CO2", -0.8)] {
            let constraint = problem
                .find_constraint(
                    ConstraintKind::DefProcessOutput,
                    &ConstraintIndex::ProcessFlow(t, coal.clone(), commodity.into()),
                )
                .unwrap();
            assert_approx_eq!(f64, constraint.coefficient(throughput), coeff);
        }
    }

    #[rstest]
    fn test_missing_efficiency_factor(mut model: Model) {
        let coal = ProcessKey::new(2020, &"North".into(), &"Coal plant".into());
        model.eff_factor.insert(coal, 1, 0.9).unwrap();
        model.features.time_var_eff = true;
        assert_error!(
            assemble(&model),
            "Missing efficiency factor for process (2020, North, Coal plant) at timestep 2"
        );
    }

    #[rstest]
    fn test_capacity_bounds(model: Model) {
        let problem = assemble(&model).unwrap();
        let index = ConstraintIndex::Process(process_key("Photovoltaics"));
        let constraint = problem
            .find_constraint(ConstraintKind::ResProcessCapacity, &index)
            .unwrap();
        assert_eq!(constraint.terms.len(), 1);
        assert_approx_eq!(
            f64,
            constraint.coefficient(capacity(&problem, "Photovoltaics")),
            1.0
        );
        assert_approx_eq!(f64, *constraint.bounds.start(), 0.0);
        assert_approx_eq!(f64, *constraint.bounds.end(), 1000.0);

        // The coal plant cannot be expanded, so its capacity is pinned by its definition
        let index = ConstraintIndex::Process(process_key("Coal plant"));
        assert!(
            problem
                .find_constraint(ConstraintKind::ResProcessCapacity, &index)
                .is_none()
        );
        let definition = problem
            .find_constraint(ConstraintKind::DefProcessCapacity, &index)
            .unwrap();
        assert_approx_eq!(f64, *definition.bounds.start(), 100.0);
    }

    #[rstest]
    #[case(0.5, 4)]
    #[case(1.0, 0)]
    #[case(f64::INFINITY, 0)]
    fn test_ramp_constraints(mut model: Model, #[case] max_grad: f64, #[case] expected: usize) {
        model.processes[&process_key("Coal plant")].max_grad = max_grad;
        let problem = assemble(&model).unwrap();
        for kind in [ConstraintKind::ResProcessRampUp, ConstraintKind::ResProcessRampDown] {
            assert_eq!(problem.constraints_of(kind).count(), expected);
        }
    }

    #[rstest]
    fn test_ramp_coefficients(mut model: Model) {
        model.processes[&process_key("Coal plant")].max_grad = 0.5;
        let problem = assemble(&model).unwrap();
        let index = ConstraintIndex::ProcessStep(1, process_key("Coal plant"));

        // The change from the initial timestep is limited to half of the fixed capacity of 100
        for (kind, sign) in [
            (ConstraintKind::ResProcessRampUp, 1.0),
            (ConstraintKind::ResProcessRampDown, -1.0),
        ] {
            let constraint = problem.find_constraint(kind, &index).unwrap();
            assert_approx_eq!(
                f64,
                constraint.coefficient(throughput(&problem, 1, "Coal plant")),
                sign
            );
            assert_approx_eq!(
                f64,
                constraint.coefficient(throughput(&problem, 0, "Coal plant")),
                -sign
            );
            assert_eq!(constraint.terms.len(), 2);
            assert_approx_eq!(f64, *constraint.bounds.end(), 50.0);
        }
    }

    #[rstest]
    fn test_area(mut model: Model) {
        let problem = assemble(&model).unwrap();
        assert_eq!(problem.constraints_of(ConstraintKind::ResArea).count(), 0);

        set_area(&mut model, 1000.0);
        let problem = assemble(&model).unwrap();
        let constraint = problem
            .find_constraint(
                ConstraintKind::ResArea,
                &ConstraintIndex::Site(2020, "North".into()),
            )
            .unwrap();

        // The coal plant uses no area
        assert_eq!(constraint.terms.len(), 1);
        assert_approx_eq!(
            f64,
            constraint.coefficient(capacity(&problem, "Photovoltaics")),
            10.0
        );
        assert_approx_eq!(f64, *constraint.bounds.end(), 1000.0);
    }

    #[rstest]
    fn test_area_unused(mut model: Model) {
        set_area(&mut model, 1000.0);
        model.processes[&process_key("Photovoltaics")].area_per_cap = Some(0.0);
        let problem = assemble(&model).unwrap();
        assert_eq!(problem.constraints_of(ConstraintKind::ResArea).count(), 0);
    }

    #[rstest]
    fn test_intermittent_supply(model: Model) {
        let problem = assemble(&model).unwrap();
        let t = 2;
        let index = ConstraintIndex::ProcessFlow(t, process_key("Photovoltaics"), "Solar".into());
        let input = var(
            &problem,
            VariableKey::ProcessInput(t, process_key("Photovoltaics"), "Solar".into()),
        );

        // Solar input is half the capacity at timestep 2
        let constraint = problem
            .find_constraint(ConstraintKind::DefIntermittentSupply, &index)
            .unwrap();
        assert!(constraint.is_equality());
        assert_approx_eq!(f64, constraint.coefficient(input), 1.0);
        assert_approx_eq!(
            f64,
            constraint.coefficient(capacity(&problem, "Photovoltaics")),
            -0.5
        );
        assert_eq!(constraint.terms.len(), 2);

        // The input still defines throughput
        let definition = problem
            .find_constraint(ConstraintKind::DefProcessInput, &index)
            .unwrap();
        assert_approx_eq!(f64, definition.coefficient(input), 1.0);
        assert_approx_eq!(
            f64,
            definition.coefficient(throughput(&problem, t, "Photovoltaics")),
            -1.0
        );
        assert_eq!(
            problem
                .constraints_of(ConstraintKind::DefIntermittentSupply)
                .count(),
            4
        );
    }

    #[rstest]
    fn test_partial_load(mut model: Model) {
        let coal = process_key("Coal plant");
        model.processes[&coal].min_fraction = 0.4;
        for (commodity, direction, ratio_min) in [
            ("Coal", FlowDirection::In, 2.6),
            ("Elec", FlowDirection::Out, 0.8),
        ] {
            let key = ProcessCommodityKey {
                period: 2020,
                process: "Coal plant".into(),
                commodity: commodity.into(),
                direction,
            };
            model.process_commodities[&key].ratio_min = Some(ratio_min);
        }
        let problem = assemble(&model).unwrap();
        let t = 1;

        // Throughput may not fall below 40% of the fixed capacity of 100
        let minimum = problem
            .find_constraint(
                ConstraintKind::ResProcessThroughputMinimum,
                &ConstraintIndex::ProcessStep(t, coal.clone()),
            )
            .unwrap();
        assert_approx_eq!(f64, minimum.coefficient(throughput(&problem, t, "Coal plant")), 1.0);
        assert_approx_eq!(f64, *minimum.bounds.start(), 40.0);
        assert_eq!(
            problem
                .constraints_of(ConstraintKind::ResProcessThroughputMinimum)
                .count(),
            4
        );

        let (online, per_throughput) = partial_load_coefficients(1.0, 0.8, 0.4);
        let output = problem
            .find_constraint(
                ConstraintKind::DefPartialProcessOutput,
                &ConstraintIndex::ProcessFlow(t, coal.clone(), "Elec".into()),
            )
            .unwrap();
        assert_approx_eq!(
            f64,
            output.coefficient(throughput(&problem, t, "Coal plant")),
            -per_throughput
        );
        assert_approx_eq!(f64, *output.bounds.start(), online * 100.0, epsilon = 1e-9);

        // CO2 has no minimum-load ratio and keeps the plain definition
        let index = ConstraintIndex::ProcessFlow(t, coal, "CO2".into());
        assert!(
            problem
                .find_constraint(ConstraintKind::DefProcessOutput, &index)
                .is_some()
        );
        assert!(
            problem
                .find_constraint(ConstraintKind::DefPartialProcessOutput, &index)
                .is_none()
        );
    }

    #[rstest]
    fn test_sell_buy_symmetry(mut model: Model) {
        add_market(&mut model, (0.0, f64::INFINITY), (0.0, f64::INFINITY));
        let problem = assemble(&model).unwrap();
        let constraint = problem
            .find_constraint(
                ConstraintKind::ResSellBuySymmetry,
                &ConstraintIndex::ProcessPair(process_key("Import"), process_key("Export")),
            )
            .unwrap();
        assert!(constraint.is_equality());
        assert_approx_eq!(f64, constraint.coefficient(capacity(&problem, "Import")), 1.0);
        assert_approx_eq!(f64, constraint.coefficient(capacity(&problem, "Export")), -1.0);
        assert_approx_eq!(f64, *constraint.bounds.start(), 0.0);
    }

    #[rstest]
    fn test_sell_buy_symmetry_fixed(mut model: Model) {
        add_market(&mut model, (50.0, 50.0), (50.0, 50.0));
        let problem = assemble(&model).unwrap();
        assert_eq!(
            problem
                .constraints_of(ConstraintKind::ResSellBuySymmetry)
                .count(),
            0
        );
    }

    #[rstest]
    fn test_sell_buy_symmetry_fixed_unequal(mut model: Model) {
        add_market(&mut model, (50.0, 50.0), (30.0, 30.0));
        assert_error!(
            assemble(&model),
            "Processes (2020, North, Import) and (2020, North, Export) buy and sell over the \
             same connection but have different fixed capacities (50 and 30)"
        );
    }

    #[rstest]
    fn test_intertemporal_capacity(two_period_model: Model) {
        let model = two_period_model;
        let problem = assemble(&model).unwrap();
        let pv = |period| ProcessKey::new(period, &"North".into(), &"Photovoltaics".into());

        // Solar built in 2020 is still operating in 2030
        let definition = problem
            .find_constraint(
                ConstraintKind::DefProcessCapacity,
                &ConstraintIndex::Process(pv(2030)),
            )
            .unwrap();
        for (key, coeff) in [
            (VariableKey::ProcessCapacity(pv(2030)), 1.0),
            (VariableKey::ProcessNewCapacity(pv(2020)), -1.0),
            (VariableKey::ProcessNewCapacity(pv(2030)), -1.0),
        ] {
            assert_approx_eq!(f64, definition.coefficient(var(&problem, key)), coeff);
        }
        assert_eq!(definition.terms.len(), 3);

        // Installed coal capacity outlasts the horizon and stays fixed
        let coal = ProcessKey::new(2030, &"North".into(), &"Coal plant".into());
        let definition = problem
            .find_constraint(
                ConstraintKind::DefProcessCapacity,
                &ConstraintIndex::Process(coal.clone()),
            )
            .unwrap();
        assert_eq!(definition.terms.len(), 1);
        assert_approx_eq!(f64, *definition.bounds.start(), 100.0);
        let limit = problem
            .find_constraint(
                ConstraintKind::ResProcessThroughputByCapacity,
                &ConstraintIndex::ProcessStep(1, coal),
            )
            .unwrap();
        assert_approx_eq!(f64, *limit.bounds.end(), 100.0);
    }
}
