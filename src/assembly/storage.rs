//! Storage capacity, content and operating constraints.
use super::AssemblyContext;
use crate::index::ModelIndex;
use crate::model::Model;
use crate::problem::{
    CapacitySource, Constraint, ConstraintIndex, ConstraintKind, LinExpr, ProblemBuilder,
    VariableKey,
};
use crate::storage::{Storage, StorageKey};

/// Declare capacity, charging, discharging and content variables for every storage row
pub fn add_variables(builder: &mut ProblemBuilder, model: &Model, index: &ModelIndex) {
    for key in model.storages.keys() {
        builder.add_non_negative(VariableKey::StoragePower(key.clone()));
        if index.storage_power.expandable.contains(key) {
            builder.add_non_negative(VariableKey::StorageNewPower(key.clone()));
        }
        builder.add_non_negative(VariableKey::StorageEnergy(key.clone()));
        if index.storage_energy.expandable.contains(key) {
            builder.add_non_negative(VariableKey::StorageNewEnergy(key.clone()));
        }

        builder.add_per_timestep(model.time.modelled(), |t| {
            VariableKey::StorageInput(t, key.clone())
        });
        builder.add_per_timestep(model.time.modelled(), |t| {
            VariableKey::StorageOutput(t, key.clone())
        });
        builder.add_per_timestep(model.time.all(), |t| {
            VariableKey::StorageContent(t, key.clone())
        });
    }
}

/// Generate the constraints for every storage row
pub fn constraints(ctx: &AssemblyContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    for (key, storage) in &ctx.model.storages {
        add_capacity(ctx, key, storage, &mut constraints);
        add_state(ctx, key, storage, &mut constraints);
        add_operation(ctx, key, &mut constraints);
        add_initial_and_final_state(ctx, key, storage, &mut constraints);
    }

    constraints
}

/// Define total power and energy capacity, bound them and tie them together if the storage has
/// a fixed energy-to-power ratio
fn add_capacity(
    ctx: &AssemblyContext,
    key: &StorageKey,
    storage: &Storage,
    constraints: &mut Vec<Constraint>,
) {
    let families = [
        (
            &ctx.index.storage_power,
            &storage.power,
            VariableKey::StoragePower(key.clone()),
            VariableKey::StorageNewPower as fn(StorageKey) -> VariableKey,
            ConstraintKind::DefStoragePower,
            ConstraintKind::ResStoragePower,
        ),
        (
            &ctx.index.storage_energy,
            &storage.energy,
            VariableKey::StorageEnergy(key.clone()),
            VariableKey::StorageNewEnergy as fn(StorageKey) -> VariableKey,
            ConstraintKind::DefStorageCapacity,
            ConstraintKind::ResStorageCapacity,
        ),
    ];
    for (index, bounds, total, new, def_kind, res_kind) in families {
        let total = ctx.var(total);
        let mut expr = LinExpr::term(total, 1.0);
        expr.add_scaled(&ctx.capacity_definition(index, key, new), -1.0);
        constraints.push(Constraint::equal(
            def_kind,
            ConstraintIndex::Storage(key.clone()),
            expr,
            0.0,
        ));

        if index.is_variable(key) {
            constraints.push(Constraint::between(
                res_kind,
                ConstraintIndex::Storage(key.clone()),
                LinExpr::term(total, 1.0),
                bounds.lower,
                bounds.upper,
            ));
        }
    }

    let Some(ep_ratio) = storage.ep_ratio else {
        return;
    };
    let (power, energy) = (ctx.storage_power(key), ctx.storage_energy(key));
    if let (CapacitySource::Fixed(_), CapacitySource::Fixed(_)) = (power, energy) {
        return;
    }
    let mut expr = LinExpr::new();
    expr.add_capacity(energy, 1.0).add_capacity(power, -ep_ratio);
    constraints.push(Constraint::equal(
        ConstraintKind::DefStorageEnergyPowerRatio,
        ConstraintIndex::Storage(key.clone()),
        expr,
        0.0,
    ));
}

/// Content follows from the previous content, self-discharge, charging and discharging
fn add_state(
    ctx: &AssemblyContext,
    key: &StorageKey,
    storage: &Storage,
    constraints: &mut Vec<Constraint>,
) {
    let dt = ctx.model.time.dt();
    for (previous, t) in ctx.model.time.iter_with_previous() {
        let mut expr = LinExpr::term(ctx.var(VariableKey::StorageContent(t, key.clone())), 1.0);
        expr.add_term(
            ctx.var(VariableKey::StorageContent(previous, key.clone())),
            -(1.0 - storage.discharge),
        )
        .add_term(
            ctx.var(VariableKey::StorageInput(t, key.clone())),
            -storage.eff_in * dt,
        )
        .add_term(
            ctx.var(VariableKey::StorageOutput(t, key.clone())),
            dt / storage.eff_out,
        );
        constraints.push(Constraint::equal(
            ConstraintKind::DefStorageState,
            ConstraintIndex::StorageStep(t, key.clone()),
            expr,
            0.0,
        ));
    }
}

/// Limit charging and discharging by power and content by energy capacity
fn add_operation(ctx: &AssemblyContext, key: &StorageKey, constraints: &mut Vec<Constraint>) {
    let (power, energy) = (ctx.storage_power(key), ctx.storage_energy(key));
    let time = &ctx.model.time;

    for &t in time.modelled() {
        for (kind, variable) in [
            (
                ConstraintKind::ResStorageInputByPower,
                VariableKey::StorageInput(t, key.clone()),
            ),
            (
                ConstraintKind::ResStorageOutputByPower,
                VariableKey::StorageOutput(t, key.clone()),
            ),
        ] {
            let mut expr = LinExpr::term(ctx.var(variable), 1.0);
            expr.add_capacity(power, -1.0);
            constraints.push(Constraint::at_most(
                kind,
                ConstraintIndex::StorageStep(t, key.clone()),
                expr,
                0.0,
            ));
        }
    }

    for &t in time.all() {
        let mut expr = LinExpr::term(ctx.var(VariableKey::StorageContent(t, key.clone())), 1.0);
        expr.add_capacity(energy, -1.0);
        constraints.push(Constraint::at_most(
            ConstraintKind::ResStorageStateByCapacity,
            ConstraintIndex::StorageStep(t, key.clone()),
            expr,
            0.0,
        ));
    }
}

/// Fix the initial content and require at least as much at the end.
///
/// Without a fixed initial fraction, the initial content is free but may not exceed the final
/// content.
fn add_initial_and_final_state(
    ctx: &AssemblyContext,
    key: &StorageKey,
    storage: &Storage,
    constraints: &mut Vec<Constraint>,
) {
    let time = &ctx.model.time;
    let content = |t| ctx.var(VariableKey::StorageContent(t, key.clone()));

    let Some(init) = storage.init else {
        let mut expr = LinExpr::term(content(time.initial()), 1.0);
        expr.add_term(content(time.last()), -1.0);
        constraints.push(Constraint::at_most(
            ConstraintKind::ResStorageStateCyclicity,
            ConstraintIndex::Storage(key.clone()),
            expr,
            0.0,
        ));
        return;
    };

    let energy = ctx.storage_energy(key);
    let mut initial = LinExpr::term(content(time.initial()), 1.0);
    initial.add_capacity(energy, -init);
    constraints.push(Constraint::equal(
        ConstraintKind::ResInitialAndFinalStorageState,
        ConstraintIndex::StorageStep(time.initial(), key.clone()),
        initial,
        0.0,
    ));

    let mut last = LinExpr::term(content(time.last()), 1.0);
    last.add_capacity(energy, -init);
    constraints.push(Constraint::at_least(
        ConstraintKind::ResInitialAndFinalStorageState,
        ConstraintIndex::StorageStep(time.last(), key.clone()),
        last,
        0.0,
    ));
}
