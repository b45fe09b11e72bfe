//! Demand-side management: shifting demand between timesteps.
//!
//! An upward shift `dsm_up[t]` raises consumption at `t`. It is compensated by downward shifts
//! `dsm_down[t, tt]` at the timesteps `tt` that follow within the delay window.
use super::AssemblyContext;
use crate::dsm::{DsmKey, DsmResource};
use crate::index::ModelIndex;
use crate::index::dsm::DsmWindows;
use crate::model::Model;
use crate::problem::{
    Constraint, ConstraintIndex, ConstraintKind, LinExpr, ProblemBuilder, VariableKey,
};
use crate::time::Timestep;

/// Declare upward and downward shift variables
pub fn add_variables(builder: &mut ProblemBuilder, model: &Model, index: &ModelIndex) {
    for (key, windows) in &index.dsm {
        for &t in model.time.modelled() {
            builder.add_non_negative(VariableKey::DsmUp(t, key.clone()));
            for tt in windows.down(t) {
                builder.add_non_negative(VariableKey::DsmDown(t, tt, key.clone()));
            }
        }
    }
}

/// Generate the shift constraints of every DSM resource
pub fn constraints(ctx: &AssemblyContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    for (key, resource) in &ctx.model.dsm {
        let Some(windows) = ctx.index.dsm.get(key) else {
            continue;
        };
        for &t in ctx.model.time.modelled() {
            add_step(ctx, key, resource, windows, t, &mut constraints);
        }
    }

    constraints
}

fn add_step(
    ctx: &AssemblyContext,
    key: &DsmKey,
    resource: &DsmResource,
    windows: &DsmWindows,
    t: Timestep,
    constraints: &mut Vec<Constraint>,
) {
    let up = |t| ctx.var(VariableKey::DsmUp(t, key.clone()));
    let index = || ConstraintIndex::DsmStep(t, key.clone());

    // Shifted demand is conserved up to the efficiency
    let mut expr = LinExpr::term(up(t), -resource.eff);
    for tt in windows.down(t) {
        expr.add_term(ctx.var(VariableKey::DsmDown(t, tt, key.clone())), 1.0);
    }
    constraints.push(Constraint::equal(
        ConstraintKind::DefDsmVariables,
        index(),
        expr,
        0.0,
    ));

    constraints.push(Constraint::at_most(
        ConstraintKind::ResDsmUpward,
        index(),
        LinExpr::term(up(t), 1.0),
        resource.cap_max_up,
    ));

    let mut incoming = LinExpr::new();
    for tt in windows.incoming(t) {
        incoming.add_term(ctx.var(VariableKey::DsmDown(tt, t, key.clone())), 1.0);
    }
    if !incoming.has_no_terms() {
        constraints.push(Constraint::at_most(
            ConstraintKind::ResDsmDownward,
            index(),
            incoming.clone(),
            resource.cap_max_down,
        ));
    }

    let mut total = LinExpr::term(up(t), 1.0);
    total.add_scaled(&incoming, 1.0);
    constraints.push(Constraint::at_most(
        ConstraintKind::ResDsmMaximum,
        index(),
        total,
        resource.cap_max_up.max(resource.cap_max_down),
    ));

    let mut recovery = LinExpr::new();
    for tt in windows.recovery(t) {
        recovery.add_term(up(tt), 1.0);
    }
    if !recovery.has_no_terms() {
        constraints.push(Constraint::at_most(
            ConstraintKind::ResDsmRecovery,
            index(),
            recovery,
            resource.cap_max_up * f64::from(resource.delay),
        ));
    }
}
