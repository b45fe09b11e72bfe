//! Transmission capacity and flow constraints.
use super::AssemblyContext;
use crate::index::ModelIndex;
use crate::model::Model;
use crate::problem::{
    CapacitySource, Constraint, ConstraintIndex, ConstraintKind, LinExpr, ProblemBuilder,
    VariableKey,
};
use crate::transmission::{Transmission, TransmissionKey};

/// Declare capacity and flow variables for every transmission row
pub fn add_variables(builder: &mut ProblemBuilder, model: &Model, index: &ModelIndex) {
    for key in model.transmissions.keys() {
        builder.add_non_negative(VariableKey::TransmissionCapacity(key.clone()));
        if index.transmissions.expandable.contains(key) {
            builder.add_non_negative(VariableKey::TransmissionNewCapacity(key.clone()));
        }
        builder.add_per_timestep(model.time.modelled(), |t| {
            VariableKey::TransmissionInput(t, key.clone())
        });
        builder.add_per_timestep(model.time.modelled(), |t| {
            VariableKey::TransmissionOutput(t, key.clone())
        });
    }
}

/// Generate the constraints for every transmission row and the symmetry of every link
pub fn constraints(ctx: &AssemblyContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    for (key, transmission) in &ctx.model.transmissions {
        add_capacity(ctx, key, transmission, &mut constraints);
        add_flows(ctx, key, transmission, &mut constraints);
    }
    for (key, reversed) in &ctx.index.transmission_pairs {
        add_symmetry(ctx, key, reversed, &mut constraints);
    }

    constraints
}

fn add_capacity(
    ctx: &AssemblyContext,
    key: &TransmissionKey,
    transmission: &Transmission,
    constraints: &mut Vec<Constraint>,
) {
    let index = &ctx.index.transmissions;
    let capacity = ctx.var(VariableKey::TransmissionCapacity(key.clone()));
    let mut expr = LinExpr::term(capacity, 1.0);
    expr.add_scaled(
        &ctx.capacity_definition(index, key, VariableKey::TransmissionNewCapacity),
        -1.0,
    );
    constraints.push(Constraint::equal(
        ConstraintKind::DefTransmissionCapacity,
        ConstraintIndex::Transmission(key.clone()),
        expr,
        0.0,
    ));

    if index.is_variable(key) {
        constraints.push(Constraint::between(
            ConstraintKind::ResTransmissionCapacity,
            ConstraintIndex::Transmission(key.clone()),
            LinExpr::term(capacity, 1.0),
            transmission.capacity.lower,
            transmission.capacity.upper,
        ));
    }
}

/// Output equals input times efficiency and input is limited by capacity
fn add_flows(
    ctx: &AssemblyContext,
    key: &TransmissionKey,
    transmission: &Transmission,
    constraints: &mut Vec<Constraint>,
) {
    let capacity = ctx.transmission_capacity(key);
    for &t in ctx.model.time.modelled() {
        let input = ctx.var(VariableKey::TransmissionInput(t, key.clone()));
        let output = ctx.var(VariableKey::TransmissionOutput(t, key.clone()));

        let mut expr = LinExpr::term(output, 1.0);
        expr.add_term(input, -transmission.eff);
        constraints.push(Constraint::equal(
            ConstraintKind::DefTransmissionOutput,
            ConstraintIndex::TransmissionStep(t, key.clone()),
            expr,
            0.0,
        ));

        let mut expr = LinExpr::term(input, 1.0);
        expr.add_capacity(capacity, -1.0);
        constraints.push(Constraint::at_most(
            ConstraintKind::ResTransmissionInputByCapacity,
            ConstraintIndex::TransmissionStep(t, key.clone()),
            expr,
            0.0,
        ));
    }
}

/// Both directions of a link have the same capacity.
///
/// Links with fixed capacity in both directions need no constraint, as their capacities were
/// checked to agree when deriving the index.
fn add_symmetry(
    ctx: &AssemblyContext,
    key: &TransmissionKey,
    reversed: &TransmissionKey,
    constraints: &mut Vec<Constraint>,
) {
    let (forward, backward) = (ctx.transmission_capacity(key), ctx.transmission_capacity(reversed));
    if let (CapacitySource::Fixed(_), CapacitySource::Fixed(_)) = (forward, backward) {
        return;
    }

    let mut expr = LinExpr::new();
    expr.add_capacity(forward, 1.0).add_capacity(backward, -1.0);
    constraints.push(Constraint::equal(
        ConstraintKind::ResTransmissionSymmetry,
        ConstraintIndex::Transmission(key.clone()),
        expr,
        0.0,
    ));
}
