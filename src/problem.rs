//! The assembled optimisation problem: variables, constraints and objective.
//!
//! A [`Problem`] is put together with a [`ProblemBuilder`] and cannot be changed afterwards.
//! Solver results are kept separately (see [`crate::solver::Solution`]).
use crate::time::Timestep;
use log::info;

pub mod constraint;
pub use constraint::{Constraint, ConstraintIndex, ConstraintKind};
pub mod expression;
pub use expression::{CapacitySource, LinExpr};
pub mod variable;
pub use variable::{VarId, VariableDefinition, VariableKey, Variables};

/// A linear program ready to be passed to a solver
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    variables: Variables,
    constraints: Vec<Constraint>,
    objective: Vec<(VarId, f64)>,
}

impl Problem {
    /// The decision variables
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Every constraint, in the order they were added
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Terms of the objective, which is minimised
    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    /// Iterate over the constraints of one family
    pub fn constraints_of(&self, kind: ConstraintKind) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.kind == kind)
    }

    /// Find a constraint by family and index
    pub fn find_constraint(
        &self,
        kind: ConstraintKind,
        index: &ConstraintIndex,
    ) -> Option<&Constraint> {
        self.constraints_of(kind).find(|c| c.index == *index)
    }

    /// Number of variables of the families selected by `filter`
    pub fn count_variables<F>(&self, filter: F) -> usize
    where
        F: Fn(&VariableKey) -> bool,
    {
        self.variables.iter().filter(|(_, key, _)| filter(key)).count()
    }
}

/// Builds a [`Problem`] from the variables and constraints of each feature
#[derive(Debug, Default)]
pub struct ProblemBuilder {
    variables: Variables,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable with the given domain
    pub fn add_variable(&mut self, key: VariableKey, definition: VariableDefinition) -> VarId {
        self.variables.add(key, definition)
    }

    /// Add a non-negative variable
    pub fn add_non_negative(&mut self, key: VariableKey) -> VarId {
        self.add_variable(key, VariableDefinition::non_negative())
    }

    /// Add one non-negative variable per timestep
    pub fn add_per_timestep<'a, I, F>(&mut self, timesteps: I, key: F)
    where
        I: IntoIterator<Item = &'a Timestep>,
        F: Fn(Timestep) -> VariableKey,
    {
        for t in timesteps {
            self.add_non_negative(key(*t));
        }
    }

    /// The variables added so far
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Add the constraints of one feature
    pub fn add_constraints(&mut self, feature: &str, constraints: Vec<Constraint>) {
        info!("Added {} {feature} constraints", constraints.len());
        self.constraints.extend(constraints);
    }

    /// Finish the problem with the given objective, to be minimised
    pub fn build(self, objective: LinExpr) -> Problem {
        let (objective, _) = objective.finish();
        Problem {
            variables: self.variables,
            constraints: self.constraints,
            objective,
        }
    }
}
