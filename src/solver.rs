//! Solving an assembled problem with HiGHS.
use crate::assembly::costs::CostType;
use crate::problem::{Problem, VariableKey};
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, RowProblem, Sense};
use indexmap::IndexMap;
use log::info;
use strum::IntoEnumIterator;

/// The outcome of a solver run.
///
/// Anything other than [`SolveStatus::Optimal`] is a property of the problem, not a failure of
/// the program.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// An optimal solution was found
    Optimal,
    /// The constraints cannot all be satisfied
    Infeasible,
    /// The objective can be decreased without limit
    Unbounded,
    /// The solver ran out of time
    TimeLimit,
    /// Any other status reported by the solver
    Error(String),
}

impl From<HighsModelStatus> for SolveStatus {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            HighsModelStatus::Optimal => Self::Optimal,
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                Self::Infeasible
            }
            HighsModelStatus::Unbounded => Self::Unbounded,
            HighsModelStatus::ReachedTimeLimit => Self::TimeLimit,
            status => Self::Error(format!("{status:?}")),
        }
    }
}

/// Values of the variables at the optimum
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: IndexMap<VariableKey, f64>,
    costs: IndexMap<CostType, f64>,
    objective: f64,
}

impl Solution {
    /// The value of a variable, if the problem has it
    pub fn value(&self, key: &VariableKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Iterate over every variable and its value
    pub fn iter(&self) -> impl Iterator<Item = (&VariableKey, f64)> {
        self.values.iter().map(|(key, value)| (key, *value))
    }

    /// The value of a cost category
    pub fn cost(&self, cost_type: CostType) -> f64 {
        self.costs[&cost_type]
    }

    /// Iterate over the cost categories and their values
    pub fn iter_costs(&self) -> impl Iterator<Item = (CostType, f64)> + '_ {
        self.costs.iter().map(|(cost_type, value)| (*cost_type, *value))
    }

    /// The objective value
    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// The status of a solver run and, if optimal, the solution
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// The status reported by the solver
    pub status: SolveStatus,
    /// The solution, present only if the status is optimal
    pub solution: Option<Solution>,
}

/// Solve a problem with HiGHS.
///
/// # Arguments
///
/// * `problem` - The problem to solve
/// * `time_limit` - Optional time limit in seconds
pub fn solve(problem: &Problem, time_limit: Option<f64>) -> Result<SolveOutcome> {
    let mut highs_problem = RowProblem::default();
    let objective: IndexMap<_, _> = problem.objective().iter().copied().collect();
    let columns: Vec<_> = problem
        .variables()
        .iter()
        .map(|(id, _, definition)| {
            let coeff = objective.get(&id).copied().unwrap_or(0.0);
            highs_problem.add_column(coeff, definition.lower..=definition.upper)
        })
        .collect();
    for constraint in problem.constraints() {
        highs_problem.add_row(
            constraint.bounds.clone(),
            constraint
                .terms
                .iter()
                .map(|(var, coeff)| (columns[var.index()], *coeff)),
        );
    }

    let mut model = highs_problem.optimise(Sense::Minimise);
    configure_highs(&mut model, time_limit);

    let solved = model
        .try_solve()
        .map_err(|status| anyhow!("HiGHS failed to solve the problem: {status:?}"))?;
    let status = SolveStatus::from(solved.status());
    info!("Solver finished with status {status:?}");
    if status != SolveStatus::Optimal {
        return Ok(SolveOutcome {
            status,
            solution: None,
        });
    }

    let values = solved.get_solution().columns().to_vec();
    let objective = problem
        .objective()
        .iter()
        .map(|(var, coeff)| values[var.index()] * coeff)
        .sum();
    let values: IndexMap<_, _> = problem
        .variables()
        .iter()
        .map(|(id, key, _)| (key.clone(), values[id.index()]))
        .collect();
    let costs = CostType::iter()
        .map(|cost_type| {
            let value = values
                .get(&VariableKey::Cost(cost_type))
                .copied()
                .unwrap_or(0.0);
            (cost_type, value)
        })
        .collect();

    Ok(SolveOutcome {
        status,
        solution: Some(Solution {
            values,
            costs,
            objective,
        }),
    })
}

/// Apply the time limit and route HiGHS output to the console unless logging is off
fn configure_highs(model: &mut highs::Model, time_limit: Option<f64>) {
    if let Some(time_limit) = time_limit {
        model.set_option("time_limit", time_limit);
    }

    if let Ok(log_level) = std::env::var(crate::log::LOG_LEVEL_ENV_VAR) {
        if log_level.eq_ignore_ascii_case("off") {
            model.set_option("output_flag", false);
            return;
        }
    }

    model.set_option("log_to_console", true);
    model.set_option("output_flag", true);
}
