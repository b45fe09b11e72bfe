//! Constraints of the assembled problem.
use super::expression::LinExpr;
use super::variable::VarId;
use crate::assembly::costs::CostType;
use crate::commodity::CommodityKey;
use crate::dsm::DsmKey;
use crate::global::Period;
use crate::id::{CommodityID, SiteID};
use crate::process::ProcessKey;
use crate::storage::StorageKey;
use crate::time::Timestep;
use crate::transmission::TransmissionKey;
use std::ops::RangeInclusive;

/// The family a constraint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintKind {
    /// Commodity balance at a site and timestep
    ResVertex,
    /// Stock purchase per timestep
    ResStockStep,
    /// Annualised stock purchase
    ResStockTotal,
    /// Sale per timestep
    ResSellStep,
    /// Annualised sale
    ResSellTotal,
    /// Purchase per timestep
    ResBuyStep,
    /// Annualised purchase
    ResBuyTotal,
    /// Environmental output per timestep
    ResEnvStep,
    /// Annualised environmental output
    ResEnvTotal,
    /// Annualised emissions over all sites
    #[strum(serialize = "res_global_co2_limit")]
    ResGlobalCo2Limit,
    /// Emissions over all sites and periods
    #[strum(serialize = "res_global_co2_budget")]
    ResGlobalCo2Budget,
    /// Sum of all cost categories
    ResGlobalCostLimit,
    /// Total process capacity
    DefProcessCapacity,
    /// Process input from throughput
    DefProcessInput,
    /// Process output from throughput
    DefProcessOutput,
    /// Intermittent supply input from capacity
    DefIntermittentSupply,
    /// Process input at partial load
    DefPartialProcessInput,
    /// Process output at partial load
    DefPartialProcessOutput,
    /// Throughput limited by capacity
    ResProcessThroughputByCapacity,
    /// Minimum load of partial-load processes
    ResProcessThroughputMinimum,
    /// Maximum increase in throughput
    ResProcessRampUp,
    /// Maximum decrease in throughput
    ResProcessRampDown,
    /// Process capacity bounds
    ResProcessCapacity,
    /// Area used by processes at a site
    ResArea,
    /// Equal capacity of paired buy and sell processes
    ResSellBuySymmetry,
    /// Total transmission capacity
    DefTransmissionCapacity,
    /// Transmission output from input
    DefTransmissionOutput,
    /// Transmission input limited by capacity
    ResTransmissionInputByCapacity,
    /// Transmission capacity bounds
    ResTransmissionCapacity,
    /// Equal capacity in both directions of a link
    ResTransmissionSymmetry,
    /// Storage content recurrence
    DefStorageState,
    /// Total storage power
    DefStoragePower,
    /// Total storage energy capacity
    DefStorageCapacity,
    /// Charging limited by power
    ResStorageInputByPower,
    /// Discharging limited by power
    ResStorageOutputByPower,
    /// Content limited by energy capacity
    ResStorageStateByCapacity,
    /// Storage power bounds
    ResStoragePower,
    /// Storage energy capacity bounds
    ResStorageCapacity,
    /// Fixed initial content and minimum final content
    ResInitialAndFinalStorageState,
    /// Final content at least the initial content
    ResStorageStateCyclicity,
    /// Fixed ratio of energy capacity to power
    DefStorageEnergyPowerRatio,
    /// Downward shifts compensating an upward shift
    DefDsmVariables,
    /// Upward shift per timestep
    ResDsmUpward,
    /// Downward shifts landing on a timestep
    ResDsmDownward,
    /// Combined shifts at a timestep
    ResDsmMaximum,
    /// Cumulative upward shift in the recovery window
    ResDsmRecovery,
    /// Total of a cost category
    DefCosts,
}

/// The index tuple of a constraint
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum ConstraintIndex {
    /// A whole period
    #[display("{_0}")]
    Global(Period),
    /// A cost category
    #[display("{_0}")]
    Cost(CostType),
    /// A commodity at a site
    #[display("{_0}")]
    Commodity(CommodityKey),
    /// A commodity at a site and timestep
    #[display("({_0}, {_1})")]
    CommodityStep(Timestep, CommodityKey),
    /// A process row
    #[display("{_0}")]
    Process(ProcessKey),
    /// A process row at a timestep
    #[display("({_0}, {_1})")]
    ProcessStep(Timestep, ProcessKey),
    /// One commodity flow of a process row at a timestep
    #[display("({_0}, {_1}, {_2})")]
    ProcessFlow(Timestep, ProcessKey, CommodityID),
    /// A site
    #[display("({_0}, {_1})")]
    Site(Period, SiteID),
    /// Two process rows which are coupled
    #[display("({_0}, {_1})")]
    ProcessPair(ProcessKey, ProcessKey),
    /// A transmission row
    #[display("{_0}")]
    Transmission(TransmissionKey),
    /// A transmission row at a timestep
    #[display("({_0}, {_1})")]
    TransmissionStep(Timestep, TransmissionKey),
    /// A storage row
    #[display("{_0}")]
    Storage(StorageKey),
    /// A storage row at a timestep
    #[display("({_0}, {_1})")]
    StorageStep(Timestep, StorageKey),
    /// A DSM resource at a timestep
    #[display("({_0}, {_1})")]
    DsmStep(Timestep, DsmKey),
}

/// A linear constraint of the form `lower <= sum(coeff * var) <= upper`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// The family of the constraint
    pub kind: ConstraintKind,
    /// The index tuple of the constraint
    pub index: ConstraintIndex,
    /// Merged terms, sorted by variable, with no zero coefficients
    pub terms: Vec<(VarId, f64)>,
    /// Bounds on the sum of the terms
    pub bounds: RangeInclusive<f64>,
}

impl Constraint {
    fn new(
        kind: ConstraintKind,
        index: ConstraintIndex,
        expr: LinExpr,
        lower: f64,
        upper: f64,
    ) -> Self {
        let (terms, constant) = expr.finish();
        Self {
            kind,
            index,
            terms,
            bounds: (lower - constant)..=(upper - constant),
        }
    }

    /// `expr == rhs`
    pub fn equal(kind: ConstraintKind, index: ConstraintIndex, expr: LinExpr, rhs: f64) -> Self {
        Self::new(kind, index, expr, rhs, rhs)
    }

    /// `expr <= rhs`
    pub fn at_most(kind: ConstraintKind, index: ConstraintIndex, expr: LinExpr, rhs: f64) -> Self {
        Self::new(kind, index, expr, f64::NEG_INFINITY, rhs)
    }

    /// `expr >= rhs`
    pub fn at_least(kind: ConstraintKind, index: ConstraintIndex, expr: LinExpr, rhs: f64) -> Self {
        Self::new(kind, index, expr, rhs, f64::INFINITY)
    }

    /// `lower <= expr <= upper`
    pub fn between(
        kind: ConstraintKind,
        index: ConstraintIndex,
        expr: LinExpr,
        lower: f64,
        upper: f64,
    ) -> Self {
        Self::new(kind, index, expr, lower, upper)
    }

    /// Whether this is an equality constraint
    #[allow(clippy::float_cmp)]
    pub fn is_equality(&self) -> bool {
        self.bounds.start() == self.bounds.end()
    }

    /// The coefficient of a variable (zero if absent)
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .binary_search_by_key(&var, |(v, _)| *v)
            .map_or(0.0, |pos| self.terms[pos].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::variable::{VariableDefinition, VariableKey, Variables};
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_kind_display() {
        assert_eq!(ConstraintKind::ResVertex.to_string(), "res_vertex");
        assert_eq!(
            ConstraintKind::DefProcessCapacity.to_string(),
            "def_process_capacity"
        );
        assert_eq!(
            ConstraintKind::ResGlobalCo2Limit.to_string(),
            "res_global_co2_limit"
        );
    }

    #[test]
    fn test_constant_moves_to_bounds() {
        let mut variables = Variables::default();
        let key = ProcessKey::new(2020, &"North".into(), &"Gas plant".into());
        let cap = variables.add(
            VariableKey::ProcessCapacity(key.clone()),
            VariableDefinition::non_negative(),
        );

        // cap - 40 <= 60
        let mut expr = LinExpr::term(cap, 1.0);
        expr.add_constant(-40.0);
        let constraint = Constraint::at_most(
            ConstraintKind::ResProcessCapacity,
            ConstraintIndex::Process(key),
            expr,
            60.0,
        );
        assert_eq!(constraint.terms, [(cap, 1.0)]);
        assert_approx_eq!(f64, *constraint.bounds.end(), 100.0);
        assert_eq!(*constraint.bounds.start(), f64::NEG_INFINITY);
        assert!(!constraint.is_equality());
        assert_eq!(constraint.coefficient(cap), 1.0);
        assert_eq!(constraint.index.to_string(), "(2020, North, Gas plant)");
    }

    #[test]
    fn test_equal() {
        let constraint = Constraint::equal(
            ConstraintKind::ResGlobalCostLimit,
            ConstraintIndex::Global(2020),
            LinExpr::new(),
            5.0,
        );
        assert!(constraint.is_equality());
        assert_eq!(constraint.bounds, 5.0..=5.0);
    }
}
