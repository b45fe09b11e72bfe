//! Assembly of the optimisation problem from a model.
//!
//! Assembly runs in two phases. First every feature declares its variables. Then each feature's
//! constraints are generated by a pure function of the model, the derived index sets, the economic
//! factors and the declared variables.
use crate::asset::AssetKey;
use crate::commodity::CommodityKey;
use crate::finance::EconomicFactors;
use crate::index::{AssetIndex, ModelIndex};
use crate::model::Model;
use crate::problem::{CapacitySource, LinExpr, Problem, ProblemBuilder, VarId, VariableKey, Variables};
use crate::process::ProcessKey;
use crate::storage::StorageKey;
use crate::time::Timestep;
use crate::transmission::TransmissionKey;
use anyhow::Result;
use log::info;

pub mod commodity;
pub mod costs;
pub mod dsm;
pub mod process;
pub mod storage;
pub mod transmission;

/// Everything a constraint assembler may read
pub struct AssemblyContext<'a> {
    /// The model
    pub model: &'a Model,
    /// Derived index sets
    pub index: &'a ModelIndex,
    /// Economic factors
    pub factors: &'a EconomicFactors,
    /// The declared variables
    pub variables: &'a Variables,
}

impl AssemblyContext<'_> {
    /// Look up a variable
    pub fn var(&self, key: VariableKey) -> VarId {
        self.variables.get(&key)
    }

    fn capacity<K, F>(&self, index: &AssetIndex<K>, key: &K, variable: F) -> CapacitySource
    where
        K: AssetKey,
        F: FnOnce(K) -> VariableKey,
    {
        if index.is_variable(key) {
            CapacitySource::Variable(self.var(variable(key.clone())))
        } else {
            CapacitySource::Fixed(index.installed_capacity(key))
        }
    }

    /// Capacity of a process row
    pub fn process_capacity(&self, key: &ProcessKey) -> CapacitySource {
        self.capacity(&self.index.processes, key, VariableKey::ProcessCapacity)
    }

    /// Capacity of a transmission row
    pub fn transmission_capacity(&self, key: &TransmissionKey) -> CapacitySource {
        self.capacity(
            &self.index.transmissions,
            key,
            VariableKey::TransmissionCapacity,
        )
    }

    /// Power of a storage row
    pub fn storage_power(&self, key: &StorageKey) -> CapacitySource {
        self.capacity(&self.index.storage_power, key, VariableKey::StoragePower)
    }

    /// Energy capacity of a storage row
    pub fn storage_energy(&self, key: &StorageKey) -> CapacitySource {
        self.capacity(&self.index.storage_energy, key, VariableKey::StorageEnergy)
    }

    /// Net consumption of a commodity at a site and timestep.
    ///
    /// This is process inputs minus process outputs, plus net transmission exports and net
    /// storage charging. A negative value means the commodity is created.
    pub fn balance(&self, key: &CommodityKey, t: Timestep) -> LinExpr {
        let mut expr = LinExpr::new();
        let Some(terms) = self.index.balance.get(key) else {
            return expr;
        };

        for process in &terms.process_inputs {
            expr.add_term(
                self.var(VariableKey::ProcessInput(t, process.clone(), key.commodity.clone())),
                1.0,
            );
        }
        for process in &terms.process_outputs {
            expr.add_term(
                self.var(VariableKey::ProcessOutput(t, process.clone(), key.commodity.clone())),
                -1.0,
            );
        }
        if self.model.features.transmission {
            for link in &terms.transmission_out {
                expr.add_term(self.var(VariableKey::TransmissionInput(t, link.clone())), 1.0);
            }
            for link in &terms.transmission_in {
                expr.add_term(self.var(VariableKey::TransmissionOutput(t, link.clone())), -1.0);
            }
        }
        if self.model.features.storage {
            for storage in &terms.storages {
                expr.add_term(self.var(VariableKey::StorageInput(t, storage.clone())), 1.0)
                    .add_term(self.var(VariableKey::StorageOutput(t, storage.clone())), -1.0);
            }
        }

        expr
    }

    /// The value of the total capacity of an asset row, given as `installed + sum(new)`
    fn capacity_definition<K, F>(&self, index: &AssetIndex<K>, key: &K, new: F) -> LinExpr
    where
        K: AssetKey,
        F: Fn(K) -> VariableKey,
    {
        let mut expr = LinExpr::new();
        for built in index.built_in(key) {
            expr.add_term(self.var(new(built.clone())), 1.0);
        }
        expr.add_constant(index.installed_capacity(key));
        expr
    }
}

/// Assemble the optimisation problem for a model.
///
/// Index sets and economic factors are derived first. Each feature then declares its variables
/// and finally its constraints. Disabled features contribute nothing.
pub fn assemble(model: &Model) -> Result<Problem> {
    info!("Assembling model with features: {}", model.features);
    let index = ModelIndex::derive(model)?;
    let factors = EconomicFactors::new(model, &index)?;

    let mut builder = ProblemBuilder::new();
    costs::add_variables(&mut builder);
    commodity::add_variables(&mut builder, model);
    process::add_variables(&mut builder, model, &index);
    if model.features.transmission {
        transmission::add_variables(&mut builder, model, &index);
    }
    if model.features.storage {
        storage::add_variables(&mut builder, model, &index);
    }
    if model.features.dsm {
        dsm::add_variables(&mut builder, model, &index);
    }
    info!("Declared {} variables", builder.variables().len());

    let ctx = AssemblyContext {
        model,
        index: &index,
        factors: &factors,
        variables: builder.variables(),
    };
    let mut constraints = vec![
        ("commodity", commodity::constraints(&ctx)?),
        ("process", process::constraints(&ctx)?),
    ];
    if model.features.transmission {
        constraints.push(("transmission", transmission::constraints(&ctx)));
    }
    if model.features.storage {
        constraints.push(("storage", storage::constraints(&ctx)));
    }
    if model.features.dsm {
        constraints.push(("DSM", dsm::constraints(&ctx)));
    }
    constraints.push(("cost", costs::constraints(&ctx)?));
    let objective = costs::objective(&ctx);

    for (feature, constraints) in constraints {
        builder.add_constraints(feature, constraints);
    }

    Ok(builder.build(objective))
}
