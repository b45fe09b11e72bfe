//! Decision variables of the assembled problem.
use crate::assembly::costs::CostType;
use crate::commodity::CommodityKey;
use crate::dsm::DsmKey;
use crate::id::CommodityID;
use crate::process::ProcessKey;
use crate::storage::StorageKey;
use crate::time::Timestep;
use crate::transmission::TransmissionKey;
use indexmap::IndexMap;

/// Refers to one column of the problem.
///
/// Note that this type does **not** include the value of the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in the problem
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies a decision variable by its family and index tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum VariableKey {
    /// Total cost of one category (free sign)
    #[display("costs[{_0}]")]
    Cost(CostType),
    /// Purchase of a stock commodity
    #[display("e_co_stock[{_0}, {_1}]")]
    StockSource(Timestep, CommodityKey),
    /// Sale of a sell commodity
    #[display("e_co_sell[{_0}, {_1}]")]
    SellSource(Timestep, CommodityKey),
    /// Purchase of a buy commodity
    #[display("e_co_buy[{_0}, {_1}]")]
    BuySource(Timestep, CommodityKey),
    /// Total process capacity
    #[display("cap_pro[{_0}]")]
    ProcessCapacity(ProcessKey),
    /// Newly built process capacity
    #[display("cap_pro_new[{_0}]")]
    ProcessNewCapacity(ProcessKey),
    /// Process throughput
    #[display("tau_pro[{_0}, {_1}]")]
    ProcessThroughput(Timestep, ProcessKey),
    /// Commodity flow into a process
    #[display("e_pro_in[{_0}, {_1}, {_2}]")]
    ProcessInput(Timestep, ProcessKey, CommodityID),
    /// Commodity flow out of a process
    #[display("e_pro_out[{_0}, {_1}, {_2}]")]
    ProcessOutput(Timestep, ProcessKey, CommodityID),
    /// Total transmission capacity
    #[display("cap_tra[{_0}]")]
    TransmissionCapacity(TransmissionKey),
    /// Newly built transmission capacity
    #[display("cap_tra_new[{_0}]")]
    TransmissionNewCapacity(TransmissionKey),
    /// Commodity entering a transmission link
    #[display("e_tra_in[{_0}, {_1}]")]
    TransmissionInput(Timestep, TransmissionKey),
    /// Commodity leaving a transmission link
    #[display("e_tra_out[{_0}, {_1}]")]
    TransmissionOutput(Timestep, TransmissionKey),
    /// Total storage power
    #[display("cap_sto_p[{_0}]")]
    StoragePower(StorageKey),
    /// Newly built storage power
    #[display("cap_sto_p_new[{_0}]")]
    StorageNewPower(StorageKey),
    /// Total storage energy capacity
    #[display("cap_sto_c[{_0}]")]
    StorageEnergy(StorageKey),
    /// Newly built storage energy capacity
    #[display("cap_sto_c_new[{_0}]")]
    StorageNewEnergy(StorageKey),
    /// Charging of a storage unit
    #[display("e_sto_in[{_0}, {_1}]")]
    StorageInput(Timestep, StorageKey),
    /// Discharging of a storage unit
    #[display("e_sto_out[{_0}, {_1}]")]
    StorageOutput(Timestep, StorageKey),
    /// Content of a storage unit
    #[display("e_sto_con[{_0}, {_1}]")]
    StorageContent(Timestep, StorageKey),
    /// Upward demand shift at a timestep
    #[display("dsm_up[{_0}, {_1}]")]
    DsmUp(Timestep, DsmKey),
    /// Downward shift at the second timestep compensating an upward shift at the first
    #[display("dsm_down[{_0}, {_1}, {_2}]")]
    DsmDown(Timestep, Timestep, DsmKey),
}

/// The domain of a variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableDefinition {
    /// The variable's minimum value
    pub lower: f64,
    /// The variable's maximum value
    pub upper: f64,
}

impl VariableDefinition {
    /// A variable in `[0, +inf)`
    pub fn non_negative() -> Self {
        Self {
            lower: 0.0,
            upper: f64::INFINITY,
        }
    }

    /// A variable in `(-inf, +inf)`
    pub fn free() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }
}

/// The variables of a problem, in the order in which they were added.
///
/// Variables are looked up by key when constraints are assembled and enumerated in order when
/// the problem is passed to the solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(IndexMap<VariableKey, VariableDefinition>);

impl Variables {
    /// Add a variable, returning its [`VarId`].
    ///
    /// Panics if a variable with the same key already exists.
    pub(super) fn add(&mut self, key: VariableKey, definition: VariableDefinition) -> VarId {
        assert!(!self.0.contains_key(&key), "Duplicate variable {key}");
        let (index, _) = self.0.insert_full(key, definition);

        VarId(index)
    }

    /// Get the [`VarId`] for the given key.
    ///
    /// Panics if there is no such variable: index derivation guarantees that every key looked up
    /// during assembly was declared.
    pub fn get(&self, key: &VariableKey) -> VarId {
        self.find(key)
            .unwrap_or_else(|| panic!("No variable found for {key}"))
    }

    /// Get the [`VarId`] for the given key, if there is such a variable
    pub fn find(&self, key: &VariableKey) -> Option<VarId> {
        self.0.get_index_of(key).map(VarId)
    }

    /// Whether there is a variable with the given key
    pub fn contains(&self, key: &VariableKey) -> bool {
        self.0.contains_key(key)
    }

    /// The key of a variable
    pub fn key(&self, id: VarId) -> &VariableKey {
        self.0
            .get_index(id.0)
            .map(|(key, _)| key)
            .expect("Variable index out of range")
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over variables in order
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VariableKey, &VariableDefinition)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, (key, definition))| (VarId(index), key, definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity_key() -> VariableKey {
        VariableKey::ProcessCapacity(ProcessKey::new(
            2020,
            &"North".into(),
            &"Coal plant".into(),
        ))
    }

    #[test]
    fn test_add_and_get() {
        let mut variables = Variables::default();
        let cost = variables.add(VariableKey::Cost(CostType::Fuel), VariableDefinition::free());
        let cap = variables.add(capacity_key(), VariableDefinition::non_negative());

        assert_eq!(variables.get(&VariableKey::Cost(CostType::Fuel)), cost);
        assert_eq!(variables.get(&capacity_key()), cap);
        assert_eq!(cap.index(), 1);
        assert_eq!(variables.key(cost), &VariableKey::Cost(CostType::Fuel));
        assert!(variables.find(&VariableKey::Cost(CostType::Invest)).is_none());
    }

    #[test]
    #[should_panic(expected = "No variable found for cap_pro[(2020, North, Coal plant)]")]
    fn test_get_missing() {
        Variables::default().get(&capacity_key());
    }

    #[test]
    #[should_panic(expected = "Duplicate variable cap_pro[(2020, North, Coal plant)]")]
    fn test_add_duplicate() {
        let mut variables = Variables::default();
        variables.add(capacity_key(), VariableDefinition::non_negative());
        variables.add(capacity_key(), VariableDefinition::non_negative());
    }

    #[test]
    fn test_display() {
        let key = VariableKey::DsmDown(
            3,
            5,
            DsmKey {
                period: 2020,
                site: "North".into(),
                commodity: "Elec".into(),
            },
        );
        assert_eq!(key.to_string(), "dsm_down[3, 5, (2020, North, Elec)]");
    }
}
