//! Linear expressions over problem variables.
use super::variable::VarId;
use itertools::Itertools;

/// Where the capacity of an asset row comes from.
///
/// Expandable rows have a capacity variable, while rows which cannot be expanded have a fixed
/// capacity equal to what is already installed. Using this type lets one constraint template
/// serve both cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapacitySource {
    /// The capacity is a decision variable
    Variable(VarId),
    /// The capacity is a constant
    Fixed(f64),
}

/// A linear expression: a sum of weighted variables plus a constant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    /// An empty expression
    pub fn new() -> Self {
        Self::default()
    }

    /// An expression with a single term
    pub fn term(var: VarId, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coeff);
        expr
    }

    /// Add `coeff * var`
    pub fn add_term(&mut self, var: VarId, coeff: f64) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    /// Add a constant
    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Add `coeff * capacity`, which is a term or a constant depending on the source
    pub fn add_capacity(&mut self, source: CapacitySource, coeff: f64) -> &mut Self {
        match source {
            CapacitySource::Variable(var) => self.add_term(var, coeff),
            CapacitySource::Fixed(value) => self.add_constant(value * coeff),
        }
    }

    /// Add `scale * other`
    pub fn add_scaled(&mut self, other: &LinExpr, scale: f64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|(var, coeff)| (*var, coeff * scale)));
        self.constant += other.constant * scale;
        self
    }

    /// Whether the expression has no variable terms
    pub fn has_no_terms(&self) -> bool {
        self.terms.is_empty()
    }

    /// Split the expression into its terms and its constant.
    ///
    /// Terms for the same variable are merged, terms are sorted by variable and terms with a
    /// zero coefficient are dropped.
    pub fn finish(self) -> (Vec<(VarId, f64)>, f64) {
        let terms = self
            .terms
            .into_iter()
            .sorted_by_key(|(var, _)| *var)
            .coalesce(|(var1, coeff1), (var2, coeff2)| {
                if var1 == var2 {
                    Ok((var1, coeff1 + coeff2))
                } else {
                    Err(((var1, coeff1), (var2, coeff2)))
                }
            })
            .filter(|(_, coeff)| *coeff != 0.0)
            .collect();

        (terms, self.constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::variable::{VariableDefinition, VariableKey, Variables};
    use crate::process::ProcessKey;
    use float_cmp::assert_approx_eq;

    fn vars() -> (VarId, VarId) {
        let mut variables = Variables::default();
        let key = ProcessKey::new(2020, &"North".into(), &"Gas plant".into());
        let a = variables.add(
            VariableKey::ProcessCapacity(key.clone()),
            VariableDefinition::non_negative(),
        );
        let b = variables.add(
            VariableKey::ProcessNewCapacity(key),
            VariableDefinition::non_negative(),
        );
        (a, b)
    }

    #[test]
    fn test_finish_merges_and_sorts() {
        let (a, b) = vars();
        let mut expr = LinExpr::new();
        expr.add_term(b, 2.0)
            .add_term(a, 1.0)
            .add_term(b, -2.0)
            .add_term(a, 0.5)
            .add_constant(3.0);

        let (terms, constant) = expr.finish();
        assert_eq!(terms, [(a, 1.5)]);
        assert_approx_eq!(f64, constant, 3.0);
    }

    #[test]
    fn test_add_capacity() {
        let (a, _) = vars();
        let mut expr = LinExpr::new();
        expr.add_capacity(CapacitySource::Variable(a), -1.0)
            .add_capacity(CapacitySource::Fixed(100.0), 0.5);

        let (terms, constant) = expr.finish();
        assert_eq!(terms, [(a, -1.0)]);
        assert_approx_eq!(f64, constant, 50.0);
    }

    #[test]
    fn test_add_scaled() {
        let (a, b) = vars();
        let mut inner = LinExpr::term(a, 1.0);
        inner.add_term(b, -1.0).add_constant(2.0);
        let mut expr = LinExpr::term(b, 1.0);
        expr.add_scaled(&inner, -2.0);

        let (terms, constant) = expr.finish();
        assert_eq!(terms, [(a, -2.0), (b, 3.0)]);
        assert_approx_eq!(f64, constant, -4.0);
    }
}
