use crate::{ShapeMismatchError, Variable};
use indexmap::IndexMap;

/// Per-sample feature values keyed by variable.
///
/// Every column has the same number of samples and columns keep their
/// insertion order, which keeps downstream merge rounds deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    n_samples: usize,
    columns: IndexMap<Variable, Vec<f64>>,
}

impl FeatureTable {
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            columns: IndexMap::new(),
        }
    }

    /// Build a table from `(variable, values)` pairs. The first column sets
    /// the number of samples.
    pub fn from_columns<I>(columns: I) -> Result<Self, ShapeMismatchError>
    where
        I: IntoIterator<Item = (Variable, Vec<f64>)>,
    {
        let mut columns = columns.into_iter().peekable();
        let n_samples = columns.peek().map_or(0, |(_, xs)| xs.len());
        let mut table = FeatureTable::new(n_samples);
        for (variable, values) in columns {
            table.insert(variable, values)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Insert or replace a column
    pub fn insert(
        &mut self,
        variable: Variable,
        values: Vec<f64>,
    ) -> Result<(), ShapeMismatchError> {
        if values.len() != self.n_samples {
            return Err(ShapeMismatchError::ColumnLength {
                variable: variable.to_string(),
                expected: self.n_samples,
                found: values.len(),
            });
        }
        self.columns.insert(variable, values);
        Ok(())
    }

    /// Remove a column, keeping the order of the others
    pub fn remove(&mut self, variable: &Variable) -> Option<Vec<f64>> {
        self.columns.shift_remove(variable)
    }

    pub fn get(&self, variable: &Variable) -> Option<&[f64]> {
        self.columns.get(variable).map(|xs| xs.as_slice())
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.columns.contains_key(variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.columns.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &[f64])> {
        self.columns.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn columns(&self) -> &IndexMap<Variable, Vec<f64>> {
        &self.columns
    }

    pub fn into_columns(self) -> IndexMap<Variable, Vec<f64>> {
        self.columns
    }
}
