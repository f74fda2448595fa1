use crate::{IncompatibleRuleError, Rule};
use serde::Serialize;
use std::fmt;

/// A named handle over one feature column.
///
/// Plain variables are original columns and never merge. Derived variables
/// carry the name of the original variable they came from and the `Rule`
/// describing which of its values they represent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Variable {
    name: String,
    origin: Option<String>,
    rule: Option<Rule>,
}

impl Variable {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            origin: None,
            rule: None,
        }
    }

    /// A variable derived from `origin` by `rule`. The name is generated from
    /// the rule, so equal rules over the same origin give equal variables.
    ///
    /// ```rust
    /// # use veca_data::{Rule, Variable};
    /// let v = Variable::derived("age", Rule::between(18.0, 30.0).unwrap());
    /// assert_eq!(v.name(), "18 <= age < 30");
    /// ```
    pub fn derived<S: Into<String>>(origin: S, rule: Rule) -> Self {
        let origin = origin.into();
        Self {
            name: rule.describe(&origin),
            origin: Some(origin),
            rule: Some(rule),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[inline]
    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    #[inline]
    pub fn is_derived(&self) -> bool {
        self.rule.is_some()
    }

    /// Two variables can merge if they are derived from the same original
    /// variable and their rules can merge.
    pub fn can_merge_with(&self, other: &Variable) -> bool {
        match (&self.origin, &self.rule, &other.origin, &other.rule) {
            (Some(o1), Some(r1), Some(o2), Some(r2)) => {
                o1 == o2 && r1.can_merge_with(r2)
            }
            _ => false,
        }
    }

    pub fn merge_with(
        &self,
        other: &Variable,
    ) -> Result<Variable, IncompatibleRuleError> {
        match (&self.origin, &self.rule, &other.origin, &other.rule) {
            (Some(o1), Some(r1), Some(o2), Some(r2)) if o1 == o2 => {
                let rule = r1.merge_with(r2)?;
                Ok(Variable::derived(o1.clone(), rule))
            }
            _ => Err(IncompatibleRuleError::new(self, other)),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}
