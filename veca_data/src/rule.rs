//! Predicates describing which values of an original variable a derived
//! variable stands for.
//!
//! Rules come in two families. Interval rules cover a numeric range and can
//! only be combined with other intervals they overlap or touch. Equality and
//! one-of rules cover sets of categories and can always be combined with each
//! other. The two families never mix.
use crate::{Category, IncompatibleRuleError, InvalidRuleError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The half-open range `[lower, upper)`. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IntervalRule {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl IntervalRule {
    pub fn new(
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Self, InvalidRuleError> {
        if lower.map_or(false, f64::is_nan) || upper.map_or(false, f64::is_nan)
        {
            return Err(InvalidRuleError::NanBound);
        }
        match (lower, upper) {
            (None, None) => Err(InvalidRuleError::UnboundedInterval),
            (Some(lower), Some(upper)) if lower >= upper => {
                Err(InvalidRuleError::InvertedBounds { lower, upper })
            }
            _ => Ok(Self { lower, upper }),
        }
    }

    #[inline]
    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    fn lo(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    fn hi(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }

    /// True if the two ranges overlap or share an endpoint
    pub fn touches(&self, other: &Self) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.lo() <= other.lo() && other.hi() <= self.hi()
    }

    /// The smallest interval covering both. An unbounded side on either input
    /// stays unbounded.
    pub fn hull(&self, other: &Self) -> Self {
        let lower = match (self.lower, other.lower) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        };
        let upper = match (self.upper, other.upper) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Self { lower, upper }
    }
}

// Bounds are never NaN, so float equality is an equivalence relation here.
impl PartialEq for IntervalRule {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower && self.upper == other.upper
    }
}

impl Eq for IntervalRule {}

fn hash_bound<H: Hasher>(bound: Option<f64>, state: &mut H) {
    // -0.0 == 0.0 so they must hash alike
    bound.map(|x| if x == 0.0 { 0.0_f64 } else { x }.to_bits()).hash(state);
}

impl Hash for IntervalRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_bound(self.lower, state);
        hash_bound(self.upper, state);
    }
}

/// A predicate over the values of one original variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Interval(IntervalRule),
    Equality(Category),
    OneOf(BTreeSet<Category>),
}

impl Rule {
    pub fn interval(
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<Self, InvalidRuleError> {
        IntervalRule::new(lower, upper).map(Rule::Interval)
    }

    /// `[lower, upper)`
    pub fn between(lower: f64, upper: f64) -> Result<Self, InvalidRuleError> {
        Self::interval(Some(lower), Some(upper))
    }

    /// `[lower, inf)`
    pub fn at_least(lower: f64) -> Result<Self, InvalidRuleError> {
        Self::interval(Some(lower), None)
    }

    /// `(-inf, upper)`
    pub fn below(upper: f64) -> Result<Self, InvalidRuleError> {
        Self::interval(None, Some(upper))
    }

    pub fn equal<T: Into<Category>>(value: T) -> Self {
        Rule::Equality(value.into())
    }

    pub fn one_of<T, I>(values: I) -> Result<Self, InvalidRuleError>
    where
        T: Into<Category>,
        I: IntoIterator<Item = T>,
    {
        let values: BTreeSet<Category> =
            values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            Err(InvalidRuleError::EmptyValueSet)
        } else {
            Ok(Rule::OneOf(values))
        }
    }

    /// The admissible categories, or `None` for interval rules
    pub fn categories(&self) -> Option<BTreeSet<Category>> {
        match self {
            Rule::Interval(_) => None,
            Rule::Equality(x) => Some(BTreeSet::from([x.clone()])),
            Rule::OneOf(xs) => Some(xs.clone()),
        }
    }

    /// Whether the two rules may be combined into one rule. Intervals must
    /// also overlap or touch.
    pub fn can_merge_with(&self, other: &Rule) -> bool {
        match (self, other) {
            (Rule::Interval(a), Rule::Interval(b)) => a.touches(b),
            (Rule::Interval(_), _) | (_, Rule::Interval(_)) => false,
            (
                Rule::Equality(_) | Rule::OneOf(_),
                Rule::Equality(_) | Rule::OneOf(_),
            ) => true,
        }
    }

    /// True if every value `other` admits is also admitted by `self`
    pub fn contains(&self, other: &Rule) -> bool {
        match (self, other) {
            (Rule::Interval(a), Rule::Interval(b)) => a.contains(b),
            (Rule::Interval(_), _) | (_, Rule::Interval(_)) => false,
            (Rule::Equality(x), Rule::Equality(y)) => x == y,
            (Rule::Equality(x), Rule::OneOf(ys)) => ys.iter().all(|y| y == x),
            (Rule::OneOf(xs), Rule::Equality(y)) => xs.contains(y),
            (Rule::OneOf(xs), Rule::OneOf(ys)) => ys.is_subset(xs),
        }
    }

    /// Combine two rules into one covering both.
    ///
    /// Intervals produce their hull; categorical rules produce the union of
    /// their values.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use veca_data::Rule;
    /// let a = Rule::between(0.0, 5.0).unwrap();
    /// let b = Rule::between(5.0, 10.0).unwrap();
    /// let ab = a.merge_with(&b).unwrap();
    /// assert_eq!(ab, Rule::between(0.0, 10.0).unwrap());
    ///
    /// let c = Rule::between(10.0, 15.0).unwrap();
    /// assert!(a.merge_with(&c).is_err());
    /// ```
    pub fn merge_with(
        &self,
        other: &Rule,
    ) -> Result<Rule, IncompatibleRuleError> {
        if !self.can_merge_with(other) {
            return Err(IncompatibleRuleError::new(self, other));
        }
        let merged = match (self, other) {
            (Rule::Interval(a), Rule::Interval(b)) => Rule::Interval(a.hull(b)),
            (Rule::Equality(x), Rule::Equality(y)) if x == y => {
                Rule::Equality(x.clone())
            }
            _ => {
                // can_merge_with guarantees both are categorical here
                let mut values = self.categories().unwrap_or_default();
                values.extend(other.categories().unwrap_or_default());
                Rule::OneOf(values)
            }
        };
        Ok(merged)
    }

    /// Human readable predicate over the variable called `name`
    pub fn describe(&self, name: &str) -> String {
        match self {
            Rule::Interval(ivl) => match (ivl.lower, ivl.upper) {
                (Some(lo), Some(hi)) => format!("{lo} <= {name} < {hi}"),
                (Some(lo), None) => format!("{name} >= {lo}"),
                (None, Some(hi)) => format!("{name} < {hi}"),
                (None, None) => name.to_owned(),
            },
            Rule::Equality(x) => format!("{name} = {x}"),
            Rule::OneOf(xs) => {
                let values: Vec<String> =
                    xs.iter().map(|x| x.to_string()).collect();
                format!("{name} in {{{}}}", values.join(", "))
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.describe("x"))
    }
}
