use serde::{Deserialize, Serialize};
use std::fmt;

/// A single categorical value an `EqualityRule` or `OneOfRule` can admit
#[derive(
    Clone, Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", untagged)]
pub enum Category {
    Bool(bool),
    Int(i64),
    String(String),
}

impl Category {
    pub fn new<T: Into<Category>>(cat: T) -> Self {
        cat.into()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bool(x) => write!(f, "{x}"),
            Self::Int(x) => write!(f, "{x}"),
            Self::String(x) => write!(f, "{x}"),
        }
    }
}

impl From<bool> for Category {
    fn from(value: bool) -> Self {
        Category::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($t: ty),*) => {
        $(
            impl From<$t> for Category {
                fn from(value: $t) -> Self {
                    Category::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(u8, u16, u32, i8, i16, i32, i64);

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::String(value)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::String(String::from(value))
    }
}
