#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]

mod category;
mod error;
mod rule;
mod table;
mod variable;

pub use category::Category;
pub use error::{IncompatibleRuleError, InvalidRuleError, ShapeMismatchError};
pub use rule::{IntervalRule, Rule};
pub use table::FeatureTable;
pub use variable::Variable;
