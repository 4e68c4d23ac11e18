//! QUBO construction for context-switch scheduling.
//!
//! The builder turns a validated [`TaskCatalog`](crate::catalog::TaskCatalog)
//! into a [`QuboModel`] over admissible `(task, timeline, start)` variables and
//! records the penalty weight it used.

mod builder;
mod model;
mod switch_cost;
mod variables;

pub use builder::{build_qubo, derive_penalty_weight, BuildError, QuboProblem};
pub use model::{Adjacency, QuboModel, VarId};
pub use switch_cost::SwitchCosts;
pub use variables::{start_range, Variable, VariableIndex};
