pub mod error;
pub mod fact;
pub mod operator;
pub mod state;
pub mod task;

pub use error::{PlanError, Result};
pub use fact::{canonical_atom, Fact, FactTable};
pub use operator::{OpId, Operator};
pub use state::State;
pub use task::PlanningTask;
