pub mod driver;

pub use driver::{heuristic_plan, sat_plan, HeuristicKind};
