pub mod heuristic;
pub mod landmarks;
pub mod rpg;

pub use heuristic::{EvalContext, Heuristic};
pub use landmarks::LandmarkHeuristic;
pub use rpg::RpgHeuristic;
