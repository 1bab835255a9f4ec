use ppl_task::{Fact, Operator, State};
use std::collections::HashSet;

/// What a [`Heuristic`] needs to evaluate one search node: its state, the operator that
/// produced it from its parent (`None` at the root), and whatever bookkeeping the parent
/// node carried for this heuristic (`None` at the root or for a stateless heuristic).
pub struct EvalContext<'a> {
    pub state: &'a State,
    pub applied: Option<&'a Operator>,
    pub parent_not_reached: Option<&'a HashSet<Fact>>,
}

/// A single capability shared by every heuristic: estimate the cost to the goal from a
/// search node, or report it unreachable. Stateful heuristics (landmarks) also return the
/// bookkeeping the node should carry forward to its own children as `parent_not_reached`;
/// stateless ones (RPG/FF) always return `None` there.
pub trait Heuristic {
    fn evaluate(&self, ctx: EvalContext) -> (Option<u32>, Option<HashSet<Fact>>);
}
