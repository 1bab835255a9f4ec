use crate::heuristic::{EvalContext, Heuristic};
use ppl_task::{Fact, OpId, PlanningTask, State};
use std::collections::HashSet;

/// Relaxed planning graph / FF-style heuristic (spec §4.2): builds a delete-free
/// relaxation of the task from a state by monotone fact-set expansion, then greedily
/// extracts a relaxed plan backward from the goal, counting the distinct operators used.
///
/// Grounded on `GraphPlanRelaxed` (expand/clean_operators/back_from_goal) in
/// `examples/original_source/GraphPlanRelaxed.py`, restated without its explicit graph
/// structure: layers and achievers are tracked directly, which is equivalent and avoids
/// the teacher's workspace carrying no graph-library dependency to reuse for this.
pub struct RpgHeuristic<'a> {
    task: &'a PlanningTask,
}

impl<'a> RpgHeuristic<'a> {
    pub fn new(task: &'a PlanningTask) -> Self {
        RpgHeuristic { task }
    }

    /// Monotone expansion: `layers[i]` is the set of facts reachable using `i` rounds of
    /// delete-free operator application, `layers[0]` being `state` itself. Stops as soon
    /// as the goal is covered, or returns `None` if a round adds nothing new first.
    fn build_layers(&self, state: &State) -> Option<Vec<HashSet<Fact>>> {
        let mut layers = vec![state.iter().collect::<HashSet<Fact>>()];
        if self.task.goals.iter().all(|g| layers[0].contains(g)) {
            return Some(layers);
        }
        loop {
            let current = layers.last().unwrap();
            let mut next = current.clone();
            for op in &self.task.operators {
                let applicable =
                    op.pos_pre().iter().all(|f| current.contains(f)) && op.neg_pre().iter().all(|f| !current.contains(f));
                if applicable {
                    next.extend(op.add().iter().copied());
                }
            }
            if self.task.goals.iter().all(|g| next.contains(g)) {
                layers.push(next);
                return Some(layers);
            }
            if next.len() == current.len() {
                return None;
            }
            layers.push(next);
        }
    }

    /// Greedily walks the layers backward from the goal, picking for each needed fact an
    /// operator applicable at the previous layer that adds it, and returns the number of
    /// distinct operators chosen (the relaxed plan's length).
    fn extract(&self, layers: &[HashSet<Fact>]) -> u32 {
        let mut needed: HashSet<Fact> = self.task.goals.iter().copied().collect();
        let mut chosen: HashSet<OpId> = HashSet::new();

        for layer_idx in (1..layers.len()).rev() {
            let prev = &layers[layer_idx - 1];
            let cur = &layers[layer_idx];
            let new_at_this_layer: Vec<Fact> =
                needed.iter().copied().filter(|f| cur.contains(f) && !prev.contains(f)).collect();

            for fact in new_at_this_layer {
                let achiever = self.task.operator_ids().find(|&id| {
                    let op = self.task.operator(id);
                    op.add().contains(&fact)
                        && op.pos_pre().iter().all(|p| prev.contains(p))
                        && op.neg_pre().iter().all(|p| !prev.contains(p))
                });
                if let Some(id) = achiever {
                    if chosen.insert(id) {
                        needed.extend(self.task.operator(id).pos_pre().iter().copied());
                    }
                }
            }
        }

        chosen.len() as u32
    }

    /// The relaxed-plan-length heuristic value for `state`, or `None` if the goal is
    /// unreachable even in the delete relaxation (a genuine dead end).
    pub fn evaluate(&self, state: &State) -> Option<u32> {
        let layers = self.build_layers(state)?;
        Some(self.extract(&layers))
    }
}

impl Heuristic for RpgHeuristic<'_> {
    fn evaluate(&self, ctx: EvalContext) -> (Option<u32>, Option<HashSet<Fact>>) {
        (self.evaluate(ctx.state), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppl_task::{canonical_atom, FactTable, Operator};

    fn blocks_task() -> PlanningTask {
        let mut ft = FactTable::new();
        let on_table = ft.intern(canonical_atom("on-table", &["a"]));
        let clear = ft.intern(canonical_atom("clear", &["a"]));
        let hand_empty = ft.intern(canonical_atom("hand-empty", &[]));
        let holding = ft.intern(canonical_atom("holding", &["a"]));
        let facts = vec![on_table, clear, hand_empty, holding];
        let init = State::from_facts(facts.len(), [on_table, clear, hand_empty]);
        let goals = vec![holding];
        let pickup = Operator::new(
            "(pickup a)",
            vec![on_table, clear, hand_empty],
            vec![],
            vec![holding],
            vec![on_table, clear, hand_empty],
        );
        PlanningTask::new("blocks-s1", ft, facts, init, goals, vec![pickup]).unwrap()
    }

    #[test]
    fn one_step_task_has_heuristic_one() {
        let task = blocks_task();
        let h = RpgHeuristic::new(&task);
        assert_eq!(h.evaluate(&task.initial_state), Some(1));
    }

    #[test]
    fn goal_state_has_heuristic_zero() {
        let task = blocks_task();
        let h = RpgHeuristic::new(&task);
        let goal_state = task.operator(ppl_task::OpId::from(0usize)).apply(&task.initial_state);
        assert_eq!(h.evaluate(&goal_state), Some(0));
    }

    #[test]
    fn unreachable_goal_is_none() {
        let mut ft = FactTable::new();
        let holding_b = ft.intern(canonical_atom("holding", &["b"]));
        let on_table_a = ft.intern(canonical_atom("on-table", &["a"]));
        let facts = vec![holding_b, on_table_a];
        let init = State::from_facts(facts.len(), [on_table_a]);
        let task = PlanningTask::new("unreachable", ft, facts, init, vec![holding_b], vec![]).unwrap();

        let h = RpgHeuristic::new(&task);
        assert_eq!(h.evaluate(&task.initial_state), None);
    }

    #[test]
    fn ff_monotonicity_holds_on_blocks_example() {
        // testable property 5: s ⊆ s' ⇒ h(s') ≤ h(s)
        let task = blocks_task();
        let h = RpgHeuristic::new(&task);
        let smaller = State::empty(task.num_facts());
        let larger = task.initial_state.clone();
        assert!(h.evaluate(&larger).unwrap_or(u32::MAX) <= h.evaluate(&smaller).unwrap_or(u32::MAX));
    }
}
