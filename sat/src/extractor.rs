use crate::encoder::Encoder;
use ppl_task::{OpId, PlanningTask, State};
use std::collections::HashSet;

/// Maps a SAT solver's satisfying assignment back to an ordered operator sequence.
///
/// Grounded on `PlanExtractor.extract_plan` in
/// `examples/original_source/plan_extractor.py`: rather than reading the `op-at-step`
/// variables directly (a satisfying assignment may leave unused ones in either polarity
/// since nothing else constrains them), it decodes the per-step fact valuation into a
/// sequence of states and, for each consecutive pair, looks up which operator is
/// applicable in the first and produces the second. This is also what makes the SAT
/// encoder's soundness testable independently of how `op-at-step` variables happen to
/// fall: only the state trajectory has to be consistent with some real operator.
pub fn extract_plan(task: &PlanningTask, encoder: &mut Encoder, assignment: &[i32], horizon: u32) -> Option<Vec<OpId>> {
    let true_lits: HashSet<i32> = assignment.iter().copied().filter(|&l| l > 0).collect();

    let states: Vec<State> = (0..=horizon)
        .map(|step| {
            let facts = task.facts.iter().copied().filter(|&f| {
                let lit = encoder.fact_literal(f, step);
                true_lits.contains(&lit)
            });
            State::from_facts(task.num_facts(), facts)
        })
        .collect();

    let mut plan = Vec::with_capacity(horizon as usize);
    for step in 0..horizon as usize {
        let from = &states[step];
        let to = &states[step + 1];
        let chosen = task.operator_ids().find(|&id| {
            let op = task.operator(id);
            op.applicable(from) && &op.apply(from) == to
        })?;
        plan.push(chosen);
    }
    Some(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::solver::{DpllSolver, SatSolver};
    use ppl_task::{canonical_atom, FactTable, Operator};

    fn s4_task() -> PlanningTask {
        let mut ft = FactTable::new();
        let on_table_a = ft.intern(canonical_atom("on-table", &["a"]));
        let clear_a = ft.intern(canonical_atom("clear", &["a"]));
        let clear_b = ft.intern(canonical_atom("clear", &["b"]));
        let hand_empty = ft.intern(canonical_atom("hand-empty", &[]));
        let holding_a = ft.intern(canonical_atom("holding", &["a"]));
        let on_a_b = ft.intern(canonical_atom("on", &["a", "b"]));

        let facts = vec![on_table_a, clear_a, clear_b, hand_empty, holding_a, on_a_b];
        let init = State::from_facts(facts.len(), [on_table_a, clear_a, clear_b, hand_empty]);
        let goals = vec![on_a_b];

        let pickup_a = Operator::new(
            "(pickup a)",
            vec![on_table_a, clear_a, hand_empty],
            vec![],
            vec![holding_a],
            vec![on_table_a, clear_a, hand_empty],
        );
        let stack_a_b = Operator::new(
            "(stack a b)",
            vec![holding_a, clear_b],
            vec![],
            vec![on_a_b, clear_a, hand_empty],
            vec![holding_a, clear_b],
        );

        PlanningTask::new("blocks-s4", ft, facts, init, goals, vec![pickup_a, stack_a_b]).unwrap()
    }

    #[test]
    fn extracted_plan_validates_at_its_satisfying_horizon() {
        let task = s4_task();
        let mut encoder = Encoder::new(&task);
        let cnf = encoder.encode(2);
        let solver = DpllSolver::new();
        let assignment = solver.solve(&cnf).expect("horizon 2 is satisfiable");
        let plan = extract_plan(&task, &mut encoder, &assignment, 2).expect("plan decodes");
        assert!(task.validate_plan(&plan).is_ok());
    }

    #[test]
    fn horizon_one_is_unsatisfiable() {
        let task = s4_task();
        let mut encoder = Encoder::new(&task);
        let cnf = encoder.encode(1);
        let solver = DpllSolver::new();
        assert!(solver.solve(&cnf).is_none());
    }
}
