use ppl_heuristics::{EvalContext, Heuristic};
use ppl_task::{Fact, OpId, PlanningTask, State};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// One search node, owned by an arena (`nodes` in [`weighted_astar`]) and referenced by
/// index from the open list and from child nodes' `parent`, so plan extraction walks an
/// index chain rather than a pointer chain (spec §9: "store them in an arena").
struct Node {
    state: State,
    parent: Option<usize>,
    op: Option<OpId>,
    g: u32,
    not_reached: Option<HashSet<Fact>>,
}

fn extract_plan(nodes: &[Node], mut idx: usize) -> Vec<OpId> {
    let mut plan = Vec::new();
    while let Some(op) = nodes[idx].op {
        plan.push(op);
        idx = nodes[idx].parent.expect("a node with an op always has a parent");
    }
    plan.reverse();
    plan
}

/// Weighted A* search (spec §4.4/C6): priority `g + weight * h`, ties broken first by `h`
/// then by insertion order, reopening a state whenever a cheaper path to it is found.
///
/// Grounded on `weighted_astar_search` in
/// `examples/original_source/weighted_astar.py` (the `state_cost` reopening check and the
/// `(f, h, preference, node)` tuple ordering), expressed with the teacher's
/// `BinaryHeap`-of-nodes idiom from
/// `examples/plaans-aries/src/planning/classical/search.rs::plan_search` (a `Reverse`-keyed
/// min-heap in place of the teacher's own reversed `Ord` impl, which is the more common
/// idiom for this and avoids a bespoke `Node: Ord` implementation).
pub fn weighted_astar(task: &PlanningTask, heuristic: &impl Heuristic, weight: u32) -> Option<Vec<OpId>> {
    let mut nodes: Vec<Node> = Vec::new();
    let mut open: BinaryHeap<(Reverse<(u32, u32, u32)>, usize)> = BinaryHeap::new();
    let mut best_g: HashMap<State, u32> = HashMap::new();
    let mut insertion: u32 = 0;

    let root_ctx = EvalContext { state: &task.initial_state, applied: None, parent_not_reached: None };
    let (h0, not_reached0) = heuristic.evaluate(root_ctx);
    let h0 = h0?;

    nodes.push(Node { state: task.initial_state.clone(), parent: None, op: None, g: 0, not_reached: not_reached0 });
    best_g.insert(task.initial_state.clone(), 0);
    open.push((Reverse((weight * h0, h0, insertion)), 0));
    insertion += 1;

    while let Some((_, idx)) = open.pop() {
        let g = nodes[idx].g;
        // a cheaper path to this state was found and pushed after this entry; skip it
        // rather than expanding a stale node (mirrors the Python's `state_cost[state] ==
        // node.g` reopening guard).
        if best_g.get(&nodes[idx].state) != Some(&g) {
            continue;
        }
        if task.is_goal(&nodes[idx].state) {
            return Some(extract_plan(&nodes, idx));
        }

        let current_state = nodes[idx].state.clone();
        for (op_id, next_state) in task.successors(&current_state) {
            let op = task.operator(op_id);
            let ctx = EvalContext {
                state: &next_state,
                applied: Some(op),
                parent_not_reached: nodes[idx].not_reached.as_ref(),
            };
            let (h, not_reached) = heuristic.evaluate(ctx);
            let Some(h) = h else { continue };

            let next_g = g + 1;
            let improves = best_g.get(&next_state).map_or(true, |&old| next_g < old);
            if improves {
                best_g.insert(next_state.clone(), next_g);
                let node_idx = nodes.len();
                nodes.push(Node { state: next_state, parent: Some(idx), op: Some(op_id), g: next_g, not_reached });
                open.push((Reverse((next_g + weight * h, h, insertion)), node_idx));
                insertion += 1;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppl_heuristics::RpgHeuristic;
    use ppl_task::{canonical_atom, FactTable, Operator};

    fn s4_task() -> PlanningTask {
        let mut ft = FactTable::new();
        let on_table_a = ft.intern(canonical_atom("on-table", &["a"]));
        let on_table_b = ft.intern(canonical_atom("on-table", &["b"]));
        let clear_a = ft.intern(canonical_atom("clear", &["a"]));
        let clear_b = ft.intern(canonical_atom("clear", &["b"]));
        let hand_empty = ft.intern(canonical_atom("hand-empty", &[]));
        let holding_a = ft.intern(canonical_atom("holding", &["a"]));
        let on_a_b = ft.intern(canonical_atom("on", &["a", "b"]));

        let facts = vec![on_table_a, on_table_b, clear_a, clear_b, hand_empty, holding_a, on_a_b];
        let init = State::from_facts(facts.len(), [on_table_a, on_table_b, clear_a, clear_b, hand_empty]);
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
    fn s4_finds_two_step_plan() {
        let task = s4_task();
        let h = RpgHeuristic::new(&task);
        let plan = weighted_astar(&task, &h, 1).expect("plan should be found");
        assert_eq!(plan.len(), 2);
        assert!(task.validate_plan(&plan).is_ok());
        assert_eq!(task.operator(plan[0]).name, "(pickup a)");
        assert_eq!(task.operator(plan[1]).name, "(stack a b)");
    }

    #[test]
    fn s2_empty_plan_when_goal_already_holds() {
        let mut ft = FactTable::new();
        let p = ft.intern(canonical_atom("p", &[]));
        let facts = vec![p];
        let init = State::from_facts(1, [p]);
        let task = PlanningTask::new("trivial", ft, facts, init, vec![p], vec![]).unwrap();

        let h = RpgHeuristic::new(&task);
        let plan = weighted_astar(&task, &h, 1).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn s3_unsolvable_goal_returns_none() {
        let mut ft = FactTable::new();
        let holding_b = ft.intern(canonical_atom("holding", &["b"]));
        let on_table_a = ft.intern(canonical_atom("on-table", &["a"]));
        let facts = vec![holding_b, on_table_a];
        let init = State::from_facts(facts.len(), [on_table_a]);
        let task = PlanningTask::new("unreachable", ft, facts, init, vec![holding_b], vec![]).unwrap();

        let h = RpgHeuristic::new(&task);
        assert!(weighted_astar(&task, &h, 1).is_none());
    }
}
