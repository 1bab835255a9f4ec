use crate::formula::{Cnf, Formula, NodeId};
use ppl_task::{Fact, OpId, PlanningTask};

/// Builds the horizon-bounded propositional encoding of plan existence (spec: for a fixed
/// horizon `H`, variables are `fact-at-step-t` for `t` in `[0, H]` and `op-at-step-t` for
/// `t` in `[0, H)`).
///
/// Grounded on `PlanExtractor.encode_plan_formula`/`encode_formula_next_horizon` in
/// `examples/original_source/plan_extractor.py`: the conjuncts built so far (everything
/// except the goal) are kept across calls so extending the horizon only appends the new
/// step's action disjunction, never re-encodes steps already built. Per-fact frame axioms
/// use [`Formula::make_iff`], matching `_get_formula_for_fact`'s `<->` fluent idiom.
pub struct Encoder<'a> {
    task: &'a PlanningTask,
    formula: Formula,
    conjuncts: Vec<NodeId>,
    horizon: u32,
}

impl<'a> Encoder<'a> {
    pub fn new(task: &'a PlanningTask) -> Self {
        let mut encoder = Encoder {
            task,
            formula: Formula::new(),
            conjuncts: Vec::new(),
            horizon: 0,
        };
        encoder.encode_initial_state();
        encoder
    }

    fn fact_var(&mut self, fact: Fact, step: u32) -> NodeId {
        let name = format!("{}-{}", self.task.fact_table.text(fact), step);
        self.formula.var(name)
    }

    fn op_var(&mut self, op: OpId, step: u32) -> NodeId {
        let name = format!("{}-{}", self.task.operator(op).name, step);
        self.formula.var(name)
    }

    fn encode_initial_state(&mut self) {
        for &fact in &self.task.facts {
            let var = self.fact_var(fact, 0);
            let lit = if self.task.initial_state.contains(fact) {
                var
            } else {
                self.formula.make_not(var)
            };
            self.conjuncts.push(lit);
        }
    }

    /// One conjunct per fact: if the operator adds it, it holds at `step + 1`; if the
    /// operator deletes it, it does not hold at `step + 1`; otherwise the fact's value is
    /// unchanged across the step (the frame axiom, as a biconditional).
    fn fact_transition(&mut self, op: OpId, fact: Fact, step: u32) -> NodeId {
        let operator = self.task.operator(op);
        let next = self.fact_var(fact, step + 1);
        if operator.add().contains(&fact) {
            next
        } else if operator.del().contains(&fact) {
            self.formula.make_not(next)
        } else {
            let now = self.fact_var(fact, step);
            self.formula.make_iff(now, next)
        }
    }

    fn operator_formula(&mut self, op: OpId, step: u32) -> NodeId {
        let operator = self.task.operator(op);
        let mut conjuncts = vec![self.op_var(op, step)];
        for &f in operator.pos_pre() {
            conjuncts.push(self.fact_var(f, step));
        }
        for &f in operator.neg_pre() {
            let v = self.fact_var(f, step);
            conjuncts.push(self.formula.make_not(v));
        }
        for &f in &self.task.facts {
            conjuncts.push(self.fact_transition(op, f, step));
        }
        self.formula.make_and_from_array(&conjuncts)
    }

    fn encode_step(&mut self, step: u32) {
        let op_ids: Vec<OpId> = self.task.operator_ids().collect();
        let disjuncts: Vec<NodeId> = op_ids.iter().map(|&op| self.operator_formula(op, step)).collect();
        let step_formula = self.formula.make_or_from_array(&disjuncts);
        self.conjuncts.push(step_formula);
        self.horizon += 1;
    }

    fn goal_conjuncts(&mut self, horizon: u32) -> Vec<NodeId> {
        self.task
            .goals
            .clone()
            .into_iter()
            .map(|f| self.fact_var(f, horizon))
            .collect()
    }

    /// Builds the CNF for a fresh horizon, extending past whatever horizon this encoder
    /// already reached (the common case: strictly growing horizon in a search loop).
    /// Re-requesting an already-built horizon also works, it simply reuses the cached
    /// prefix without appending anything new.
    pub fn encode(&mut self, horizon: u32) -> Cnf {
        while self.horizon < horizon {
            let step = self.horizon;
            self.encode_step(step);
        }
        let mut all = self.conjuncts.clone();
        all.extend(self.goal_conjuncts(horizon));
        let root = self.formula.make_and_from_array(&all);
        self.formula.to_cnf(root)
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// The DIMACS literal (1-based, always positive) standing for `fact` at `step`.
    /// Re-interning an already-encoded fact/step pair is idempotent, so this is safe to
    /// call from the extractor after [`Encoder::encode`] has run.
    pub fn fact_literal(&mut self, fact: Fact, step: u32) -> i32 {
        let node = self.fact_var(fact, step);
        self.formula.var_index(node).expect("fact variable always exists") as i32 + 1
    }

    pub fn current_horizon(&self) -> u32 {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppl_task::{canonical_atom, FactTable, Operator, State};

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
    fn horizon_zero_is_unsatisfiable_when_goal_does_not_hold() {
        let task = s4_task();
        let mut encoder = Encoder::new(&task);
        let cnf = encoder.encode(0);
        // init asserts on_a_b false at step 0; the goal conjunct demands it true: UNSAT by
        // two unit clauses alone, which a correct solver must reject.
        assert!(cnf.clauses.iter().any(|c| c.len() == 1));
    }

    #[test]
    fn extending_horizon_reuses_prior_conjuncts() {
        let task = s4_task();
        let mut encoder = Encoder::new(&task);
        let _ = encoder.encode(1);
        let conjuncts_after_one = encoder.conjuncts.len();
        let _ = encoder.encode(2);
        // exactly one new step conjunct appended, not a rebuild of the whole prefix.
        assert_eq!(encoder.conjuncts.len(), conjuncts_after_one + 1);
    }

    #[test]
    fn variable_count_grows_monotonically_with_horizon() {
        let task = s4_task();
        let mut encoder = Encoder::new(&task);
        let cnf1 = encoder.encode(1);
        let cnf2 = encoder.encode(2);
        assert!(cnf2.num_vars >= cnf1.num_vars);
    }
}
