use crate::error::{PlanError, Result};
use crate::fact::{Fact, FactTable};
use crate::operator::{OpId, Operator};
use crate::state::State;

/// An immutable bundle of facts, initial state, goals and operators.
///
/// Construction validates the task-level invariants of `§3`: the initial state and goals are
/// subsets of the fact universe, and so are every operator's four fact sets. A grounder that
/// produces a task violating these has a bug, hence [`PlanError::InvariantViolation`] rather
/// than a user-facing error.
pub struct PlanningTask {
    pub name: String,
    pub fact_table: FactTable,
    pub facts: Vec<Fact>,
    pub initial_state: State,
    pub goals: Vec<Fact>,
    pub operators: Vec<Operator>,
}

impl PlanningTask {
    pub fn new(
        name: impl Into<String>,
        fact_table: FactTable,
        facts: Vec<Fact>,
        initial_state: State,
        goals: Vec<Fact>,
        operators: Vec<Operator>,
    ) -> Result<PlanningTask> {
        let universe: std::collections::HashSet<Fact> = facts.iter().copied().collect();
        let check = |fs: &[Fact], what: &str| -> Result<()> {
            for f in fs {
                if !universe.contains(f) {
                    return Err(PlanError::InvariantViolation(format!(
                        "{what} references a fact outside the task's fact universe"
                    )));
                }
            }
            Ok(())
        };
        check(&goals, "goal set")?;
        for f in initial_state.iter() {
            if !universe.contains(&f) {
                return Err(PlanError::InvariantViolation(
                    "initial state references a fact outside the task's fact universe".into(),
                ));
            }
        }
        for op in &operators {
            check(op.pos_pre(), &format!("operator {}'s positive preconditions", op.name))?;
            check(op.neg_pre(), &format!("operator {}'s negative preconditions", op.name))?;
            check(op.add(), &format!("operator {}'s add effects", op.name))?;
            check(op.del(), &format!("operator {}'s delete effects", op.name))?;
        }

        Ok(PlanningTask {
            name: name.into(),
            fact_table,
            facts,
            initial_state,
            goals,
            operators,
        })
    }

    pub fn is_goal(&self, state: &State) -> bool {
        state.satisfies_all(&self.goals)
    }

    pub fn num_facts(&self) -> usize {
        self.facts.len()
    }

    pub fn operator(&self, id: OpId) -> &Operator {
        &self.operators[usize::from(id)]
    }

    pub fn operator_ids(&self) -> impl Iterator<Item = OpId> {
        (0..self.operators.len()).map(OpId::from)
    }

    /// All `(operator, resulting state)` pairs reachable by one applicable action from `state`.
    pub fn successors<'a>(&'a self, state: &'a State) -> impl Iterator<Item = (OpId, State)> + 'a {
        self.operator_ids().filter_map(move |id| {
            let op = self.operator(id);
            op.applicable(state).then(|| (id, op.apply(state)))
        })
    }

    /// End-to-end plan validator (testable property 3): replays `plan` from the initial
    /// state and checks every step is applicable and the goal holds at the end.
    pub fn validate_plan(&self, plan: &[OpId]) -> Result<()> {
        let mut state = self.initial_state.clone();
        for (i, &id) in plan.iter().enumerate() {
            let op = self.operator(id);
            if !op.applicable(&state) {
                return Err(PlanError::InvariantViolation(format!(
                    "step {i} ({}) is not applicable in the state reached so far",
                    op.name
                )));
            }
            state = op.apply(&state);
        }
        if self.is_goal(&state) {
            Ok(())
        } else {
            Err(PlanError::InvariantViolation(
                "plan does not reach a goal state".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::canonical_atom;

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
    fn one_step_plan_validates() {
        let task = blocks_task();
        let plan = vec![OpId::from(0usize)];
        assert!(task.validate_plan(&plan).is_ok());
    }

    #[test]
    fn empty_plan_fails_when_goal_not_initially_true() {
        let task = blocks_task();
        assert!(task.validate_plan(&[]).is_err());
    }

    #[test]
    fn successors_enumerates_applicable_operators() {
        let task = blocks_task();
        let succ: Vec<_> = task.successors(&task.initial_state).collect();
        assert_eq!(succ.len(), 1);
    }
}
