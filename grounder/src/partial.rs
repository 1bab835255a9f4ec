use crate::ground::{build_operator, dynamic_predicates, effective_params, instantiate_args};
use crate::init_index::InitIndex;
use crate::universe::build_universe;
use ppl_pddl::{Domain, Literal, Problem};
use ppl_task::{canonical_atom, Fact, FactTable, Operator, PlanError, PlanningTask, Result, State};
use std::collections::{HashMap, HashSet};

/// Backstop against a domain whose goal-regression search never reaches the initial state
/// (a malformed domain, or one this narrow grounding path doesn't actually fit).
const MAX_REGRESSION_STEPS: usize = 10_000;

fn atom_of(pred: &str, args: &[String]) -> String {
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    canonical_atom(pred, &refs)
}

fn split_atom(atom: &str) -> (String, Vec<String>) {
    let inner = atom.trim_start_matches('(').trim_end_matches(')');
    let mut parts = inner.split(' ').filter(|s| !s.is_empty()).map(str::to_string);
    let pred = parts.next().unwrap_or_default();
    (pred, parts.collect())
}

/// Binds `literal`'s variables to `atom_args` positionally, succeeding only if `atom_pred`
/// matches the literal's predicate and arity.
fn match_literal(literal: &Literal, atom_pred: &str, atom_args: &[String]) -> Option<HashMap<String, String>> {
    if literal.predicate != atom_pred || literal.args.len() != atom_args.len() {
        return None;
    }
    Some(literal.args.iter().cloned().zip(atom_args.iter().cloned()).collect())
}

/// Goal-directed backward grounding for domains dominated by a single `forall`/`when`
/// effect over a huge object space (e.g. permutation puzzles), where enumerating every
/// parameter combination up front per [`crate::ground::ground_full`] is infeasible.
///
/// Starting from the goal state, repeatedly finds an action instantiation whose forall
/// effect could have produced one of the facts in the current candidate state, grounds
/// only that instantiation, and steps backward to the predecessor state it implies. Only
/// actions reducible to the no-ordinary-parameters forall case (see [`effective_params`])
/// are groundable this way; actions that don't fit this shape are skipped.
pub fn ground_partial(domain: &Domain, problem: &Problem) -> Result<PlanningTask> {
    let (hierarchy, table) = build_universe(domain, problem)?;
    let dynamic = dynamic_predicates(domain);
    let init_index = InitIndex::build(&problem.init);
    let mut fact_table = FactTable::new();

    let initial_atoms: HashSet<String> = problem.init.iter().map(|(p, a)| atom_of(p, a)).collect();
    let goal_atoms: HashSet<String> = problem.goal.iter().map(|(p, a)| atom_of(p, a)).collect();

    let mut possible_states: Vec<HashSet<String>> = vec![goal_atoms.clone()];
    let mut visited: HashSet<Vec<String>> = HashSet::new();
    let mut operators: Vec<Operator> = Vec::new();

    let mut steps = 0;
    while !possible_states.iter().any(|s| *s == initial_atoms) {
        steps += 1;
        if steps > MAX_REGRESSION_STEPS {
            tracing::warn!(
                steps = MAX_REGRESSION_STEPS,
                "goal-regression partial grounding did not reach the initial state"
            );
            break;
        }

        let mut next_states = Vec::new();
        for possible_state in &possible_states {
            for action in &domain.actions {
                let (params, consumed_forall) = effective_params(action);
                if !consumed_forall {
                    continue;
                }
                let fe = &action.forall[0];
                let (Some(add_lit), Some(del_lit)) = (fe.add.first(), fe.del.first()) else {
                    continue;
                };

                let mut assignment = None;
                let mut prev_state = possible_state.clone();
                for atom in possible_state {
                    let (pred, args) = split_atom(atom);
                    if let Some(binding) = match_literal(add_lit, &pred, &args) {
                        prev_state.remove(atom);
                        let del_args = instantiate_args(&del_lit.args, &binding);
                        prev_state.insert(atom_of(&del_lit.predicate, &del_args));
                        assignment = Some(binding);
                        break;
                    }
                }

                let Some(assignment) = assignment else { continue };
                if params.iter().any(|(v, _)| !assignment.contains_key(v)) {
                    continue;
                }

                if let Some(op) = build_operator(
                    action,
                    &assignment,
                    consumed_forall,
                    &hierarchy,
                    &table,
                    &dynamic,
                    &init_index,
                    &mut fact_table,
                )? {
                    operators.push(op);
                }
                next_states.push(prev_state);
            }
        }

        if next_states.is_empty() {
            tracing::warn!("goal-regression partial grounding found no applicable predecessor state");
            break;
        }

        let mut progressed = false;
        for s in &next_states {
            let mut key: Vec<String> = s.iter().cloned().collect();
            key.sort_unstable();
            if visited.insert(key) {
                progressed = true;
            }
        }
        possible_states = next_states;
        if !progressed {
            tracing::warn!("goal-regression partial grounding reached a fixed point before the initial state");
            break;
        }
    }

    for atom in &goal_atoms {
        fact_table.intern(atom.clone());
    }

    let facts: Vec<Fact> = fact_table.iter().map(|(f, _)| f).collect();
    let goals: Vec<Fact> = goal_atoms.iter().map(|a| fact_table.intern(a.clone())).collect();
    let init_facts: Vec<Fact> = initial_atoms.iter().filter_map(|a| fact_table.get(a)).collect();
    let initial_state = State::from_facts(fact_table.len(), init_facts);

    PlanningTask::new(domain.name.clone(), fact_table, facts, initial_state, goals, operators)
        .map_err(|e| PlanError::InvariantViolation(format!("partial grounder produced an inconsistent task: {e}")))
}
