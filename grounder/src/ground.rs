use crate::init_index::InitIndex;
use crate::universe::{build_universe, candidates_for_type};
use itertools::Itertools;
use ppl_pddl::{ActionSchema, Domain, ForallEffect, Literal, Problem};
use ppl_symbols::types::TypeHierarchy;
use ppl_symbols::SymbolTable;
use ppl_task::{canonical_atom, Fact, FactTable, Operator, PlanError, PlanningTask, Result, State};
use std::collections::{HashMap, HashSet};

/// A predicate is dynamic iff it appears in some action's add or delete effect, including
/// inside a `forall`/`when` conditional effect (spec §4.1 step 1). Everything else is static.
pub(crate) fn dynamic_predicates(domain: &Domain) -> HashSet<String> {
    let mut dynamic = HashSet::new();
    for action in &domain.actions {
        for lit in action.add.iter().chain(action.del.iter()) {
            dynamic.insert(lit.predicate.clone());
        }
        for fe in &action.forall {
            for lit in fe.add.iter().chain(fe.del.iter()) {
                dynamic.insert(lit.predicate.clone());
            }
        }
    }
    dynamic
}

/// An action's parameters for grounding purposes: its own declared parameters, or — if it
/// declares none but has exactly one `forall` effect — that effect's quantified variables
/// (spec §4.1 step 3, narrowly scoped to the no-ordinary-parameters case; see DESIGN.md).
pub(crate) fn effective_params(action: &ActionSchema) -> (Vec<(String, String)>, bool) {
    if action.params.is_empty() && action.forall.len() == 1 {
        (action.forall[0].vars.clone(), true)
    } else {
        (action.params.clone(), false)
    }
}

/// Narrows `candidates` to objects consistent with a static-predicate literal mentioning
/// `var`, at every position `var` occurs in the literal (spec §4.1 step 3).
fn static_restrict(candidates: &mut Vec<String>, lit: &Literal, var: &str, dynamic: &HashSet<String>, idx: &InitIndex) {
    if dynamic.contains(&lit.predicate) {
        return;
    }
    for (pos, arg) in lit.args.iter().enumerate() {
        if arg == var {
            if lit.sign > 0 {
                candidates.retain(|o| idx.candidate_holds(&lit.predicate, pos, o));
            } else {
                candidates.retain(|o| !idx.candidate_holds(&lit.predicate, pos, o));
            }
        }
    }
}

pub(crate) fn instantiate_args(args: &[String], subst: &HashMap<String, String>) -> Vec<String> {
    args.iter().map(|a| subst.get(a).cloned().unwrap_or_else(|| a.clone())).collect()
}

fn instantiate_fact(lit: &Literal, subst: &HashMap<String, String>, facts: &mut FactTable) -> Fact {
    let args = instantiate_args(&lit.args, subst);
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    facts.intern(canonical_atom(&lit.predicate, &arg_refs))
}

/// Applies one precondition literal under `subst`: a static one is checked directly against
/// the initial state (true => drop it, it holds forever; false => the whole assignment is
/// rejected, returning `false`); a dynamic one becomes a precondition fact of the operator.
fn apply_precondition(
    lit: &Literal,
    subst: &HashMap<String, String>,
    dynamic: &HashSet<String>,
    init: &InitIndex,
    pos_pre: &mut Vec<Fact>,
    neg_pre: &mut Vec<Fact>,
    facts: &mut FactTable,
) -> bool {
    if dynamic.contains(&lit.predicate) {
        let fact = instantiate_fact(lit, subst, facts);
        if lit.sign > 0 {
            pos_pre.push(fact);
        } else {
            neg_pre.push(fact);
        }
        true
    } else {
        let args = instantiate_args(&lit.args, subst);
        let holds = init.atom_holds(&lit.predicate, &args);
        if lit.sign > 0 {
            holds
        } else {
            !holds
        }
    }
}

/// Expands one `forall`/`when` effect not covered by [`effective_params`]: enumerates
/// bindings of its own variables and, for each, either contributes its add/delete effects
/// unconditionally (static condition that holds, or dynamic condition added as an extra
/// precondition fact per spec §4.1 step 4) or contributes nothing (static condition false).
#[allow(clippy::too_many_arguments)]
fn expand_forall(
    fe: &ForallEffect,
    outer: &HashMap<String, String>,
    hierarchy: &TypeHierarchy,
    table: &SymbolTable,
    dynamic: &HashSet<String>,
    init: &InitIndex,
    pos_pre: &mut Vec<Fact>,
    neg_pre: &mut Vec<Fact>,
    add: &mut Vec<Fact>,
    del: &mut Vec<Fact>,
    facts: &mut FactTable,
) -> Result<()> {
    let mut candidate_sets = Vec::with_capacity(fe.vars.len());
    for (_, ty) in &fe.vars {
        candidate_sets.push(candidates_for_type(hierarchy, table, ty)?);
    }
    let bindings: Box<dyn Iterator<Item = Vec<String>>> = if fe.vars.is_empty() {
        Box::new(std::iter::once(Vec::new()))
    } else {
        Box::new(candidate_sets.into_iter().multi_cartesian_product())
    };

    for values in bindings {
        let mut subst = outer.clone();
        for ((var, _), val) in fe.vars.iter().zip(values.iter()) {
            subst.insert(var.clone(), val.clone());
        }

        let contributes = if dynamic.contains(&fe.condition.predicate) {
            let fact = instantiate_fact(&fe.condition, &subst, facts);
            if fe.condition.sign > 0 {
                pos_pre.push(fact);
            } else {
                neg_pre.push(fact);
            }
            true
        } else {
            let args = instantiate_args(&fe.condition.args, &subst);
            let holds = init.atom_holds(&fe.condition.predicate, &args);
            if fe.condition.sign > 0 {
                holds
            } else {
                !holds
            }
        };

        if contributes {
            for lit in &fe.add {
                add.push(instantiate_fact(lit, &subst, facts));
            }
            for lit in &fe.del {
                del.push(instantiate_fact(lit, &subst, facts));
            }
        }
    }
    Ok(())
}

/// Builds the grounded operator for a single assignment of `action`'s effective
/// parameters, or `None` if a static precondition rejects the assignment (spec §4.1 step 4).
pub(crate) fn build_operator(
    action: &ActionSchema,
    subst: &HashMap<String, String>,
    consumed_forall: bool,
    hierarchy: &TypeHierarchy,
    table: &SymbolTable,
    dynamic: &HashSet<String>,
    init: &InitIndex,
    facts: &mut FactTable,
) -> Result<Option<Operator>> {
    let mut pos_pre = Vec::new();
    let mut neg_pre = Vec::new();
    let mut add = Vec::new();
    let mut del = Vec::new();

    for lit in action.pos_pre.iter().chain(action.neg_pre.iter()) {
        if !apply_precondition(lit, subst, dynamic, init, &mut pos_pre, &mut neg_pre, facts) {
            return Ok(None);
        }
    }

    for lit in &action.add {
        add.push(instantiate_fact(lit, subst, facts));
    }
    for lit in &action.del {
        del.push(instantiate_fact(lit, subst, facts));
    }

    for (i, fe) in action.forall.iter().enumerate() {
        if consumed_forall && i == 0 {
            if !apply_precondition(&fe.condition, subst, dynamic, init, &mut pos_pre, &mut neg_pre, facts) {
                return Ok(None);
            }
            for lit in &fe.add {
                add.push(instantiate_fact(lit, subst, facts));
            }
            for lit in &fe.del {
                del.push(instantiate_fact(lit, subst, facts));
            }
        } else {
            expand_forall(fe, subst, hierarchy, table, dynamic, init, &mut pos_pre, &mut neg_pre, &mut add, &mut del, facts)?;
        }
    }

    let args: Vec<String> = action
        .params
        .iter()
        .map(|(v, _)| subst.get(v).cloned().unwrap_or_else(|| v.clone()))
        .collect();
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let name = canonical_atom(&action.name, &arg_refs);

    Ok(Some(Operator::new(name, pos_pre, neg_pre, add, del)))
}

/// Grounds a single action schema into zero or more operators (spec §4.1 steps 3-4).
/// Never fails on "this action didn't ground" — that is `UngroundableDomain`, logged as a
/// warning per §7, with the action simply contributing no operators.
pub fn ground_action(
    action: &ActionSchema,
    hierarchy: &TypeHierarchy,
    table: &SymbolTable,
    dynamic: &HashSet<String>,
    init: &InitIndex,
    facts: &mut FactTable,
) -> Result<Vec<Operator>> {
    let (params, consumed_forall) = effective_params(action);

    let mut candidate_sets = Vec::with_capacity(params.len());
    for (var, ty) in &params {
        let mut candidates = candidates_for_type(hierarchy, table, ty)?;
        for lit in action.pos_pre.iter().chain(action.neg_pre.iter()) {
            static_restrict(&mut candidates, lit, var, dynamic, init);
        }
        if consumed_forall {
            static_restrict(&mut candidates, &action.forall[0].condition, var, dynamic, init);
        }
        candidate_sets.push(candidates);
    }

    if candidate_sets.iter().any(Vec::is_empty) {
        tracing::warn!(action = %action.name, "no matching object for a parameter type after static filtering");
        return Ok(Vec::new());
    }

    let assignments: Box<dyn Iterator<Item = Vec<String>>> = if params.is_empty() {
        Box::new(std::iter::once(Vec::new()))
    } else {
        Box::new(candidate_sets.into_iter().multi_cartesian_product())
    };

    let mut ops = Vec::new();
    for values in assignments {
        let subst: HashMap<String, String> = params.iter().map(|(v, _)| v.clone()).zip(values).collect();
        if let Some(op) = build_operator(action, &subst, consumed_forall, hierarchy, table, dynamic, init, facts)? {
            ops.push(op);
        }
    }

    if ops.is_empty() {
        tracing::warn!(action = %action.name, "every candidate assignment was rejected by a static precondition");
    }
    Ok(ops)
}

/// Computes the least fixed point of relevant facts and restricts every operator's
/// add/delete effects to it, dropping operators that become entirely irrelevant
/// (spec §4.1 step 7).
fn prune_irrelevant(ops: Vec<Operator>, goals: &[Fact]) -> Vec<Operator> {
    let mut relevant: HashSet<Fact> = goals.iter().copied().collect();
    loop {
        let before = relevant.len();
        for op in &ops {
            let touches = op.add().iter().any(|f| relevant.contains(f)) || op.del().iter().any(|f| relevant.contains(f));
            if touches {
                relevant.extend(op.pos_pre().iter().copied());
                relevant.extend(op.neg_pre().iter().copied());
            }
        }
        if relevant.len() == before {
            break;
        }
    }

    ops.into_iter()
        .filter_map(|op| {
            let add: Vec<Fact> = op.add().iter().copied().filter(|f| relevant.contains(f)).collect();
            let del: Vec<Fact> = op.del().iter().copied().filter(|f| relevant.contains(f)).collect();
            if add.is_empty() && del.is_empty() {
                None
            } else {
                Some(Operator::new(op.name.clone(), op.pos_pre().to_vec(), op.neg_pre().to_vec(), add, del))
            }
        })
        .collect()
}

fn goal_facts(problem: &Problem, fact_table: &mut FactTable) -> Vec<Fact> {
    problem
        .goal
        .iter()
        .map(|(pred, args)| {
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            fact_table.intern(canonical_atom(pred, &arg_refs))
        })
        .collect()
}

fn fact_universe(ops: &[Operator], goals: &[Fact]) -> Vec<Fact> {
    let mut set: HashSet<Fact> = goals.iter().copied().collect();
    for op in ops {
        set.extend(op.pos_pre().iter().copied());
        set.extend(op.neg_pre().iter().copied());
        set.extend(op.add().iter().copied());
        set.extend(op.del().iter().copied());
    }
    let mut v: Vec<Fact> = set.into_iter().collect();
    v.sort_unstable();
    v
}

/// Full grounding (spec §4.1): static analysis, per-action Cartesian-product grounding,
/// fact closure, initial-state restriction, and irrelevance pruning.
pub fn ground_full(domain: &Domain, problem: &Problem) -> Result<PlanningTask> {
    let (hierarchy, table) = build_universe(domain, problem)?;
    let dynamic = dynamic_predicates(domain);
    let init_index = InitIndex::build(&problem.init);
    let mut fact_table = FactTable::new();

    let mut ops = Vec::new();
    for action in &domain.actions {
        ops.extend(ground_action(action, &hierarchy, &table, &dynamic, &init_index, &mut fact_table)?);
    }

    let goals = goal_facts(problem, &mut fact_table);
    let ops = prune_irrelevant(ops, &goals);
    let facts = fact_universe(&ops, &goals);
    let universe: HashSet<Fact> = facts.iter().copied().collect();

    let init_facts: Vec<Fact> = problem
        .init
        .iter()
        .map(|(pred, args)| {
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            fact_table.intern(canonical_atom(pred, &arg_refs))
        })
        .filter(|f| universe.contains(f))
        .collect();

    let initial_state = State::from_facts(fact_table.len(), init_facts);

    PlanningTask::new(domain.name.clone(), fact_table, facts, initial_state, goals, ops)
        .map_err(|e| PlanError::InvariantViolation(format!("grounder produced an inconsistent task: {e}")))
}
