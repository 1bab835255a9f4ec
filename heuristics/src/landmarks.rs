use crate::heuristic::{EvalContext, Heuristic};
use ppl_task::{Fact, PlanningTask, State};
use std::collections::{HashMap, HashSet};

/// A fact is a landmark iff a delete-relaxed, f-avoiding version of the task can never
/// reach the goal from the initial state — i.e. no plan can possibly avoid making `f` true
/// at some point. All goal facts are landmarks by definition (spec §4.3).
///
/// Grounded on `get_landmarks`/`get_landmark_costs`/`LandmarkHeuristic` in
/// `examples/original_source/src/heuristics/landmarks.py`, restated as monotone
/// reachability under delete-relaxation rather than repeated full state transitions (the
/// Python version literally replays operators against a frozen `current_state` one at a
/// time, which is equivalent to fixpoint reachability but considerably slower).
pub struct LandmarkHeuristic<'a> {
    task: &'a PlanningTask,
    landmarks: HashSet<Fact>,
    costs: HashMap<Fact, f64>,
}

/// Monotone reachability from `task.initial_state` using every operator except those that
/// add `excluded`, ignoring delete effects. Returns the full reachable set.
fn reachable_excluding(task: &PlanningTask, excluded: Fact) -> HashSet<Fact> {
    let mut reached: HashSet<Fact> = task.initial_state.iter().collect();
    loop {
        let before = reached.len();
        for op in &task.operators {
            if op.add().contains(&excluded) {
                continue;
            }
            let applicable = op.pos_pre().iter().all(|f| reached.contains(f)) && op.neg_pre().iter().all(|f| !reached.contains(f));
            if applicable {
                reached.extend(op.add().iter().copied());
            }
        }
        if reached.len() == before {
            return reached;
        }
    }
}

fn find_landmarks(task: &PlanningTask) -> HashSet<Fact> {
    let mut landmarks: HashSet<Fact> = task.goals.iter().copied().collect();
    for &fact in &task.facts {
        if landmarks.contains(&fact) {
            continue;
        }
        let reached = reachable_excluding(task, fact);
        if !task.goals.iter().all(|g| reached.contains(g)) {
            landmarks.insert(fact);
        }
    }
    landmarks
}

/// For each operator, the landmarks it adds share its cost evenly; each landmark's cost is
/// the minimum such share over every operator that adds it (spec §4.3).
fn landmark_costs(task: &PlanningTask, landmarks: &HashSet<Fact>) -> HashMap<Fact, f64> {
    let mut costs: HashMap<Fact, f64> = landmarks.iter().map(|&l| (l, f64::INFINITY)).collect();
    for op in &task.operators {
        let added: Vec<Fact> = op.add().iter().copied().filter(|f| landmarks.contains(f)).collect();
        if added.is_empty() {
            continue;
        }
        let share = 1.0 / added.len() as f64;
        for l in added {
            let c = costs.entry(l).or_insert(f64::INFINITY);
            if share < *c {
                *c = share;
            }
        }
    }
    costs
}

impl<'a> LandmarkHeuristic<'a> {
    pub fn new(task: &'a PlanningTask) -> Self {
        let landmarks = find_landmarks(task);
        debug_assert!(task.goals.iter().all(|g| landmarks.contains(g)));
        let costs = landmark_costs(task, &landmarks);
        LandmarkHeuristic { task, landmarks, costs }
    }

    /// True iff some goal fact has infinite cost: no operator can ever produce it, so the
    /// task is unsolvable regardless of search effort.
    pub fn is_unsolvable(&self) -> bool {
        self.task.goals.iter().any(|g| !self.costs.get(g).is_some_and(|c| c.is_finite()))
    }

    fn not_reached_at_root(&self) -> HashSet<Fact> {
        self.landmarks.iter().copied().filter(|f| !self.task.initial_state.contains(*f)).collect()
    }

    fn value(&self, state: &State, not_reached: &HashSet<Fact>) -> Option<u32> {
        let total: f64 = not_reached
            .iter()
            .chain(self.task.goals.iter().filter(|g| !state.contains(**g)))
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|f| self.costs.get(f).copied().unwrap_or(f64::INFINITY))
            .sum();
        if total.is_infinite() {
            None
        } else {
            Some(total.ceil() as u32)
        }
    }
}

impl Heuristic for LandmarkHeuristic<'_> {
    fn evaluate(&self, ctx: EvalContext) -> (Option<u32>, Option<HashSet<Fact>>) {
        let not_reached = match (ctx.parent_not_reached, ctx.applied) {
            (Some(parent_not_reached), Some(applied)) => {
                parent_not_reached.iter().copied().filter(|f| !applied.add().contains(f)).collect()
            }
            _ => self.not_reached_at_root(),
        };
        let value = self.value(ctx.state, &not_reached);
        (value, Some(not_reached))
    }
}
