use crate::fact::Fact;
use crate::state::State;
use ppl_collections::create_ref_type;

create_ref_type!(OpId);

/// A grounded, named action: positive/negative preconditions plus add/delete effects.
///
/// Construction resolves the three disjointness invariants of `§3` the way the grounder
/// does: on conflict, add wins over delete, and an effect that would merely restate a
/// precondition is dropped from the effect rather than rejecting the whole operator. A
/// remaining violation after normalization is therefore a bug in the caller, not a
/// condition to surface to a domain author, hence the `debug_assert`s rather than an
/// [`PlanError::InvariantViolation`] return.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operator {
    pub name: String,
    pos_pre: Vec<Fact>,
    neg_pre: Vec<Fact>,
    add: Vec<Fact>,
    del: Vec<Fact>,
}

fn sorted_dedup(mut v: Vec<Fact>) -> Vec<Fact> {
    v.sort_unstable();
    v.dedup();
    v
}

fn disjoint(a: &[Fact], b: &[Fact]) -> bool {
    a.iter().all(|x| !b.contains(x))
}

impl Operator {
    /// Builds an operator, resolving the three disjointness invariants of `§3` the way
    /// the grounder does: add wins over delete on conflict, and an add/delete effect that
    /// would merely restate a precondition already known to hold/not-hold is dropped from
    /// the effect set rather than causing a rejection.
    pub fn new(
        name: impl Into<String>,
        pos_pre: Vec<Fact>,
        neg_pre: Vec<Fact>,
        mut add: Vec<Fact>,
        mut del: Vec<Fact>,
    ) -> Operator {
        let pos_pre = sorted_dedup(pos_pre);
        let neg_pre = sorted_dedup(neg_pre);
        del.retain(|f| !add.contains(f));
        del.retain(|f| !neg_pre.contains(f));
        add.retain(|f| !pos_pre.contains(f));
        let add = sorted_dedup(add);
        let del = sorted_dedup(del);

        let name = name.into();
        debug_assert!(disjoint(&add, &del), "add-wins rule should make this unreachable");
        debug_assert!(disjoint(&add, &pos_pre), "restating a positive precondition should have been stripped");
        debug_assert!(disjoint(&del, &neg_pre), "restating a negative precondition should have been stripped");

        Operator {
            name,
            pos_pre,
            neg_pre,
            add,
            del,
        }
    }

    pub fn pos_pre(&self) -> &[Fact] {
        &self.pos_pre
    }
    pub fn neg_pre(&self) -> &[Fact] {
        &self.neg_pre
    }
    pub fn add(&self) -> &[Fact] {
        &self.add
    }
    pub fn del(&self) -> &[Fact] {
        &self.del
    }

    pub fn applicable(&self, state: &State) -> bool {
        state.satisfies_all(&self.pos_pre) && state.satisfies_none(&self.neg_pre)
    }

    /// Precondition: `self.applicable(state)`. Panics (debug) otherwise: applying an
    /// inapplicable operator is a caller bug, not a recoverable condition.
    pub fn apply(&self, state: &State) -> State {
        debug_assert!(self.applicable(state), "apply called on inapplicable operator {}", self.name);
        let mut next = state.clone();
        next.apply_in_place(&self.add, &self.del);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(i: usize) -> Fact {
        Fact::from(i)
    }

    #[test]
    fn add_wins_over_delete() {
        let op = Operator::new("a", vec![], vec![], vec![f(0)], vec![f(0)]);
        assert_eq!(op.add(), &[f(0)]);
        assert!(op.del().is_empty());
    }

    #[test]
    fn add_overlapping_pos_pre_is_stripped() {
        let op = Operator::new("a", vec![f(0)], vec![], vec![f(0), f(1)], vec![]);
        assert_eq!(op.add(), &[f(1)]);
    }

    #[test]
    fn del_overlapping_neg_pre_is_stripped() {
        let op = Operator::new("a", vec![], vec![f(0)], vec![], vec![f(0), f(1)]);
        assert_eq!(op.del(), &[f(1)]);
    }

    #[test]
    fn applicability_and_transition() {
        let op = Operator::new("pickup", vec![f(0), f(1)], vec![f(2)], vec![f(2)], vec![f(0), f(1)]);
        let mut s = State::empty(3);
        s.insert(f(0));
        s.insert(f(1));
        assert!(op.applicable(&s));
        let next = op.apply(&s);
        assert!(next.contains(f(2)));
        assert!(!next.contains(f(0)));
        assert!(!next.contains(f(1)));
    }
}
