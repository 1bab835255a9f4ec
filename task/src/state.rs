use crate::fact::Fact;
use fixedbitset::FixedBitSet;

/// An immutable-by-convention snapshot of the facts that hold, over a fixed fact universe.
///
/// Backed by a bitset indexed by `Fact` so that membership, union/difference (successor
/// generation) and hashing (for use as a key in open/closed lists) are all cheap. Mutating
/// methods are provided for building successor states efficiently; callers treat a `State`
/// as a value and clone before mutating one that is still referenced elsewhere (e.g. search
/// nodes).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct State {
    facts: FixedBitSet,
}

impl State {
    pub fn empty(num_facts: usize) -> Self {
        State {
            facts: FixedBitSet::with_capacity(num_facts),
        }
    }

    pub fn from_facts(num_facts: usize, facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut s = State::empty(num_facts);
        for f in facts {
            s.insert(f);
        }
        s
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn contains(&self, f: Fact) -> bool {
        self.facts.contains(f.into())
    }

    pub fn insert(&mut self, f: Fact) {
        self.facts.insert(f.into());
    }

    pub fn remove(&mut self, f: Fact) {
        self.facts.set(f.into(), false);
    }

    /// True iff every fact in `facts` holds in this state.
    pub fn satisfies_all(&self, facts: &[Fact]) -> bool {
        facts.iter().all(|&f| self.contains(f))
    }

    /// True iff none of `facts` holds in this state.
    pub fn satisfies_none(&self, facts: &[Fact]) -> bool {
        facts.iter().all(|&f| !self.contains(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = Fact> + '_ {
        self.facts.ones().map(Fact::from)
    }

    /// `(self \ del) ∪ add`, applied in place.
    pub fn apply_in_place(&mut self, add: &[Fact], del: &[Fact]) {
        for &f in del {
            self.remove(f);
        }
        for &f in add {
            self.insert(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_and_mutation() {
        let mut s = State::empty(4);
        let f0 = Fact::from(0usize);
        let f1 = Fact::from(1usize);
        assert!(!s.contains(f0));
        s.insert(f0);
        assert!(s.contains(f0));
        assert!(!s.contains(f1));
        s.remove(f0);
        assert!(!s.contains(f0));
    }

    #[test]
    fn equal_states_hash_equal() {
        use std::collections::HashSet;
        let f0 = Fact::from(0usize);
        let mut a = State::empty(4);
        a.insert(f0);
        let mut b = State::empty(4);
        b.insert(f0);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }
}
