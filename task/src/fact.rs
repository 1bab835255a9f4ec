use ppl_collections::create_ref_type;
use ppl_collections::ref_store::RefPool;

create_ref_type!(Fact);

/// Interns the canonical textual representation of grounded atoms, e.g. `(on a b)`.
///
/// A [`Fact`] carries no structure of its own: only identity (via interning) matters, as
/// required of facts throughout the planner. The table is the single owner of the mapping
/// between a fact and its display string; everything else only ever passes `Fact` handles
/// around.
#[derive(Clone, Default)]
pub struct FactTable {
    pool: RefPool<Fact, String>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text`, returning the existing fact if already known.
    pub fn intern(&mut self, text: impl Into<String>) -> Fact {
        self.pool.intern(text.into())
    }

    /// Looks up a fact without interning it.
    pub fn get(&self, text: &str) -> Option<Fact> {
        self.pool.get_ref(text)
    }

    pub fn text(&self, fact: Fact) -> &str {
        self.pool.get(fact)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fact, &String)> {
        self.pool.iter()
    }
}

/// Builds a canonical fact string `(name arg1 arg2 ...)` from a predicate name and its
/// grounded argument tuple.
pub fn canonical_atom(name: &str, args: &[&str]) -> String {
    let mut s = String::from("(");
    s.push_str(name);
    for a in args {
        s.push(' ');
        s.push_str(a);
    }
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = FactTable::new();
        let a = table.intern(canonical_atom("on", &["a", "b"]));
        let b = table.intern(canonical_atom("on", &["a", "b"]));
        assert_eq!(a, b);
        assert_eq!(table.text(a), "(on a b)");
    }
}
