use ppl_collections::create_ref_type;
use ppl_collections::ref_store::RefPool;
use std::collections::HashMap;

create_ref_type!(NodeId);

/// A propositional formula DAG node, hash-consed on `(op, operands)` so that repeated
/// subformulas (e.g. the same frame axiom reused at every horizon step) share a single
/// node rather than being rebuilt.
///
/// Grounded on the `Node`/`Operator` pair of `examples/original_source/formula.py`'s
/// `Formula` class, restated as a sum type in the manner of the teacher's `Expr { fun,
/// args }` (`model/src/lang/expr.rs`): here the arity is baked into the variant instead of
/// a generic `args: Vec<Atom>`, since every connective this planner needs is fixed-arity.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum NodeData {
    Var(u32),
    Not(NodeId),
    And(NodeId, NodeId),
    Or(NodeId, NodeId),
    Implies(NodeId, NodeId),
    /// `a <-> b`, kept distinct from a pair of `Implies` so that CNF emission can produce
    /// the four-clause biconditional expansion directly instead of via two implications.
    Iff(NodeId, NodeId),
}

/// A hash-consed boolean formula over named variables.
///
/// Variable names are interned once and keep a stable numeric index for the lifetime of
/// the `Formula`, so an encoder that extends a horizon (adding new `fact-t`/`op-t` names
/// but never touching existing ones) gets a CNF whose variable numbering for the unchanged
/// prefix is untouched, matching the "monotonic and preserved across horizons" requirement
/// on variable assignment.
#[derive(Default)]
pub struct Formula {
    nodes: RefPool<NodeId, NodeData>,
    names: HashMap<String, NodeId>,
    next_var: u32,
}

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for `name`, interning a fresh variable if this is the first use.
    pub fn var(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        if let Some(&id) = self.names.get(&name) {
            return id;
        }
        let idx = self.next_var;
        self.next_var += 1;
        let id = self.nodes.intern(NodeData::Var(idx));
        self.names.insert(name, id);
        id
    }

    pub fn make_not(&mut self, a: NodeId) -> NodeId {
        if let NodeData::Not(inner) = self.nodes.get(a) {
            return *inner;
        }
        self.nodes.intern(NodeData::Not(a))
    }

    pub fn make_and(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let (a, b) = order(a, b);
        self.nodes.intern(NodeData::And(a, b))
    }

    pub fn make_or(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let (a, b) = order(a, b);
        self.nodes.intern(NodeData::Or(a, b))
    }

    pub fn make_implication(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.nodes.intern(NodeData::Implies(a, b))
    }

    pub fn make_iff(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let (a, b) = order(a, b);
        self.nodes.intern(NodeData::Iff(a, b))
    }

    /// Balanced-tree conjunction of `nodes`, mirroring
    /// `Formula.make_and_from_array`/`make_or_from_array` in `formula.py`: folding pairwise
    /// rather than left-to-right keeps the DAG shallow, which keeps Tseitin variable counts
    /// and recursion depth down for wide per-step action disjunctions.
    pub fn make_and_from_array(&mut self, nodes: &[NodeId]) -> NodeId {
        self.fold_balanced(nodes, Self::make_and)
    }

    pub fn make_or_from_array(&mut self, nodes: &[NodeId]) -> NodeId {
        self.fold_balanced(nodes, Self::make_or)
    }

    fn fold_balanced(&mut self, nodes: &[NodeId], op: fn(&mut Self, NodeId, NodeId) -> NodeId) -> NodeId {
        match nodes.len() {
            0 => panic!("cannot fold an empty node array"),
            1 => nodes[0],
            _ => {
                let mid = nodes.len() / 2;
                let left = self.fold_balanced(&nodes[..mid], op);
                let right = self.fold_balanced(&nodes[mid..], op);
                op(self, left, right)
            }
        }
    }

    /// The stable 0-based index assigned to `id` if it is a variable node, `None` for a
    /// compound node.
    pub fn var_index(&self, id: NodeId) -> Option<u32> {
        match self.nodes.get(id) {
            NodeData::Var(idx) => Some(*idx),
            _ => None,
        }
    }

    /// Converts the formula rooted at `root` to CNF via Tseitin transformation, asserting
    /// `root` true. Every formula variable keeps the DIMACS index `var_index + 1`; every
    /// compound node gets one auxiliary variable, memoized by node id so a shared
    /// subformula (frame axioms reused across an unchanged horizon prefix) is encoded only
    /// once even if reached from multiple parents.
    pub fn to_cnf(&self, root: NodeId) -> Cnf {
        let mut cnf = Cnf {
            num_vars: self.next_var,
            clauses: Vec::new(),
        };
        let mut var_of: HashMap<NodeId, i32> = HashMap::new();
        let mut next_aux = self.next_var + 1;
        let lit = self.tseitin(root, &mut cnf, &mut var_of, &mut next_aux);
        cnf.clauses.push(vec![lit]);
        cnf
    }

    fn fresh_aux(cnf: &mut Cnf, next_aux: &mut u32) -> i32 {
        let v = *next_aux;
        *next_aux += 1;
        cnf.num_vars = cnf.num_vars.max(v);
        v as i32
    }

    fn tseitin(&self, id: NodeId, cnf: &mut Cnf, var_of: &mut HashMap<NodeId, i32>, next_aux: &mut u32) -> i32 {
        if let Some(&lit) = var_of.get(&id) {
            return lit;
        }
        let lit = match self.nodes.get(id) {
            NodeData::Var(idx) => (*idx + 1) as i32,
            NodeData::Not(a) => -self.tseitin(*a, cnf, var_of, next_aux),
            NodeData::And(a, b) => {
                let la = self.tseitin(*a, cnf, var_of, next_aux);
                let lb = self.tseitin(*b, cnf, var_of, next_aux);
                let v = Self::fresh_aux(cnf, next_aux);
                cnf.clauses.push(vec![-v, la]);
                cnf.clauses.push(vec![-v, lb]);
                cnf.clauses.push(vec![v, -la, -lb]);
                v
            }
            NodeData::Or(a, b) => {
                let la = self.tseitin(*a, cnf, var_of, next_aux);
                let lb = self.tseitin(*b, cnf, var_of, next_aux);
                let v = Self::fresh_aux(cnf, next_aux);
                cnf.clauses.push(vec![v, -la]);
                cnf.clauses.push(vec![v, -lb]);
                cnf.clauses.push(vec![-v, la, lb]);
                v
            }
            NodeData::Implies(a, b) => {
                let la = self.tseitin(*a, cnf, var_of, next_aux);
                let lb = self.tseitin(*b, cnf, var_of, next_aux);
                let v = Self::fresh_aux(cnf, next_aux);
                cnf.clauses.push(vec![-v, -la, lb]);
                cnf.clauses.push(vec![v, la]);
                cnf.clauses.push(vec![v, -lb]);
                v
            }
            NodeData::Iff(a, b) => {
                let la = self.tseitin(*a, cnf, var_of, next_aux);
                let lb = self.tseitin(*b, cnf, var_of, next_aux);
                let v = Self::fresh_aux(cnf, next_aux);
                cnf.clauses.push(vec![-v, -la, lb]);
                cnf.clauses.push(vec![-v, la, -lb]);
                cnf.clauses.push(vec![v, la, lb]);
                cnf.clauses.push(vec![v, -la, -lb]);
                v
            }
        };
        var_of.insert(id, lit);
        lit
    }
}

/// Canonical ordering for commutative connectives, so `and(a, b)` and `and(b, a)` hash-cons
/// to the same node.
fn order(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A CNF in DIMACS convention: a positive integer is the literal for that variable, a
/// negative one its negation; `0` is never stored (it is only a line terminator in the
/// textual format). Mirrors the shape of the teacher's `aries_sat::cnf::CNF`
/// (`sat/src/cnf.rs`), using plain signed integers instead of the teacher's own `Lit` type
/// since this crate has no need for the rest of `aries_model`'s bound-literal machinery.
#[derive(Debug, Default)]
pub struct Cnf {
    pub num_vars: u32,
    pub clauses: Vec<Vec<i32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_interning_is_idempotent() {
        let mut f = Formula::new();
        let a = f.var("p-0");
        let b = f.var("p-0");
        assert_eq!(a, b);
        assert_eq!(f.var_index(a), Some(0));
    }

    #[test]
    fn commutative_ops_share_nodes() {
        let mut f = Formula::new();
        let a = f.var("a");
        let b = f.var("b");
        let ab = f.make_and(a, b);
        let ba = f.make_and(b, a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn double_negation_collapses() {
        let mut f = Formula::new();
        let a = f.var("a");
        let not_a = f.make_not(a);
        let not_not_a = f.make_not(not_a);
        assert_eq!(a, not_not_a);
    }

    #[test]
    fn and_clause_count_matches_tseitin_definition() {
        let mut f = Formula::new();
        let a = f.var("a");
        let b = f.var("b");
        let ab = f.make_and(a, b);
        let cnf = f.to_cnf(ab);
        // 3 clauses for the AND gate plus 1 unit clause asserting the gate true.
        assert_eq!(cnf.clauses.len(), 4);
    }

    #[test]
    fn iff_expands_to_four_clauses_plus_assertion() {
        let mut f = Formula::new();
        let a = f.var("a");
        let b = f.var("b");
        let iff = f.make_iff(a, b);
        let cnf = f.to_cnf(iff);
        assert_eq!(cnf.clauses.len(), 5);
    }

    #[test]
    fn shared_subformula_encoded_once() {
        let mut f = Formula::new();
        let a = f.var("a");
        let b = f.var("b");
        let shared = f.make_and(a, b);
        let top = f.make_and(shared, shared);
        let cnf = f.to_cnf(top);
        // one gate for `shared`, one for `top`, each contributing 3 clauses, plus the
        // final unit assertion.
        assert_eq!(cnf.clauses.len(), 7);
    }
}
