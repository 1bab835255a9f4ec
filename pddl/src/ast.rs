/// A (possibly negated) atom: `sign == -1` for `(not (pred args...))`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    pub sign: i8,
    pub predicate: String,
    pub args: Vec<String>,
}

impl Literal {
    pub fn positive(predicate: impl Into<String>, args: Vec<String>) -> Literal {
        Literal { sign: 1, predicate: predicate.into(), args }
    }
}

/// A single `forall (vars) when (cond) (effects)` conditional effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForallEffect {
    pub vars: Vec<(String, String)>,
    pub condition: Literal,
    pub add: Vec<Literal>,
    pub del: Vec<Literal>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateSig {
    pub name: String,
    pub params: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSchema {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub pos_pre: Vec<Literal>,
    pub neg_pre: Vec<Literal>,
    pub add: Vec<Literal>,
    pub del: Vec<Literal>,
    pub forall: Vec<ForallEffect>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    /// `(type, parent)`, parent `None` for a direct child of `object`.
    pub types: Vec<(String, Option<String>)>,
    pub constants: Vec<(String, String)>,
    pub predicates: Vec<PredicateSig>,
    pub actions: Vec<ActionSchema>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    pub name: String,
    pub domain: String,
    pub objects: Vec<(String, String)>,
    pub init: Vec<(String, Vec<String>)>,
    pub goal: Vec<(String, Vec<String>)>,
}
