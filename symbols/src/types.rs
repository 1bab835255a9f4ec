use anyhow::*;
use ppl_collections::create_ref_type;
use ppl_collections::ref_store::RefPool;

create_ref_type!(TypeId);

/// The type hierarchy of a domain, as a forest of named types.
///
/// Types are stored in pre-order depth-first traversal order: visiting the
/// subtree rooted at a type `t` only ever visits types whose id lies in
/// `[t, last_subtype(t)]`. This makes "is `s` a (transitive) subtype of `t`"
/// and "find all symbols whose type is `t` or a subtype of `t`" a single
/// integer range check instead of a graph walk.
#[derive(Clone)]
pub struct TypeHierarchy {
    names: RefPool<TypeId, String>,
    last_subtype: Vec<TypeId>,
}

#[derive(Debug)]
pub struct UnreachableFromRoot(Vec<(String, Option<String>)>);

impl std::fmt::Display for UnreachableFromRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "types not reachable from any root type: {:?}", self.0)
    }
}
impl std::error::Error for UnreachableFromRoot {}

impl TypeHierarchy {
    /// Builds a type hierarchy from `(type, parent)` pairs. A `None` parent denotes a root type.
    pub fn new(mut types: Vec<(String, Option<String>)>) -> Result<Self, UnreachableFromRoot> {
        let mut sys = TypeHierarchy {
            names: Default::default(),
            last_subtype: Vec::new(),
        };

        // depth-first, children-after-parent traversal: repeatedly pop the current
        // frontier's parent, append any not-yet-placed direct child, and backtrack
        // when no child remains.
        let mut trace: Vec<Option<String>> = vec![None];

        while let Some(parent) = trace.last().cloned() {
            match types.iter().position(|(_, p)| p == &parent) {
                Some(pos) => {
                    let (name, _) = types.remove(pos);
                    let id = sys.names.intern(name.clone());
                    debug_assert_eq!(usize::from(id), sys.last_subtype.len());
                    sys.last_subtype.push(id); // placeholder, fixed up on backtrack
                    trace.push(Some(name));
                }
                None => {
                    if let Some(p) = &parent {
                        let parent_id = sys.names.get_ref(p.as_str()).unwrap();
                        let last = sys.names.last_key().unwrap();
                        sys.last_subtype[usize::from(parent_id)] = last;
                    }
                    trace.pop();
                }
            }
        }

        if types.is_empty() {
            Ok(sys)
        } else {
            Err(UnreachableFromRoot(types))
        }
    }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.names.get_ref(name)
    }

    pub fn name(&self, id: TypeId) -> &str {
        self.names.get(id)
    }

    /// True iff `possible_subtype` is `tpe` itself or a (transitive) subtype of it.
    pub fn is_subtype(&self, tpe: TypeId, possible_subtype: TypeId) -> bool {
        tpe <= possible_subtype && possible_subtype <= self.last_subtype[usize::from(tpe)]
    }

    pub fn last_subtype(&self, tpe: TypeId) -> TypeId {
        self.last_subtype[usize::from(tpe)]
    }

    pub fn types(&self) -> impl Iterator<Item = TypeId> {
        self.names.keys()
    }
}
