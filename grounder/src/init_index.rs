use ppl_task::canonical_atom;
use std::collections::{HashMap, HashSet};

/// Indexes the initial state two ways: by `(predicate, position) -> objects seen there`,
/// for the static-candidate filter of spec §4.1 step 3 (`_find_pred_in_initial_state` in
/// the Python grounder, restated as a hash lookup instead of a regex scan); and by exact
/// canonical atom, for checking whether a fully-instantiated static precondition holds.
pub struct InitIndex {
    by_pred_pos: HashMap<(String, usize), HashSet<String>>,
    atoms: HashSet<String>,
}

impl InitIndex {
    pub fn build(init: &[(String, Vec<String>)]) -> InitIndex {
        let mut by_pred_pos: HashMap<(String, usize), HashSet<String>> = HashMap::new();
        let mut atoms = HashSet::new();
        for (pred, args) in init {
            for (pos, arg) in args.iter().enumerate() {
                by_pred_pos.entry((pred.clone(), pos)).or_default().insert(arg.clone());
            }
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            atoms.insert(canonical_atom(pred, &arg_refs));
        }
        InitIndex { by_pred_pos, atoms }
    }

    /// True iff some initial-state atom of `predicate` has `object` at position `pos`.
    pub fn candidate_holds(&self, predicate: &str, pos: usize, object: &str) -> bool {
        self.by_pred_pos.get(&(predicate.to_string(), pos)).is_some_and(|s| s.contains(object))
    }

    /// True iff the fully-instantiated ground atom `predicate(args)` is in the initial state.
    pub fn atom_holds(&self, predicate: &str, args: &[String]) -> bool {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.atoms.contains(&canonical_atom(predicate, &arg_refs))
    }
}
