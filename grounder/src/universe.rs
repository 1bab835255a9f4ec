use ppl_pddl::{Domain, Problem};
use ppl_symbols::types::TypeHierarchy;
use ppl_symbols::SymbolTable;
use ppl_task::{PlanError, Result};

/// Builds the type hierarchy and symbol table spanning a domain's declared types plus its
/// constants and the problem's objects (both treated as instances for grounding purposes,
/// mirroring `self.type2objects` in the Python grounder, which merges `problem.objects` and
/// `domain.constants` into one lookup).
///
/// Declared types with no explicit parent are rehomed under the implicit `object` root
/// rather than left as siblings of it, so an untyped parameter (which defaults to `object`,
/// see `parse_typed_list`) still ranges over every declared type's instances.
pub fn build_universe(domain: &Domain, problem: &Problem) -> Result<(TypeHierarchy, SymbolTable)> {
    let mut types: Vec<(String, Option<String>)> = domain
        .types
        .iter()
        .map(|(name, parent)| match parent {
            None if name != "object" => (name.clone(), Some("object".to_string())),
            _ => (name.clone(), parent.clone()),
        })
        .collect();
    if !types.iter().any(|(name, _)| name == "object") {
        types.push(("object".to_string(), None));
    }
    let hierarchy = TypeHierarchy::new(types)
        .map_err(|e| PlanError::UnsupportedFeature(format!("domain type hierarchy: {e}")))?;

    let mut symbols = domain.constants.clone();
    symbols.extend(problem.objects.iter().cloned());

    let table = SymbolTable::new(hierarchy.clone(), symbols)
        .map_err(|e| PlanError::UnsupportedFeature(format!("domain symbol table: {e}")))?;
    Ok((hierarchy, table))
}

/// Sorted-by-name object candidates for a parameter of type `type_name` (tie-break per
/// spec §4.1: "objects in sorted order by name").
pub fn candidates_for_type(hierarchy: &TypeHierarchy, table: &SymbolTable, type_name: &str) -> Result<Vec<String>> {
    let tid = hierarchy
        .id_of(type_name)
        .ok_or_else(|| PlanError::UnsupportedFeature(format!("unknown type '{type_name}'")))?;
    let mut names: Vec<String> = table.instances_of_type(tid).map(|s| table.symbol(s).to_string()).collect();
    names.sort_unstable();
    Ok(names)
}
