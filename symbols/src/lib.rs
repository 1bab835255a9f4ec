pub mod types;

use crate::types::{TypeHierarchy, TypeId};
use anyhow::*;
use ppl_collections::create_ref_type;
use std::collections::HashMap;
use std::fmt::Write as _;

create_ref_type!(SymId);

/// A contiguous range of [`SymId`]s, used to represent "all instances of a type".
#[derive(Copy, Clone, Debug)]
pub struct ContiguousSymbols {
    first: usize,
    after_last: usize,
}

impl ContiguousSymbols {
    fn new(first: SymId, after_last_exclusive: usize) -> Self {
        ContiguousSymbols {
            first: first.into(),
            after_last: after_last_exclusive,
        }
    }

    pub fn len(self) -> usize {
        self.after_last.saturating_sub(self.first)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn contains(self, sym: SymId) -> bool {
        let sym = usize::from(sym);
        self.first <= sym && sym < self.after_last
    }
}

impl Iterator for ContiguousSymbols {
    type Item = SymId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.first < self.after_last {
            self.first += 1;
            Some(SymId::from(self.first - 1))
        } else {
            None
        }
    }
}

/// Associates each symbol (predicate, object, constant, type or action name) with a type and
/// a dense numeric [`SymId`] suitable for use as an array index.
///
/// Symbols are laid out in the same pre-order as [`TypeHierarchy`], so "all instances of type
/// `t` including subtypes" is the contiguous span from the first symbol of exact type `t` to
/// the last symbol of exact type `last_subtype(t)`.
#[derive(Clone)]
pub struct SymbolTable {
    pub types: TypeHierarchy,
    names: Vec<String>,
    ids: HashMap<String, SymId>,
    symbol_types: Vec<TypeId>,
    instances_by_exact_type: Vec<ContiguousSymbols>,
}

impl SymbolTable {
    /// Builds a symbol table from a type hierarchy and a set of `(symbol, type)` pairs.
    pub fn new(types: TypeHierarchy, symbols: Vec<(String, String)>) -> Result<Self> {
        let mut by_type: HashMap<TypeId, Vec<String>> = HashMap::new();
        for (sym, tpe) in symbols {
            let tpe_id = types
                .id_of(&tpe)
                .with_context(|| format!("Unknown type: {tpe}"))?;
            by_type.entry(tpe_id).or_default().push(sym);
        }

        let mut table = SymbolTable {
            types,
            names: Vec::new(),
            ids: HashMap::new(),
            symbol_types: Vec::new(),
            instances_by_exact_type: Vec::new(),
        };

        for tpe in table.types.types() {
            let first = SymId::from(table.names.len());
            for sym in by_type.remove(&tpe).unwrap_or_default() {
                ensure!(!table.ids.contains_key(&sym), "duplicated instance: {sym}");
                let id = SymId::from(table.names.len());
                table.ids.insert(sym.clone(), id);
                table.names.push(sym);
                table.symbol_types.push(tpe);
            }
            table
                .instances_by_exact_type
                .push(ContiguousSymbols::new(first, table.names.len()));
        }

        Ok(table)
    }

    pub fn id(&self, sym: &str) -> Option<SymId> {
        self.ids.get(sym).copied()
    }

    pub fn symbol(&self, id: SymId) -> &str {
        &self.names[usize::from(id)]
    }

    pub fn type_of(&self, id: SymId) -> TypeId {
        self.symbol_types[usize::from(id)]
    }

    /// All direct or indirect instances of `tpe`, in sorted (symbol-table) order.
    pub fn instances_of_type(&self, tpe: TypeId) -> ContiguousSymbols {
        let mut instances = self.instances_by_exact_type[usize::from(tpe)];
        let last = self.types.last_subtype(tpe);
        instances.after_last = self.instances_by_exact_type[usize::from(last)].after_last;
        instances
    }

    pub fn format(&self, sexpr: &[SymId]) -> String {
        let mut s = String::from("(");
        for (i, sym) in sexpr.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            write!(s, "{}", self.symbol(*sym)).unwrap();
        }
        s.push(')');
        s
    }
}
