pub mod ast;
pub mod parser;
pub mod sexpr;

pub use ast::{ActionSchema, Domain, ForallEffect, Literal, PredicateSig, Problem};
use ppl_task::{PlanError, Result};

/// Parses a domain file's contents into a [`Domain`].
pub fn parse_domain_str(src: &str) -> Result<Domain> {
    let forms = sexpr::parse_all(src)?;
    let form = forms
        .first()
        .ok_or_else(|| PlanError::UnsupportedFeature("empty domain file".into()))?;
    parser::parse_domain(form)
}

/// Parses a problem file's contents into a [`Problem`].
pub fn parse_problem_str(src: &str) -> Result<Problem> {
    let forms = sexpr::parse_all(src)?;
    let form = forms
        .first()
        .ok_or_else(|| PlanError::UnsupportedFeature("empty problem file".into()))?;
    parser::parse_problem(form)
}
