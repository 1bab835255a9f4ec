use crate::ast::{ActionSchema, Domain, ForallEffect, Literal, PredicateSig, Problem};
use crate::sexpr::Sexpr;
use ppl_task::{PlanError, Result};

fn err(msg: impl Into<String>) -> PlanError {
    PlanError::UnsupportedFeature(msg.into())
}

fn atom<'a>(s: &'a Sexpr, what: &str) -> Result<&'a str> {
    s.as_atom().ok_or_else(|| err(format!("expected an atom for {what}")))
}

fn list<'a>(s: &'a Sexpr, what: &str) -> Result<&'a [Sexpr]> {
    s.as_list().ok_or_else(|| err(format!("expected a list for {what}")))
}

/// Finds the `(:keyword ...)` section for `keyword` among a domain/problem body.
fn section<'a>(items: &'a [Sexpr], keyword: &str) -> Option<&'a [Sexpr]> {
    items.iter().find_map(|item| {
        let l = item.as_list()?;
        let head = l.first()?.as_atom()?;
        (head == keyword).then_some(&l[1..])
    })
}

fn all_sections<'a>(items: &'a [Sexpr], keyword: &str) -> Vec<&'a [Sexpr]> {
    items
        .iter()
        .filter_map(|item| {
            let l = item.as_list()?;
            let head = l.first()?.as_atom()?;
            (head == keyword).then_some(&l[1..])
        })
        .collect()
}

/// Parses a PDDL typed list `a b - type c - type2 d` (untyped trailing names default to
/// `object`), as used for `:parameters`, `:constants` and predicate argument lists.
fn parse_typed_list(items: &[Sexpr]) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut pending = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let tok = atom(&items[i], "typed list entry")?;
        if tok == "-" {
            i += 1;
            let ty = atom(items.get(i).ok_or_else(|| err("dangling '-' in typed list"))?, "type name")?;
            for name in pending.drain(..) {
                out.push((name, ty.to_string()));
            }
            i += 1;
        } else if tok == "either" {
            return Err(err("either-types are not supported"));
        } else {
            pending.push(tok.to_string());
            i += 1;
        }
    }
    for name in pending.drain(..) {
        out.push((name, "object".to_string()));
    }
    Ok(out)
}

/// Parses a `:types` section: `t1 t2 - parent t3` groups, with bare trailing names having
/// no parent (direct children of the implicit root `object`). Unlike `parse_typed_list`,
/// an entry with no `-` suffix gets `None` here rather than defaulting to `"object"`.
fn parse_types_section(items: &[Sexpr]) -> Result<Vec<(String, Option<String>)>> {
    let mut out = Vec::new();
    let mut pending = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let tok = atom(&items[i], "type name")?;
        if tok == "-" {
            i += 1;
            let ty = atom(items.get(i).ok_or_else(|| err("dangling '-' in :types"))?, "parent type")?;
            for name in pending.drain(..) {
                out.push((name, Some(ty.to_string())));
            }
            i += 1;
        } else {
            pending.push(tok.to_string());
            i += 1;
        }
    }
    for name in pending.drain(..) {
        out.push((name, None));
    }
    Ok(out)
}

fn parse_args(items: &[Sexpr]) -> Result<Vec<String>> {
    items.iter().map(|s| atom(s, "argument").map(str::to_string)).collect()
}

/// A positive or negated atom: `(pred a b)` or `(not (pred a b))`.
fn parse_literal(sexpr: &Sexpr) -> Result<Literal> {
    let l = list(sexpr, "literal")?;
    let head = atom(l.first().ok_or_else(|| err("empty literal"))?, "predicate or 'not'")?;
    if head == "not" {
        let inner = list(l.get(1).ok_or_else(|| err("'not' with no argument"))?, "negated atom")?;
        let pred = atom(inner.first().ok_or_else(|| err("empty negated atom"))?, "predicate")?;
        Ok(Literal { sign: -1, predicate: pred.to_string(), args: parse_args(&inner[1..])? })
    } else {
        Ok(Literal { sign: 1, predicate: head.to_string(), args: parse_args(&l[1..])? })
    }
}

/// Splits a precondition formula into positive/negative literal lists. Only conjunctions
/// of (possibly negated) atoms are supported; `or`/`exists`/`forall` in a precondition are
/// outside the STRIPS fragment this planner supports.
fn parse_precondition(sexpr: &Sexpr, pos: &mut Vec<Literal>, neg: &mut Vec<Literal>) -> Result<()> {
    let l = list(sexpr, "precondition")?;
    let head = atom(l.first().ok_or_else(|| err("empty precondition"))?, "'and'/'not'/predicate");
    match head {
        Ok("and") => {
            for sub in &l[1..] {
                parse_precondition(sub, pos, neg)?;
            }
            Ok(())
        }
        Ok("or") => Err(err("disjunctive preconditions are not supported")),
        Ok("forall") | Ok("exists") => Err(err("quantified preconditions are not supported")),
        _ => {
            let lit = parse_literal(sexpr)?;
            if lit.sign < 0 {
                neg.push(lit);
            } else {
                pos.push(lit);
            }
            Ok(())
        }
    }
}

/// Splits an effect formula into add/delete literals and `forall/when` conditional effects.
/// Only a single level of `forall` wrapping a single `when` is supported (design note (c)).
fn parse_effect(
    sexpr: &Sexpr,
    add: &mut Vec<Literal>,
    del: &mut Vec<Literal>,
    forall: &mut Vec<ForallEffect>,
) -> Result<()> {
    let l = list(sexpr, "effect")?;
    let head = atom(l.first().ok_or_else(|| err("empty effect"))?, "'and'/'forall'/'not'/predicate");
    match head {
        Ok("and") => {
            for sub in &l[1..] {
                parse_effect(sub, add, del, forall)?;
            }
            Ok(())
        }
        Ok("forall") => {
            let vars = parse_typed_list(list(l.get(1).ok_or_else(|| err("'forall' with no variable list"))?, "forall variables")?)?;
            let body = l.get(2).ok_or_else(|| err("'forall' with no body"))?;
            let body_l = list(body, "forall body")?;
            let body_head = atom(body_l.first().ok_or_else(|| err("empty forall body"))?, "'when'")?;
            if body_head != "when" {
                return Err(err("forall effects must wrap a single 'when'"));
            }
            let condition_sexpr = body_l.get(1).ok_or_else(|| err("'when' with no condition"))?;
            let condition = parse_literal(condition_sexpr)
                .map_err(|_| err("'when' condition must be a single (possibly negated) atom"))?;
            let mut when_add = Vec::new();
            let mut when_del = Vec::new();
            let mut nested_forall = Vec::new();
            parse_effect(body_l.get(2).ok_or_else(|| err("'when' with no consequent"))?, &mut when_add, &mut when_del, &mut nested_forall)?;
            if !nested_forall.is_empty() {
                return Err(err("nested 'forall' effects are not supported"));
            }
            forall.push(ForallEffect { vars, condition, add: when_add, del: when_del });
            Ok(())
        }
        Ok("when") => Err(err("'when' outside a 'forall' is not supported")),
        Ok(k) if matches!(k, "increase" | "decrease" | "assign" | "scale-up" | "scale-down") => {
            Err(err("numeric-fluent effects are not supported"))
        }
        _ => {
            let lit = parse_literal(sexpr)?;
            if lit.sign < 0 {
                del.push(lit);
            } else {
                add.push(lit);
            }
            Ok(())
        }
    }
}

fn parse_action(items: &[Sexpr]) -> Result<ActionSchema> {
    let name = atom(items.first().ok_or_else(|| err("action with no name"))?, "action name")?.to_string();
    let mut params = Vec::new();
    let mut pos_pre = Vec::new();
    let mut neg_pre = Vec::new();
    let mut add = Vec::new();
    let mut del = Vec::new();
    let mut forall = Vec::new();
    let mut i = 1;
    while i < items.len() {
        let key = atom(&items[i], "action keyword")?;
        match key {
            ":parameters" => {
                let plist = list(items.get(i + 1).ok_or_else(|| err(":parameters with no value"))?, "parameter list")?;
                params = parse_typed_list(plist)?;
                i += 2;
            }
            ":precondition" => {
                parse_precondition(items.get(i + 1).ok_or_else(|| err(":precondition with no value"))?, &mut pos_pre, &mut neg_pre)?;
                i += 2;
            }
            ":effect" => {
                parse_effect(items.get(i + 1).ok_or_else(|| err(":effect with no value"))?, &mut add, &mut del, &mut forall)?;
                i += 2;
            }
            _ => return Err(err(format!("unsupported action keyword '{key}'"))),
        }
    }
    Ok(ActionSchema { name, params, pos_pre, neg_pre, add, del, forall })
}

pub fn parse_domain(form: &Sexpr) -> Result<Domain> {
    let top = list(form, "domain form")?;
    if atom(top.first().ok_or_else(|| err("empty domain form"))?, "'define'")? != "define" {
        return Err(err("expected a (define ...) form"));
    }
    let header = list(top.get(1).ok_or_else(|| err("domain form missing header"))?, "(domain NAME)")?;
    if atom(header.first().ok_or_else(|| err("empty domain header"))?, "'domain'")? != "domain" {
        return Err(err("expected a (domain NAME) header"));
    }
    let name = atom(header.get(1).ok_or_else(|| err("domain header missing name"))?, "domain name")?.to_string();

    let body = &top[2..];
    if let Some(reqs) = section(body, ":requirements") {
        for r in reqs {
            let r = atom(r, "requirement")?;
            if matches!(
                r,
                ":fluents"
                    | ":numeric-fluents"
                    | ":durative-actions"
                    | ":derived-predicates"
                    | ":disjunctive-preconditions"
                    | ":existential-preconditions"
                    | ":quantified-preconditions"
                    | ":action-costs"
            ) {
                return Err(err(format!("requirement '{r}' is outside the supported fragment")));
            }
        }
    }

    let types = section(body, ":types").map(parse_types_section).transpose()?.unwrap_or_default();
    let constants = section(body, ":constants").map(parse_typed_list).transpose()?.unwrap_or_default();

    let mut predicates = Vec::new();
    if let Some(preds) = section(body, ":predicates") {
        for p in preds {
            let pl = list(p, "predicate signature")?;
            let pname = atom(pl.first().ok_or_else(|| err("empty predicate signature"))?, "predicate name")?.to_string();
            let params = parse_typed_list(&pl[1..])?;
            predicates.push(PredicateSig { name: pname, params });
        }
    }

    let mut actions = Vec::new();
    for a in all_sections(body, ":action") {
        actions.push(parse_action(a)?);
    }

    Ok(Domain { name, types, constants, predicates, actions })
}

pub fn parse_problem(form: &Sexpr) -> Result<Problem> {
    let top = list(form, "problem form")?;
    if atom(top.first().ok_or_else(|| err("empty problem form"))?, "'define'")? != "define" {
        return Err(err("expected a (define ...) form"));
    }
    let header = list(top.get(1).ok_or_else(|| err("problem form missing header"))?, "(problem NAME)")?;
    if atom(header.first().ok_or_else(|| err("empty problem header"))?, "'problem'")? != "problem" {
        return Err(err("expected a (problem NAME) header"));
    }
    let name = atom(header.get(1).ok_or_else(|| err("problem header missing name"))?, "problem name")?.to_string();

    let body = &top[2..];
    let domain = section(body, ":domain")
        .and_then(|s| s.first())
        .map(|s| atom(s, "domain name"))
        .transpose()?
        .ok_or_else(|| err("problem is missing a :domain section"))?
        .to_string();

    let objects = section(body, ":objects").map(parse_typed_list).transpose()?.unwrap_or_default();

    let mut init = Vec::new();
    if let Some(atoms) = section(body, ":init") {
        for a in atoms {
            let l = list(a, "init atom")?;
            let pred = atom(l.first().ok_or_else(|| err("empty init atom"))?, "predicate")?.to_string();
            init.push((pred, parse_args(&l[1..])?));
        }
    }

    let mut goal = Vec::new();
    if let Some(goal_sexprs) = section(body, ":goal") {
        let g = goal_sexprs.first().ok_or_else(|| err(":goal with no formula"))?;
        collect_positive_goal(g, &mut goal)?;
    }

    Ok(Problem { name, domain, objects, init, goal })
}

/// Goals are required to be a positive conjunction (design note (a): negative goals are
/// rejected here rather than silently stripped later).
fn collect_positive_goal(sexpr: &Sexpr, out: &mut Vec<(String, Vec<String>)>) -> Result<()> {
    let l = list(sexpr, "goal formula")?;
    let head = atom(l.first().ok_or_else(|| err("empty goal formula"))?, "'and'/predicate");
    match head {
        Ok("and") => {
            for sub in &l[1..] {
                collect_positive_goal(sub, out)?;
            }
            Ok(())
        }
        Ok("not") => Err(err("negative goals are not supported")),
        Ok("or") | Ok("forall") | Ok("exists") => Err(err("quantified or disjunctive goals are not supported")),
        _ => {
            let pred = atom(l.first().unwrap(), "predicate")?.to_string();
            out.push((pred, parse_args(&l[1..])?));
            Ok(())
        }
    }
}
