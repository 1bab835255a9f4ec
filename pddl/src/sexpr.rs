use ppl_task::{PlanError, Result};

/// A parsed s-expression: either a bare token or a parenthesized list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sexpr {
    Atom(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Atom(s) => Some(s.as_str()),
            Sexpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            Sexpr::Atom(_) => None,
        }
    }
}

/// Tokenizes PDDL source: `(`, `)`, and whitespace/comment-delimited atoms. `;` starts a
/// line comment, matching the PDDL convention.
fn tokenize(src: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parses every top-level form in `src` (a domain or problem file has exactly one).
pub fn parse_all(src: &str) -> Result<Vec<Sexpr>> {
    let tokens = tokenize(src);
    let mut pos = 0;
    let mut forms = Vec::new();
    while pos < tokens.len() {
        let (expr, next) = parse_one(&tokens, pos)?;
        forms.push(expr);
        pos = next;
    }
    Ok(forms)
}

fn parse_one(tokens: &[String], pos: usize) -> Result<(Sexpr, usize)> {
    match tokens.get(pos) {
        None => Err(PlanError::UnsupportedFeature("unexpected end of input".into())),
        Some(t) if t == "(" => {
            let mut items = Vec::new();
            let mut pos = pos + 1;
            loop {
                match tokens.get(pos) {
                    None => {
                        return Err(PlanError::UnsupportedFeature(
                            "unterminated list in PDDL source".into(),
                        ))
                    }
                    Some(t) if t == ")" => return Ok((Sexpr::List(items), pos + 1)),
                    _ => {
                        let (expr, next) = parse_one(tokens, pos)?;
                        items.push(expr);
                        pos = next;
                    }
                }
            }
        }
        Some(t) if t == ")" => Err(PlanError::UnsupportedFeature("unexpected ')'".into())),
        Some(t) => Ok((Sexpr::Atom(t.clone()), pos + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_and_nests() {
        let forms = parse_all("(define (domain d) (:types a b))").unwrap();
        assert_eq!(forms.len(), 1);
        let list = forms[0].as_list().unwrap();
        assert_eq!(list[0].as_atom(), Some("define"));
    }

    #[test]
    fn strips_line_comments() {
        let forms = parse_all("(a ; a comment\n b)").unwrap();
        let list = forms[0].as_list().unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn rejects_unterminated_list() {
        assert!(parse_all("(a (b)").is_err());
    }
}
