//! SMT-LIB2 assertion scripts over boolean constants and their output.
//!
//! Atom `n` is declared as the constant `a{n}`; every clause becomes one
//! assertion.

use thiserror::Error;

use crate::cnf::{AtomId, Clause, CnfFormula, Literal};
use crate::solver::{Model, SatResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmtLibError {
    #[error("solver output has no status line")]
    MissingStatus,
    #[error("solver error: {0}")]
    SolverError(String),
    #[error("unexpected solver status '{0}'")]
    UnexpectedStatus(String),
    #[error("malformed model: {0}")]
    Malformed(String),
}

pub fn atom_name(atom: AtomId) -> String {
    format!("a{atom}")
}

/// Print a literal as SMT-LIB2.
pub fn literal_to_smtlib(lit: Literal) -> String {
    if lit.is_positive() {
        atom_name(lit.atom())
    } else {
        format!("(not {})", atom_name(lit.atom()))
    }
}

/// Print a clause as SMT-LIB2.
pub fn clause_to_smtlib(clause: &Clause) -> String {
    match clause.literals() {
        [] => "false".to_string(),
        [single] => literal_to_smtlib(*single),
        lits => {
            let inner: Vec<String> = lits.iter().map(|l| literal_to_smtlib(*l)).collect();
            format!("(or {})", inner.join(" "))
        }
    }
}

/// Complete script: declarations, one assertion per clause, `check-sat`
/// and `get-model`.
pub fn to_smtlib_script(formula: &CnfFormula) -> String {
    let mut script = String::new();
    script.push_str("(set-option :produce-models true)\n");
    script.push_str("(set-logic QF_UF)\n");
    for atom in 1..=formula.num_atoms() {
        script.push_str(&format!("(declare-const {} Bool)\n", atom_name(atom)));
    }
    for clause in formula.clauses() {
        script.push_str(&format!("(assert {})\n", clause_to_smtlib(clause)));
    }
    script.push_str("(check-sat)\n(get-model)\n(exit)\n");
    script
}

#[derive(Debug, Clone, PartialEq)]
enum SExpr {
    Symbol(String),
    List(Vec<SExpr>),
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            '"' => {
                current.push(c);
                for q in chars.by_ref() {
                    current.push(q);
                    if q == '"' {
                        break;
                    }
                }
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

fn parse_sexprs(tokens: &[String]) -> Result<Vec<SExpr>, SmtLibError> {
    let mut stack: Vec<Vec<SExpr>> = vec![Vec::new()];
    for token in tokens {
        match token.as_str() {
            "(" => stack.push(Vec::new()),
            ")" => {
                let list = stack
                    .pop()
                    .filter(|_| !stack.is_empty())
                    .ok_or_else(|| SmtLibError::Malformed("unbalanced ')'".into()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push(SExpr::List(list));
                }
            }
            sym => {
                if let Some(top) = stack.last_mut() {
                    top.push(SExpr::Symbol(sym.to_string()));
                }
            }
        }
    }
    match (stack.pop(), stack.is_empty()) {
        (Some(top), true) => Ok(top),
        _ => Err(SmtLibError::Malformed("unbalanced '('".into())),
    }
}

fn collect_definitions(expr: &SExpr, model: &mut Model) -> Result<(), SmtLibError> {
    let SExpr::List(items) = expr else {
        return Ok(());
    };
    if let [SExpr::Symbol(head), SExpr::Symbol(name), SExpr::List(params), _sort, SExpr::Symbol(value)] =
        items.as_slice()
    {
        if head == "define-fun" && params.is_empty() {
            let Some(atom) = name.strip_prefix('a').and_then(|n| n.parse::<AtomId>().ok()) else {
                return Ok(());
            };
            let value = match value.as_str() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(SmtLibError::Malformed(format!(
                        "non-boolean value '{other}' for {name}"
                    )))
                }
            };
            model.set(atom, value);
            return Ok(());
        }
    }
    for item in items {
        collect_definitions(item, model)?;
    }
    Ok(())
}

/// Parse the response to [`to_smtlib_script`]: a status line followed, when
/// satisfiable, by a model that may span several lines.
pub fn parse_smtlib_output(output: &str) -> Result<(SatResult, Option<Model>), SmtLibError> {
    let mut lines = output.lines().map(str::trim).skip_while(|l| l.is_empty());
    let first = lines.next().ok_or(SmtLibError::MissingStatus)?;
    let result = match first {
        "sat" => SatResult::Sat,
        "unsat" => return Ok((SatResult::Unsat, None)),
        "timeout" => return Ok((SatResult::Timeout, None)),
        "unknown" => return Ok((SatResult::Unknown("solver returned unknown".into()), None)),
        other if other.starts_with("(error") => {
            return Err(SmtLibError::SolverError(other.to_string()))
        }
        other => return Err(SmtLibError::UnexpectedStatus(other.to_string())),
    };

    let rest: Vec<&str> = lines.collect();
    let exprs = parse_sexprs(&tokenize(&rest.join("\n")))?;
    let mut model = Model::new();
    for expr in &exprs {
        collect_definitions(expr, &mut model)?;
    }
    Ok((result, Some(model)))
}
