// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core term language and unification
//!
//! A miniKanren-style substitution: terms are unified by extending a
//! binding map, and templates are instantiated by resolving every variable
//! through it. The knowledge base only talks to this module through
//! [`match_statements`], [`instantiate`], structural equality and
//! [`Statement::is_fact_query`].

use std::collections::BTreeMap;
use std::fmt;

/// A logic term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Logic variable, written `?name`
    Var(String),
    /// Symbolic constant
    Atom(String),
    /// Integer constant
    Int(i64),
    /// Compound term: functor(args...)
    Compound(String, Vec<Term>),
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Var(name.trim_start_matches('?').to_string())
    }

    pub fn atom(s: &str) -> Self {
        Term::Atom(s.to_string())
    }

    pub fn compound(name: &str, args: Vec<Term>) -> Self {
        Term::Compound(name.to_string(), args)
    }

    /// Shorthand used by loaders and tests: `?x` is a variable, anything
    /// else an atom.
    pub fn parse_symbol(s: &str) -> Self {
        if s.starts_with('?') {
            Term::var(s)
        } else {
            Term::atom(s)
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Atom(_) | Term::Int(_) => true,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
        }
    }

    fn occurs(&self, name: &str, subst: &Substitution) -> bool {
        match subst.walk(self) {
            Term::Var(other) => other == name,
            Term::Compound(_, args) => args.iter().any(|arg| arg.occurs(name, subst)),
            _ => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "?{}", name),
            Term::Atom(name) => write!(f, "{}", name),
            Term::Int(value) => write!(f, "{}", value),
            Term::Compound(functor, args) => {
                write!(f, "{}(", functor)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A predicate applied to argument terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub predicate: String,
    pub args: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: &str, args: Vec<Term>) -> Self {
        Self {
            predicate: predicate.to_string(),
            args,
        }
    }

    /// Build a statement from shorthand symbols, e.g.
    /// `Statement::parse("isa", &["?x", "cube"])`.
    pub fn parse(predicate: &str, args: &[&str]) -> Self {
        Self::new(
            predicate,
            args.iter().map(|s| Term::parse_symbol(s)).collect(),
        )
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }

    /// Whether this statement can be used to query facts: the predicate
    /// must be a constant symbol.
    pub fn is_fact_query(&self) -> bool {
        !self.predicate.is_empty() && !self.predicate.starts_with('?')
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

/// Substitution: mapping from variable names to terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    bindings: BTreeMap<String, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk a term through the substitution, resolving variables
    pub fn walk(&self, term: &Term) -> Term {
        match term {
            Term::Var(id) => {
                if let Some(bound) = self.bindings.get(id) {
                    self.walk(bound)
                } else {
                    term.clone()
                }
            }
            _ => term.clone(),
        }
    }

    /// Resolve a term completely, including variables nested in compounds
    pub fn resolve(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Compound(functor, args) => {
                Term::Compound(functor, args.iter().map(|arg| self.resolve(arg)).collect())
            }
            other => other,
        }
    }

    /// Unify two terms, extending the substitution if successful
    pub fn unify(&self, t1: &Term, t2: &Term) -> Option<Substitution> {
        let t1 = self.walk(t1);
        let t2 = self.walk(t2);

        match (&t1, &t2) {
            // Same term
            (a, b) if a == b => Some(self.clone()),

            // Variable binding
            (Term::Var(id), _) => self.bind(id, t2),
            (_, Term::Var(id)) => self.bind(id, t1),

            // Compound term unification
            (Term::Compound(f1, args1), Term::Compound(f2, args2)) => {
                if f1 != f2 || args1.len() != args2.len() {
                    return None;
                }
                let mut subst = self.clone();
                for (a1, a2) in args1.iter().zip(args2.iter()) {
                    subst = subst.unify(a1, a2)?;
                }
                Some(subst)
            }

            // No unification possible
            _ => None,
        }
    }

    fn bind(&self, id: &str, term: Term) -> Option<Substitution> {
        if term.occurs(id, self) {
            return None;
        }
        let mut new_subst = self.clone();
        new_subst.bindings.insert(id.to_string(), term);
        Some(new_subst)
    }

    /// Fully resolved value of a variable, if it is bound
    pub fn lookup(&self, name: &str) -> Option<Term> {
        let resolved = self.resolve(&Term::var(name));
        if resolved.is_var() {
            None
        } else {
            Some(resolved)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Variables and their resolved values, ordered by variable name
    pub fn iter(&self) -> impl Iterator<Item = (&str, Term)> + '_ {
        self.bindings
            .iter()
            .map(move |(name, term)| (name.as_str(), self.resolve(term)))
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, term)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{} : {}", name, term)?;
        }
        Ok(())
    }
}

/// Match a pattern statement against a candidate statement.
///
/// Either side may contain variables; the result is the most general
/// substitution making both equal, or `None`.
pub fn match_statements(pattern: &Statement, candidate: &Statement) -> Option<Substitution> {
    if pattern.predicate != candidate.predicate || pattern.args.len() != candidate.args.len() {
        return None;
    }
    let mut subst = Substitution::new();
    for (a, b) in pattern.args.iter().zip(candidate.args.iter()) {
        subst = subst.unify(a, b)?;
    }
    Some(subst)
}

/// Apply a substitution to a statement template
pub fn instantiate(template: &Statement, subst: &Substitution) -> Statement {
    Statement {
        predicate: template.predicate.clone(),
        args: template.args.iter().map(|arg| subst.resolve(arg)).collect(),
    }
}
