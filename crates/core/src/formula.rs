//! The formula AST the encoder emits into, and the oracle-facing surface
//! over it: a deterministic symbol-naming scheme and an s-expression
//! renderer usable for the `--debug` constraint bag dump.
//!
//! This is not a full SMT-LIB2 front end — there is no `declare-fun`
//! preamble, no sort checking, no solver binding. Those belong to whatever
//! adapter implements [`crate::oracle::Oracle`]; this crate only needs a
//! faithful in-memory representation of the formula and a human-readable
//! rendering of it, per §6 and §9 of `SPEC_FULL.md`.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::history::{Key, SessionId, TransactionId};

/// One argument to a relation or integer function application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Tx(TransactionId),
    Session(SessionId),
    /// A read event, identified by its owning transaction and
    /// session-relative `seq` — the domain of `choice`.
    Read(TransactionId, u32),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tx(t) => write!(f, "{t}"),
            Self::Session(s) => write!(f, "{s}"),
            Self::Read(t, seq) => write!(f, "read[{t}/{seq}]"),
        }
    }
}

/// Every uninterpreted relation and function the Symbolic Context declares
/// (§3). Each mints a deterministic, collision-free name (§9) so a debug
/// dump and a real model read-back agree on identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    So,
    Wr,
    WrK(Key),
    Hb,
    Ar,
    ArK(Key),
    Ww,
    WwK(Key),
    Rw,
    RwK(Key),
    Reachable,
    Rank,
    /// A per-level commit-order integer function, e.g. `Causal`,
    /// `ReadCommitted`, or the unserializability encoder's own `Serial`.
    CommitOrder(String),
    Boundary,
    Choice,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::So => write!(f, "Session-Order"),
            Self::Wr => write!(f, "Write-Read"),
            Self::WrK(k) => write!(f, "Write-Read-{k}"),
            Self::Hb => write!(f, "Happens-Before"),
            Self::Ar => write!(f, "Causal-Arbitration"),
            Self::ArK(k) => write!(f, "Causal-Arbitration-{k}"),
            Self::Ww => write!(f, "Serial-Arbitration"),
            Self::WwK(k) => write!(f, "Serial-Arbitration-{k}"),
            Self::Rw => write!(f, "Serial-Antidependency"),
            Self::RwK(k) => write!(f, "Serial-Antidependency-{k}"),
            Self::Reachable => write!(f, "Reachable"),
            Self::Rank => write!(f, "Rank"),
            Self::CommitOrder(level) => write!(f, "{level}-CommitOrder"),
            Self::Boundary => write!(f, "Boundary"),
            Self::Choice => write!(f, "Choice"),
        }
    }
}

/// An integer-sorted term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntExpr {
    /// Application of an integer function, e.g. `co_W(t)`, `rank(t1, t2)`,
    /// `boundary(s)`, `choice(t, seq)`.
    Fun(Symbol, Vec<Term>),
    Const(i64),
}

impl fmt::Display for IntExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fun(sym, args) => {
                write!(f, "({sym}")?;
                for a in args {
                    write!(f, " {a}")?;
                }
                write!(f, ")")
            }
            Self::Const(n) => write!(f, "{n}"),
        }
    }
}

/// A Boolean-sorted formula over uninterpreted relations and integer
/// comparisons. Built bottom-up by C3–C6 and handed whole to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    Bool(bool),
    /// Application of a Boolean relation, e.g. `so(t1, t2)`, `wrₖ(t1, t2)`.
    Rel(Symbol, Term, Term),
    IntEq(IntExpr, IntExpr),
    IntLt(IntExpr, IntExpr),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    /// A defining equation: `lhs` holds iff `rhs` holds. Used throughout
    /// C3/C6 to pin an uninterpreted relation to its candidate disjunction.
    Iff(Box<Formula>, Box<Formula>),
    /// `Distinct` over a set of integer-function values, e.g. a commit
    /// order's values over all parsed transactions.
    Distinct(Vec<IntExpr>),
}

impl Formula {
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    #[must_use]
    pub fn implies(self, then: Self) -> Self {
        Self::Implies(Box::new(self), Box::new(then))
    }

    #[must_use]
    pub fn iff(self, other: Self) -> Self {
        Self::Iff(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn and(terms: Vec<Self>) -> Self {
        Self::And(terms)
    }

    #[must_use]
    pub fn or(terms: Vec<Self>) -> Self {
        Self::Or(terms)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Rel(sym, a, b) => write!(f, "({sym} {a} {b})"),
            Self::IntEq(a, b) => write!(f, "(= {a} {b})"),
            Self::IntLt(a, b) => write!(f, "(< {a} {b})"),
            Self::Not(inner) => write!(f, "(not {inner})"),
            Self::And(terms) => write_sexp(f, "and", terms),
            Self::Or(terms) => write_sexp(f, "or", terms),
            Self::Implies(a, b) => write!(f, "(=> {a} {b})"),
            Self::Iff(a, b) => write!(f, "(= {a} {b})"),
            Self::Distinct(terms) => {
                write!(f, "(distinct")?;
                for t in terms {
                    write!(f, " {t}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_sexp(f: &mut fmt::Formatter<'_>, head: &str, terms: &[Formula]) -> fmt::Result {
    write!(f, "({head}")?;
    for t in terms {
        write!(f, " {t}")?;
    }
    write!(f, ")")
}

/// The accumulated conjuncts of one analysis invocation. Owned by an
/// [`crate::encoder::Encoder`] session; handed whole to the oracle as a
/// single [`Formula::And`].
#[derive(Debug, Default)]
pub struct ConstraintBag {
    conjuncts: Vec<Formula>,
}

impl ConstraintBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assert(&mut self, formula: Formula) {
        self.conjuncts.push(formula);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conjuncts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }

    #[must_use]
    pub fn conjuncts(&self) -> &[Formula] {
        &self.conjuncts
    }

    /// The whole bag as one formula.
    #[must_use]
    pub fn into_formula(self) -> Formula {
        Formula::And(self.conjuncts)
    }

    /// A multi-line s-expression dump, one conjunct per line, for
    /// `--debug`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, c) in self.conjuncts.iter().enumerate() {
            out.push_str(&format!("; assertion {i}\n{c}\n"));
        }
        out
    }
}
