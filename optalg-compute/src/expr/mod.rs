//! A representation of symbolic objectives built from named functions.
//!
//! An [`Expr`] is an immutable tree. Every node carries the [`Space`] its value lives in, and
//! the constructors check that operands agree on that space, so a malformed expression can never
//! be built: [`Expr::addition`] and friends return an [`Error`] with a [`SpaceMismatch`] kind
//! instead.
//!
//! ```
//! use optalg_compute::expr::Expr;
//! use optalg_compute::space::Space;
//!
//! let x = Expr::variable("x", Space::Scalar);
//! let f = Expr::call("f", vec![x.clone()], Space::Scalar);
//! let g = Expr::call("g", vec![x], Space::Scalar);
//!
//! let sum = Expr::addition(vec![f, g]).unwrap();
//! assert_eq!(sum.to_string(), "f(x) + g(x)");
//! ```
//!
//! # Structural equality
//!
//! The [`PartialEq`], [`Eq`] and [`Hash`] implementations for [`Expr`] are **structural**: two
//! expressions are equal if they have the same variant, the same space and pairwise-equal
//! children, **in the same order**. In particular, `f(x) + g(x)` and `g(x) + f(x)` are different
//! expressions, and the reformulation engine treats them as two distinct reformulations.
//!
//! # Transformations
//!
//! Nodes are never mutated after construction. Rewriting is done by building new trees, usually
//! with [`Expr::replace_at`], which addresses a node by its [position](Expr::positions): the
//! sequence of child indices leading to it from the root.

mod error;
mod iter;

pub use error::{EmptyOperation, SpaceMismatch};
pub use iter::ExprIter;

use crate::space::Space;
use optalg_error::Error;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write,
    hash::{Hash, Hasher},
    ops::Range,
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// A real number stored in an expression.
///
/// [`Hash`] and [`Eq`] are implemented manually by comparing bit patterns. This module **must
/// never** store `NaN` in a [`Real`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct Real(pub f64);

impl Real {
    fn bits(&self) -> u64 {
        // `-0.0` and `0.0` must compare equal
        if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl std::fmt::Display for Real {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operator at the root of an expression, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Op {
    Literal,
    Variable,
    Call,
    Addition,
    Subtraction,
    Composition,
    Maximum,
    Minimum,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Literal => "literal",
            Self::Variable => "variable",
            Self::Call => "function call",
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Composition => "composition",
            Self::Maximum => "maximum",
            Self::Minimum => "minimum",
        };
        write!(f, "{}", name)
    }
}

/// An operator that accepts any positive number of operands sharing one space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaryOp {
    Addition,
    Subtraction,
    Maximum,
    Minimum,
}

impl From<NaryOp> for Op {
    fn from(op: NaryOp) -> Self {
        match op {
            NaryOp::Addition => Op::Addition,
            NaryOp::Subtraction => Op::Subtraction,
            NaryOp::Maximum => Op::Maximum,
            NaryOp::Minimum => Op::Minimum,
        }
    }
}

/// The function being called in a [`ExprKind::Call`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Callee {
    /// A leaf function, known by name to the registries.
    Named(String),

    /// A function built from other functions, such as `(f ∘ g)`.
    Expr(Box<Expr>),
}

/// The variants of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ExprKind {
    /// A constant, such as `2.5`.
    Literal(Real),

    /// A variable, such as `x`.
    Variable(String),

    /// A function call, such as `f(x)`, `f` (a call with no arguments, used as a bare function in
    /// compositions), or `(f ∘ g)(x)`.
    Call(Callee, Vec<Expr>),

    /// Terms added together.
    Addition(Vec<Expr>),

    /// The first term, minus every other term.
    Subtraction(Vec<Expr>),

    /// The outer function applied to the result of the inner one.
    Composition(Box<Expr>, Box<Expr>),

    /// The pointwise maximum of the terms.
    Maximum(Vec<Expr>),

    /// The pointwise minimum of the terms.
    Minimum(Vec<Expr>),
}

/// An immutable expression tree whose nodes all know the space they live in.
///
/// For more information about this type, see the [module-level documentation](self).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Expr {
    kind: ExprKind,
    space: Space,
}

/// Returns true if `child` must be wrapped in parentheses when rendered as an operand of `parent`.
fn needs_parens(parent: Op, child: &Expr) -> bool {
    match parent {
        Op::Addition | Op::Subtraction => {
            matches!(child.op(), Op::Addition | Op::Subtraction)
        },
        Op::Composition => {
            matches!(child.op(), Op::Addition | Op::Subtraction | Op::Composition)
        },
        _ => false,
    }
}

/// Renders the operands of the given operator, returning the rendered text along with the span
/// each operand occupies in it.
///
/// For [`Op::Call`], only the parenthesized argument list is rendered.
pub(crate) fn render_operands<'a>(
    op: Op,
    operands: impl IntoIterator<Item = &'a Expr>,
) -> (String, Vec<Range<usize>>) {
    let (open, sep, close) = match op {
        Op::Addition => ("", " + ", ""),
        Op::Subtraction => ("", " - ", ""),
        Op::Composition => ("", " ∘ ", ""),
        Op::Maximum => ("max(", ", ", ")"),
        Op::Minimum => ("min(", ", ", ")"),
        Op::Call | Op::Literal | Op::Variable => ("(", ", ", ")"),
    };

    let mut out = String::from(open);
    let mut spans = Vec::new();
    for (i, operand) in operands.into_iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        let start = out.len();
        // writing into a `String` cannot fail
        let _ = if needs_parens(op, operand) {
            write!(out, "({})", operand)
        } else {
            write!(out, "{}", operand)
        };
        spans.push(start..out.len());
    }
    out.push_str(close);
    (out, spans)
}

/// The span covering every span in the given range of operand spans.
pub(crate) fn covering_span(spans: &[Range<usize>]) -> Range<usize> {
    match (spans.first(), spans.last()) {
        (Some(first), Some(last)) => first.start..last.end,
        _ => 0..0,
    }
}

/// Checks that the operands of an n-ary operator are non-empty and all live in `space`.
fn check_operands(op: Op, terms: &[Expr], space: &Space) -> Result<(), Error> {
    if terms.is_empty() {
        let (source, _) = render_operands(op, []);
        let span = 0..source.len();
        return Err(Error::new(source, vec![span], EmptyOperation { op }));
    }

    if let Some(idx) = terms.iter().position(|term| term.space() != space) {
        let (source, spans) = render_operands(op, terms);
        return Err(Error::new(
            source,
            vec![spans[idx].clone()],
            SpaceMismatch {
                op,
                expected: space.clone(),
                found: terms[idx].space().clone(),
            },
        ));
    }

    Ok(())
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Literal(value) => write!(f, "{}", value),
            ExprKind::Variable(name) => write!(f, "{}", name),
            ExprKind::Call(callee, args) => {
                match callee {
                    Callee::Named(name) => {
                        write!(f, "{}", name)?;
                        if args.is_empty() {
                            return Ok(());
                        }
                    },
                    Callee::Expr(callee) => write!(f, "({})", callee)?,
                }
                write!(f, "{}", render_operands(Op::Call, args).0)
            },
            ExprKind::Addition(terms) => write!(f, "{}", render_operands(Op::Addition, terms).0),
            ExprKind::Subtraction(terms) => {
                write!(f, "{}", render_operands(Op::Subtraction, terms).0)
            },
            ExprKind::Composition(outer, inner) => {
                let operands = [&**outer, &**inner];
                write!(f, "{}", render_operands(Op::Composition, operands).0)
            },
            ExprKind::Maximum(terms) => write!(f, "{}", render_operands(Op::Maximum, terms).0),
            ExprKind::Minimum(terms) => write!(f, "{}", render_operands(Op::Minimum, terms).0),
        }
    }
}

impl Expr {
    /// A scalar constant.
    pub fn literal(value: f64) -> Self {
        Self::literal_in(value, Space::Scalar)
    }

    /// A constant living in the given space.
    pub fn literal_in(value: f64, space: Space) -> Self {
        debug_assert!(!value.is_nan(), "literals must not be NaN");
        Self { kind: ExprKind::Literal(Real(value)), space }
    }

    /// A variable living in the given space.
    pub fn variable(name: impl Into<String>, space: Space) -> Self {
        Self { kind: ExprKind::Variable(name.into()), space }
    }

    /// A call to the named leaf function, producing a value in the given space.
    ///
    /// With no arguments, the call stands for the function itself, e.g. as an operand of a
    /// [composition](Self::composition).
    pub fn call(name: impl Into<String>, args: Vec<Expr>, space: Space) -> Self {
        Self { kind: ExprKind::Call(Callee::Named(name.into()), args), space }
    }

    /// The named leaf function itself, i.e. a call with no arguments.
    pub fn function(name: impl Into<String>, space: Space) -> Self {
        Self::call(name, Vec::new(), space)
    }

    /// A call through a function built from other functions, such as `(f ∘ g)(x)`.
    ///
    /// Returns an error if the declared space differs from the space `callee` produces.
    pub fn call_through(callee: Expr, args: Vec<Expr>, space: Space) -> Result<Self, Error> {
        if callee.space != space {
            let rendered = format!("({})", callee);
            let span = 1..rendered.len() - 1;
            let (args_rendered, _) = render_operands(Op::Call, &args);
            return Err(Error::new(
                rendered + &args_rendered,
                vec![span],
                SpaceMismatch { op: Op::Call, expected: space, found: callee.space },
            ));
        }

        Ok(Self { kind: ExprKind::Call(Callee::Expr(Box::new(callee)), args), space })
    }

    /// Builds an n-ary operator whose operands must all live in the declared space.
    pub fn nary(op: NaryOp, terms: Vec<Expr>, space: Space) -> Result<Self, Error> {
        check_operands(op.into(), &terms, &space)?;
        let kind = match op {
            NaryOp::Addition => ExprKind::Addition(terms),
            NaryOp::Subtraction => ExprKind::Subtraction(terms),
            NaryOp::Maximum => ExprKind::Maximum(terms),
            NaryOp::Minimum => ExprKind::Minimum(terms),
        };
        Ok(Self { kind, space })
    }

    /// Builds an n-ary operator living in the space of its first operand.
    fn nary_like_first(op: NaryOp, terms: Vec<Expr>) -> Result<Self, Error> {
        let space = terms.first().map(|term| term.space.clone()).unwrap_or_default();
        Self::nary(op, terms, space)
    }

    /// `t1 + t2 + ... + tn`, in the space of `t1`.
    pub fn addition(terms: Vec<Expr>) -> Result<Self, Error> {
        Self::nary_like_first(NaryOp::Addition, terms)
    }

    /// `t1 - t2 - ... - tn`, in the space of `t1`.
    pub fn subtraction(terms: Vec<Expr>) -> Result<Self, Error> {
        Self::nary_like_first(NaryOp::Subtraction, terms)
    }

    /// `max(t1, ..., tn)`, in the space of `t1`.
    pub fn maximum(terms: Vec<Expr>) -> Result<Self, Error> {
        Self::nary_like_first(NaryOp::Maximum, terms)
    }

    /// `min(t1, ..., tn)`, in the space of `t1`.
    pub fn minimum(terms: Vec<Expr>) -> Result<Self, Error> {
        Self::nary_like_first(NaryOp::Minimum, terms)
    }

    /// `outer ∘ inner`, in the space `outer` produces.
    pub fn composition(outer: Expr, inner: Expr) -> Self {
        let space = outer.space.clone();
        Self { kind: ExprKind::Composition(Box::new(outer), Box::new(inner)), space }
    }

    /// `outer ∘ inner`, declared to live in `space`.
    ///
    /// Returns an error if `outer` does not produce a value in `space`.
    pub fn composition_in(outer: Expr, inner: Expr, space: Space) -> Result<Self, Error> {
        if outer.space != space {
            let (source, spans) = render_operands(Op::Composition, [&outer, &inner]);
            return Err(Error::new(
                source,
                vec![spans[0].clone()],
                SpaceMismatch { op: Op::Composition, expected: space, found: outer.space },
            ));
        }

        Ok(Self::composition(outer, inner))
    }

    /// The variant of this node and its operands.
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// The space this expression's value lives in.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The operator at the root of this expression.
    pub fn op(&self) -> Op {
        match self.kind {
            ExprKind::Literal(_) => Op::Literal,
            ExprKind::Variable(_) => Op::Variable,
            ExprKind::Call(..) => Op::Call,
            ExprKind::Addition(_) => Op::Addition,
            ExprKind::Subtraction(_) => Op::Subtraction,
            ExprKind::Composition(..) => Op::Composition,
            ExprKind::Maximum(_) => Op::Maximum,
            ExprKind::Minimum(_) => Op::Minimum,
        }
    }

    /// If the root is an n-ary operator, returns it.
    pub fn nary_op(&self) -> Option<NaryOp> {
        match self.kind {
            ExprKind::Addition(_) => Some(NaryOp::Addition),
            ExprKind::Subtraction(_) => Some(NaryOp::Subtraction),
            ExprKind::Maximum(_) => Some(NaryOp::Maximum),
            ExprKind::Minimum(_) => Some(NaryOp::Minimum),
            _ => None,
        }
    }

    /// If the root is an n-ary operator, returns its operands.
    pub fn terms(&self) -> Option<&[Expr]> {
        match &self.kind {
            ExprKind::Addition(terms)
            | ExprKind::Subtraction(terms)
            | ExprKind::Maximum(terms)
            | ExprKind::Minimum(terms) => Some(terms),
            _ => None,
        }
    }

    /// If the root is a call to a named leaf function, returns the name.
    pub fn function_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call(Callee::Named(name), _) => Some(name),
            _ => None,
        }
    }

    /// Returns true if the expression is a variable or a literal.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_) | ExprKind::Variable(_))
    }

    /// Returns true if the expression is atomic: a variable, a literal, or a call to a named
    /// function whose arguments are all atomic.
    pub fn is_atomic(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => true,
            ExprKind::Call(Callee::Named(_), args) => args.iter().all(Self::is_atomic),
            _ => false,
        }
    }

    /// The direct children of this node, from left to right.
    ///
    /// The callee of a call through a built function is its first child, followed by the
    /// arguments.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => Vec::new(),
            ExprKind::Call(Callee::Named(_), args) => args.iter().collect(),
            ExprKind::Call(Callee::Expr(callee), args) => {
                std::iter::once(&**callee).chain(args.iter()).collect()
            },
            ExprKind::Addition(terms)
            | ExprKind::Subtraction(terms)
            | ExprKind::Maximum(terms)
            | ExprKind::Minimum(terms) => terms.iter().collect(),
            ExprKind::Composition(outer, inner) => vec![outer, inner],
        }
    }

    /// Rebuilds this node with new children, keeping its variant and space.
    ///
    /// The children must have the same arity and spaces as [`Expr::children`] returns; this is
    /// not checked again.
    pub(crate) fn with_children(&self, children: Vec<Expr>) -> Self {
        let space = self.space.clone();
        let kind = match &self.kind {
            ExprKind::Literal(_) | ExprKind::Variable(_) => return self.clone(),
            ExprKind::Call(Callee::Named(name), _) => {
                ExprKind::Call(Callee::Named(name.clone()), children)
            },
            ExprKind::Call(Callee::Expr(_), _) => {
                let mut iter = children.into_iter();
                let Some(callee) = iter.next() else {
                    return self.clone();
                };
                ExprKind::Call(Callee::Expr(Box::new(callee)), iter.collect())
            },
            ExprKind::Addition(_) => ExprKind::Addition(children),
            ExprKind::Subtraction(_) => ExprKind::Subtraction(children),
            ExprKind::Maximum(_) => ExprKind::Maximum(children),
            ExprKind::Minimum(_) => ExprKind::Minimum(children),
            ExprKind::Composition(..) => {
                let mut iter = children.into_iter();
                let (Some(outer), Some(inner)) = (iter.next(), iter.next()) else {
                    return self.clone();
                };
                ExprKind::Composition(Box::new(outer), Box::new(inner))
            },
        };
        Self { kind, space }
    }

    /// Returns an iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }

    /// The positions of every node in the tree, in pre-order. The root is at the empty position.
    pub fn positions(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        let mut stack = vec![(self, Vec::new())];
        while let Some((expr, path)) = stack.pop() {
            let children = expr.children();
            for (i, child) in children.into_iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push((child, child_path));
            }
            out.push(path);
        }
        out
    }

    /// Returns the node at the given position, if there is one.
    pub fn get(&self, path: &[usize]) -> Option<&Expr> {
        let mut current = self;
        for &idx in path {
            current = current.children().get(idx).copied()?;
        }
        Some(current)
    }

    /// Returns a new tree where the node at the given position is replaced.
    ///
    /// The replacement must live in the same space as the node it replaces, otherwise an error is
    /// returned. A position that does not address a node leaves the tree unchanged.
    pub fn replace_at(&self, path: &[usize], replacement: Expr) -> Result<Self, Error> {
        let Some((&idx, rest)) = path.split_first() else {
            if replacement.space != self.space {
                let source = self.to_string();
                let span = 0..source.len();
                return Err(Error::new(
                    source,
                    vec![span],
                    SpaceMismatch {
                        op: self.op(),
                        expected: self.space.clone(),
                        found: replacement.space,
                    },
                ));
            }
            return Ok(replacement);
        };

        let children = self.children();
        let Some(child) = children.get(idx) else {
            return Ok(self.clone());
        };
        let new_child = child.replace_at(rest, replacement)?;

        let mut owned = children.into_iter().cloned().collect::<Vec<_>>();
        owned[idx] = new_child;
        Ok(self.with_children(owned))
    }

    /// The distinct variables appearing in the expression, sorted by name.
    pub fn free_variables(&self) -> Vec<Expr> {
        let mut vars = BTreeMap::new();
        for node in self.post_order_iter() {
            if let ExprKind::Variable(name) = &node.kind {
                vars.entry(name.clone()).or_insert_with(|| node.space.clone());
            }
        }
        vars.into_iter()
            .map(|(name, space)| Self::variable(name, space))
            .collect()
    }

    /// The distinct named leaf functions called in the expression, sorted by name.
    pub fn leaf_functions(&self) -> Vec<String> {
        self.post_order_iter()
            .filter_map(|node| node.function_name().map(str::to_owned))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
