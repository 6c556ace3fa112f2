//! Property inference, oracle composition and reformulation of symbolic optimization objectives.
//!
//! An objective is an [`Expr`](expr::Expr) built from opaque leaf functions, combined with sums,
//! differences, compositions and pointwise maxima / minima. The facts and oracles of the leaf
//! functions are registered in a [`Ctxt`](ctxt::Ctxt), from which the engine can:
//!
//! - infer the [properties](property) of a whole expression, such as convexity or smoothness
//!   constants,
//! - build [oracles](oracle) (evaluation, derivative, proximal) for a whole expression,
//! - [reformulate](reformulate) the expression into equivalent forms, each annotated with its own
//!   properties and oracles.
//!
//! # Features
//!
//! - `serde`: Derives `Serialize` for expressions, and `Serialize` / `Deserialize` for the other
//! plain data types provided by this crate.

pub mod ctxt;
pub mod expr;
pub mod funcs;
pub mod interval;
pub mod oracle;
pub mod property;
pub mod reformulate;
pub mod space;
pub mod step_collector;
