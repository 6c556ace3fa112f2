//! Numerical spot checks of reformulations.
//!
//! Rewrites are equivalences by construction, but a wrong oracle registration or a buggy
//! strategy can still break them. The functions here compare the evaluation oracles of two
//! reformulations of a scalar objective at a handful of points.
//!
//! ```
//! use optalg_compute::ctxt::Ctxt;
//! use optalg_compute::expr::Expr;
//! use optalg_compute::oracle::OracleKind;
//! use optalg_compute::reformulate::{check::{agree_at, Agreement}, Reformulation};
//! use optalg_compute::space::Space;
//!
//! let mut ctxt = Ctxt::new();
//! ctxt.register_scalar_oracle("f", OracleKind::Evaluation, |x| x * x);
//! ctxt.register_scalar_oracle("g", OracleKind::Evaluation, f64::cos);
//!
//! let x = Expr::variable("x", Space::Scalar);
//! let f = Expr::call("f", vec![x.clone()], Space::Scalar);
//! let g = Expr::call("g", vec![x], Space::Scalar);
//! let lhs = Reformulation::new(Expr::addition(vec![f.clone(), g.clone()]).unwrap(), &ctxt).unwrap();
//! let rhs = Reformulation::new(Expr::addition(vec![g, f]).unwrap(), &ctxt).unwrap();
//!
//! assert_eq!(agree_at(&lhs, &rhs, &[0.5, 1.0, 2.0], 1e-10), Agreement::Agree);
//! ```

use crate::oracle::OracleKind;
use log::debug;
use rand::Rng;
use std::ops::Range;
use super::Reformulation;

/// The outcome of comparing two reformulations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Agreement {
    /// The evaluation oracles agree at every point checked.
    Agree,

    /// The evaluation oracles differ at a point.
    Disagree {
        /// The point.
        at: f64,

        /// The value of the left-hand side.
        lhs: f64,

        /// The value of the right-hand side.
        rhs: f64,
    },

    /// One of the reformulations has no evaluation oracle, or it could not be called with a
    /// single real argument.
    Unavailable,
}

/// Returns true if `a` and `b` are equal within `tol`, relative to their magnitude when it is
/// larger than one.
fn close(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        // both sides leaving the domain counts as agreement
        return a.is_nan() && b.is_nan();
    }
    (a - b).abs() <= tol * 1f64.max(a.abs()).max(b.abs())
}

/// Compares the evaluation oracles of two reformulations at the given points.
pub fn agree_at(
    lhs: &Reformulation,
    rhs: &Reformulation,
    points: &[f64],
    tol: f64,
) -> Agreement {
    let (Some(f), Some(g)) = (
        lhs.oracle(OracleKind::Evaluation),
        rhs.oracle(OracleKind::Evaluation),
    ) else {
        return Agreement::Unavailable;
    };

    for &x in points {
        let (Ok(a), Ok(b)) = (f.call_scalar(x), g.call_scalar(x)) else {
            return Agreement::Unavailable;
        };
        if !close(a, b, tol) {
            debug!("`{}` and `{}` differ at {}: {} != {}", lhs.expr, rhs.expr, x, a, b);
            return Agreement::Disagree { at: x, lhs: a, rhs: b };
        }
    }

    Agreement::Agree
}

/// Compares the evaluation oracles of two reformulations at `count` points drawn uniformly from
/// `range`.
pub fn agree_at_random(
    lhs: &Reformulation,
    rhs: &Reformulation,
    rng: &mut impl Rng,
    count: usize,
    range: Range<f64>,
    tol: f64,
) -> Agreement {
    let points = (0..count)
        .map(|_| rng.gen_range(range.clone()))
        .collect::<Vec<_>>();
    agree_at(lhs, rhs, &points, tol)
}
