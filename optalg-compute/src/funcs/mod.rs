//! Special functions registered in every default [`Ctxt`](crate::ctxt::Ctxt).
//!
//! Each function is implemented as a unit `struct` implementing [`SpecialFunction`], which
//! provides the facts and oracles the context registers for it. The monotone-transform
//! reformulation strategy relies on these functions being present.
//!
//! # Example
//!
//! ```
//! use optalg_compute::ctxt::Ctxt;
//! use optalg_compute::funcs::{self, SpecialFunction};
//! use optalg_compute::oracle::OracleKind;
//!
//! assert_eq!(funcs::Log1p.eval(0.0), 0.0);
//!
//! let ctxt = Ctxt::default();
//! let oracle = ctxt.oracle_of(funcs::SQRT, OracleKind::Evaluation).unwrap();
//! assert_eq!(oracle.call_scalar(4.0).unwrap(), 2.0);
//! ```

use crate::property::Property;

/// The name of the square root function.
pub const SQRT: &str = "sqrt";

/// The name of the `log(1 + x)` function.
pub const LOG1P: &str = "log1p";

/// A function of one real variable with known facts and closed-form oracles.
pub trait SpecialFunction: std::fmt::Debug + Send + Sync {
    /// Returns the name of the function.
    fn name(&self) -> &'static str;

    /// The facts registered for the function.
    fn properties(&self) -> Vec<Property>;

    /// Evaluates the function.
    fn eval(&self, x: f64) -> f64;

    /// Evaluates the derivative of the function.
    fn derivative(&self, x: f64) -> f64;
}

/// `sqrt(x)`, increasing and concave on its domain.
#[derive(Debug, Clone, Copy)]
pub struct Sqrt;

impl SpecialFunction for Sqrt {
    fn name(&self) -> &'static str {
        SQRT
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::MonotonicallyIncreasing]
    }

    fn eval(&self, x: f64) -> f64 {
        x.sqrt()
    }

    fn derivative(&self, x: f64) -> f64 {
        0.5 / x.sqrt()
    }
}

/// `log(1 + x)`, increasing and concave on its domain.
#[derive(Debug, Clone, Copy)]
pub struct Log1p;

impl SpecialFunction for Log1p {
    fn name(&self) -> &'static str {
        LOG1P
    }

    fn properties(&self) -> Vec<Property> {
        vec![Property::MonotonicallyIncreasing]
    }

    fn eval(&self, x: f64) -> f64 {
        x.ln_1p()
    }

    fn derivative(&self, x: f64) -> f64 {
        1.0 / (1.0 + x)
    }
}

/// Returns a list of all special functions.
pub fn all() -> Vec<Box<dyn SpecialFunction>> {
    macro_rules! build {
        ($($upname:ident),* $(,)?) => {
            vec![$(Box::new($upname) as Box<dyn SpecialFunction>),*]
        };
    }

    build![Sqrt, Log1p]
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use super::*;

    #[test]
    fn names_are_unique() {
        let names = all().iter().map(|f| f.name()).collect::<Vec<_>>();
        assert_eq!(names, vec![SQRT, LOG1P]);
    }

    #[test]
    fn derivatives() {
        assert_float_absolute_eq!(Sqrt.derivative(4.0), 0.25);
        assert_float_absolute_eq!(Log1p.derivative(1.0), 0.5);
        assert_float_absolute_eq!(Log1p.eval(std::f64::consts::E - 1.0), 1.0);
    }
}
