use crate::{
    expr::{Expr, Op},
    funcs,
    oracle::{self, CallError, Oracle, OracleKind, OracleMetadata, Value},
    property::{self, Property, PropertySet},
    reformulate::{self, error::StrategyNotFound, Reformulation, Strategy},
};
use indexmap::IndexMap;
use levenshtein::levenshtein;
use log::warn;
use optalg_error::Error;
use std::{collections::HashMap, fmt, sync::Arc};

/// A hand-supplied oracle for a specific combination of functions.
pub type SpecialHandler = Arc<dyn Fn(&Expr) -> Oracle + Send + Sync>;

/// The key of the special-combination registry: the operator at the root of the expression, the
/// sorted names of the leaf functions it involves, and the requested oracle kind.
type SpecialKey = (Op, Vec<String>, OracleKind);

/// The prefix of the names of functions created by abstracting a subexpression.
const FRESH_PREFIX: &str = "_h";

/// A context holding every registry the engine reads from: the facts and oracles of leaf
/// functions, hand-supplied special combinations, and reformulation strategies.
///
/// Registration is expected to happen up front, before any querying. Every registry keeps the
/// last value written for a key.
#[derive(Clone)]
pub struct Ctxt {
    /// The facts known about each leaf function.
    properties: HashMap<String, PropertySet>,

    /// The oracles of each leaf function.
    oracles: HashMap<(String, OracleKind), Oracle>,

    /// Oracles for specific combinations of functions.
    specials: HashMap<SpecialKey, SpecialHandler>,

    /// The reformulation strategies, in registration order.
    strategies: IndexMap<String, Arc<dyn Strategy>>,

    /// The fresh functions created by abstracting subexpressions.
    abstractions: HashMap<Expr, String>,
}

impl Default for Ctxt {
    fn default() -> Self {
        let mut ctxt = Self::new();
        for func in funcs::all() {
            let name = func.name();
            ctxt.register_properties(name, func.properties());

            let func: Arc<dyn funcs::SpecialFunction> = func.into();
            let eval = Arc::clone(&func);
            ctxt.register_scalar_oracle(name, OracleKind::Evaluation, move |x| eval.eval(x));
            ctxt.register_scalar_oracle(name, OracleKind::Derivative, move |x| func.derivative(x));
        }
        for (name, strategy) in reformulate::rules::all() {
            ctxt.strategies.insert(name.to_string(), strategy);
        }
        ctxt
    }
}

impl fmt::Debug for Ctxt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctxt")
            .field("properties", &self.properties)
            .field("oracles", &self.oracles.keys().collect::<Vec<_>>())
            .field("specials", &self.specials.keys().collect::<Vec<_>>())
            .field("strategies", &self.list_strategies())
            .field("abstractions", &self.abstractions)
            .finish()
    }
}

impl Ctxt {
    /// Creates a new empty context.
    ///
    /// The empty context has no special functions and no reformulation strategies, which makes it
    /// useful for isolated tests. Consider using the [`Default`] implementation instead.
    pub fn new() -> Ctxt {
        Ctxt {
            properties: HashMap::new(),
            oracles: HashMap::new(),
            specials: HashMap::new(),
            strategies: IndexMap::new(),
            abstractions: HashMap::new(),
        }
    }

    /// Adds a fact about a leaf function.
    pub fn register_property(&mut self, name: impl Into<String>, property: Property) {
        self.properties.entry(name.into()).or_default().insert(property);
    }

    /// Adds several facts about a leaf function.
    pub fn register_properties(
        &mut self,
        name: impl Into<String>,
        properties: impl IntoIterator<Item = Property>,
    ) {
        self.properties.entry(name.into()).or_default().extend(properties);
    }

    /// Removes every fact about a leaf function.
    pub fn clear_properties(&mut self, name: &str) {
        self.properties.remove(name);
    }

    /// Returns the facts known about a leaf function.
    pub fn properties_of(&self, name: &str) -> Option<&PropertySet> {
        self.properties.get(name)
    }

    /// Adds an oracle to a leaf function, replacing any oracle of the same kind.
    pub fn register_oracle(
        &mut self,
        name: impl Into<String>,
        kind: OracleKind,
        func: impl Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
        metadata: Option<OracleMetadata>,
    ) {
        let oracle = Oracle::new(kind, func).with_metadata(metadata.unwrap_or_default());
        self.insert_oracle(name, oracle);
    }

    /// Adds an oracle of a function of one real variable to a leaf function.
    pub fn register_scalar_oracle(
        &mut self,
        name: impl Into<String>,
        kind: OracleKind,
        f: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) {
        self.insert_oracle(name, Oracle::from_scalar(kind, f));
    }

    /// Adds an already built oracle to a leaf function.
    pub fn insert_oracle(&mut self, name: impl Into<String>, oracle: Oracle) {
        let name = name.into();
        let kind = oracle.kind();
        if self.oracles.insert((name.clone(), kind), oracle).is_some() {
            warn!("replacing the {} oracle of `{}`", kind, name);
        }
    }

    /// Returns the oracle of the given kind registered on a leaf function.
    pub fn oracle_of(&self, name: &str, kind: OracleKind) -> Option<&Oracle> {
        self.oracles.get(&(name.to_string(), kind))
    }

    /// Removes every oracle of a leaf function.
    pub fn clear_oracles(&mut self, name: &str) {
        self.oracles.retain(|(n, _), _| n != name);
    }

    /// Adds a hand-supplied oracle for expressions with the given root operator that involve
    /// exactly the given leaf functions.
    pub fn register_special_combination(
        &mut self,
        op: Op,
        names: impl IntoIterator<Item = impl Into<String>>,
        kind: OracleKind,
        handler: impl Fn(&Expr) -> Oracle + Send + Sync + 'static,
    ) {
        let mut names = names.into_iter().map(Into::into).collect::<Vec<String>>();
        names.sort();
        names.dedup();
        if self.specials.insert((op, names.clone(), kind), Arc::new(handler)).is_some() {
            warn!("replacing the special {} oracle of {} over {:?}", kind, op, names);
        }
    }

    /// Returns the special-combination handler for the given key, if there is one. The names must
    /// be sorted and de-duplicated, as [`Expr::leaf_functions`] returns them.
    pub fn special_combination(
        &self,
        op: Op,
        names: &[String],
        kind: OracleKind,
    ) -> Option<&SpecialHandler> {
        if self.specials.is_empty() {
            return None;
        }
        self.specials.get(&(op, names.to_vec(), kind))
    }

    /// Adds a reformulation strategy, replacing any strategy with the same name.
    pub fn register_strategy(&mut self, name: impl Into<String>, strategy: impl Strategy + 'static) {
        let name = name.into();
        if self.strategies.insert(name.clone(), Arc::new(strategy)).is_some() {
            warn!("replacing the reformulation strategy `{}`", name);
        }
    }

    /// Returns the names of the registered strategies, in registration order.
    pub fn list_strategies(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Returns the strategy with the given name.
    pub fn get_strategy(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).cloned()
    }

    /// Returns the registered strategies, in registration order.
    pub(crate) fn strategies(&self) -> Vec<(String, Arc<dyn Strategy>)> {
        self.strategies
            .iter()
            .map(|(name, strategy)| (name.clone(), Arc::clone(strategy)))
            .collect()
    }

    /// Returns all strategies with a name similar to the given name.
    pub fn get_similar_strategies(&self, name: &str) -> Vec<&str> {
        self.strategies
            .keys()
            .filter(|n| levenshtein(n, name) < 2)
            .map(String::as_str)
            .collect()
    }

    /// Removes every reformulation strategy.
    pub fn clear_strategies(&mut self) {
        self.strategies.clear();
    }

    /// Returns the name of the fresh function already standing for the given subexpression.
    pub(crate) fn abstraction_of(&self, subtree: &Expr) -> Option<&str> {
        self.abstractions.get(subtree).map(String::as_str)
    }

    /// Records a new fresh function standing for the given subexpression and returns its name.
    /// The same subexpression must not be recorded twice.
    pub(crate) fn insert_abstraction(&mut self, subtree: &Expr) -> String {
        let name = format!("{}{}", FRESH_PREFIX, self.abstractions.len());
        self.abstractions.insert(subtree.clone(), name.clone());
        name
    }

    /// Infers the properties of an expression. See [`property::infer_properties`].
    pub fn infer_properties(&self, expr: &Expr) -> Result<PropertySet, Error> {
        property::infer_properties(expr, self)
    }

    /// Builds an oracle for an expression. See [`oracle::oracle_for_expression`].
    pub fn oracle_for(&self, expr: &Expr, kind: OracleKind) -> Option<Oracle> {
        oracle::oracle_for_expression(expr, kind, self)
    }

    /// Applies the named strategy to an expression, returning the distinct reformulations it
    /// produces.
    ///
    /// Returns an error with the [`StrategyNotFound`] kind if no strategy has that name.
    pub fn apply_strategy(&mut self, name: &str, expr: &Expr) -> Result<Vec<Reformulation>, Error> {
        let Some(strategy) = self.get_strategy(name) else {
            let source = expr.to_string();
            let span = 0..source.len();
            let suggestions = self.get_similar_strategies(name)
                .into_iter()
                .map(str::to_owned)
                .collect();
            return Err(Error::new(
                source,
                vec![span],
                StrategyNotFound { name: name.to_string(), suggestions },
            ));
        };

        strategy.reformulate(expr, self)
    }

    /// Generates the reformulations of an expression. See [`reformulate::generate_reformulations`].
    pub fn generate_reformulations(
        &mut self,
        expr: &Expr,
        max_iterations: usize,
    ) -> Result<Vec<Reformulation>, Error> {
        reformulate::generate_reformulations(expr, max_iterations, self)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        interval::Interval,
        reformulate::rules,
        space::Space,
    };
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn default_registers_special_functions() {
        let ctxt = Ctxt::default();
        for name in [funcs::SQRT, funcs::LOG1P] {
            assert!(ctxt.properties_of(name).unwrap().contains(&Property::MonotonicallyIncreasing));
            assert!(ctxt.oracle_of(name, OracleKind::Evaluation).is_some());
            assert!(ctxt.oracle_of(name, OracleKind::Derivative).is_some());
        }
        assert_eq!(
            ctxt.list_strategies(),
            vec![rules::COMMUTATIVITY, rules::REBALANCING, rules::STRUCTURE_LOSS, rules::MONOTONE_TRANSFORM],
        );
    }

    #[test]
    fn new_is_empty() {
        let ctxt = Ctxt::new();
        assert!(ctxt.properties_of(funcs::SQRT).is_none());
        assert!(ctxt.list_strategies().is_empty());
    }

    #[test]
    fn registration_is_cumulative_and_clearable() {
        let mut ctxt = Ctxt::new();
        ctxt.register_property("f", Property::Convex);
        ctxt.register_property("f", Property::Smooth(Some(Interval::point(1.0))));
        ctxt.register_property("f", Property::Convex);
        assert_eq!(ctxt.properties_of("f").unwrap().len(), 2);

        ctxt.clear_properties("f");
        assert!(ctxt.properties_of("f").is_none());
    }

    #[test]
    fn last_oracle_wins() {
        let mut ctxt = Ctxt::new();
        ctxt.register_scalar_oracle("f", OracleKind::Evaluation, |x| x);
        ctxt.register_scalar_oracle("f", OracleKind::Evaluation, |x| 2.0 * x);
        ctxt.register_scalar_oracle("f", OracleKind::Derivative, |_| 2.0);
        let oracle = ctxt.oracle_of("f", OracleKind::Evaluation).unwrap();
        assert_eq!(oracle.call_scalar(3.0), Ok(6.0));

        ctxt.clear_oracles("f");
        assert!(ctxt.oracle_of("f", OracleKind::Derivative).is_none());
    }

    #[test]
    fn strategy_lookup() {
        let mut ctxt = Ctxt::default();
        assert!(ctxt.get_strategy(rules::COMMUTATIVITY).is_some());
        assert_eq!(ctxt.get_similar_strategies("rebalancin"), vec![rules::REBALANCING]);

        let x = Expr::variable("x", Space::Scalar);
        let err = ctxt.apply_strategy("commutativty", &x).unwrap_err();
        let kind = err.downcast_ref::<StrategyNotFound>().unwrap();
        assert_eq!(kind.suggestions, vec![rules::COMMUTATIVITY.to_string()]);

        ctxt.clear_strategies();
        assert!(ctxt.get_strategy(rules::COMMUTATIVITY).is_none());
    }

    #[test]
    fn custom_strategy() {
        fn negate_nothing(expr: &Expr, _: &mut Ctxt) -> Result<Vec<Expr>, Error> {
            Ok(vec![expr.clone(), expr.clone()])
        }

        let mut ctxt = Ctxt::new();
        ctxt.register_strategy("identity", negate_nothing);
        let x = Expr::variable("x", Space::Scalar);
        let reformulations = ctxt.apply_strategy("identity", &x).unwrap();
        assert_eq!(reformulations.len(), 1);
        assert_eq!(ctxt.get_strategy("identity").unwrap().rewrite(&x, &mut Ctxt::new()).unwrap().len(), 2);
    }

    #[test]
    fn abstraction_names_are_memoized() {
        let mut ctxt = Ctxt::new();
        let x = Expr::variable("x", Space::Scalar);
        let sum = Expr::addition(vec![
            Expr::call("f", vec![x.clone()], Space::Scalar),
            Expr::call("g", vec![x.clone()], Space::Scalar),
        ]).unwrap();
        assert_eq!(ctxt.abstraction_of(&sum), None);
        assert_eq!(ctxt.insert_abstraction(&sum), "_h0");
        assert_eq!(ctxt.abstraction_of(&sum), Some("_h0"));
        assert_eq!(ctxt.insert_abstraction(&x), "_h1");
    }
}
