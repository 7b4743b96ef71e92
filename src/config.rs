//! Bad-value rules and configuration scopes
//!
//! A [`Configuration`] decides which values short-circuit a pipeline. It
//! holds an ordered list of [`Rule`]s: literal values matched by equality,
//! and predicates. The default rules treat `Null`, `Undefined` and `NaN` as
//! bad. Errors never need a rule: they are recognised by the
//! [`Value::Error`] discriminant before any rule is consulted.
//!
//! Configuration lives at two scopes:
//!
//! - a process-wide default, read as an immutable snapshot and replaced only
//!   through [`define_default_configuration`] and
//!   [`restore_default_configuration`]
//! - a per-chain override installed with
//!   [`LazyBox::with_configuration`](crate::LazyBox::with_configuration) and
//!   inherited by every box derived from it
//!
//! # Example
//!
//! ```
//! use lazybox::{Configuration, ConfigurationPatch, Rule, Value};
//!
//! let config = Configuration::default().apply(
//!     &ConfigurationPatch::new().bad_values(vec![Rule::literal(-1), Rule::predicate(Value::is_null)]),
//! );
//!
//! assert!(config.is_bad_value(&Value::Int(-1)));
//! assert!(config.is_bad_value(&Value::Null));
//! assert!(!config.is_bad_value(&Value::Undefined));
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::resolve::Resolved;
use crate::value::Value;

/// Nesting bound applied when unwrapping boxes and pending results.
pub const DEFAULT_MAX_UNWRAP_DEPTH: usize = 64;

/// A single bad-value rule.
#[derive(Clone)]
pub enum Rule {
    /// Matches values equal to this one.
    Literal(Value),
    /// Matches values for which the predicate returns `true`.
    Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl Rule {
    /// A rule matching values equal to `value`.
    pub fn literal(value: impl Into<Value>) -> Self {
        Rule::Literal(value.into())
    }

    /// A rule matching values accepted by `predicate`.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Rule::Predicate(Arc::new(predicate))
    }

    /// Returns `true` if `value` matches this rule.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Rule::Literal(literal) => literal == value,
            Rule::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Rule::Predicate(_) => f.write_str("Predicate(<predicate>)"),
        }
    }
}

/// Returns `true` if any rule matches `value`, stopping at the first match.
///
/// An empty rule list matches nothing.
///
/// # Example
///
/// ```
/// use lazybox::{is_bad_value, Rule, Value};
///
/// let rules = [Rule::literal(0), Rule::predicate(|v: &Value| v.as_str() == Some(""))];
/// assert!(is_bad_value(&Value::Int(0), &rules));
/// assert!(is_bad_value(&Value::from(""), &rules));
/// assert!(!is_bad_value(&Value::Null, &rules));
/// assert!(!is_bad_value(&Value::Null, &[]));
/// ```
pub fn is_bad_value(value: &Value, rules: &[Rule]) -> bool {
    rules.iter().any(|rule| rule.matches(value))
}

/// An immutable set of resolution settings.
#[derive(Clone, Debug)]
pub struct Configuration {
    bad_values: Vec<Rule>,
    max_unwrap_depth: usize,
}

impl Configuration {
    /// A configuration with the given rules and the default unwrap depth.
    pub fn new(bad_values: Vec<Rule>) -> Self {
        Configuration {
            bad_values,
            max_unwrap_depth: DEFAULT_MAX_UNWRAP_DEPTH,
        }
    }

    /// The bad-value rules, in match order.
    pub fn bad_values(&self) -> &[Rule] {
        &self.bad_values
    }

    /// How many nested boxes or pending results an unwrap follows before
    /// giving up with an error.
    pub fn max_unwrap_depth(&self) -> usize {
        self.max_unwrap_depth
    }

    /// Returns `true` if `value` matches one of this configuration's rules.
    pub fn is_bad_value(&self, value: &Value) -> bool {
        is_bad_value(value, &self.bad_values)
    }

    /// Three-way classification of a settled value.
    ///
    /// # Example
    ///
    /// ```
    /// use lazybox::{Configuration, Resolved, Value};
    ///
    /// let config = Configuration::default();
    /// assert!(matches!(config.classify(Value::Int(1)), Resolved::Success(_)));
    /// assert!(matches!(config.classify(Value::Null), Resolved::Bad(_)));
    /// assert!(matches!(config.classify(Value::error("x")), Resolved::Error(_)));
    /// ```
    pub fn classify(&self, value: Value) -> Resolved {
        match value {
            Value::Error(fault) => Resolved::Error(fault),
            value if self.is_bad_value(&value) => Resolved::Bad(value),
            value => Resolved::Success(value),
        }
    }

    /// A new configuration with `patch` laid over this one.
    pub fn apply(&self, patch: &ConfigurationPatch) -> Configuration {
        Configuration {
            bad_values: patch
                .bad_values
                .clone()
                .unwrap_or_else(|| self.bad_values.clone()),
            max_unwrap_depth: patch
                .max_unwrap_depth
                .unwrap_or(self.max_unwrap_depth)
                .max(1),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new(vec![
            Rule::literal(Value::Null),
            Rule::literal(Value::Undefined),
            Rule::predicate(Value::is_nan),
        ])
    }
}

/// A partial configuration: unset fields keep the base configuration's value.
///
/// # Example
///
/// ```
/// use lazybox::{Configuration, ConfigurationPatch, Rule};
///
/// let patch = ConfigurationPatch::from(vec![Rule::literal(1)]);
/// let config = Configuration::default().apply(&patch.max_unwrap_depth(4));
/// assert_eq!(config.bad_values().len(), 1);
/// assert_eq!(config.max_unwrap_depth(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigurationPatch {
    bad_values: Option<Vec<Rule>>,
    max_unwrap_depth: Option<usize>,
}

impl ConfigurationPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bad-value rules.
    pub fn bad_values(mut self, rules: Vec<Rule>) -> Self {
        self.bad_values = Some(rules);
        self
    }

    /// Replace the unwrap depth bound. Values below one are raised to one.
    pub fn max_unwrap_depth(mut self, depth: usize) -> Self {
        self.max_unwrap_depth = Some(depth);
        self
    }
}

impl From<Vec<Rule>> for ConfigurationPatch {
    fn from(rules: Vec<Rule>) -> Self {
        ConfigurationPatch::new().bad_values(rules)
    }
}

impl From<Configuration> for ConfigurationPatch {
    fn from(config: Configuration) -> Self {
        ConfigurationPatch {
            bad_values: Some(config.bad_values),
            max_unwrap_depth: Some(config.max_unwrap_depth),
        }
    }
}

static DEFAULT_CONFIGURATION: LazyLock<RwLock<Arc<Configuration>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Configuration::default())));

/// The current process-wide default configuration snapshot.
pub fn default_configuration() -> Arc<Configuration> {
    Arc::clone(&DEFAULT_CONFIGURATION.read())
}

/// Replace the process-wide default with `patch` laid over the current default.
///
/// Boxes already constructed keep the snapshot they captured.
pub fn define_default_configuration(patch: impl Into<ConfigurationPatch>) -> Arc<Configuration> {
    let patch = patch.into();
    let mut current = DEFAULT_CONFIGURATION.write();
    let next = Arc::new(current.apply(&patch));
    *current = Arc::clone(&next);

    crate::trace_event!(
        debug,
        rules = next.bad_values().len(),
        max_unwrap_depth = next.max_unwrap_depth(),
        "default configuration redefined"
    );

    next
}

/// Put the original process-wide default back.
pub fn restore_default_configuration() -> Arc<Configuration> {
    let original = Arc::new(Configuration::default());
    *DEFAULT_CONFIGURATION.write() = Arc::clone(&original);

    crate::trace_event!(debug, "default configuration restored");

    original
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Fault;

    #[test]
    fn test_default_rules() {
        let config = Configuration::default();
        assert!(config.is_bad_value(&Value::Null));
        assert!(config.is_bad_value(&Value::Undefined));
        assert!(config.is_bad_value(&Value::Float(f64::NAN)));
        assert!(!config.is_bad_value(&Value::Int(0)));
        assert!(!config.is_bad_value(&Value::from("")));
        assert_eq!(config.max_unwrap_depth(), DEFAULT_MAX_UNWRAP_DEPTH);
    }

    #[test]
    fn test_empty_rules_match_nothing() {
        let config = Configuration::new(Vec::new());
        assert!(!config.is_bad_value(&Value::Null));
        assert!(matches!(config.classify(Value::Null), Resolved::Success(_)));
    }

    #[test]
    fn test_errors_classify_without_rules() {
        let config = Configuration::new(Vec::new());
        match config.classify(Value::Error(Fault::new("e"))) {
            Resolved::Error(fault) => assert_eq!(fault.message(), "e"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_first_match_short_circuits() {
        let rules = [
            Rule::literal(1),
            Rule::predicate(|_: &Value| panic!("should not be consulted")),
        ];
        assert!(is_bad_value(&Value::Int(1), &rules));
    }

    #[test]
    fn test_literal_nan_never_matches() {
        let rules = [Rule::literal(f64::NAN)];
        assert!(!is_bad_value(&Value::Float(f64::NAN), &rules));
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let base = Configuration::default();
        let patched = base.apply(&ConfigurationPatch::new().max_unwrap_depth(3));
        assert_eq!(patched.bad_values().len(), base.bad_values().len());
        assert_eq!(patched.max_unwrap_depth(), 3);

        let replaced = base.apply(&ConfigurationPatch::from(vec![Rule::literal("x")]));
        assert_eq!(replaced.bad_values().len(), 1);
        assert_eq!(replaced.max_unwrap_depth(), DEFAULT_MAX_UNWRAP_DEPTH);
    }

    #[test]
    fn test_full_configuration_as_patch_replaces_everything() {
        let strict = Configuration::new(vec![Rule::literal(0)])
            .apply(&ConfigurationPatch::new().max_unwrap_depth(5));
        let replaced = Configuration::default().apply(&ConfigurationPatch::from(strict));

        assert_eq!(replaced.bad_values().len(), 1);
        assert!(replaced.is_bad_value(&Value::Int(0)));
        assert!(!replaced.is_bad_value(&Value::Null));
        assert_eq!(replaced.max_unwrap_depth(), 5);
    }

    #[test]
    fn test_zero_depth_is_raised_to_one() {
        let config = Configuration::default().apply(&ConfigurationPatch::new().max_unwrap_depth(0));
        assert_eq!(config.max_unwrap_depth(), 1);
    }

    #[test]
    fn test_rule_debug_hides_predicates() {
        assert_eq!(format!("{:?}", Rule::literal(1)), "Literal(Int(1))");
        assert_eq!(
            format!("{:?}", Rule::predicate(Value::is_null)),
            "Predicate(<predicate>)"
        );
    }
}
