//! Declared default values, applied to a tree in one pass.
//!
//! Each [`DefaultRule`] names the path it fills and every path it reads from.
//! [`DefaultRules::apply`] uses those declarations to order the rules, so a default
//! that copies another path's value always sees that path's own default first.
//! Explicit values are never overwritten.
use crate::{
    Group, Node, NodePath,
    error::{TreeError, TreeErrorKind, TreeResult},
    path::IntoNodePath,
};
use indexmap::IndexMap;

/// Where a default value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultSource {
    /// A fixed value.
    Value(Node),

    /// A copy of whatever is set at another path, when the rule runs.
    CopyFrom(NodePath),
}

/// A value applied at a path only if nothing is set there.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultRule {
    target: NodePath,
    source: DefaultSource,
    condition: Option<NodePath>,
}
impl DefaultRule {
    /// A rule that fills `target` with a fixed value.
    ///
    /// # Errors
    /// Returns `InvalidPath` if the target is not a valid path.
    pub fn value(target: impl IntoNodePath, value: impl Into<Node>) -> TreeResult<Self> {
        Ok(Self {
            target: target.into_node_path()?,
            source: DefaultSource::Value(value.into()),
            condition: None,
        })
    }

    /// A rule that fills `target` with a copy of the node at `source`.
    /// If `source` is not set when the rule runs, nothing is applied.
    ///
    /// # Errors
    /// Returns `InvalidPath` if either path is not valid.
    pub fn copy_from(target: impl IntoNodePath, source: impl IntoNodePath) -> TreeResult<Self> {
        Ok(Self {
            target: target.into_node_path()?,
            source: DefaultSource::CopyFrom(source.into_node_path()?),
            condition: None,
        })
    }

    /// Only apply this rule if something is set at `path`.
    ///
    /// # Errors
    /// Returns `InvalidPath` if the path is not valid.
    pub fn when_set(mut self, path: impl IntoNodePath) -> TreeResult<Self> {
        self.condition = Some(path.into_node_path()?);
        Ok(self)
    }

    /// Returns the path this rule fills.
    #[must_use]
    pub fn target(&self) -> &NodePath {
        &self.target
    }

    /// Returns the source of the default value.
    #[must_use]
    pub fn source(&self) -> &DefaultSource {
        &self.source
    }

    /// Returns every path this rule reads before deciding what to apply.
    pub fn reads(&self) -> impl Iterator<Item = &NodePath> {
        let source = match &self.source {
            DefaultSource::CopyFrom(path) => Some(path),
            DefaultSource::Value(_) => None,
        };
        source.into_iter().chain(self.condition.as_ref())
    }

    /// Returns true if running `other` first could change what this rule reads.
    fn depends_on(&self, other: &DefaultRule) -> bool {
        self.reads()
            .any(|read| read.contains(&other.target) || other.target.contains(read))
    }

    /// Apply the rule to `group`; returns true if a value was set.
    fn apply(&self, group: &mut Group) -> TreeResult<bool> {
        if group.get(&self.target).is_some() {
            return Ok(false);
        }

        if let Some(condition) = &self.condition {
            if group.get(condition).is_none() {
                return Ok(false);
            }
        }

        let value = match &self.source {
            DefaultSource::Value(value) => value.clone(),
            DefaultSource::CopyFrom(source) => match group.get(source) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(path = %self.target, source = %source, "default source is not set");
                    return Ok(false);
                }
            },
        };

        tracing::trace!(path = %self.target, "applying default");
        group.set_default(&self.target, value)
    }
}

/// A set of default rules, at most one per target path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultRules {
    rules: IndexMap<NodePath, DefaultRule>,
}
impl DefaultRules {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. A rule for the same target replaces the earlier one.
    pub fn declare(&mut self, rule: DefaultRule) {
        self.rules.insert(rule.target.clone(), rule);
    }

    /// Add several rules. See [`DefaultRules::declare`].
    pub fn extend(&mut self, rules: impl IntoIterator<Item = DefaultRule>) {
        for rule in rules {
            self.declare(rule);
        }
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the rules in the order they will be applied.
    ///
    /// A rule that reads a path runs after every rule filling that path (or a path above or below it).
    /// Otherwise, rules run in the order they were declared.
    ///
    /// # Errors
    /// Returns `DefaultCycle` if the rules read each other's targets in a loop.
    pub fn ordered(&self) -> TreeResult<Vec<&DefaultRule>> {
        let rules: Vec<&DefaultRule> = self.rules.values().collect();
        let dependencies: Vec<Vec<usize>> = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                (0..rules.len())
                    .filter(|&j| j != i && rule.depends_on(rules[j]))
                    .collect()
            })
            .collect();

        let mut done = vec![false; rules.len()];
        let mut order = Vec::with_capacity(rules.len());
        while order.len() < rules.len() {
            let next = (0..rules.len())
                .find(|&i| !done[i] && dependencies[i].iter().all(|&j| done[j]));

            let Some(i) = next else {
                let stuck = (0..rules.len()).find(|&i| !done[i]).map(|i| rules[i]);
                let target = stuck.map(|r| r.target.to_string()).unwrap_or_default();
                return Err(TreeError::bare(TreeErrorKind::DefaultCycle(target)));
            };

            done[i] = true;
            order.push(rules[i]);
        }

        Ok(order)
    }

    /// Apply every rule to `group`. Returns the number of defaults that were set.
    ///
    /// Applying the same rules twice is a no-op the second time.
    ///
    /// # Errors
    /// - `DefaultCycle` if the rules cannot be ordered
    /// - `InvalidNodeShape` if a target path passes through a leaf or a repeated group
    ///
    /// # Example
    /// ```rust
    /// use fatturapa::{DefaultRule, DefaultRules, Group};
    ///
    /// let mut rules = DefaultRules::new();
    /// rules.declare(DefaultRule::copy_from("Progressivo", "Numero").unwrap());
    /// rules.declare(DefaultRule::value("Divisa", "EUR").unwrap());
    ///
    /// let mut group = Group::new();
    /// group.set("Numero", "42").unwrap();
    /// group.set("Divisa", "USD").unwrap();
    ///
    /// assert_eq!(rules.apply(&mut group).unwrap(), 1);
    /// assert_eq!(group.get_text("Progressivo"), Some("42"));
    /// assert_eq!(group.get_text("Divisa"), Some("USD"));
    /// ```
    pub fn apply(&self, group: &mut Group) -> TreeResult<usize> {
        let mut applied = 0;
        for rule in self.ordered()? {
            if rule.apply(group)? {
                applied += 1;
            }
        }

        tracing::debug!(rules = self.len(), applied, "applied defaults");
        Ok(applied)
    }
}
impl FromIterator<DefaultRule> for DefaultRules {
    fn from_iter<T: IntoIterator<Item = DefaultRule>>(iter: T) -> Self {
        let mut rules = Self::new();
        rules.extend(iter);
        rules
    }
}
