//! Selector model and matching.
//!
//! A selector is a tag/namespace gate plus an ordered list of
//! [`Qualifier`]s. Combinators are themselves qualifiers carrying an
//! inner selector, so `div p.note` is the selector for `p` with a
//! `Class("note")` qualifier and a `Combined(Descendant, div)` qualifier.
//!
//! Selectors are built mutably through [`SelectorBuilder`] and frozen
//! into immutable [`Selector`]s at ruleset-insertion time; specificity
//! is computed once at freeze time and cached.
//!
//! Specificity follows
//! [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
//! with one extra leading component: an `inline` flag that outranks all
//! counts, reserved for declarations lifted from `style` attributes.

use folio_dom::Element;

/// Relationship operators between a selector and an inner selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Descendant combinator (whitespace): the inner selector must match
    /// some ancestor.
    Descendant,
    /// Child combinator (`>`): the inner selector must match the parent.
    Child,
    /// Adjacent-sibling combinator (`+`): the inner selector must match
    /// the immediately preceding sibling element.
    AdjacentSibling,
}

/// Attribute predicate operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOp {
    /// `[attr]` — presence only.
    Exists,
    /// `[attr=value]` — exact match.
    Equals,
    /// `[attr~=value]` — whitespace-separated word match.
    Includes,
    /// `[attr|=value]` — exact match or prefix followed by `-`.
    DashMatch,
}

/// A single condition on an element, beyond the tag/namespace gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// `#id`
    Id(String),
    /// `.class`
    Class(String),
    /// `[attr]`, `[attr=v]`, `[attr~=v]`, `[attr|=v]`
    Attribute {
        /// The attribute name.
        name: String,
        /// The predicate operator.
        op: AttrOp,
        /// The comparison value; `None` for presence-only.
        value: Option<String>,
    },
    /// `:pseudo` or `:pseudo(params)`, resolved through the element
    /// adapter's pseudo-state callback.
    Pseudo {
        /// The pseudo-class name, lowercase.
        name: String,
        /// Raw text inside the parentheses, empty for bare pseudos.
        params: String,
    },
    /// A combinator linking this selector to an inner selector on a
    /// related element.
    Combined {
        /// The relationship.
        combinator: Combinator,
        /// The selector the related element must match.
        inner: Box<Selector>,
    },
}

/// A selector's rank in the cascade, compared lexicographically.
///
/// The leading `inline` flag outranks every count: a declaration from a
/// `style` attribute beats any stylesheet selector within the same
/// cascade origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    /// Set only for the synthetic selector carrying inline declarations.
    pub inline: bool,
    /// Number of id qualifiers.
    pub ids: u32,
    /// Number of class and attribute qualifiers.
    pub classes: u32,
    /// Number of type selectors and pseudo qualifiers.
    pub types: u32,
}

/// An immutable, frozen selector with cached specificity.
///
/// Build through [`SelectorBuilder`]; once frozen a selector never
/// changes, so rulesets can key on it and share it across threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    namespace: Option<String>,
    tag: Option<String>,
    qualifiers: Vec<Qualifier>,
    specificity: Specificity,
}

impl Selector {
    /// A universal selector (`*`), matching any element.
    #[must_use]
    pub fn universal() -> Self {
        SelectorBuilder::new().freeze()
    }

    /// The synthetic selector used for inline `style` declarations:
    /// matches everything, outranks everything within its origin.
    #[must_use]
    pub fn inline() -> Self {
        let mut builder = SelectorBuilder::new();
        builder.mark_inline();
        builder.freeze()
    }

    /// The tag gate, if any (`None` = universal).
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The namespace gate, if any (`None` matches any namespace).
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Apply a stylesheet's default namespace: fills the gate on this
    /// selector, and on every combined inner selector, where no
    /// explicit namespace is set. Specificity is unaffected.
    #[must_use]
    pub fn with_default_namespace(mut self, ns: &str) -> Self {
        if self.namespace.is_none() {
            self.namespace = Some(ns.to_string());
        }
        for qualifier in &mut self.qualifiers {
            if let Qualifier::Combined { inner, .. } = qualifier {
                *inner = Box::new(inner.as_ref().clone().with_default_namespace(ns));
            }
        }
        self
    }

    /// The cached specificity, computed at freeze time.
    #[must_use]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Whether this selector matches the given element.
    ///
    /// The tag/namespace gate is checked first, then every qualifier
    /// must hold. Combined qualifiers recurse through the element's
    /// ancestors or siblings as their combinator dictates.
    #[must_use]
    pub fn matches<E: Element>(&self, element: &E) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        // A selector namespace of None matches any element namespace.
        if let Some(ns) = &self.namespace {
            if element.namespace() != Some(ns.as_str()) {
                return false;
            }
        }
        self.qualifiers.iter().all(|q| Self::qualifier_matches(q, element))
    }

    fn qualifier_matches<E: Element>(qualifier: &Qualifier, element: &E) -> bool {
        match qualifier {
            Qualifier::Id(id) => element.id() == Some(id.as_str()),
            Qualifier::Class(class) => element.class_list().contains(&class.as_str()),
            Qualifier::Attribute { name, op, value } => {
                let Some(actual) = element.attr(name) else {
                    return false;
                };
                match (op, value.as_deref()) {
                    (AttrOp::Exists, _) => true,
                    (AttrOp::Equals, Some(v)) => actual == v,
                    (AttrOp::Includes, Some(v)) => {
                        actual.split_ascii_whitespace().any(|w| w == v)
                    }
                    (AttrOp::DashMatch, Some(v)) => {
                        actual == v
                            || (actual.starts_with(v)
                                && actual[v.len()..].starts_with('-'))
                    }
                    // Operators other than Exists require a value.
                    (_, None) => false,
                }
            }
            Qualifier::Pseudo { name, params } => element.pseudo_state(name, params),
            Qualifier::Combined { combinator, inner } => match combinator {
                Combinator::Descendant => {
                    let mut cursor = element.parent();
                    while let Some(ancestor) = cursor {
                        if inner.matches(&ancestor) {
                            return true;
                        }
                        cursor = ancestor.parent();
                    }
                    false
                }
                Combinator::Child => element.parent().is_some_and(|p| inner.matches(&p)),
                Combinator::AdjacentSibling => {
                    element.prev_sibling().is_some_and(|s| inner.matches(&s))
                }
            },
        }
    }
}

/// Mutable selector under construction.
///
/// [`freeze`](Self::freeze) computes specificity and produces the
/// immutable [`Selector`]; the builder is consumed, so a selector can
/// never be mutated after it enters a ruleset.
#[derive(Debug, Default)]
pub struct SelectorBuilder {
    namespace: Option<String>,
    tag: Option<String>,
    qualifiers: Vec<Qualifier>,
    inline: bool,
}

impl SelectorBuilder {
    /// Start an empty (universal) selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag gate. `*` leaves the selector universal.
    pub fn set_tag(&mut self, tag: &str) {
        if tag != "*" {
            self.tag = Some(tag.to_ascii_lowercase());
        }
    }

    /// Set the namespace gate.
    pub fn set_namespace(&mut self, ns: &str) {
        self.namespace = Some(ns.to_string());
    }

    /// Append a qualifier.
    pub fn push(&mut self, qualifier: Qualifier) {
        self.qualifiers.push(qualifier);
    }

    /// Mark the selector as the inline-style carrier.
    pub fn mark_inline(&mut self) {
        self.inline = true;
    }

    /// Wrap the selector built so far as the left side of a combinator:
    /// the builder restarts empty and receives the old content as a
    /// `Combined` qualifier once the right side's tag is known.
    ///
    /// Used by the parser when it encounters ` `, `>` or `+`.
    #[must_use]
    pub fn take_as_inner(&mut self) -> Selector {
        let inner = Self {
            namespace: self.namespace.take(),
            tag: self.tag.take(),
            qualifiers: std::mem::take(&mut self.qualifiers),
            inline: false,
        };
        inner.freeze()
    }

    /// Compute specificity and freeze into an immutable [`Selector`].
    #[must_use]
    pub fn freeze(self) -> Selector {
        let mut spec = Specificity {
            inline: self.inline,
            ..Specificity::default()
        };
        count_specificity(self.tag.as_deref(), &self.qualifiers, &mut spec);
        Selector {
            namespace: self.namespace,
            tag: self.tag,
            qualifiers: self.qualifiers,
            specificity: spec,
        }
    }
}

/// [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules):
/// ids count into A, classes/attributes into B, types and pseudos into
/// C. Combined qualifiers contribute their inner selector's counts.
fn count_specificity(tag: Option<&str>, qualifiers: &[Qualifier], spec: &mut Specificity) {
    if tag.is_some() {
        spec.types += 1;
    }
    for qualifier in qualifiers {
        match qualifier {
            Qualifier::Id(_) => spec.ids += 1,
            Qualifier::Class(_) | Qualifier::Attribute { .. } => spec.classes += 1,
            Qualifier::Pseudo { .. } => spec.types += 1,
            Qualifier::Combined { inner, .. } => {
                let inner_spec = inner.specificity();
                spec.ids += inner_spec.ids;
                spec.classes += inner_spec.classes;
                spec.types += inner_spec.types;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_selector(tag: &str) -> Selector {
        let mut b = SelectorBuilder::new();
        b.set_tag(tag);
        b.freeze()
    }

    #[test]
    fn test_specificity_class_beats_type() {
        // .red beats p
        let mut b = SelectorBuilder::new();
        b.push(Qualifier::Class("red".to_string()));
        let class_sel = b.freeze();
        let type_sel = tag_selector("p");
        assert!(class_sel.specificity() > type_sel.specificity());
    }

    #[test]
    fn test_specificity_id_beats_classes() {
        let mut b = SelectorBuilder::new();
        b.push(Qualifier::Id("main".to_string()));
        let id_sel = b.freeze();

        let mut b = SelectorBuilder::new();
        for i in 0..10 {
            b.push(Qualifier::Class(format!("c{i}")));
        }
        let many_classes = b.freeze();
        assert!(id_sel.specificity() > many_classes.specificity());
    }

    #[test]
    fn test_inline_outranks_everything() {
        let inline = Selector::inline();
        let mut b = SelectorBuilder::new();
        b.set_tag("div");
        b.push(Qualifier::Id("x".to_string()));
        b.push(Qualifier::Class("y".to_string()));
        let heavy = b.freeze();
        assert!(inline.specificity() > heavy.specificity());
    }

    #[test]
    fn test_combined_contributes_inner_counts() {
        // "div p" has two type counts
        let mut b = SelectorBuilder::new();
        let inner = {
            let mut ib = SelectorBuilder::new();
            ib.set_tag("div");
            ib.freeze()
        };
        b.set_tag("p");
        b.push(Qualifier::Combined {
            combinator: Combinator::Descendant,
            inner: Box::new(inner),
        });
        let sel = b.freeze();
        assert_eq!(sel.specificity().types, 2);
    }

    #[test]
    fn test_specificity_cached_at_freeze() {
        let sel = tag_selector("p");
        // Two calls observe the same cached tuple.
        assert_eq!(sel.specificity(), sel.specificity());
    }
}
