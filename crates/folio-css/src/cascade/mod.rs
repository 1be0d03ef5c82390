//! Cascade resolution over per-origin rulesets.
//!
//! Declarations live in eight rulesets, one per origin × importance.
//! [`CascadeEngine::find_value`] consults them in this fixed priority
//! order, lowest first:
//!
//! 1. user-agent normal
//! 2. user-agent important
//! 3. user normal
//! 4. author normal
//! 5. author important
//! 6. inline normal
//! 7. inline important
//! 8. user important
//!
//! The last matching declaration in that walk wins: a later origin beats
//! an earlier one, higher specificity beats lower within an origin, and
//! specificity ties keep ruleset insertion order. This is the governing
//! rule of the whole engine — in particular a user-important declaration
//! overrides everything, including inline-important, and inline-important
//! sits *before* user-important rather than after it as some engines
//! order them. Callers relying on the cascade must rely on this exact
//! order.
//!
//! Rulesets are immutable once the stylesheets are loaded; a fully built
//! engine may be shared read-only across concurrent document runs. All
//! per-run mutability (the matched-selector cache, diagnostics) is passed
//! in explicitly.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use folio_common::Diagnostics;
use folio_dom::Element;

use crate::parser::{Declaration, Stylesheet, parse_inline_declarations};
use crate::selector::Selector;
use crate::values::Value;

/// A cascade origin: where a stylesheet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Origin {
    /// Built-in defaults shipped with the engine.
    UserAgent,
    /// The reading user's stylesheet.
    User,
    /// The document's own stylesheets (`<style>`, `<link>`).
    Author,
    /// Synthetic origin for declarations lifted from `style` attributes.
    /// Per-element style attributes are folded here automatically during
    /// [`CascadeEngine::find_value`]; hosts only add stylesheets to this
    /// origin to emulate inline declarations in bulk.
    Inline,
}

/// Number of origin × importance ruleset slots.
const SLOT_COUNT: usize = 8;

/// Slot indices in priority order (low to high). The position of
/// user-important after inline-important is deliberate; see the module
/// docs.
const fn slot(origin: Origin, important: bool) -> usize {
    match (origin, important) {
        (Origin::UserAgent, false) => 0,
        (Origin::UserAgent, true) => 1,
        (Origin::User, false) => 2,
        (Origin::Author, false) => 3,
        (Origin::Author, true) => 4,
        (Origin::Inline, false) => 5,
        (Origin::Inline, true) => 6,
        (Origin::User, true) => 7,
    }
}

const INLINE_NORMAL_SLOT: usize = slot(Origin::Inline, false);
const INLINE_IMPORTANT_SLOT: usize = slot(Origin::Inline, true);

/// One selector with its merged declarations inside a ruleset.
#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    declarations: Vec<Declaration>,
}

/// Mapping `Selector -> Declarations` for one origin × importance.
///
/// Selectors are unique within a ruleset: re-declaring a selector merges
/// its declaration map into the existing entry (last value per property
/// wins) while the rule keeps its original insertion position.
#[derive(Debug, Clone, Default)]
struct Ruleset {
    rules: Vec<Rule>,
    by_selector: HashMap<Selector, usize>,
}

impl Ruleset {
    fn insert<I: IntoIterator<Item = Declaration>>(&mut self, selector: &Selector, decls: I) {
        let index = if let Some(&i) = self.by_selector.get(selector) {
            i
        } else {
            self.rules.push(Rule {
                selector: selector.clone(),
                declarations: Vec::new(),
            });
            let i = self.rules.len() - 1;
            let _ = self.by_selector.insert(selector.clone(), i);
            i
        };
        let rule = &mut self.rules[index];
        for decl in decls {
            if let Some(existing) = rule
                .declarations
                .iter_mut()
                .find(|d| d.property == decl.property)
            {
                *existing = decl;
            } else {
                rule.declarations.push(decl);
            }
        }
    }
}

/// Cache key for matched-selector memoization.
///
/// Identical siblings (same parent, tag, class, id and style attribute)
/// match the same rules, so their entries coincide and re-matching is
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    parent: usize,
    tag: String,
    class: String,
    id: String,
    style: String,
}

impl CacheKey {
    fn for_element<E: Element>(element: &E) -> Self {
        Self {
            parent: element.parent().map_or(0, |p| p.identity()),
            tag: element.tag_name().to_string(),
            class: element.attr("class").unwrap_or_default().to_string(),
            id: element.attr("id").unwrap_or_default().to_string(),
            style: element.inline_style().unwrap_or_default().to_string(),
        }
    }
}

/// Matched rules for one cache key: per slot, the indices of matching
/// rules already stable-sorted by specificity, plus the parsed inline
/// `style` attribute declarations.
#[derive(Debug, Clone, Default)]
struct MatchedRules {
    slots: [Vec<usize>; SLOT_COUNT],
    inline: Vec<Declaration>,
}

/// Bounded per-run memoization of selector matching.
///
/// Owned by the conversion run and passed into every
/// [`CascadeEngine::find_value`] call; never shared across runs, so a
/// stale entry can never leak between documents. When the entry budget
/// is exhausted the cache resets and refills rather than growing.
#[derive(Debug)]
pub struct MatchCache {
    entries: HashMap<CacheKey, MatchedRules>,
    capacity: usize,
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Default entry budget, enough for any realistic document.
const DEFAULT_CACHE_CAPACITY: usize = 4096;

impl MatchCache {
    /// A cache with the default entry budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A cache bounded to `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Drop all entries. Called between document runs when the cache
    /// object is reused.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of memoized entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_or_compute(
        &mut self,
        key: CacheKey,
        compute: impl FnOnce() -> MatchedRules,
    ) -> &MatchedRules {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.entries.clear();
        }
        match self.entries.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(compute()),
        }
    }
}

/// The cascade resolution engine: eight rulesets and the priority walk
/// over them.
#[derive(Debug, Clone, Default)]
pub struct CascadeEngine {
    rulesets: [Ruleset; SLOT_COUNT],
}

impl CascadeEngine {
    /// An engine with all rulesets empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a parsed stylesheet into the given origin. Normal and
    /// `!important` declarations split into the origin's two slots.
    pub fn add_stylesheet(&mut self, sheet: &Stylesheet, origin: Origin) {
        for rule in &sheet.rules {
            for selector in &rule.selectors {
                let (normal, important): (Vec<_>, Vec<_>) = rule
                    .declarations
                    .iter()
                    .cloned()
                    .partition(|d| !d.important);
                if !normal.is_empty() {
                    self.rulesets[slot(origin, false)].insert(selector, normal);
                }
                if !important.is_empty() {
                    self.rulesets[slot(origin, true)].insert(selector, important);
                }
            }
        }
    }

    /// Insert a single rule directly. Used for built-in user-agent
    /// defaults and by tests.
    pub fn insert_rule(
        &mut self,
        selector: &Selector,
        declarations: Vec<Declaration>,
        origin: Origin,
        important: bool,
    ) {
        self.rulesets[slot(origin, important)].insert(selector, declarations);
    }

    /// Resolve the winning value of `property` for `element`.
    ///
    /// Walks the eight ruleset slots in priority order; within each slot
    /// matching rules are stable-sorted by specificity so the last
    /// property-bearing candidate seen is the winner. The element's own
    /// `style` attribute is parsed once per cache entry and folded into
    /// the two inline slots.
    ///
    /// Returns `None` when no matching rule carries the property; the
    /// caller supplies the property-specific default. A lookup miss is
    /// not an error and produces no diagnostic.
    pub fn find_value<E: Element>(
        &self,
        element: &E,
        property: &str,
        cache: &mut MatchCache,
        diags: &mut Diagnostics,
    ) -> Option<Value> {
        let key = CacheKey::for_element(element);
        let matched = cache.get_or_compute(key, || self.compute_matches(element, diags));

        let mut winner: Option<&Value> = None;
        for (slot_index, rule_indices) in matched.slots.iter().enumerate() {
            for &rule_index in rule_indices {
                let rule = &self.rulesets[slot_index].rules[rule_index];
                if let Some(decl) = rule.declarations.iter().find(|d| d.property == property) {
                    winner = Some(&decl.value);
                }
            }
            // The style attribute outranks same-slot stylesheet rules.
            if slot_index == INLINE_NORMAL_SLOT || slot_index == INLINE_IMPORTANT_SLOT {
                let want_important = slot_index == INLINE_IMPORTANT_SLOT;
                if let Some(decl) = matched
                    .inline
                    .iter()
                    .find(|d| d.important == want_important && d.property == property)
                {
                    winner = Some(&decl.value);
                }
            }
        }
        winner.cloned()
    }

    /// Match every ruleset against the element and pre-sort the results.
    fn compute_matches<E: Element>(&self, element: &E, diags: &mut Diagnostics) -> MatchedRules {
        let mut matched = MatchedRules::default();
        for (slot_index, ruleset) in self.rulesets.iter().enumerate() {
            let hits = &mut matched.slots[slot_index];
            for (rule_index, rule) in ruleset.rules.iter().enumerate() {
                if rule.selector.matches(element) {
                    hits.push(rule_index);
                }
            }
            // Stable: equal specificity keeps insertion order, so the
            // later-declared rule wins the slot.
            hits.sort_by_key(|&i| ruleset.rules[i].selector.specificity());
        }
        if let Some(style_attr) = element.inline_style() {
            matched.inline = parse_inline_declarations(style_attr, diags);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StylesheetParser;
    use crate::selector::{Qualifier, SelectorBuilder};
    use crate::tokenizer::CssTokenizer;
    use crate::values::Rgba;
    use folio_dom::{DocTree, ElementData, NodeId};

    fn sheet(css: &str) -> Stylesheet {
        let mut diags = Diagnostics::new();
        StylesheetParser::new(CssTokenizer::new(css).run()).parse("all", &mut diags, None)
    }

    fn color_of(engine: &CascadeEngine, tree: &DocTree, id: NodeId) -> Option<Rgba> {
        let element = tree.element(id).expect("element node");
        let mut cache = MatchCache::new();
        let mut diags = Diagnostics::new();
        engine
            .find_value(&element, "color", &mut cache, &mut diags)
            .and_then(|v| v.as_color())
    }

    fn p_in_body() -> (DocTree, NodeId) {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p"));
        (tree, p)
    }

    #[test]
    fn test_later_origin_beats_earlier() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: blue; }"), Origin::UserAgent);
        engine.add_stylesheet(&sheet("p { color: red; }"), Origin::Author);
        let (tree, p) = p_in_body();
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_class_beats_type_within_origin() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(
            &sheet(".red { color: red; } p { color: blue; }"),
            Origin::Author,
        );
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p").with_attr("class", "red"));
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_equal_specificity_later_declaration_wins() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(
            &sheet("p { color: blue; } p { color: red; }"),
            Origin::Author,
        );
        let (tree, p) = p_in_body();
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_user_important_beats_author_important() {
        // Regardless of which stylesheet loads first.
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: red !important; }"), Origin::Author);
        engine.add_stylesheet(&sheet("p { color: green !important; }"), Origin::User);
        let (tree, p) = p_in_body();
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(0, 128, 0)));

        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: green !important; }"), Origin::User);
        engine.add_stylesheet(&sheet("p { color: red !important; }"), Origin::Author);
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(0, 128, 0)));
    }

    #[test]
    fn test_inline_style_beats_author_regardless_of_specificity() {
        // p { color: yellow } plus style="color:red" resolves to red.
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: yellow; }"), Origin::Author);
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p").with_attr("style", "color:red"));
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_user_important_beats_inline_important() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: green !important; }"), Origin::User);
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(
            body,
            ElementData::new("p").with_attr("style", "color: red !important"),
        );
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(0, 128, 0)));
    }

    #[test]
    fn test_inline_important_beats_inline_normal() {
        let engine = CascadeEngine::new();
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(
            body,
            ElementData::new("p").with_attr("style", "color: red !important; color: blue"),
        );
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_miss_returns_none() {
        let engine = CascadeEngine::new();
        let (tree, p) = p_in_body();
        assert_eq!(color_of(&engine, &tree, p), None);
    }

    #[test]
    fn test_redeclared_selector_merges_in_place() {
        let mut engine = CascadeEngine::new();
        let selector = {
            let mut b = SelectorBuilder::new();
            b.set_tag("p");
            b.freeze()
        };
        engine.insert_rule(
            &selector,
            vec![Declaration {
                property: "color".to_string(),
                value: Value::Color(Rgba::rgb(0, 0, 255)),
                important: false,
            }],
            Origin::Author,
            false,
        );
        // Same selector again: merged, not appended.
        engine.insert_rule(
            &selector,
            vec![Declaration {
                property: "color".to_string(),
                value: Value::Color(Rgba::rgb(255, 0, 0)),
                important: false,
            }],
            Origin::Author,
            false,
        );
        assert_eq!(engine.rulesets[slot(Origin::Author, false)].rules.len(), 1);
        let (tree, p) = p_in_body();
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn test_descendant_combinator_through_cascade() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("body p { color: red; }"), Origin::Author);
        let (tree, p) = p_in_body();
        assert_eq!(color_of(&engine, &tree, p), Some(Rgba::rgb(255, 0, 0)));

        // An orphan p (no body ancestor) does not match.
        let mut lone = DocTree::new();
        let div = lone.append_element(NodeId::ROOT, ElementData::new("div"));
        let p2 = lone.append_element(div, ElementData::new("p"));
        assert_eq!(color_of(&engine, &lone, p2), None);
    }

    #[test]
    fn test_cache_hits_identical_siblings() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: red; }"), Origin::Author);
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let first = tree.append_element(body, ElementData::new("p"));
        let second = tree.append_element(body, ElementData::new("p"));

        let mut cache = MatchCache::new();
        let mut diags = Diagnostics::new();
        let a = engine.find_value(
            &tree.element(first).expect("element"),
            "color",
            &mut cache,
            &mut diags,
        );
        assert_eq!(cache.len(), 1);
        let b = engine.find_value(
            &tree.element(second).expect("element"),
            "color",
            &mut cache,
            &mut diags,
        );
        // Identical siblings share one entry and resolve identically.
        assert_eq!(cache.len(), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_resets_at_capacity() {
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet("p { color: red; }"), Origin::Author);
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let ids: Vec<_> = (0..4)
            .map(|i| {
                tree.append_element(
                    body,
                    ElementData::new("p").with_attr("id", &format!("p{i}")),
                )
            })
            .collect();

        let mut cache = MatchCache::with_capacity(2);
        let mut diags = Diagnostics::new();
        for id in ids {
            let value = engine.find_value(
                &tree.element(id).expect("element"),
                "color",
                &mut cache,
                &mut diags,
            );
            assert!(value.is_some());
            assert!(cache.len() <= 2);
        }
    }
}
