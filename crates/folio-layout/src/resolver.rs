//! Style resolution and fragment accumulation over the document tree.
//!
//! One depth-first walk visits every element: the resolver clones the
//! parent's [`StyleState`] on entry, asks the cascade engine for each
//! recognized property, applies type-specific coercion, and pushes the
//! result. Text under the element splits per its `white-space` mode
//! into `Word`/`Space` fragments stamped with a snapshot of the current
//! state. Exit pops the state; nothing is referenced after pop.
//!
//! Block-level elements flush the in-progress fragment list both on
//! entry (closing the previous sibling's trailing inline run) and on
//! exit. Break properties enqueue explicit break tokens into the output
//! stream at flush time.

use folio_common::Diagnostics;
use folio_css::values::{Edges, expand_box_shorthand};
use folio_css::{CascadeEngine, MatchCache, Unit, Value};
use folio_dom::{DocTree, Element, ElementRef, NodeId, NodeType};

use crate::fragment::Fragment;
use crate::output::{BreakKind, LayoutItem};
use crate::paragraph::Paragraph;
use crate::style::{
    BorderSide, BorderStyle, DEFAULT_LEADING_FACTOR, Direction, ListStyle, StyleSnapshot,
    StyleState, TextAlign, VerticalAlign, WhiteSpace,
};
use crate::table::{Cell, TableData, TrackSize};
use crate::text::TextMeasure;

/// Closed classification of tag behavior, matched once per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    /// Starts and ends a paragraph flush.
    Block,
    /// Flows inline; opens a box when it carries decoration.
    Inline,
    /// Forces a line break.
    LineBreak,
    /// An inline replaced image.
    Image,
    /// A table grid.
    Table,
    /// A table row container (`thead`/`tbody`/`tfoot`).
    RowGroup,
    /// A table row.
    Row,
    /// A table cell.
    Cell,
    /// Renders the current page number.
    PageNumber,
    /// Renders the total page count.
    PageCount,
    /// Subtree contributes nothing to layout.
    Skipped,
}

/// The tag behavior table. Unknown tags flow inline, matching the HTML
/// default display.
#[must_use]
pub fn classify(tag: &str) -> ElementClass {
    match tag {
        "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre" | "ul"
        | "ol" | "li" | "dl" | "dt" | "dd" | "fieldset" | "form" | "hr" | "address" => {
            ElementClass::Block
        }
        "br" => ElementClass::LineBreak,
        "img" => ElementClass::Image,
        "table" => ElementClass::Table,
        "thead" | "tbody" | "tfoot" => ElementClass::RowGroup,
        "tr" => ElementClass::Row,
        "td" | "th" => ElementClass::Cell,
        "pdf:pagenumber" => ElementClass::PageNumber,
        "pdf:pagecount" => ElementClass::PageCount,
        "head" | "script" | "style" | "title" | "meta" | "link" => ElementClass::Skipped,
        _ => ElementClass::Inline,
    }
}

/// Walks a document tree against a cascade engine and produces the
/// layout item stream.
pub struct StyleResolver<'a> {
    engine: &'a CascadeEngine,
    measure: &'a dyn TextMeasure,
    cache: MatchCache,
    diags: Diagnostics,
    stack: Vec<StyleState>,
    fragments: Vec<Fragment>,
    items: Vec<LayoutItem>,
}

impl<'a> StyleResolver<'a> {
    /// A resolver over the given engine and measurement collaborator.
    #[must_use]
    pub fn new(engine: &'a CascadeEngine, measure: &'a dyn TextMeasure) -> Self {
        Self {
            engine,
            measure,
            cache: MatchCache::new(),
            diags: Diagnostics::new(),
            stack: vec![StyleState::root()],
            fragments: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Walk the whole tree and return the layout items plus the run's
    /// accumulated diagnostics.
    #[must_use]
    pub fn resolve(mut self, tree: &DocTree) -> (Vec<LayoutItem>, Diagnostics) {
        self.walk_children(tree, tree.root());
        self.flush();
        (self.items, self.diags)
    }

    fn state(&self) -> &StyleState {
        // The root state is never popped.
        self.stack.last().unwrap_or_else(|| unreachable!())
    }

    fn walk_children(&mut self, tree: &DocTree, id: NodeId) {
        for &child in tree.children(id) {
            self.walk(tree, child);
        }
    }

    fn walk(&mut self, tree: &DocTree, id: NodeId) {
        let Some(node) = tree.get(id) else { return };
        match &node.node_type {
            NodeType::Document => self.walk_children(tree, id),
            NodeType::Text(text) => self.emit_text(text),
            NodeType::Element(_) => {
                if let Some(element) = tree.element(id) {
                    self.visit_element(tree, id, &element);
                }
            }
        }
    }

    fn visit_element(&mut self, tree: &DocTree, id: NodeId, element: &ElementRef<'_>) {
        let class = self
            .display_override(element)
            .unwrap_or_else(|| classify(element.tag_name()));
        if class == ElementClass::Skipped {
            return;
        }

        let mut state = self.state().clone();
        reset_non_inherited(&mut state);
        self.apply_properties(&mut state, element);
        apply_tag_defaults(&mut state, element);

        match class {
            ElementClass::Block => {
                self.flush();
                self.emit_breaks(element, true);
                self.stack.push(state);
                self.walk_children(tree, id);
                if let Some(closed) = self.stack.pop() {
                    self.flush_under(closed.snapshot());
                }
                self.emit_breaks(element, false);
            }
            ElementClass::Inline => {
                let decorated = state.background.is_some()
                    || state.border.top.is_visible()
                    || state.border.right.is_visible()
                    || state.border.bottom.is_visible()
                    || state.border.left.is_visible();
                if decorated {
                    self.fragments.push(Fragment::BoxBegin {
                        style: state.snapshot(),
                    });
                }
                self.stack.push(state);
                self.walk_children(tree, id);
                let _ = self.stack.pop();
                if decorated {
                    self.fragments.push(Fragment::BoxEnd);
                }
            }
            ElementClass::LineBreak => self.fragments.push(Fragment::LineBreak),
            ElementClass::Image => self.emit_image(element, &state),
            ElementClass::PageNumber => {
                self.fragments
                    .push(Fragment::page_placeholder(&state, self.measure, false));
            }
            ElementClass::PageCount => {
                self.fragments
                    .push(Fragment::page_placeholder(&state, self.measure, true));
            }
            ElementClass::Table => {
                self.flush();
                self.emit_breaks(element, true);
                self.stack.push(state);
                let table = self.build_table(tree, id);
                let _ = self.stack.pop();
                self.items.push(LayoutItem::Table(Box::new(table)));
                self.emit_breaks(element, false);
            }
            // Row structure outside a table contributes nothing of its
            // own; content still flows.
            ElementClass::RowGroup | ElementClass::Row | ElementClass::Cell => {
                self.stack.push(state);
                self.walk_children(tree, id);
                let _ = self.stack.pop();
            }
            ElementClass::Skipped => {}
        }
    }

    /// `display` beats the tag table when the cascade sets it.
    fn display_override(&mut self, element: &ElementRef<'_>) -> Option<ElementClass> {
        let value =
            self.engine
                .find_value(element, "display", &mut self.cache, &mut self.diags)?;
        match value.as_ident()?.as_str() {
            "block" | "list-item" => Some(ElementClass::Block),
            "inline" => Some(ElementClass::Inline),
            "none" => Some(ElementClass::Skipped),
            _ => None,
        }
    }

    /// Close the in-progress fragment list into a paragraph under the
    /// current (parent) style.
    fn flush(&mut self) {
        let style = self.state().snapshot();
        self.flush_under(style);
    }

    /// Close the in-progress fragment list under the given block style.
    /// Lists holding no real content (only spaces and box markers) are
    /// dropped.
    fn flush_under(&mut self, style: StyleSnapshot) {
        let has_content = self.fragments.iter().any(|f| {
            !matches!(
                f,
                Fragment::Space { .. } | Fragment::BoxBegin { .. } | Fragment::BoxEnd
            )
        });
        if !has_content {
            self.fragments.clear();
            return;
        }
        let fragments = std::mem::take(&mut self.fragments);
        self.items
            .push(LayoutItem::Paragraph(Paragraph::new(fragments, style)));
    }

    /// Enqueue explicit break tokens from the cascaded break
    /// properties. `entering` selects the before/after side. The vendor
    /// forms name the side as their value; the standard properties name
    /// it in the property.
    fn emit_breaks(&mut self, element: &ElementRef<'_>, entering: bool) {
        let side = if entering { "before" } else { "after" };
        let property = if entering {
            "page-break-before"
        } else {
            "page-break-after"
        };
        let css_page = self
            .engine
            .find_value(element, property, &mut self.cache, &mut self.diags)
            .and_then(|v| v.as_ident())
            .is_some_and(|k| matches!(k.as_str(), "always" | "left" | "right" | "page"));
        let pdf_page = self
            .engine
            .find_value(element, "-pdf-page-break", &mut self.cache, &mut self.diags)
            .and_then(|v| v.as_ident())
            .is_some_and(|k| k == side);
        if css_page || pdf_page {
            self.items.push(LayoutItem::ExplicitBreak(BreakKind::Page));
        }

        let frame = self
            .engine
            .find_value(element, "-pdf-frame-break", &mut self.cache, &mut self.diags)
            .and_then(|v| v.as_ident())
            .is_some_and(|k| k == side);
        if frame {
            self.items.push(LayoutItem::ExplicitBreak(BreakKind::Frame));
        }
    }

    /// Split text per the `white-space` mode and append word/space
    /// fragments carrying the current style snapshot.
    fn emit_text(&mut self, text: &str) {
        let state = self.state().clone();
        match state.white_space {
            WhiteSpace::Normal => self.emit_collapsed(text, &state),
            WhiteSpace::Pre => self.emit_preformatted(text, &state),
        }
    }

    /// Runs of whitespace collapse to a single space fragment; a run at
    /// the very start of a block is dropped entirely.
    fn emit_collapsed(&mut self, text: &str, state: &StyleState) {
        let mut rest = text;
        while !rest.is_empty() {
            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() {
                if !matches!(self.fragments.last(), None | Some(Fragment::Space { .. })) {
                    self.fragments.push(Fragment::space(state, self.measure));
                }
                rest = trimmed;
                continue;
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            self.fragments
                .push(Fragment::word(&rest[..end], state, self.measure));
            rest = &rest[end..];
        }
    }

    /// Newlines become line breaks, tabs become spaces, nothing
    /// collapses.
    fn emit_preformatted(&mut self, text: &str, state: &StyleState) {
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.fragments.push(Fragment::LineBreak);
            }
            let mut word = String::new();
            for c in line.chars() {
                if c == ' ' || c == '\t' {
                    if !word.is_empty() {
                        self.fragments
                            .push(Fragment::word(&word, state, self.measure));
                        word.clear();
                    }
                    self.fragments.push(Fragment::space(state, self.measure));
                } else {
                    word.push(c);
                }
            }
            if !word.is_empty() {
                self.fragments
                    .push(Fragment::word(&word, state, self.measure));
            }
        }
    }

    fn emit_image(&mut self, element: &ElementRef<'_>, state: &StyleState) {
        let Some(source) = element.attr("src").map(str::to_string) else {
            self.diags.warn("resolver", "img without src; skipping");
            return;
        };
        let width = self
            .length_property(element, "width", state)
            .or_else(|| attr_points(element, "width"))
            .unwrap_or(0.0);
        let height = self
            .length_property(element, "height", state)
            .or_else(|| attr_points(element, "height"))
            .unwrap_or(0.0);
        if width <= 0.0 || height <= 0.0 {
            self.diags.warn(
                "resolver",
                &format!("image '{source}' with unresolved size; using 1pt placeholder"),
            );
        }
        self.fragments.push(Fragment::Image {
            source,
            width: width.max(1.0),
            height: height.max(1.0),
            valign: state.vertical_align,
            link: state.link.clone(),
        });
    }

    fn length_property(
        &mut self,
        element: &ElementRef<'_>,
        property: &str,
        state: &StyleState,
    ) -> Option<f64> {
        self.engine
            .find_value(element, property, &mut self.cache, &mut self.diags)?
            .to_points(state.font_size, 0.0)
            .filter(|v| *v > 0.0)
    }

    /// Build a table model from a `<table>` subtree: rows row-major,
    /// cell content collected by a nested fragment run.
    fn build_table(&mut self, tree: &DocTree, table_id: NodeId) -> TableData {
        let mut table = TableData::new();
        let mut first_row = true;
        self.collect_rows(tree, table_id, &mut table, &mut first_row);
        table
    }

    fn collect_rows(
        &mut self,
        tree: &DocTree,
        id: NodeId,
        table: &mut TableData,
        first_row: &mut bool,
    ) {
        for &child in tree.children(id) {
            let Some(element) = tree.element(child) else {
                continue;
            };
            match classify(element.tag_name()) {
                ElementClass::RowGroup => self.collect_rows(tree, child, table, first_row),
                ElementClass::Row => {
                    table.start_row();
                    self.collect_cells(tree, child, table, *first_row);
                    *first_row = false;
                }
                _ => {}
            }
        }
    }

    fn collect_cells(
        &mut self,
        tree: &DocTree,
        row_id: NodeId,
        table: &mut TableData,
        first_row: bool,
    ) {
        let mut col = 0usize;
        for &child in tree.children(row_id) {
            let Some(element) = tree.element(child) else {
                continue;
            };
            if classify(element.tag_name()) != ElementClass::Cell {
                continue;
            }
            let mut state = self.state().clone();
            reset_non_inherited(&mut state);
            self.apply_properties(&mut state, &element);
            if element.tag_name() == "th" {
                state.bold = true;
                state.align = TextAlign::Center;
            }

            // Declared widths land on each cell's first column; only
            // the first row declares.
            if first_row
                && let Some(size) = self.track_size(&element, &state)
            {
                table.set_column_size(col, size);
            }
            let height = self
                .length_property(&element, "height", &state)
                .or_else(|| attr_points(&element, "height"));

            let colspan = attr_usize(&element, "colspan");
            let rowspan = attr_usize(&element, "rowspan");

            // Nested run: the cell's subtree fills its own list.
            let outer = std::mem::take(&mut self.fragments);
            self.stack.push(state.clone());
            self.walk_children(tree, child);
            let _ = self.stack.pop();
            let fragments = std::mem::replace(&mut self.fragments, outer);

            table.add_cell(Cell {
                fragments,
                style: state.snapshot(),
                colspan,
                rowspan,
                height,
            });
            col += colspan;
        }
    }

    /// A cell's declared width as a column track size: percent stays
    /// percent, lengths resolve to points, the `width` attribute is the
    /// fallback.
    fn track_size(&mut self, element: &ElementRef<'_>, state: &StyleState) -> Option<TrackSize> {
        if let Some(value) =
            self.engine
                .find_value(element, "width", &mut self.cache, &mut self.diags)
        {
            if let Value::Number {
                value: percent,
                unit: Some(Unit::Percent),
            } = value
            {
                return Some(TrackSize::Percent(percent));
            }
            if let Some(points) = value.to_points(state.font_size, 0.0).filter(|v| *v > 0.0) {
                return Some(TrackSize::Fixed(points));
            }
        }
        let attr = element.attr("width")?;
        if let Some(percent) = attr.strip_suffix('%') {
            return percent.trim().parse::<f64>().ok().map(TrackSize::Percent);
        }
        attr.trim().parse::<f64>().ok().map(TrackSize::Fixed)
    }

    /// Resolve one property, honoring an explicit `inherit` keyword by
    /// copying the parent's already-resolved field. The keyword never
    /// reaches the caller's coercion; properties outside the copy table
    /// keep their initial value with a warning.
    fn property_value(
        &mut self,
        element: &ElementRef<'_>,
        property: &str,
        state: &mut StyleState,
        parent: &StyleState,
    ) -> Option<Value> {
        let value = self
            .engine
            .find_value(element, property, &mut self.cache, &mut self.diags)?;
        if value.as_ident().is_some_and(|k| k == "inherit") {
            if !copy_inherited(state, parent, property) {
                self.diags.warn(
                    "resolver",
                    &format!("'{property}: inherit' has no inheritable field; keeping initial"),
                );
            }
            return None;
        }
        Some(value)
    }

    /// Resolve the fixed property list into the style state.
    ///
    /// Order matters only where shorthands overlap their longhands:
    /// shorthand first, longhand refinements after.
    fn apply_properties(&mut self, state: &mut StyleState, element: &ElementRef<'_>) {
        let parent_size = state.font_size;
        // The stack top is still the parent here; its resolved fields
        // are what an explicit `inherit` copies.
        let parent = self.state().clone();

        if let Some(value) = self.property_value(element, "font-family", state, &parent) {
            let families: Vec<String> = value
                .components()
                .iter()
                .filter_map(|v| match v {
                    Value::Ident(name) | Value::StringLit(name) => {
                        Some(name.to_ascii_lowercase())
                    }
                    _ => None,
                })
                .collect();
            if !families.is_empty() {
                state.font_family = families;
            }
        }
        if let Some(points) = self
            .property_value(element, "font-size", state, &parent)
            .and_then(|v| font_size_points(&v, parent_size))
        {
            state.font_size = points;
            state.leading = points * DEFAULT_LEADING_FACTOR;
        }
        if let Some(bold) = self
            .property_value(element, "font-weight", state, &parent)
            .and_then(|v| weight_keyword(&v))
        {
            state.bold = bold;
        }
        if let Some(keyword) = self
            .property_value(element, "font-style", state, &parent)
            .and_then(|v| v.as_ident())
        {
            state.italic = matches!(keyword.as_str(), "italic" | "oblique");
        }
        if let Some(color) = self
            .property_value(element, "color", state, &parent)
            .and_then(|v| v.as_color())
        {
            state.color = color;
        }
        if let Some(color) = self
            .property_value(element, "background-color", state, &parent)
            .or_else(|| self.property_value(element, "background", state, &parent))
            .and_then(|v| v.as_color())
        {
            state.background = Some(color);
        }
        if let Some(align) = self
            .property_value(element, "text-align", state, &parent)
            .and_then(|v| v.as_ident())
            .and_then(|k| k.parse::<TextAlign>().ok())
        {
            state.align = align;
        }
        if let Some(mode) = self
            .property_value(element, "white-space", state, &parent)
            .and_then(|v| v.as_ident())
            .and_then(|k| k.parse::<WhiteSpace>().ok())
        {
            state.white_space = mode;
        }
        if let Some(direction) = self
            .property_value(element, "direction", state, &parent)
            .and_then(|v| v.as_ident())
            .and_then(|k| k.parse::<Direction>().ok())
        {
            state.direction = direction;
        }
        if let Some(value) = self.property_value(element, "text-decoration", state, &parent) {
            for part in value.components() {
                match part.as_ident().as_deref() {
                    Some("underline") => state.underline = true,
                    Some("line-through") => state.strike = true,
                    Some("none") => {
                        state.underline = false;
                        state.strike = false;
                    }
                    _ => {}
                }
            }
        }
        if let Some(leading) = self
            .property_value(element, "line-height", state, &parent)
            .and_then(|v| leading_points(&v, state.font_size))
        {
            state.leading = leading;
        }
        if let Some(points) = self
            .property_value(element, "letter-spacing", state, &parent)
            .and_then(|v| v.to_points(state.font_size, 0.0))
        {
            state.letter_spacing = points;
        }
        if let Some(points) = self
            .property_value(element, "word-spacing", state, &parent)
            .and_then(|v| v.to_points(state.font_size, 0.0))
        {
            state.word_spacing = points;
        }
        if let Some(points) = self
            .property_value(element, "text-indent", state, &parent)
            .and_then(|v| v.to_points(state.font_size, 0.0))
        {
            state.first_line_indent = points;
        }
        if let Some(Value::Number { value, unit: None }) =
            self.property_value(element, "zoom", state, &parent)
            && value > 0.0
        {
            state.zoom = value;
        }
        if let Some(style) = self
            .property_value(element, "list-style-type", state, &parent)
            .or_else(|| self.property_value(element, "list-style", state, &parent))
            .and_then(|v| v.as_ident())
            .and_then(|k| k.parse::<ListStyle>().ok())
        {
            state.list_style = style;
        }
        if let Some(keyword) = self
            .property_value(element, "vertical-align", state, &parent)
            .and_then(|v| v.as_ident())
        {
            match keyword.as_str() {
                "sub" => state.sub = true,
                "super" => state.superscript = true,
                other => {
                    if let Ok(valign) = other.parse::<VerticalAlign>() {
                        state.vertical_align = valign;
                    }
                }
            }
        }

        self.apply_margins(state, element, &parent);
        self.apply_padding(state, element, &parent);
        self.apply_borders(state, element, &parent);

        // Hyperlink state comes from the anchor's own attribute.
        if element.tag_name() == "a"
            && let Some(href) = element.attr("href")
        {
            state.link = Some(href.to_string());
        }
    }

    fn apply_margins(
        &mut self,
        state: &mut StyleState,
        element: &ElementRef<'_>,
        parent: &StyleState,
    ) {
        let em = state.font_size;
        if let Some(value) = self.property_value(element, "margin", state, parent)
            && let Some(edges) = expand_box_shorthand(&value.components())
        {
            state.margin.top = edges.top.to_points(em, 0.0).unwrap_or(0.0);
            state.margin.right = edges.right.to_points(em, 0.0).unwrap_or(0.0);
            state.margin.bottom = edges.bottom.to_points(em, 0.0).unwrap_or(0.0);
            state.margin.left = edges.left.to_points(em, 0.0).unwrap_or(0.0);
        }
        for property in ["margin-top", "margin-right", "margin-bottom", "margin-left"] {
            let Some(points) = self
                .property_value(element, property, state, parent)
                .and_then(|v| v.to_points(em, 0.0))
            else {
                continue;
            };
            match property {
                "margin-top" => state.margin.top = points,
                "margin-right" => state.margin.right = points,
                "margin-bottom" => state.margin.bottom = points,
                _ => state.margin.left = points,
            }
        }
        state.space_before = state.margin.top;
        state.space_after = state.margin.bottom;
        state.indent_left = state.margin.left;
        state.indent_right = state.margin.right;
    }

    fn apply_padding(
        &mut self,
        state: &mut StyleState,
        element: &ElementRef<'_>,
        parent: &StyleState,
    ) {
        let em = state.font_size;
        if let Some(value) = self.property_value(element, "padding", state, parent)
            && let Some(edges) = expand_box_shorthand(&value.components())
        {
            state.padding.top = edges.top.to_points(em, 0.0).unwrap_or(0.0);
            state.padding.right = edges.right.to_points(em, 0.0).unwrap_or(0.0);
            state.padding.bottom = edges.bottom.to_points(em, 0.0).unwrap_or(0.0);
            state.padding.left = edges.left.to_points(em, 0.0).unwrap_or(0.0);
        }
        for property in [
            "padding-top",
            "padding-right",
            "padding-bottom",
            "padding-left",
        ] {
            let Some(points) = self
                .property_value(element, property, state, parent)
                .and_then(|v| v.to_points(em, 0.0))
            else {
                continue;
            };
            match property {
                "padding-top" => state.padding.top = points,
                "padding-right" => state.padding.right = points,
                "padding-bottom" => state.padding.bottom = points,
                _ => state.padding.left = points,
            }
        }
    }

    fn apply_borders(
        &mut self,
        state: &mut StyleState,
        element: &ElementRef<'_>,
        parent: &StyleState,
    ) {
        let em = state.font_size;
        // `border` shorthand: width, style, color in any order.
        if let Some(value) = self.property_value(element, "border", state, parent) {
            let mut side = BorderSide::default();
            for part in value.components() {
                if let Some(points) = part.to_points(em, 0.0) {
                    side.width = points;
                } else if let Some(color) = part.as_color() {
                    side.color = Some(color);
                } else if let Some(style) =
                    part.as_ident().and_then(|k| k.parse::<BorderStyle>().ok())
                {
                    side.style = style;
                }
            }
            if side.style == BorderStyle::None && side.width > 0.0 {
                side.style = BorderStyle::Solid;
            }
            state.border = Edges::uniform(side);
        }
        if let Some(value) = self.property_value(element, "border-width", state, parent)
            && let Some(edges) = expand_box_shorthand(&value.components())
        {
            state.border.top.width = edges.top.to_points(em, 0.0).unwrap_or(0.0);
            state.border.right.width = edges.right.to_points(em, 0.0).unwrap_or(0.0);
            state.border.bottom.width = edges.bottom.to_points(em, 0.0).unwrap_or(0.0);
            state.border.left.width = edges.left.to_points(em, 0.0).unwrap_or(0.0);
        }
        if let Some(value) = self.property_value(element, "border-style", state, parent)
            && let Some(edges) = expand_box_shorthand(&value.components())
        {
            let parse = |v: &Value| {
                v.as_ident()
                    .and_then(|k| k.parse::<BorderStyle>().ok())
                    .unwrap_or_default()
            };
            state.border.top.style = parse(&edges.top);
            state.border.right.style = parse(&edges.right);
            state.border.bottom.style = parse(&edges.bottom);
            state.border.left.style = parse(&edges.left);
        }
        if let Some(value) = self.property_value(element, "border-color", state, parent)
            && let Some(edges) = expand_box_shorthand(&value.components())
        {
            state.border.top.color = edges.top.as_color();
            state.border.right.color = edges.right.as_color();
            state.border.bottom.color = edges.bottom.as_color();
            state.border.left.color = edges.left.as_color();
        }
    }
}

/// Box model properties do not inherit; clear them before applying the
/// element's own cascade results.
fn reset_non_inherited(state: &mut StyleState) {
    state.background = None;
    state.border = Edges::default();
    state.padding = Edges::default();
    state.margin = Edges::default();
    state.space_before = 0.0;
    state.space_after = 0.0;
    state.indent_left = 0.0;
    state.indent_right = 0.0;
    state.first_line_indent = 0.0;
    state.page_number = false;
    state.page_count = false;
}

/// Copy the parent's resolved field(s) for an explicit `inherit`
/// declaration. Returns `false` for properties with no entry in the
/// table. At the document root the parent is the initial state, so
/// `inherit` degrades to the initial value.
fn copy_inherited(state: &mut StyleState, parent: &StyleState, property: &str) -> bool {
    match property {
        "font-family" => state.font_family = parent.font_family.clone(),
        "font-size" => {
            state.font_size = parent.font_size;
            state.leading = parent.leading;
        }
        "font-weight" => state.bold = parent.bold,
        "font-style" => state.italic = parent.italic,
        "color" => state.color = parent.color,
        "background" | "background-color" => state.background = parent.background,
        "text-align" => state.align = parent.align,
        "white-space" => state.white_space = parent.white_space,
        "direction" => state.direction = parent.direction,
        "text-decoration" => {
            state.underline = parent.underline;
            state.strike = parent.strike;
        }
        "line-height" => state.leading = parent.leading,
        "letter-spacing" => state.letter_spacing = parent.letter_spacing,
        "word-spacing" => state.word_spacing = parent.word_spacing,
        "text-indent" => state.first_line_indent = parent.first_line_indent,
        "zoom" => state.zoom = parent.zoom,
        "list-style" | "list-style-type" => state.list_style = parent.list_style,
        "vertical-align" => {
            state.vertical_align = parent.vertical_align;
            state.sub = parent.sub;
            state.superscript = parent.superscript;
        }
        "margin" => state.margin = parent.margin,
        "margin-top" => state.margin.top = parent.margin.top,
        "margin-right" => state.margin.right = parent.margin.right,
        "margin-bottom" => state.margin.bottom = parent.margin.bottom,
        "margin-left" => state.margin.left = parent.margin.left,
        "padding" => state.padding = parent.padding,
        "padding-top" => state.padding.top = parent.padding.top,
        "padding-right" => state.padding.right = parent.padding.right,
        "padding-bottom" => state.padding.bottom = parent.padding.bottom,
        "padding-left" => state.padding.left = parent.padding.left,
        "border" | "border-width" | "border-style" | "border-color" => {
            state.border = parent.border;
        }
        _ => return false,
    }
    true
}

/// Tag-intrinsic styling the built-in stylesheet layer would otherwise
/// carry.
fn apply_tag_defaults(state: &mut StyleState, element: &ElementRef<'_>) {
    match element.tag_name() {
        "b" | "strong" => state.bold = true,
        "i" | "em" => state.italic = true,
        "u" | "ins" => state.underline = true,
        "s" | "strike" | "del" => state.strike = true,
        "sub" => state.sub = true,
        "sup" => state.superscript = true,
        "pre" => state.white_space = WhiteSpace::Pre,
        "center" => state.align = TextAlign::Center,
        "h1" => scale_heading(state, 2.0),
        "h2" => scale_heading(state, 1.5),
        "h3" => scale_heading(state, 1.17),
        _ => {}
    }
}

fn scale_heading(state: &mut StyleState, factor: f64) {
    state.font_size *= factor;
    state.leading = state.font_size * DEFAULT_LEADING_FACTOR;
    state.bold = true;
}

/// `font-size` coercion: lengths, percentages and `em` resolve against
/// the parent size; the absolute keywords map to the HTML scale.
fn font_size_points(value: &Value, parent_size: f64) -> Option<f64> {
    if let Some(keyword) = value.as_ident() {
        let factor = match keyword.as_str() {
            "xx-small" => 0.6,
            "x-small" => 0.75,
            "small" => 0.89,
            "medium" => 1.0,
            "large" => 1.2,
            "x-large" => 1.5,
            "xx-large" => 2.0,
            "smaller" => 0.85,
            "larger" => 1.18,
            _ => return None,
        };
        return Some(parent_size * factor);
    }
    value
        .to_points(parent_size, parent_size)
        .filter(|v| *v > 0.0)
}

/// `line-height` coercion: a unitless number is a factor of the font
/// size, everything else resolves as a length or percentage of it.
fn leading_points(value: &Value, font_size: f64) -> Option<f64> {
    match value {
        Value::Number { value, unit: None } if *value > 0.0 => Some(value * font_size),
        Value::Ident(keyword) if keyword.eq_ignore_ascii_case("normal") => {
            Some(font_size * DEFAULT_LEADING_FACTOR)
        }
        other => other.to_points(font_size, font_size).filter(|v| *v > 0.0),
    }
}

/// `font-weight` coercion to the bold flag.
fn weight_keyword(value: &Value) -> Option<bool> {
    match value {
        Value::Ident(keyword) => match keyword.to_ascii_lowercase().as_str() {
            "bold" | "bolder" => Some(true),
            "normal" | "lighter" => Some(false),
            _ => None,
        },
        Value::Number { value, unit: None } => Some(*value >= 600.0),
        _ => None,
    }
}

fn attr_points(element: &ElementRef<'_>, name: &str) -> Option<f64> {
    element
        .attr(name)?
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|v| *v > 0.0)
}

fn attr_usize(element: &ElementRef<'_>, name: &str) -> usize {
    element
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ApproximateTextMeasure;
    use folio_css::{Origin, StylesheetParser, StylesheetSource};
    use folio_dom::ElementData;

    fn engine_from(css: &str) -> CascadeEngine {
        let mut diags = Diagnostics::new();
        let tokens = StylesheetSource::new(css).tokenize().expect("tokenize");
        let sheet = StylesheetParser::new(tokens).parse("print", &mut diags, None);
        let mut engine = CascadeEngine::new();
        engine.add_stylesheet(&sheet, Origin::Author);
        engine
    }

    fn resolve(tree: &DocTree, css: &str) -> Vec<LayoutItem> {
        let engine = engine_from(css);
        let measure = ApproximateTextMeasure;
        let (items, _diags) = StyleResolver::new(&engine, &measure).resolve(tree);
        items
    }

    fn first_paragraph(items: &[LayoutItem]) -> &Paragraph {
        items
            .iter()
            .find_map(|item| match item {
                LayoutItem::Paragraph(p) => Some(p),
                _ => None,
            })
            .expect("no paragraph in output")
    }

    #[test]
    fn test_text_collapses_whitespace_runs() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p, "hello   brave\n  world");

        let items = resolve(&tree, "");
        let paragraph = first_paragraph(&items);
        let words: Vec<&str> = paragraph
            .fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Word { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(words, vec!["hello", "brave", "world"]);
        let spaces = paragraph
            .fragments
            .iter()
            .filter(|f| f.is_soft_break())
            .count();
        assert_eq!(spaces, 2);
    }

    #[test]
    fn test_pre_preserves_breaks_and_spaces() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let pre = tree.append_element(body, ElementData::new("pre"));
        let _ = tree.append_text(pre, "a  b\nc");

        let items = resolve(&tree, "");
        let paragraph = first_paragraph(&items);
        let spaces = paragraph
            .fragments
            .iter()
            .filter(|f| f.is_soft_break())
            .count();
        let breaks = paragraph
            .fragments
            .iter()
            .filter(|f| matches!(f, Fragment::LineBreak))
            .count();
        assert_eq!(spaces, 2);
        assert_eq!(breaks, 1);
    }

    #[test]
    fn test_styles_reach_fragments() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p").with_attr("class", "warn"));
        let _ = tree.append_text(p, "careful");

        let items = resolve(&tree, ".warn { color: red; font-size: 14pt }");
        let paragraph = first_paragraph(&items);
        let Some(Fragment::Word { style, .. }) = paragraph.fragments.first() else {
            panic!("expected a word");
        };
        assert_eq!(style.color, folio_css::Rgba::rgb(255, 0, 0));
        assert!((style.font_size - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_inline_style_attribute_wins() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p").with_attr("style", "color: red"));
        let _ = tree.append_text(p, "x");

        let items = resolve(&tree, "p { color: yellow }");
        let paragraph = first_paragraph(&items);
        let Some(Fragment::Word { style, .. }) = paragraph.fragments.first() else {
            panic!("expected a word");
        };
        assert_eq!(style.color, folio_css::Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn test_bold_tag_and_anchor_link() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p"));
        let a = tree.append_element(
            p,
            ElementData::new("a").with_attr("href", "https://example.org"),
        );
        let b = tree.append_element(a, ElementData::new("b"));
        let _ = tree.append_text(b, "go");

        let items = resolve(&tree, "");
        let paragraph = first_paragraph(&items);
        let Some(Fragment::Word { style, .. }) = paragraph.fragments.first() else {
            panic!("expected a word");
        };
        assert!(style.bold);
        assert_eq!(style.link.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn test_block_boundaries_flush_paragraphs() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p1 = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p1, "one");
        let p2 = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p2, "two");

        let items = resolve(&tree, "");
        let paragraphs = items
            .iter()
            .filter(|i| matches!(i, LayoutItem::Paragraph(_)))
            .count();
        assert_eq!(paragraphs, 2);
    }

    #[test]
    fn test_page_break_before_emits_token() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p1 = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p1, "first");
        let p2 = tree.append_element(body, ElementData::new("p").with_attr("class", "fresh"));
        let _ = tree.append_text(p2, "second");

        let items = resolve(&tree, ".fresh { page-break-before: always }");
        let positions: Vec<usize> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                matches!(item, LayoutItem::ExplicitBreak(BreakKind::Page)).then_some(i)
            })
            .collect();
        assert_eq!(positions.len(), 1);
        // The break sits between the two paragraphs.
        assert!(matches!(items[positions[0] - 1], LayoutItem::Paragraph(_)));
        assert!(matches!(items[positions[0] + 1], LayoutItem::Paragraph(_)));
    }

    #[test]
    fn test_pdf_page_break_emits_page_token() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p1 = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p1, "first");
        let p2 = tree.append_element(body, ElementData::new("p").with_attr("class", "fresh"));
        let _ = tree.append_text(p2, "second");

        // The vendor property names the side as its value.
        let items = resolve(&tree, ".fresh { -pdf-page-break: before }");
        let positions: Vec<usize> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                matches!(item, LayoutItem::ExplicitBreak(BreakKind::Page)).then_some(i)
            })
            .collect();
        assert_eq!(positions.len(), 1);
        assert!(matches!(items[positions[0] - 1], LayoutItem::Paragraph(_)));
        assert!(matches!(items[positions[0] + 1], LayoutItem::Paragraph(_)));
    }

    #[test]
    fn test_pdf_page_break_after_emits_trailing_token() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p").with_attr("class", "last"));
        let _ = tree.append_text(p, "end of chapter");

        let items = resolve(&tree, ".last { -pdf-page-break: after }");
        assert!(matches!(
            items.last(),
            Some(LayoutItem::ExplicitBreak(BreakKind::Page))
        ));
    }

    #[test]
    fn test_margin_inherit_copies_parent_indent() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let div = tree.append_element(body, ElementData::new("div").with_attr("class", "outer"));
        let p = tree.append_element(div, ElementData::new("p"));
        let _ = tree.append_text(p, "indented");

        // Margins never inherit implicitly; the keyword copies them.
        let items = resolve(&tree, ".outer { margin-left: 24pt } p { margin: inherit }");
        let paragraph = first_paragraph(&items);
        assert!((paragraph.style.indent_left - 24.0).abs() < 1e-9);
        assert!((paragraph.style.margin.left - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_background_inherit_copies_parent_fill() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let div = tree.append_element(body, ElementData::new("div").with_attr("class", "shaded"));
        let p = tree.append_element(div, ElementData::new("p"));
        let _ = tree.append_text(p, "x");

        let items = resolve(
            &tree,
            ".shaded { background-color: yellow } p { background-color: inherit }",
        );
        let paragraph = first_paragraph(&items);
        let Some(Fragment::Word { style, .. }) = paragraph.fragments.first() else {
            panic!("expected a word");
        };
        assert_eq!(style.background, Some(folio_css::Rgba::rgb(255, 255, 0)));
    }

    #[test]
    fn test_display_none_prunes_subtree() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p, "kept");
        let hidden = tree.append_element(body, ElementData::new("p").with_attr("class", "gone"));
        let _ = tree.append_text(hidden, "dropped");

        let items = resolve(&tree, ".gone { display: none }");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_decorated_span_opens_box() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let p = tree.append_element(body, ElementData::new("p"));
        let _ = tree.append_text(p, "before");
        let span = tree.append_element(p, ElementData::new("span").with_attr("class", "mark"));
        let _ = tree.append_text(span, "inside");

        let items = resolve(&tree, ".mark { background-color: yellow }");
        let paragraph = first_paragraph(&items);
        let begins = paragraph
            .fragments
            .iter()
            .filter(|f| matches!(f, Fragment::BoxBegin { .. }))
            .count();
        let ends = paragraph
            .fragments
            .iter()
            .filter(|f| matches!(f, Fragment::BoxEnd))
            .count();
        assert_eq!(begins, 1);
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_table_subtree_builds_grid() {
        let mut tree = DocTree::new();
        let body = tree.append_element(NodeId::ROOT, ElementData::new("body"));
        let table = tree.append_element(body, ElementData::new("table"));
        let tbody = tree.append_element(table, ElementData::new("tbody"));
        let tr1 = tree.append_element(tbody, ElementData::new("tr"));
        let td1 = tree.append_element(tr1, ElementData::new("td").with_attr("width", "30"));
        let _ = tree.append_text(td1, "a");
        let td2 = tree.append_element(tr1, ElementData::new("td").with_attr("rowspan", "2"));
        let _ = tree.append_text(td2, "tall");
        let tr2 = tree.append_element(tbody, ElementData::new("tr"));
        let td3 = tree.append_element(tr2, ElementData::new("td"));
        let _ = tree.append_text(td3, "b");

        let items = resolve(&tree, "");
        let table_data = items
            .iter()
            .find_map(|item| match item {
                LayoutItem::Table(t) => Some(t),
                _ => None,
            })
            .expect("no table in output");
        assert_eq!(table_data.row_count(), 2);
        assert_eq!(table_data.column_count(), 2);
        assert!(table_data.is_spanned(1, 1));
        assert_eq!(
            table_data.column_sizes.first().copied(),
            Some(TrackSize::Fixed(30.0))
        );
    }
}
