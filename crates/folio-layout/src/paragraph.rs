//! Greedy paragraph line breaking and box layout.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally,
//! one after the other, beginning at the top of a containing block."
//!
//! The engine is a single greedy pass over a fragment list: consecutive
//! non-break fragments group into unbreakable words, words accumulate
//! into the current line while they fit, and every completed line gets
//! alignment, vertical metrics, inline-box bookkeeping and decoration
//! runs. Fragments arrive pre-measured, so nothing here touches the
//! text measurement collaborator — laying out the same fragment list
//! twice with the same width produces identical output.

use folio_common::Diagnostics;
use folio_css::Rgba;
use serde::Serialize;

use crate::fragment::Fragment;
use crate::style::{Direction, LeadingMode, StyleSnapshot, TextAlign};

/// A fragment with its assigned x-offset on a line.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedFragment {
    /// Final x-offset from the line's left edge, points.
    pub x: f64,
    /// Index of the word this fragment belongs to on its line; spaces
    /// carry the index of the word they follow.
    pub word_index: usize,
    /// The fragment itself.
    pub fragment: Fragment,
}

/// One laid-out line.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    /// Fragments in visual order with final x-offsets.
    pub fragments: Vec<PlacedFragment>,
    /// Unused width after the last word, before alignment distributed
    /// it.
    pub extra_space: f64,
    /// Number of words placed on the line.
    pub word_count: usize,
    /// Tallest ascent on the line, points.
    pub ascent: f64,
    /// Deepest descent on the line, points (negative).
    pub descent: f64,
    /// Baseline-to-baseline advance this line contributes, points.
    pub leading: f64,
}

/// An inline box instance opened by a `BoxBegin` fragment.
#[derive(Debug, Clone, Serialize)]
pub struct BoxInfo {
    /// Style carrying the box's borders, padding and background.
    pub style: StyleSnapshot,
    /// Total run length summed across every line the box touched.
    pub total_length: f64,
}

/// One line-local segment of an inline box.
#[derive(Debug, Clone, Serialize)]
pub struct BoxRun {
    /// Index into [`ParagraphLayout::boxes`].
    pub box_index: usize,
    /// Line the segment lies on.
    pub line: usize,
    /// Segment start, points from the line's left edge.
    pub x: f64,
    /// Segment width, points.
    pub width: f64,
}

/// What a decoration run draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecorationKind {
    /// A line under the baseline.
    Underline,
    /// A line through the text.
    Strike,
    /// A clickable hyperlink region.
    Link(String),
}

/// A merged decoration run: contiguous same-color decorated fragments
/// collapse into one draw command.
#[derive(Debug, Clone, Serialize)]
pub struct DecorationRun {
    /// What to draw.
    pub kind: DecorationKind,
    /// Draw color.
    pub color: Rgba,
    /// Line the run lies on.
    pub line: usize,
    /// Run start, points from the line's left edge.
    pub x: f64,
    /// Run width, points.
    pub width: f64,
}

/// The complete output of laying out one paragraph at a given width.
#[derive(Debug, Clone, Serialize)]
pub struct ParagraphLayout {
    /// The lines in order.
    pub lines: Vec<Line>,
    /// Inline box instances, in open order.
    pub boxes: Vec<BoxInfo>,
    /// Per-line box segments.
    pub box_runs: Vec<BoxRun>,
    /// Merged underline/strike/hyperlink runs.
    pub decorations: Vec<DecorationRun>,
}

impl ParagraphLayout {
    /// Total height: the sum of all line leadings.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.lines.iter().map(|l| l.leading).sum()
    }

    /// Index of the first line that does not fit in `available_height`,
    /// or `None` when the whole paragraph fits.
    #[must_use]
    pub fn fit_index(&self, available_height: f64) -> Option<usize> {
        let mut used = 0.0;
        for (index, line) in self.lines.iter().enumerate() {
            used += line.leading;
            if used > available_height {
                return Some(index);
            }
        }
        None
    }
}

/// How a paragraph splits against a page-frame boundary.
#[derive(Debug, Clone)]
pub enum PageSplit {
    /// Everything fits; no split needed.
    Fits,
    /// Nothing may stay (orphan policy); move the whole paragraph to
    /// the next frame.
    Defer,
    /// Split into a part that stays and a continuation.
    Split {
        /// The lines staying in the current frame.
        first: Paragraph,
        /// The continuation for the next frame.
        second: Paragraph,
    },
}

/// A closed block: an owned fragment list plus its block-level style.
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// The content fragments, in document order.
    pub fragments: Vec<Fragment>,
    /// Block-level style: alignment, leading mode, indents, spacing.
    pub style: StyleSnapshot,
}

impl Paragraph {
    /// Wrap a fragment list and its block style.
    #[must_use]
    pub fn new(fragments: Vec<Fragment>, style: StyleSnapshot) -> Self {
        Self { fragments, style }
    }

    /// Break the fragments into lines of at most `available_width`.
    ///
    /// Warnings (oversized first word, unbalanced box stack) go to
    /// `diags`; the engine always produces output.
    #[must_use]
    pub fn layout(&self, available_width: f64, diags: &mut Diagnostics) -> ParagraphLayout {
        Breaker::new(self, available_width).run(diags)
    }

    /// Split against `available_height`, honoring the widow/orphan
    /// policy.
    ///
    /// A split that would strand exactly one line at the bottom of the
    /// current frame is rejected in favor of deferring the whole
    /// paragraph; a split that would push exactly one line to the next
    /// frame pulls one more line forward, unless the paragraph has at
    /// most three lines.
    #[must_use]
    pub fn split(&self, layout: &ParagraphLayout, available_height: f64) -> PageSplit {
        let total = layout.lines.len();
        let Some(first_unfit) = layout.fit_index(available_height) else {
            return PageSplit::Fits;
        };
        let mut keep = first_unfit;

        // Widow: exactly one line would start the next frame.
        if total - keep == 1 && total > 3 {
            keep -= 1;
        }
        // Orphan: exactly one line would stay behind.
        if keep == 1 && total > 2 {
            keep = 0;
        }
        if keep == 0 {
            return PageSplit::Defer;
        }
        if keep >= total {
            return PageSplit::Fits;
        }

        let (first, second) = self.split_at_line(layout, keep);
        PageSplit::Split { first, second }
    }

    /// Reassemble two continuation paragraphs from the first `keep`
    /// lines and the rest. Inline boxes open across the boundary are
    /// closed in the first part and re-opened in the second so each
    /// half carries a balanced box stack.
    fn split_at_line(&self, layout: &ParagraphLayout, keep: usize) -> (Self, Self) {
        let mut first = Vec::new();
        let mut second = Vec::new();
        for (index, line) in layout.lines.iter().enumerate() {
            let target = if index < keep { &mut first } else { &mut second };
            target.extend(line.fragments.iter().map(|p| p.fragment.clone()));
            // Re-insert the soft break the line wrap consumed.
            let interior = index + 1 < keep || (index >= keep && index + 1 < layout.lines.len());
            if interior
                && !matches!(target.last(), Some(Fragment::LineBreak | Fragment::Space { .. }))
                && let Some(style) = line
                    .fragments
                    .iter()
                    .rev()
                    .find_map(|p| p.fragment.style().cloned())
            {
                target.push(Fragment::Space {
                    width: 0.0,
                    ascent: 0.0,
                    descent: 0.0,
                    style,
                });
            }
        }

        // Balance the box stack across the boundary.
        let mut open: Vec<StyleSnapshot> = Vec::new();
        for fragment in &first {
            match fragment {
                Fragment::BoxBegin { style } => open.push(style.clone()),
                Fragment::BoxEnd => {
                    let _ = open.pop();
                }
                _ => {}
            }
        }
        for style in open.iter().rev() {
            first.push(Fragment::BoxEnd);
            second.insert(0, Fragment::BoxBegin {
                style: style.clone(),
            });
        }

        (
            Self::new(first, self.style.clone()),
            Self::new(second, self.style.clone()),
        )
    }
}

/// An unbreakable run of fragments plus its total width.
struct WordCluster {
    fragments: Vec<Fragment>,
    width: f64,
    has_content: bool,
}

/// The greedy breaker's working state.
struct Breaker<'a> {
    paragraph: &'a Paragraph,
    available_width: f64,
    // current line accumulation
    placed: Vec<PlacedFragment>,
    x: f64,
    word_count: usize,
    // pending soft breaks between the last word and the next
    pending_spaces: Vec<Fragment>,
    // open inline boxes: (box index, start x on current line)
    box_stack: Vec<(usize, f64)>,
    out: ParagraphLayout,
}

impl<'a> Breaker<'a> {
    fn new(paragraph: &'a Paragraph, available_width: f64) -> Self {
        Self {
            paragraph,
            available_width,
            placed: Vec::new(),
            x: 0.0,
            word_count: 0,
            pending_spaces: Vec::new(),
            box_stack: Vec::new(),
            out: ParagraphLayout {
                lines: Vec::new(),
                boxes: Vec::new(),
                box_runs: Vec::new(),
                decorations: Vec::new(),
            },
        }
    }

    fn run(mut self, diags: &mut Diagnostics) -> ParagraphLayout {
        // STEP 1: group consecutive non-break fragments into words.
        let clusters = cluster_fragments(&self.paragraph.fragments);

        // STEP 2: greedy accumulation, left to right.
        for item in clusters {
            match item {
                ClusterItem::Word(word) => self.take_word(word, diags),
                ClusterItem::Space(fragment) => self.pending_spaces.push(fragment),
                ClusterItem::ForcedBreak => {
                    self.flush_pending_spaces_trailing();
                    self.placed.push(PlacedFragment {
                        x: self.x,
                        word_index: self.word_count.saturating_sub(1),
                        fragment: Fragment::LineBreak,
                    });
                    self.end_line(false);
                }
            }
        }
        self.flush_pending_spaces_trailing();
        if !self.placed.is_empty() {
            self.end_line(true);
        }

        // An unbalanced box stack at paragraph end is force-closed; the
        // per-line segments were already recorded when each line ended.
        if !self.box_stack.is_empty() {
            diags.warn(
                "layout",
                "inline box left open at paragraph end; force-closing",
            );
            self.box_stack.clear();
        }
        self.out
    }

    fn take_word(&mut self, word: WordCluster, diags: &mut Diagnostics) {
        let space_width: f64 = self.pending_spaces.iter().map(Fragment::width).sum();

        if self.word_count == 0 {
            // First word on an empty line is placed even when it is
            // wider than the line, otherwise nothing would ever fit.
            if word.width > self.available_width {
                diags.warn(
                    "layout",
                    &format!(
                        "word wider than line ({:.1}pt > {:.1}pt); placing anyway",
                        word.width, self.available_width
                    ),
                );
            }
            self.place_pending_spaces(true);
            self.place_word(word);
        } else if self.x + space_width + word.width <= self.available_width {
            self.place_pending_spaces(true);
            self.place_word(word);
        } else {
            // Wrap: the pending spaces stay behind as zero-advance
            // trailing fragments of the closing line.
            self.flush_pending_spaces_trailing();
            self.end_line(false);
            if word.width > self.available_width {
                diags.warn(
                    "layout",
                    &format!(
                        "word wider than line ({:.1}pt > {:.1}pt); placing anyway",
                        word.width, self.available_width
                    ),
                );
            }
            self.place_word(word);
        }
    }

    /// Place pending spaces into the line, advancing x when they count.
    fn place_pending_spaces(&mut self, advance: bool) {
        for fragment in std::mem::take(&mut self.pending_spaces) {
            let width = fragment.width();
            self.placed.push(PlacedFragment {
                x: self.x,
                word_index: self.word_count.saturating_sub(1),
                fragment,
            });
            if advance {
                self.x += width;
            }
        }
    }

    /// Trailing spaces at a line end keep their position but contribute
    /// no width, so `extra_space` ignores them.
    fn flush_pending_spaces_trailing(&mut self) {
        self.place_pending_spaces(false);
    }

    fn place_word(&mut self, word: WordCluster) {
        let word_index = self.word_count;
        for fragment in word.fragments {
            match &fragment {
                Fragment::BoxBegin { style } => {
                    self.out.boxes.push(BoxInfo {
                        style: style.clone(),
                        total_length: 0.0,
                    });
                    self.box_stack.push((self.out.boxes.len() - 1, self.x));
                }
                Fragment::BoxEnd => {
                    if let Some((box_index, start_x)) = self.box_stack.pop() {
                        let line = self.out.lines.len();
                        self.record_box_segment(box_index, line, start_x, self.x);
                    }
                }
                _ => {}
            }
            let width = fragment.width();
            self.placed.push(PlacedFragment {
                x: self.x,
                word_index,
                fragment,
            });
            self.x += width;
        }
        if word.has_content {
            self.word_count += 1;
        }
    }

    fn record_box_segment(&mut self, box_index: usize, line: usize, start_x: f64, end_x: f64) {
        let width = (end_x - start_x).max(0.0);
        self.out.box_runs.push(BoxRun {
            box_index,
            line,
            x: start_x,
            width,
        });
        if let Some(info) = self.out.boxes.get_mut(box_index) {
            info.total_length += width;
        }
    }

    /// STEP 3-4: close the current line, compute metrics, align.
    fn end_line(&mut self, is_last: bool) {
        let style = &self.paragraph.style;
        let extra_space = (self.available_width - self.x).max(0.0);

        let mut ascent = 0.0_f64;
        let mut descent = 0.0_f64;
        for placed in &self.placed {
            ascent = ascent.max(placed.fragment.ascent());
            descent = descent.min(placed.fragment.descent());
        }
        let content_height = ascent - descent;
        let leading = match style.leading_mode {
            LeadingMode::Max => content_height.max(style.leading),
            LeadingMode::Min => content_height.min(style.leading),
            LeadingMode::Fixed => style.leading,
        };

        // Alignment shifts x-offsets; justify distributes the extra
        // space across the inter-word gaps, but never on the last line.
        match style.align {
            TextAlign::Left => {}
            TextAlign::Right => {
                for placed in &mut self.placed {
                    placed.x += extra_space;
                }
            }
            TextAlign::Center => {
                for placed in &mut self.placed {
                    placed.x += extra_space / 2.0;
                }
            }
            TextAlign::Justify => {
                if !is_last && self.word_count > 1 {
                    #[allow(clippy::cast_precision_loss)]
                    let gap_bonus = extra_space / (self.word_count - 1) as f64;
                    for placed in &mut self.placed {
                        #[allow(clippy::cast_precision_loss)]
                        let shift = gap_bonus * placed.word_index as f64;
                        placed.x += shift;
                    }
                }
            }
        }

        let line_index = self.out.lines.len();
        let mut fragments = std::mem::take(&mut self.placed);

        // Decoration merging assumes ascending x, so runs merge over
        // the logical order first.
        let decoration_start = self.out.decorations.len();
        merge_decoration_runs(&fragments, line_index, &mut self.out.decorations);

        // RTL is a linear reorder: mirror every fragment's span and the
        // finished decoration runs of this line.
        if style.direction == Direction::Rtl {
            for placed in &mut fragments {
                placed.x = self.available_width - placed.x - placed.fragment.width();
            }
            for run in &mut self.out.decorations[decoration_start..] {
                run.x = self.available_width - run.x - run.width;
            }
        }

        self.out.lines.push(Line {
            fragments,
            extra_space,
            word_count: self.word_count,
            ascent,
            descent,
            leading,
        });

        // STEP 5: boxes still open at end-of-line record a segment and
        // re-open at x = 0 on the next line.
        let line_end = self.x;
        let open: Vec<(usize, f64)> = self.box_stack.drain(..).collect();
        for (box_index, start_x) in open {
            self.record_box_segment(box_index, line_index, start_x, line_end);
            self.box_stack.push((box_index, 0.0));
        }

        self.x = 0.0;
        self.word_count = 0;
    }
}

/// One step of the clustered fragment stream.
enum ClusterItem {
    Word(WordCluster),
    Space(Fragment),
    ForcedBreak,
}

/// Group consecutive non-break fragments into unbreakable words.
fn cluster_fragments(fragments: &[Fragment]) -> Vec<ClusterItem> {
    let mut items = Vec::new();
    let mut current: Option<WordCluster> = None;
    for fragment in fragments {
        match fragment {
            Fragment::Space { .. } => {
                if let Some(word) = current.take() {
                    items.push(ClusterItem::Word(word));
                }
                items.push(ClusterItem::Space(fragment.clone()));
            }
            Fragment::LineBreak => {
                if let Some(word) = current.take() {
                    items.push(ClusterItem::Word(word));
                }
                items.push(ClusterItem::ForcedBreak);
            }
            other => {
                let word = current.get_or_insert_with(|| WordCluster {
                    fragments: Vec::new(),
                    width: 0.0,
                    has_content: false,
                });
                word.width += other.width();
                word.has_content |= !matches!(other, Fragment::BoxBegin { .. } | Fragment::BoxEnd);
                word.fragments.push(other.clone());
            }
        }
    }
    if let Some(word) = current.take() {
        items.push(ClusterItem::Word(word));
    }
    items
}

/// STEP 6: merge contiguous decorated fragments into single draw runs.
///
/// Underline and strike runs are keyed by color; hyperlink regions by
/// target plus color. Only a key change closes a run — alignment gaps
/// (justify) stay covered because the run's end extends to each new
/// member fragment. Zero-width fragments (box boundaries, breaks)
/// neither extend nor break runs.
fn merge_decoration_runs(fragments: &[PlacedFragment], line: usize, out: &mut Vec<DecorationRun>) {
    let mut open: Vec<(DecorationKind, Rgba, f64, f64)> = Vec::new();

    for placed in fragments {
        let width = placed.fragment.width();
        if width <= 0.0 {
            continue;
        }
        let mut active: Vec<(DecorationKind, Rgba)> = Vec::new();
        if let Some(style) = placed.fragment.style() {
            if style.underline {
                active.push((DecorationKind::Underline, style.color));
            }
            if style.strike {
                active.push((DecorationKind::Strike, style.color));
            }
            if let Some(target) = &style.link {
                active.push((DecorationKind::Link(target.clone()), style.color));
            }
        } else if let Fragment::Image {
            link: Some(target), ..
        } = &placed.fragment
        {
            active.push((DecorationKind::Link(target.clone()), Rgba::BLACK));
        }

        // A key no longer active closes its run.
        let mut index = 0;
        while index < open.len() {
            let (kind, color, start, end) = &open[index];
            if active.iter().any(|(k, c)| k == kind && c == color) {
                index += 1;
            } else {
                out.push(DecorationRun {
                    kind: kind.clone(),
                    color: *color,
                    line,
                    x: *start,
                    width: end - start,
                });
                let _ = open.remove(index);
            }
        }

        for (kind, color) in active {
            if let Some(run) = open
                .iter_mut()
                .find(|(k, c, _, _)| *k == kind && *c == color)
            {
                run.3 = placed.x + width;
            } else {
                open.push((kind, color, placed.x, placed.x + width));
            }
        }
    }

    for (kind, color, start, end) in open {
        out.push(DecorationRun {
            kind,
            color,
            line,
            x: start,
            width: end - start,
        });
    }
}
