//! Table layout: span bookkeeping and column-width distribution.
//!
//! [§ 17.5 Visual layout of table contents](https://www.w3.org/TR/CSS2/tables.html#table-layout)
//!
//! Cells insert row-major through the builder methods; `colspan` and
//! `rowspan` greater than one register the covered `(col, row)` pairs
//! in the span set so later insertions skip them, and a merge style
//! command records the covering rectangle for the drawing backend.
//! Each cell's internal flow is delegated to the paragraph engine at
//! the cell's resolved width; the table itself only distributes
//! geometry.

use folio_common::Diagnostics;
use folio_css::Rgba;
use std::collections::HashSet;

use crate::fragment::Fragment;
use crate::paragraph::{Paragraph, ParagraphLayout};
use crate::style::StyleSnapshot;

/// A column width or row height declaration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrackSize {
    /// Resolved points.
    Fixed(f64),
    /// Percentage of the table's total extent.
    Percent(f64),
    /// Left for the distribution algorithm to decide.
    #[default]
    Auto,
}

/// What a region style command paints or declares.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// The region is one merged cell.
    Merge,
    /// Background fill behind the region.
    Background(Rgba),
    /// Grid lines around every cell of the region.
    Grid {
        /// Line width, points.
        width: f64,
        /// Line color.
        color: Rgba,
    },
    /// Box border around the region's outer rectangle.
    Outline {
        /// Line width, points.
        width: f64,
        /// Line color.
        color: Rgba,
    },
    /// The region's content must not split across pages; shrink to fit
    /// instead.
    KeepIntact,
}

/// A style command over a rectangular cell region, inclusive corners
/// in `(col, row)` coordinates.
#[derive(Debug, Clone)]
pub struct StyleCommand {
    /// What to apply.
    pub kind: CommandKind,
    /// Top-left corner.
    pub top_left: (usize, usize),
    /// Bottom-right corner.
    pub bottom_right: (usize, usize),
}

/// One table cell's content and span.
#[derive(Debug, Clone)]
pub struct Cell {
    /// The cell's inline content.
    pub fragments: Vec<Fragment>,
    /// Block style used when the cell's paragraph flows.
    pub style: StyleSnapshot,
    /// Columns covered, at least 1.
    pub colspan: usize,
    /// Rows covered, at least 1.
    pub rowspan: usize,
    /// Explicit cell height, if declared.
    pub height: Option<f64>,
}

/// The 2-D table model under construction and its resolved geometry
/// inputs.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    /// Grid of cells, row-major; `None` where a span covers.
    pub grid: Vec<Vec<Option<Cell>>>,
    /// `(col, row)` positions hidden under a rowspan/colspan.
    pub span: HashSet<(usize, usize)>,
    /// Region style commands in insertion order.
    pub commands: Vec<StyleCommand>,
    /// Declared column widths; missing entries are `Auto`.
    pub column_sizes: Vec<TrackSize>,
    /// Declared row heights; missing entries are `Auto`.
    pub row_sizes: Vec<TrackSize>,
    cursor_col: usize,
}

/// Minimum share of the total width an auto column receives.
const AUTO_MIN_FRACTION: f64 = 0.01;

impl TableData {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows inserted so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.grid.len()
    }

    /// Number of columns the widest row occupies.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Start the next row; following [`add_cell`](Self::add_cell) calls
    /// fill it left to right.
    pub fn start_row(&mut self) {
        self.grid.push(Vec::new());
        self.cursor_col = 0;
    }

    /// Insert a cell at the next free position of the current row,
    /// skipping positions covered by earlier spans. Registers the span
    /// set entries and the merge command for multi-cell spans.
    pub fn add_cell(&mut self, cell: Cell) {
        if self.grid.is_empty() {
            self.start_row();
        }
        let row = self.grid.len() - 1;

        // Skip positions a rowspan from an earlier row covers.
        while self.span.contains(&(self.cursor_col, row)) {
            self.push_slot(row, None);
        }
        let col = self.cursor_col;
        let colspan = cell.colspan.max(1);
        let rowspan = cell.rowspan.max(1);

        if colspan > 1 || rowspan > 1 {
            for c in col..col + colspan {
                for r in row..row + rowspan {
                    if (c, r) != (col, row) {
                        let _ = self.span.insert((c, r));
                    }
                }
            }
            self.commands.push(StyleCommand {
                kind: CommandKind::Merge,
                top_left: (col, row),
                bottom_right: (col + colspan - 1, row + rowspan - 1),
            });
        }

        self.push_slot(row, Some(cell));
        for _ in 1..colspan {
            self.push_slot(row, None);
        }
    }

    fn push_slot(&mut self, row: usize, cell: Option<Cell>) {
        self.grid[row].push(cell);
        self.cursor_col += 1;
    }

    /// Declare the width of a column.
    pub fn set_column_size(&mut self, index: usize, size: TrackSize) {
        if self.column_sizes.len() <= index {
            self.column_sizes.resize(index + 1, TrackSize::Auto);
        }
        self.column_sizes[index] = size;
    }

    /// Declare the height of a row.
    pub fn set_row_size(&mut self, index: usize, size: TrackSize) {
        if self.row_sizes.len() <= index {
            self.row_sizes.resize(index + 1, TrackSize::Auto);
        }
        self.row_sizes[index] = size;
    }

    /// Record a region style command.
    pub fn add_command(&mut self, kind: CommandKind, top_left: (usize, usize), bottom_right: (usize, usize)) {
        self.commands.push(StyleCommand {
            kind,
            top_left,
            bottom_right,
        });
    }

    /// Whether `(col, row)` is hidden under a span.
    #[must_use]
    pub fn is_spanned(&self, col: usize, row: usize) -> bool {
        self.span.contains(&(col, row))
    }

    /// Resolve every column to points against `total_width`.
    ///
    /// Explicit fixed and percent widths resolve first; the remaining
    /// width splits evenly among `Auto` columns with a floor of 1% of
    /// the total each. When the resolved sum exceeds the total, every
    /// width scales down by the same ratio and the residual rounding
    /// error comes out of the first column only, so the sum lands
    /// exactly on the total.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve_column_widths(&self, total_width: f64, diags: &mut Diagnostics) -> Vec<f64> {
        let count = self.column_count();
        if count == 0 {
            return Vec::new();
        }
        if total_width <= 0.0 {
            diags.error(
                "table",
                &format!("non-positive table width {total_width:.1}pt"),
            );
            return vec![0.0; count];
        }

        // STEP 1: explicit widths.
        let mut widths = vec![0.0_f64; count];
        let mut auto_columns = Vec::new();
        for (index, width) in widths.iter_mut().enumerate() {
            match self.column_sizes.get(index).copied().unwrap_or_default() {
                TrackSize::Fixed(points) => *width = points.max(0.0),
                TrackSize::Percent(percent) => *width = percent / 100.0 * total_width,
                TrackSize::Auto => auto_columns.push(index),
            }
        }

        // STEP 2: split what is left evenly among the auto columns.
        if !auto_columns.is_empty() {
            let used: f64 = widths.iter().sum();
            let remaining = (total_width - used).max(0.0);
            let each = (remaining / auto_columns.len() as f64)
                .max(total_width * AUTO_MIN_FRACTION);
            for index in auto_columns {
                widths[index] = each;
            }
        }

        // STEP 3: scale down on overflow; the first column absorbs the
        // rounding residue.
        let sum: f64 = widths.iter().sum();
        if sum > total_width {
            let ratio = total_width / sum;
            for width in &mut widths {
                *width *= ratio;
            }
            let scaled: f64 = widths.iter().sum();
            widths[0] -= scaled - total_width;
        }
        widths
    }

    /// Lay out every cell's content at its resolved width and compute
    /// row heights.
    ///
    /// A cell spanning several columns flows at the sum of the covered
    /// widths; a cell without an explicit height takes its content
    /// height, and each row's height is the maximum over its cells (or
    /// the row's fixed height when declared larger).
    ///
    /// A cell whose content overflows its declared height cannot split
    /// at a page boundary without losing lines, so a
    /// [`CommandKind::KeepIntact`] command over the cell's rectangle
    /// tells the backend to shrink the content to fit instead.
    #[must_use]
    pub fn layout_cells(&self, total_width: f64, diags: &mut Diagnostics) -> TableLayoutResult {
        let column_widths = self.resolve_column_widths(total_width, diags);
        let mut cells = Vec::new();
        let mut commands = self.commands.clone();
        let mut row_heights = vec![0.0_f64; self.grid.len()];

        for (row, slots) in self.grid.iter().enumerate() {
            for (col, slot) in slots.iter().enumerate() {
                let Some(cell) = slot else { continue };
                let span_width: f64 = column_widths
                    .iter()
                    .skip(col)
                    .take(cell.colspan.max(1))
                    .sum();
                let paragraph = Paragraph::new(cell.fragments.clone(), cell.style.clone());
                let layout = paragraph.layout(span_width, diags);
                let height = cell.height.unwrap_or_else(|| layout.height());
                if let Some(declared) = cell.height
                    && layout.height() > declared
                {
                    commands.push(StyleCommand {
                        kind: CommandKind::KeepIntact,
                        top_left: (col, row),
                        bottom_right: (
                            col + cell.colspan.max(1) - 1,
                            row + cell.rowspan.max(1) - 1,
                        ),
                    });
                }
                // A rowspan cell's height spreads over its rows; only
                // single-row cells raise their row directly.
                if cell.rowspan <= 1 {
                    row_heights[row] = row_heights[row].max(height);
                }
                cells.push(CellLayout {
                    col,
                    row,
                    width: span_width,
                    height,
                    layout,
                });
            }
            if let Some(TrackSize::Fixed(points)) = self.row_sizes.get(row) {
                row_heights[row] = row_heights[row].max(*points);
            }
        }
        TableLayoutResult {
            column_widths,
            row_heights,
            cells,
            commands,
        }
    }
}

/// One laid-out cell.
#[derive(Debug, Clone)]
pub struct CellLayout {
    /// Leftmost column the cell occupies.
    pub col: usize,
    /// Topmost row the cell occupies.
    pub row: usize,
    /// Resolved flow width, points.
    pub width: f64,
    /// Content (or explicit) height, points.
    pub height: f64,
    /// The cell's internal line layout.
    pub layout: ParagraphLayout,
}

/// Resolved table geometry.
#[derive(Debug, Clone)]
pub struct TableLayoutResult {
    /// Column widths in points, summing to the total width.
    pub column_widths: Vec<f64>,
    /// Row heights in points.
    pub row_heights: Vec<f64>,
    /// Per-cell layouts in row-major order.
    pub cells: Vec<CellLayout>,
    /// Region style commands for the backend: the builder's commands
    /// plus any keep-intact commands raised during cell flow.
    pub commands: Vec<StyleCommand>,
}

impl TableLayoutResult {
    /// Total table height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.row_heights.iter().sum()
    }
}
