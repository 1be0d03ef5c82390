//! Integration tests for table column distribution, span bookkeeping
//! and cell flow.

use folio_common::Diagnostics;
use folio_layout::fragment::Fragment;
use folio_layout::style::StyleState;
use folio_layout::table::{Cell, CommandKind, TableData, TrackSize};
use folio_layout::text::ApproximateTextMeasure;

const MEASURE: ApproximateTextMeasure = ApproximateTextMeasure;

fn cell(text: &str, style: &StyleState) -> Cell {
    Cell {
        fragments: vec![Fragment::word(text, style, &MEASURE)],
        style: style.snapshot(),
        colspan: 1,
        rowspan: 1,
        height: None,
    }
}

fn two_column_table() -> TableData {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    table.add_cell(cell("a", &style));
    table.add_cell(cell("b", &style));
    table
}

#[test]
fn test_auto_column_takes_remaining_width() {
    let mut table = two_column_table();
    table.set_column_size(1, TrackSize::Fixed(30.0));

    let mut diags = Diagnostics::new();
    let widths = table.resolve_column_widths(100.0, &mut diags);
    assert!((widths[0] - 70.0).abs() < 1e-9);
    assert!((widths[1] - 30.0).abs() < 1e-9);
    assert!(diags.records().is_empty());
}

#[test]
fn test_percent_column_resolves_against_total() {
    let mut table = two_column_table();
    table.set_column_size(0, TrackSize::Percent(50.0));

    let mut diags = Diagnostics::new();
    let widths = table.resolve_column_widths(200.0, &mut diags);
    assert!((widths[0] - 100.0).abs() < 1e-9);
    assert!((widths[1] - 100.0).abs() < 1e-9);
}

#[test]
fn test_overflow_scales_down_with_first_column_residue() {
    let mut table = two_column_table();
    table.set_column_size(0, TrackSize::Fixed(80.0));
    table.set_column_size(1, TrackSize::Fixed(40.0));

    let mut diags = Diagnostics::new();
    let widths = table.resolve_column_widths(100.0, &mut diags);
    // Scaled by 100/120; any rounding residue lands on column 0 so the
    // sum is exact.
    let sum: f64 = widths.iter().sum();
    assert!((sum - 100.0).abs() < 1e-12);
    assert!((widths[1] - 40.0 * (100.0 / 120.0)).abs() < 1e-9);
}

#[test]
fn test_auto_column_floor_when_explicit_consumes_total() {
    let mut table = two_column_table();
    table.set_column_size(0, TrackSize::Fixed(99.5));

    let mut diags = Diagnostics::new();
    let widths = table.resolve_column_widths(100.0, &mut diags);
    // The auto column gets at least 1% of the total before the
    // overflow scale-down, so it never collapses to nothing.
    assert!(widths[1] > 0.9);
    let sum: f64 = widths.iter().sum();
    assert!((sum - 100.0).abs() < 1e-9);
}

#[test]
fn test_non_positive_width_reports_error() {
    let table = two_column_table();
    let mut diags = Diagnostics::new();
    let widths = table.resolve_column_widths(0.0, &mut diags);
    assert_eq!(widths.len(), 2);
    assert!(widths.iter().all(|w| w.abs() < f64::EPSILON));
    assert!(
        diags
            .records()
            .iter()
            .any(|r| r.message.contains("non-positive"))
    );
}

#[test]
fn test_rowspan_reserves_grid_positions() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    let mut tall = cell("tall", &style);
    tall.rowspan = 2;
    table.add_cell(tall);
    table.add_cell(cell("a", &style));
    table.start_row();
    // The next insertion must skip the position under the rowspan.
    table.add_cell(cell("b", &style));

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_count(), 2);
    assert!(table.is_spanned(0, 1));
    assert!(table.grid[1][0].is_none());
    assert!(table.grid[1][1].is_some());
}

#[test]
fn test_colspan_registers_merge_command() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    let mut wide = cell("wide", &style);
    wide.colspan = 3;
    table.add_cell(wide);

    assert_eq!(table.column_count(), 3);
    assert!(table.is_spanned(1, 0));
    assert!(table.is_spanned(2, 0));
    let merge = table
        .commands
        .iter()
        .find(|c| matches!(c.kind, CommandKind::Merge))
        .expect("merge command");
    assert_eq!(merge.top_left, (0, 0));
    assert_eq!(merge.bottom_right, (2, 0));
}

#[test]
fn test_cell_content_flows_at_span_width() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    let mut wide = cell("wide", &style);
    wide.colspan = 2;
    table.add_cell(wide);
    table.add_cell(cell("x", &style));
    table.set_column_size(0, TrackSize::Fixed(20.0));
    table.set_column_size(1, TrackSize::Fixed(30.0));
    table.set_column_size(2, TrackSize::Fixed(50.0));

    let mut diags = Diagnostics::new();
    let result = table.layout_cells(100.0, &mut diags);
    let spanning = result
        .cells
        .iter()
        .find(|c| c.col == 0)
        .expect("spanning cell");
    // Covered columns sum: 20 + 30.
    assert!((spanning.width - 50.0).abs() < 1e-9);
}

#[test]
fn test_row_height_is_tallest_cell() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    table.add_cell(cell("a", &style));
    let mut fixed = cell("b", &style);
    fixed.height = Some(50.0);
    table.add_cell(fixed);

    let mut diags = Diagnostics::new();
    let result = table.layout_cells(100.0, &mut diags);
    assert!((result.row_heights[0] - 50.0).abs() < 1e-9);
    // Table height is the row-height sum.
    assert!((result.height() - 50.0).abs() < 1e-9);
}

#[test]
fn test_declared_row_size_raises_row() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    table.add_cell(cell("a", &style));
    table.set_row_size(0, TrackSize::Fixed(40.0));

    let mut diags = Diagnostics::new();
    let result = table.layout_cells(100.0, &mut diags);
    assert!((result.row_heights[0] - 40.0).abs() < 1e-9);
}

#[test]
fn test_overfull_fixed_height_cell_emits_keep_intact() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    // Several words at a narrow width wrap to more lines than 5pt of
    // cell height can hold.
    let cramped = Cell {
        fragments: vec![
            Fragment::word("alpha", &style, &MEASURE),
            Fragment::space(&style, &MEASURE),
            Fragment::word("beta", &style, &MEASURE),
            Fragment::space(&style, &MEASURE),
            Fragment::word("gamma", &style, &MEASURE),
        ],
        style: style.snapshot(),
        colspan: 2,
        rowspan: 1,
        height: Some(5.0),
    };
    table.add_cell(cramped);

    let mut diags = Diagnostics::new();
    let result = table.layout_cells(40.0, &mut diags);
    let keep = result
        .commands
        .iter()
        .find(|c| matches!(c.kind, CommandKind::KeepIntact))
        .expect("keep-intact command");
    assert_eq!(keep.top_left, (0, 0));
    assert_eq!(keep.bottom_right, (1, 0));
    // The declared height still wins; the backend shrinks the content.
    assert!((result.row_heights[0] - 5.0).abs() < 1e-9);
}

#[test]
fn test_roomy_fixed_height_cell_emits_no_keep_intact() {
    let style = StyleState::root();
    let mut table = TableData::new();
    table.start_row();
    let mut roomy = cell("a", &style);
    roomy.height = Some(100.0);
    table.add_cell(roomy);

    let mut diags = Diagnostics::new();
    let result = table.layout_cells(100.0, &mut diags);
    assert!(
        !result
            .commands
            .iter()
            .any(|c| matches!(c.kind, CommandKind::KeepIntact))
    );
}

#[test]
fn test_builder_commands_carried_into_layout_result() {
    let mut table = two_column_table();
    table.add_command(
        CommandKind::Background(folio_css::Rgba::rgb(240, 240, 240)),
        (0, 0),
        (1, 0),
    );
    let mut diags = Diagnostics::new();
    let result = table.layout_cells(100.0, &mut diags);
    assert!(
        result
            .commands
            .iter()
            .any(|c| matches!(c.kind, CommandKind::Background(_)))
    );
}

#[test]
fn test_background_command_preserved_for_backend() {
    let mut table = two_column_table();
    table.add_command(
        CommandKind::Background(folio_css::Rgba::rgb(200, 200, 200)),
        (0, 0),
        (1, 0),
    );
    assert!(
        table
            .commands
            .iter()
            .any(|c| matches!(c.kind, CommandKind::Background(_)))
    );
}
