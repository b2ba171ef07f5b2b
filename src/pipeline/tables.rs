//! Table detection from ruling lines or from positioned text.
//!
//! pdfium gives us text segments and path objects with bounding boxes but no
//! notion of tables. Two strategies recover them:
//!
//! * [`TableStrategy::Lines`] (default) builds grids from ruling lines:
//!   drawn horizontal and vertical strokes, and the edges of drawn
//!   rectangles. Strokes that touch form one table; their distinct x and y
//!   positions are the column and row boundaries, and each text span lands
//!   in the cell holding its centre. Prose never becomes a table this way,
//!   but tables drawn without any ruling are not found. Only path bounding
//!   boxes are read, so a grid drawn as one single path contributes its
//!   outline only.
//!
//! * [`TableStrategy::Text`] works from alignment alone:
//!   1. segments sharing a baseline form a line;
//!   2. within a line, segments separated by a wide horizontal gap are
//!      different cells, narrow gaps are word spacing inside one cell;
//!   3. two or more consecutive lines with the same number of cells whose
//!      cells overlap column by column form a table grid.
//!
//!   This finds unruled tables too, but prose laid out in aligned columns
//!   is mistaken for a table.
//!
//! The first row of every detected grid becomes the header when the grid is
//! turned into a [`crate::document::TableGrid`].

use crate::document::RawTable;
use tracing::debug;

/// A run of text with its bounding box in PDF user space (y grows upwards).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            bottom,
            top,
        }
    }

    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A straight ruling stroke in PDF user space, normalised so `x0 <= x1`
/// and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Ruling {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Rulings drawn by a path with this bounding box.
    ///
    /// A box no thicker than `thickness` is a single stroke; anything larger
    /// is a rectangle and contributes its four edges.
    pub fn from_bounds(left: f32, bottom: f32, right: f32, top: f32, thickness: f32) -> Vec<Self> {
        let (width, height) = ((right - left).abs(), (top - bottom).abs());
        if height <= thickness && width <= thickness {
            vec![]
        } else if height <= thickness {
            let y = (top + bottom) / 2.0;
            vec![Self::new(left, y, right, y)]
        } else if width <= thickness {
            let x = (left + right) / 2.0;
            vec![Self::new(x, bottom, x, top)]
        } else {
            vec![
                Self::new(left, bottom, right, bottom),
                Self::new(left, top, right, top),
                Self::new(left, bottom, left, top),
                Self::new(right, bottom, right, top),
            ]
        }
    }

    fn is_horizontal(&self) -> bool {
        self.y1 - self.y0 < self.x1 - self.x0
    }
}

/// How tables are located on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStrategy {
    /// Grids drawn with ruling lines or cell rectangles.
    #[default]
    Lines,
    /// Columns of aligned text, ruled or not.
    Text,
}

/// Tunables for [`detect_tables`].
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Which signal marks a table.
    pub strategy: TableStrategy,
    /// Rulings closer than this, in points, are the same boundary and
    /// strokes this close to each other touch.
    pub snap_tolerance: f32,
    /// Minimum lines (header included) for a grid.
    pub min_rows: usize,
    /// Minimum cells per line.
    pub min_columns: usize,
    /// Lines with more cells than this are treated as prose.
    pub max_columns: usize,
    /// Maximum vertical distance between span centres on the same line, in points.
    pub line_tolerance: f32,
    /// Horizontal gap that separates two cells, in points.
    pub column_gap: f32,
    /// Slack allowed when matching a cell against the column above it, in points.
    pub alignment_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            strategy: TableStrategy::default(),
            snap_tolerance: 3.0,
            min_rows: 2,
            min_columns: 2,
            max_columns: 12,
            line_tolerance: 3.0,
            column_gap: 12.0,
            alignment_tolerance: 4.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    left: f32,
    right: f32,
}

impl TableDetectorConfig {
    pub fn with_strategy(strategy: TableStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// Detect table grids on one page, top to bottom.
///
/// `rulings` are only consulted by [`TableStrategy::Lines`].
pub fn detect_tables(
    spans: &[TextSpan],
    rulings: &[Ruling],
    config: &TableDetectorConfig,
) -> Vec<RawTable> {
    match config.strategy {
        TableStrategy::Lines => detect_ruled(spans, rulings, config),
        TableStrategy::Text => detect_aligned(spans, config),
    }
}

// ── Lines strategy ───────────────────────────────────────────────────────

fn detect_ruled(
    spans: &[TextSpan],
    rulings: &[Ruling],
    config: &TableDetectorConfig,
) -> Vec<RawTable> {
    let tol = config.snap_tolerance;
    let mut grids: Vec<(f32, RawTable)> = connected_rulings(rulings, tol)
        .into_iter()
        .filter_map(|group| {
            let xs = snap(group.iter().filter(|r| !r.is_horizontal()).map(|r| r.x0), tol);
            let mut ys = snap(group.iter().filter(|r| r.is_horizontal()).map(|r| r.y0), tol);
            ys.reverse();
            let (rows, columns) = (ys.len().saturating_sub(1), xs.len().saturating_sub(1));
            if rows < config.min_rows || columns < config.min_columns || columns > config.max_columns {
                return None;
            }

            let mut cells: Vec<Vec<Vec<&TextSpan>>> = vec![vec![Vec::new(); columns]; rows];
            for span in spans.iter().filter(|s| !s.text.trim().is_empty()) {
                let cx = (span.left + span.right) / 2.0;
                let cy = span.center_y();
                let column = xs.windows(2).position(|w| cx >= w[0] && cx < w[1]);
                let row = ys.windows(2).position(|w| cy <= w[0] && cy > w[1]);
                if let (Some(row), Some(column)) = (row, column) {
                    cells[row][column].push(span);
                }
            }

            let table: RawTable = cells
                .into_iter()
                .map(|row| row.into_iter().map(cell_from_spans).collect())
                .collect();
            if table.iter().flatten().all(Option::is_none) {
                return None;
            }
            debug!("Detected ruled table: {} rows × {} columns", rows, columns);
            Some((ys[0], table))
        })
        .collect();

    grids.sort_by(|a, b| b.0.total_cmp(&a.0));
    grids.into_iter().map(|(_, table)| table).collect()
}

/// Split rulings into groups of strokes that touch, directly or through others.
fn connected_rulings(rulings: &[Ruling], tol: f32) -> Vec<Vec<Ruling>> {
    let mut parent: Vec<usize> = (0..rulings.len()).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..rulings.len() {
        for j in i + 1..rulings.len() {
            if touches(&rulings[i], &rulings[j], tol) {
                let (a, b) = (root(&mut parent, i), root(&mut parent, j));
                parent[a] = b;
            }
        }
    }

    let mut groups: Vec<(usize, Vec<Ruling>)> = Vec::new();
    for (i, ruling) in rulings.iter().enumerate() {
        let r = root(&mut parent, i);
        match groups.iter_mut().find(|(g, _)| *g == r) {
            Some((_, group)) => group.push(*ruling),
            None => groups.push((r, vec![*ruling])),
        }
    }
    groups.into_iter().map(|(_, group)| group).collect()
}

fn touches(a: &Ruling, b: &Ruling, tol: f32) -> bool {
    a.x0 <= b.x1 + tol && b.x0 <= a.x1 + tol && a.y0 <= b.y1 + tol && b.y0 <= a.y1 + tol
}

/// Sorted distinct positions, merging values closer than `tol`.
fn snap(values: impl Iterator<Item = f32>, tol: f32) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.collect();
    sorted.sort_by(f32::total_cmp);
    let mut out: Vec<f32> = Vec::new();
    for v in sorted {
        match out.last() {
            Some(last) if v - last <= tol => {}
            _ => out.push(v),
        }
    }
    out
}

fn cell_from_spans(mut spans: Vec<&TextSpan>) -> Option<String> {
    if spans.is_empty() {
        return None;
    }
    spans.sort_by(|a, b| {
        b.center_y()
            .total_cmp(&a.center_y())
            .then(a.left.total_cmp(&b.left))
    });
    let text = spans
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(text)
}

// ── Text strategy ────────────────────────────────────────────────────────

fn detect_aligned(spans: &[TextSpan], config: &TableDetectorConfig) -> Vec<RawTable> {
    let lines: Vec<Vec<Cell>> = group_lines(spans, config.line_tolerance)
        .into_iter()
        .map(|line| split_cells(line, config.column_gap))
        .collect();

    let mut tables = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let width = lines[i].len();
        if width < config.min_columns || width > config.max_columns {
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < lines.len() && aligned(&lines[i], &lines[end], config.alignment_tolerance) {
            end += 1;
        }

        if end - i >= config.min_rows {
            debug!("Detected table: {} rows × {} columns", end - i, width);
            tables.push(
                lines[i..end]
                    .iter()
                    .map(|line| line.iter().map(|c| Some(c.text.clone())).collect())
                    .collect(),
            );
            i = end;
        } else {
            i += 1;
        }
    }
    tables
}

/// Group spans into lines, top of the page first, each line sorted left to right.
fn group_lines(spans: &[TextSpan], tolerance: f32) -> Vec<Vec<TextSpan>> {
    let mut sorted: Vec<&TextSpan> = spans.iter().filter(|s| !s.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        b.center_y()
            .total_cmp(&a.center_y())
            .then(a.left.total_cmp(&b.left))
    });

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    for span in sorted {
        match lines.last_mut() {
            Some(line) if (line[0].center_y() - span.center_y()).abs() <= tolerance => {
                line.push(span.clone());
            }
            _ => lines.push(vec![span.clone()]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.left.total_cmp(&b.left));
    }
    lines
}

/// Merge spans of one line into cells wherever the gap is narrower than `column_gap`.
fn split_cells(line: Vec<TextSpan>, column_gap: f32) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();
    for span in line {
        let text = span.text.trim();
        match cells.last_mut() {
            Some(cell) if span.left - cell.right < column_gap => {
                if !cell.text.ends_with(' ') && !text.is_empty() {
                    cell.text.push(' ');
                }
                cell.text.push_str(text);
                cell.right = cell.right.max(span.right);
            }
            _ => cells.push(Cell {
                text: text.to_string(),
                left: span.left,
                right: span.right,
            }),
        }
    }
    cells
}

/// True when `line` has as many cells as `head` and each overlaps the one above it.
fn aligned(head: &[Cell], line: &[Cell], tolerance: f32) -> bool {
    head.len() == line.len()
        && head
            .iter()
            .zip(line)
            .all(|(a, b)| a.left <= b.right + tolerance && b.left <= a.right + tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A span of `text` on baseline `y`, starting at `x`, 5pt per character.
    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, x + 5.0 * text.len() as f32, y + 10.0)
    }

    fn text_mode() -> TableDetectorConfig {
        TableDetectorConfig::with_strategy(TableStrategy::Text)
    }

    /// Rulings of a grid with the given column and row boundaries.
    fn ruled_grid(xs: &[f32], ys: &[f32]) -> Vec<Ruling> {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (bottom, top) = (ys[ys.len() - 1], ys[0]);
        ys.iter()
            .map(|&y| Ruling::new(left, y, right, y))
            .chain(xs.iter().map(|&x| Ruling::new(x, bottom, x, top)))
            .collect()
    }

    fn cells(table: &RawTable) -> Vec<Vec<&str>> {
        table
            .iter()
            .map(|row| row.iter().map(|c| c.as_deref().unwrap_or("")).collect())
            .collect()
    }

    #[test]
    fn detects_aligned_grid_below_prose() {
        let spans = vec![
            span("Some", 50.0, 700.0),
            span("prose", 75.0, 700.0),
            span("Fruit", 50.0, 680.0),
            span("Color", 200.0, 680.0),
            span("Apple", 50.0, 665.0),
            span("Red", 200.0, 665.0),
            span("Banana", 50.0, 650.0),
            span("Yellow", 200.0, 650.0),
        ];
        let tables = detect_tables(&spans, &[], &text_mode());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            cells(&tables[0]),
            vec![
                vec!["Fruit", "Color"],
                vec!["Apple", "Red"],
                vec!["Banana", "Yellow"],
            ]
        );
    }

    #[test]
    fn ruled_grid_assigns_spans_to_cells() {
        let rulings = ruled_grid(&[40.0, 150.0, 300.0], &[695.0, 675.0, 655.0]);
        let spans = vec![
            span("Above", 50.0, 720.0),
            span("Fruit", 50.0, 680.0),
            span("Color", 160.0, 680.0),
            span("Apple", 50.0, 660.0),
        ];
        let tables = detect_tables(&spans, &rulings, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][1][1], None);
        assert_eq!(
            cells(&tables[0]),
            vec![vec!["Fruit", "Color"], vec!["Apple", ""]]
        );
    }

    #[test]
    fn aligned_prose_without_rulings_is_not_a_table() {
        let spans = vec![
            span("Left", 50.0, 700.0),
            span("Right", 300.0, 700.0),
            span("column", 50.0, 685.0),
            span("column", 300.0, 685.0),
        ];
        assert!(detect_tables(&spans, &[], &TableDetectorConfig::default()).is_empty());
        assert_eq!(detect_tables(&spans, &[], &text_mode()).len(), 1);
    }

    #[test]
    fn cell_rectangles_form_a_grid() {
        let mut rulings = Vec::new();
        for (left, right) in [(40.0, 150.0), (150.0, 300.0)] {
            for (bottom, top) in [(675.0, 695.0), (655.0, 675.0)] {
                rulings.extend(Ruling::from_bounds(left, bottom, right, top, 1.0));
            }
        }
        let spans = vec![
            span("a", 50.0, 680.0),
            span("b", 160.0, 680.0),
            span("1", 50.0, 660.0),
            span("2", 160.0, 660.0),
        ];
        let tables = detect_tables(&spans, &rulings, &TableDetectorConfig::default());
        assert_eq!(cells(&tables[0]), vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn separate_ruled_tables_come_top_first() {
        let mut rulings = ruled_grid(&[40.0, 150.0, 300.0], &[400.0, 380.0, 360.0]);
        rulings.extend(ruled_grid(&[40.0, 150.0, 300.0], &[695.0, 675.0, 655.0]));
        let spans = vec![
            span("low", 50.0, 385.0),
            span("x", 160.0, 385.0),
            span("high", 50.0, 680.0),
            span("y", 160.0, 680.0),
        ];
        let tables = detect_tables(&spans, &rulings, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][0][0].as_deref(), Some("high"));
        assert_eq!(tables[1][0][0].as_deref(), Some("low"));
    }

    #[test]
    fn empty_box_and_thin_rules_are_ignored() {
        let mut rulings = Ruling::from_bounds(40.0, 600.0, 300.0, 700.0, 1.0);
        rulings.extend(Ruling::from_bounds(40.0, 500.0, 300.0, 500.5, 1.0));
        assert_eq!(Ruling::from_bounds(40.0, 500.0, 300.0, 500.5, 1.0).len(), 1);
        let spans = vec![span("boxed", 50.0, 650.0)];
        assert!(detect_tables(&spans, &rulings, &TableDetectorConfig::default()).is_empty());
    }

    #[test]
    fn words_with_narrow_gaps_stay_in_one_cell() {
        let spans = vec![
            span("Unit", 50.0, 700.0),
            span("price", 73.0, 700.0),
            span("Qty", 200.0, 700.0),
            span("1.50", 50.0, 685.0),
            span("3", 200.0, 685.0),
        ];
        let tables = detect_tables(&spans, &[], &text_mode());
        assert_eq!(cells(&tables[0])[0], vec!["Unit price", "Qty"]);
    }

    #[test]
    fn single_multi_cell_line_is_not_a_table() {
        let spans = vec![span("Left", 50.0, 700.0), span("Right", 300.0, 700.0)];
        assert!(detect_tables(&spans, &[], &text_mode()).is_empty());
    }

    #[test]
    fn misaligned_columns_break_the_grid() {
        let spans = vec![
            span("A", 50.0, 700.0),
            span("B", 200.0, 700.0),
            span("C", 50.0, 685.0),
            span("D", 400.0, 685.0),
        ];
        assert!(detect_tables(&spans, &[], &text_mode()).is_empty());
    }

    #[test]
    fn plain_prose_has_no_tables() {
        let spans = vec![
            span("Just", 50.0, 700.0),
            span("text", 75.0, 700.0),
            span("More", 50.0, 685.0),
            span("words", 75.0, 685.0),
        ];
        assert!(detect_tables(&spans, &[], &text_mode()).is_empty());
    }
}
