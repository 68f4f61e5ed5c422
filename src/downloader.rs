#![cfg(not(tarpaulin_include))]

use crate::grid::GridState;

/// Convert the flat view to CSV
///
/// Exports exactly what the flat view shows: visible columns in their
/// current order, column filters and header sort applied, edits and remarks
/// in place of the generated values. The first line holds the column headers.
///
/// # Examples
/// ```
/// use obligation_grid::downloader::to_csv;
/// use obligation_grid::grid::GridState;
///
/// let grid = GridState::new(Vec::new());
/// let csv = to_csv(&grid);
/// assert!(csv.starts_with("Contract ID,"));
/// ```
pub fn to_csv(grid: &GridState) -> String {
    let view = grid.flat_view();
    let mut csv_content = String::new();

    push_csv_line(
        &mut csv_content,
        view.columns.iter().map(|column| column.header),
    );
    for row in &view.rows {
        push_csv_line(&mut csv_content, row.cells.iter().map(String::as_str));
    }

    csv_content
}

fn push_csv_line<'a>(out: &mut String, values: impl Iterator<Item = &'a str>) {
    for (i, value) in values.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if value.contains([',', '"', '\n', '\r']) {
            let escaped = value.replace('"', "\"\"");
            out.push_str(&format!("\"{}\"", escaped));
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}

/// Convert the flat view to XLSX
///
/// Same content as [`to_csv`]. Numeric columns are written as numbers when
/// the displayed value parses as one, so spreadsheets can sum them.
#[cfg(feature = "web")]
pub fn to_xlsx(grid: &GridState) -> Result<Vec<u8>, crate::error::GridError> {
    use crate::error::GridError;
    use crate::grid::FlatView;
    use crate::model::FieldKind;
    use rust_xlsxwriter::{Workbook, Worksheet};

    let view: FlatView = grid.flat_view();
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    let export_error = |e: rust_xlsxwriter::XlsxError| GridError::Export(e.to_string());

    for (c, column) in view.columns.iter().enumerate() {
        worksheet
            .write_string(0, c as u16, column.header)
            .map_err(export_error)?;
    }

    for (r, row) in view.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, (column, cell)) in view.columns.iter().zip(&row.cells).enumerate() {
            let c = c as u16;
            let number = match column.field.kind() {
                FieldKind::Numeric => cell.trim().parse::<f64>().ok(),
                _ => None,
            };
            match number {
                Some(number) => worksheet.write_number(r, c, number),
                None => worksheet.write_string(r, c, cell.as_str()),
            }
            .map_err(export_error)?;
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer().map_err(export_error)
}
