//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::PersistenceError;
use group_engine::AggregationRow;
use report_engine::{build_report_view, ReportCellStyle, ReportCellValue, ReportDefinition, ReportView};
use rust_xlsxwriter::{ColNum, Color, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet};
use std::path::Path;

const HEADER_FILL: u32 = 0xE0E0E0;
const GROUP_HEADER_FILL: u32 = 0xF5F5F5;

/// Lays out `rows` per `definition` and renders the workbook in one step.
pub fn export_report(
    rows: &[AggregationRow],
    definition: &ReportDefinition,
) -> Result<Vec<u8>, PersistenceError> {
    write_report_xlsx(&build_report_view(rows, definition))
}

/// Renders the report into an in-memory xlsx file.
pub fn write_report_xlsx(view: &ReportView) -> Result<Vec<u8>, PersistenceError> {
    let mut workbook = build_workbook(view)?;
    Ok(workbook.save_to_buffer()?)
}

/// Renders the report and saves it to `path`.
pub fn save_report_xlsx(view: &ReportView, path: &Path) -> Result<(), PersistenceError> {
    let mut workbook = build_workbook(view)?;
    workbook.save(path)?;
    Ok(())
}

fn build_workbook(view: &ReportView) -> Result<Workbook, PersistenceError> {
    let mut workbook = Workbook::new();
    let formats = ReportFormats::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&view.sheet_name)?;

    for (row, cells) in view.rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            // Merge masters and covered cells are written by merge_range.
            if cell.is_spanned || cell.row_span > 1 {
                continue;
            }
            let (row, col) = cell_position(row, col)?;
            write_cell(worksheet, row, col, &cell.value, formats.get(cell.style))?;
        }
    }

    for span in &view.merges {
        let Some(master) = view.cell(span.first_row, span.col) else {
            continue;
        };
        let text = match &master.value {
            ReportCellValue::Text(s) => s.clone(),
            ReportCellValue::Number(n) => engine::format_number(*n),
            ReportCellValue::Empty => String::new(),
        };
        let (first_row, col) = cell_position(span.first_row, span.col)?;
        let (last_row, _) = cell_position(span.last_row, span.col)?;
        worksheet.merge_range(first_row, col, last_row, col, &text, formats.get(master.style))?;
    }

    worksheet.autofit();
    Ok(workbook)
}

/// Converts view indices to worksheet coordinates without truncation.
fn cell_position(row: usize, col: usize) -> Result<(RowNum, ColNum), PersistenceError> {
    match (RowNum::try_from(row), ColNum::try_from(col)) {
        (Ok(r), Ok(c)) => Ok((r, c)),
        _ => Err(PersistenceError::OutOfBounds { row, col }),
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &ReportCellValue,
    format: &Format,
) -> Result<(), PersistenceError> {
    match value {
        ReportCellValue::Empty => {
            worksheet.write_blank(row, col, format)?;
        }
        ReportCellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        ReportCellValue::Text(s) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
    }
    Ok(())
}

/// One prebuilt format per cell style. All carry a thin border.
struct ReportFormats {
    header: Format,
    group_header: Format,
    data: Format,
}

impl ReportFormats {
    fn new() -> Self {
        let base = Format::new().set_border(FormatBorder::Thin);

        ReportFormats {
            header: base
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_FILL)),
            group_header: base
                .clone()
                .set_bold()
                .set_background_color(Color::RGB(GROUP_HEADER_FILL))
                .set_align(FormatAlign::VerticalCenter),
            data: base,
        }
    }

    fn get(&self, style: ReportCellStyle) -> &Format {
        match style {
            ReportCellStyle::Header => &self.header,
            ReportCellStyle::GroupHeader => &self.group_header,
            ReportCellStyle::Data => &self.data,
        }
    }
}
