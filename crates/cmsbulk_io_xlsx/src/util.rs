//! Stateless helpers used by the XLSX reader and writer.

use std::collections::{BTreeMap, BTreeSet};

use cmsbulk_core::{N_NCOLS_BULK, SpecDestinationCell};

use crate::conf::{
    C_SHEET_NAME_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecSheetGrid, SpecTemplateGrid, XlsxIoError};

////////////////////////////////////////////////////////////////////////////////
// #region HeaderUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_DEFAULT.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Cast a zero-based row index to the writer's row type.
pub fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(XlsxIoError::IndexOverflow(format!("row index overflow: {value}")));
    }
    u32::try_from(value)
        .map_err(|_| XlsxIoError::IndexOverflow(format!("row index overflow: {value}")))
}

/// Cast a zero-based column index to the writer's column type.
pub fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(XlsxIoError::IndexOverflow(format!("column index overflow: {value}")));
    }
    u16::try_from(value)
        .map_err(|_| XlsxIoError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TemplateFill

/// Render a read grid as text, padding every row to at least the bulk width.
pub fn derive_template_grid(grid: &SpecSheetGrid) -> SpecTemplateGrid {
    let n_width = usize::max(grid.width(), N_NCOLS_BULK);
    let rows = grid
        .rows
        .iter()
        .map(|row| {
            let mut l_cells: Vec<String> = row.iter().map(|cell| cell.to_text()).collect();
            l_cells.resize(n_width, String::new());
            l_cells
        })
        .collect();

    SpecTemplateGrid {
        sheet_name: grid.sheet_name.clone(),
        rows,
    }
}

/// Overwrite grid cells with destination cells (1-based row/column).
///
/// Rows are appended when a cell lands below the template. Returns the number
/// of cells placed; cells addressed at row or column 0 are skipped.
pub fn apply_destination_cells<'a, I>(grid: &mut SpecTemplateGrid, cells: I) -> usize
where
    I: IntoIterator<Item = &'a SpecDestinationCell>,
{
    let n_width = usize::max(
        grid.rows.iter().map(Vec::len).max().unwrap_or(0),
        N_NCOLS_BULK,
    );
    let mut n_cells_filled = 0usize;

    for cell in cells {
        let (Some(n_idx_row), Some(n_idx_col)) =
            (cell.row.checked_sub(1), cell.column.checked_sub(1))
        else {
            continue;
        };
        while grid.rows.len() <= n_idx_row {
            grid.rows.push(vec![String::new(); n_width]);
        }
        let row = &mut grid.rows[n_idx_row];
        if row.len() <= n_idx_col {
            row.resize(n_idx_col + 1, String::new());
        }
        row[n_idx_col] = cell.value.clone();
        n_cells_filled += 1;
    }

    n_cells_filled
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use cmsbulk_core::EnumCellValue;

    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_validate_unique_columns() {
        assert!(validate_unique_columns(&["a".to_string(), "b".to_string()]).is_ok());
        let c_err = validate_unique_columns(&["a".to_string(), "a".to_string()])
            .expect_err("duplicate");
        assert!(c_err.contains("\"a\" x2 at indices [0, 1]"));
    }

    #[test]
    fn test_cast_limits() {
        assert_eq!(cast_row_num(5).expect("row"), 5);
        assert!(cast_row_num(N_NROWS_EXCEL_MAX).is_err());
        assert!(cast_col_num(N_NCOLS_EXCEL_MAX).is_err());
    }

    #[test]
    fn test_apply_destination_cells_extends_and_overwrites() {
        let grid_read = SpecSheetGrid {
            sheet_name: "Bulk".to_string(),
            rows: vec![vec![EnumCellValue::from("H1"), EnumCellValue::Number(2.0)]],
        };
        let mut grid = derive_template_grid(&grid_read);
        assert_eq!(grid.rows[0].len(), N_NCOLS_BULK);
        assert_eq!(grid.rows[0][1], "2");

        let l_cells = vec![
            SpecDestinationCell {
                row: 3,
                column: 4,
                value: "60420250001".to_string(),
                if_force_text_format: true,
            },
            SpecDestinationCell {
                row: 0,
                column: 1,
                value: "skipped".to_string(),
                if_force_text_format: true,
            },
        ];
        let n_filled = apply_destination_cells(&mut grid, &l_cells);
        assert_eq!(n_filled, 1);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[2][3], "60420250001");
        assert_eq!(grid.rows[1].len(), N_NCOLS_BULK);
    }
}
