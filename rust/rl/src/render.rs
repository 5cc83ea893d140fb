use itertools::Itertools;
use mdp::{Error, Result};
use ndarray::{ArrayView, Ix2, IxDyn, ShapeError};
use std::fmt::Display;

/// Cells per line when a one-dimensional table is printed.
pub const WRAP: usize = 10;

/// Right-aligned text table of `cells` laid out row-major over `shape`.
pub fn table(shape: &[usize], cells: &[String]) -> Result<String> {
    let bad_shape = |e: ShapeError| Error::InvalidArgument(format!("shape {shape:?}: {e}"));
    let view = ArrayView::from_shape(IxDyn(shape), cells).map_err(bad_shape)?;
    let width = cells.iter().map(|c| c.chars().count()).max().unwrap_or(0);

    let lines = match view.ndim() {
        1 => cells.chunks(WRAP).map(|row| line(row.iter(), width)).collect_vec(),
        2 => view
            .into_dimensionality::<Ix2>()
            .map_err(bad_shape)?
            .rows()
            .into_iter()
            .map(|row| line(row.iter(), width))
            .collect_vec(),
        n => {
            return Err(Error::InvalidArgument(format!(
                "cannot print a {n}-dimensional table"
            )))
        }
    };
    Ok(lines.join("\n"))
}

fn line<'a>(row: impl Iterator<Item = &'a String>, width: usize) -> String {
    row.map(|c| format!("{c:>width$}")).join(" ")
}

pub fn values(shape: &[usize], values: &[f64]) -> Result<String> {
    let cells = values.iter().map(|v| format!("{v:.2}")).collect_vec();
    table(shape, &cells)
}

/// States without an action print as a dot.
pub fn policy<A: Display>(shape: &[usize], actions: &[Option<A>]) -> Result<String> {
    let cells = actions
        .iter()
        .map(|a| a.as_ref().map_or_else(|| "·".to_string(), |a| a.to_string()))
        .collect_vec();
    table(shape, &cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grids_print_one_row_per_line() {
        let out = values(&[2, 2], &[0., -1.5, 12., 3.25]).unwrap();
        assert_eq!(out, " 0.00 -1.50\n12.00  3.25");
    }

    #[test]
    fn long_rows_wrap() {
        let mut actions = (0..12).map(Some).collect_vec();
        actions[0] = None;
        actions[11] = None;
        let out = policy(&[12], &actions).unwrap();
        let lines = out.lines().collect_vec();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" · "));
        assert_eq!(lines[1], "10  ·");
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        assert!(values(&[3, 3], &[0.; 4]).is_err());
        assert!(values(&[1, 2, 2], &[0.; 4]).is_err());
    }
}
