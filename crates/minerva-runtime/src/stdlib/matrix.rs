//! Dense matrix operations over `Vec<Vec<f64>>`
//!
//! Pure helpers used by the ML routines (normal equations need transpose,
//! multiply and inverse) and by `show` for pretty-printing. Row-major, all
//! rows equal length; dimension checks fail with `DimensionMismatch`.

use crate::value::{format_number, RuntimeError};

pub type Mat = Vec<Vec<f64>>;

fn shape(m: &Mat) -> (usize, usize) {
    (m.len(), m.first().map_or(0, Vec::len))
}

fn check_same_shape(a: &Mat, b: &Mat, op: &str) -> Result<(), RuntimeError> {
    if shape(a) != shape(b) {
        return Err(RuntimeError::DimensionMismatch(format!(
            "{op} needs equal shapes, found {:?} and {:?}",
            shape(a),
            shape(b)
        )));
    }
    Ok(())
}

pub fn add(a: &Mat, b: &Mat) -> Result<Mat, RuntimeError> {
    check_same_shape(a, b, "matrix addition")?;
    Ok(a.iter()
        .zip(b)
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| x + y).collect())
        .collect())
}

pub fn subtract(a: &Mat, b: &Mat) -> Result<Mat, RuntimeError> {
    check_same_shape(a, b, "matrix subtraction")?;
    Ok(a.iter()
        .zip(b)
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| x - y).collect())
        .collect())
}

pub fn scale(a: &Mat, factor: f64) -> Mat {
    a.iter()
        .map(|row| row.iter().map(|x| x * factor).collect())
        .collect()
}

pub fn multiply(a: &Mat, b: &Mat) -> Result<Mat, RuntimeError> {
    let (rows_a, cols_a) = shape(a);
    let (rows_b, cols_b) = shape(b);
    if cols_a != rows_b {
        return Err(RuntimeError::DimensionMismatch(format!(
            "cannot multiply {rows_a}x{cols_a} by {rows_b}x{cols_b}"
        )));
    }
    let mut result = vec![vec![0.0; cols_b]; rows_a];
    for i in 0..rows_a {
        for j in 0..cols_b {
            let mut sum = 0.0;
            for k in 0..cols_a {
                sum += a[i][k] * b[k][j];
            }
            result[i][j] = sum;
        }
    }
    Ok(result)
}

pub fn transpose(a: &Mat) -> Mat {
    let (rows, cols) = shape(a);
    let mut result = vec![vec![0.0; rows]; cols];
    for (i, row) in a.iter().enumerate() {
        for (j, &x) in row.iter().enumerate() {
            result[j][i] = x;
        }
    }
    result
}

pub fn identity(n: usize) -> Mat {
    let mut result = vec![vec![0.0; n]; n];
    for (i, row) in result.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    result
}

const PIVOT_EPSILON: f64 = 1e-12;

/// Inverse by Gauss-Jordan elimination with partial pivoting. Fails with
/// `SingularMatrix` when no usable pivot remains.
pub fn inverse(a: &Mat) -> Result<Mat, RuntimeError> {
    let n = a.len();
    if a.iter().any(|row| row.len() != n) {
        return Err(RuntimeError::DimensionMismatch(
            "inverse needs a square matrix".to_string(),
        ));
    }

    let mut work = a.clone();
    let mut inv = identity(n);

    for col in 0..n {
        // Partial pivoting: bring the largest remaining entry up.
        let mut pivot_row = col;
        for row in col + 1..n {
            if work[row][col].abs() > work[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        let pivot = work[pivot_row][col];
        if pivot.abs() < PIVOT_EPSILON {
            return Err(RuntimeError::SingularMatrix);
        }
        work.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        for j in 0..n {
            work[col][j] /= pivot;
            inv[col][j] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = work[row][col];
                for j in 0..n {
                    work[row][j] -= factor * work[col][j];
                    inv[row][j] -= factor * inv[col][j];
                }
            }
        }
    }

    Ok(inv)
}

/// One display line per row, used by `show`.
pub fn render(a: &Mat) -> Vec<String> {
    a.iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|x| format_number(*x)).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(a: &Mat, b: &Mat, tolerance: f64) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(ra, rb)| ra.iter().zip(rb).all(|(x, y)| (x - y).abs() < tolerance))
    }

    #[test]
    fn add_and_subtract_elementwise() {
        let a = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let b = vec![vec![5.0, 6.0], vec![7.0, 8.0]];
        assert_eq!(add(&a, &b).unwrap(), vec![vec![6.0, 8.0], vec![10.0, 12.0]]);
        assert_eq!(
            subtract(&b, &a).unwrap(),
            vec![vec![4.0, 4.0], vec![4.0, 4.0]]
        );
        assert!(add(&a, &[vec![1.0]].to_vec()).is_err());
    }

    #[test]
    fn multiply_checks_inner_dimension() {
        let a = vec![vec![1.0, 2.0, 3.0]];
        let b = vec![vec![4.0], vec![5.0], vec![6.0]];
        assert_eq!(multiply(&a, &b).unwrap(), vec![vec![32.0]]);
        assert!(multiply(&a, &a).is_err());
    }

    #[test]
    fn transpose_flips_shape() {
        let a = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        assert_eq!(
            transpose(&a),
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
        );
    }

    #[test]
    fn inverse_times_original_is_identity() {
        let a = vec![
            vec![4.0, 7.0, 2.0],
            vec![3.0, 6.0, 1.0],
            vec![2.0, 5.0, 3.0],
        ];
        let inv = inverse(&a).unwrap();
        let product = multiply(&a, &inv).unwrap();
        assert!(close(&product, &identity(3), 1e-9));
    }

    #[test]
    fn inverse_pivots_past_a_zero_diagonal() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let inv = inverse(&a).unwrap();
        assert!(close(&inv, &a, 1e-12));
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert_eq!(inverse(&a), Err(RuntimeError::SingularMatrix));
    }

    #[test]
    fn render_formats_rows() {
        let a = vec![vec![1.0, 2.5], vec![3.0, 4.0]];
        assert_eq!(render(&a), ["[1, 2.5]", "[3, 4]"]);
    }
}
