//! Row-major 4x4 matrix algebra.

use crate::foundation::core::Mat4;
use crate::foundation::error::{BrainError, BrainResult};

/// Row-major product `a * b`.
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = (0..4).map(|k| a.at(row, k) * b.at(k, col)).sum();
        }
    }
    Mat4(out)
}

/// Determinant by cofactor expansion along the first column.
pub fn determinant(m: &Mat4) -> f64 {
    let c = cofactors_first_col(m);
    m.0[0] * c[0] + m.0[4] * c[1] + m.0[8] * c[2] + m.0[12] * c[3]
}

/// Inverse of `m`.
///
/// Fails with [`BrainError::SingularMatrix`] only when the determinant is exactly zero; nearly
/// singular inputs are inverted as-is.
pub fn invert(m: &Mat4) -> BrainResult<Mat4> {
    let [
        n11, n12, n13, n14, n21, n22, n23, n24, n31, n32, n33, n34, n41, n42, n43, n44,
    ] = m.0;

    let [t11, t12, t13, t14] = cofactors_first_col(m);
    let det = n11 * t11 + n21 * t12 + n31 * t13 + n41 * t14;
    if det == 0.0 {
        return Err(BrainError::SingularMatrix);
    }
    let inv = 1.0 / det;

    let mut te = [0.0; 16];
    te[0] = t11 * inv;
    te[4] = (n24 * n33 * n41 - n23 * n34 * n41 - n24 * n31 * n43 + n21 * n34 * n43
        + n23 * n31 * n44
        - n21 * n33 * n44)
        * inv;
    te[8] = (n22 * n34 * n41 - n24 * n32 * n41 + n24 * n31 * n42 - n21 * n34 * n42
        - n22 * n31 * n44
        + n21 * n32 * n44)
        * inv;
    te[12] = (n23 * n32 * n41 - n22 * n33 * n41 - n23 * n31 * n42 + n21 * n33 * n42
        + n22 * n31 * n43
        - n21 * n32 * n43)
        * inv;

    te[1] = t12 * inv;
    te[5] = (n13 * n34 * n41 - n14 * n33 * n41 + n14 * n31 * n43 - n11 * n34 * n43
        - n13 * n31 * n44
        + n11 * n33 * n44)
        * inv;
    te[9] = (n14 * n32 * n41 - n12 * n34 * n41 - n14 * n31 * n42 + n11 * n34 * n42
        + n12 * n31 * n44
        - n11 * n32 * n44)
        * inv;
    te[13] = (n12 * n33 * n41 - n13 * n32 * n41 + n13 * n31 * n42 - n11 * n33 * n42
        - n12 * n31 * n43
        + n11 * n32 * n43)
        * inv;

    te[2] = t13 * inv;
    te[6] = (n14 * n23 * n41 - n13 * n24 * n41 - n14 * n21 * n43 + n11 * n24 * n43
        + n13 * n21 * n44
        - n11 * n23 * n44)
        * inv;
    te[10] = (n12 * n24 * n41 - n14 * n22 * n41 + n14 * n21 * n42 - n11 * n24 * n42
        - n12 * n21 * n44
        + n11 * n22 * n44)
        * inv;
    te[14] = (n13 * n22 * n41 - n12 * n23 * n41 - n13 * n21 * n42 + n11 * n23 * n42
        + n12 * n21 * n43
        - n11 * n22 * n43)
        * inv;

    te[3] = t14 * inv;
    te[7] = (n13 * n24 * n31 - n14 * n23 * n31 + n14 * n21 * n33 - n11 * n24 * n33
        - n13 * n21 * n34
        + n11 * n23 * n34)
        * inv;
    te[11] = (n14 * n22 * n31 - n12 * n24 * n31 - n14 * n21 * n32 + n11 * n24 * n32
        + n12 * n21 * n34
        - n11 * n22 * n34)
        * inv;
    te[15] = (n12 * n23 * n31 - n13 * n22 * n31 + n13 * n21 * n32 - n11 * n23 * n32
        - n12 * n21 * n33
        + n11 * n22 * n33)
        * inv;

    Ok(Mat4(te))
}

fn cofactors_first_col(m: &Mat4) -> [f64; 4] {
    let [
        _n11, n12, n13, n14, _n21, n22, n23, n24, _n31, n32, n33, n34, _n41, n42, n43, n44,
    ] = m.0;
    [
        n23 * n34 * n42 - n24 * n33 * n42 + n24 * n32 * n43 - n22 * n34 * n43 - n23 * n32 * n44
            + n22 * n33 * n44,
        n14 * n33 * n42 - n13 * n34 * n42 - n14 * n32 * n43 + n12 * n34 * n43 + n13 * n32 * n44
            - n12 * n33 * n44,
        n13 * n24 * n42 - n14 * n23 * n42 + n14 * n22 * n43 - n12 * n24 * n43 - n13 * n22 * n44
            + n12 * n23 * n44,
        n14 * n23 * n32 - n13 * n24 * n32 - n14 * n22 * n33 + n12 * n24 * n33 + n13 * n22 * n34
            - n12 * n23 * n34,
    ]
}

/// Build a matrix from 16 row-major values, or from 12 values of an affine whose last row is
/// implied to be `0 0 0 1`.
pub fn spread_4x4(values: &[f64]) -> BrainResult<Mat4> {
    let mut out = [0.0; 16];
    match values.len() {
        16 => out.copy_from_slice(values),
        12 => {
            out[..12].copy_from_slice(values);
            out[15] = 1.0;
        }
        n => {
            return Err(BrainError::validation(format!(
                "matrix must have 12 or 16 elements, got {n}"
            )));
        }
    }
    Ok(Mat4(out))
}

/// Flatten a nested row representation (`[[..4]; 3|4]`) into a matrix.
pub fn from_rows(rows: &[Vec<f64>]) -> BrainResult<Mat4> {
    if rows.iter().any(|r| r.len() != 4) {
        return Err(BrainError::validation("matrix rows must have 4 elements"));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    spread_4x4(&flat)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/matrix.rs"]
mod tests;
