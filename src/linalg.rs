//! Shape-checked vector and matrix primitives used by the layers.
//!
//! Every operation that combines two operands verifies that their shapes agree and
//! fails with [`MlErr::SizeMismatch`] otherwise, instead of letting `ndarray` panic
//! or broadcast.

use ndarray::{Array, Array1, Array2, ArrayView, ArrayView1, ArrayView2, Axis, Dimension};

use crate::{MlErr, Result};

/// Elementwise addition of two tensors with the same shape.
pub fn add<D: Dimension>(a: ArrayView<f32, D>, b: ArrayView<f32, D>) -> Result<Array<f32, D>> {
    check_same_shape("addition operands", &a, &b)?;
    Ok(&a + &b)
}

/// Adds `x` into `acc` elementwise.
pub fn add_assign<D: Dimension>(acc: &mut Array<f32, D>, x: ArrayView<f32, D>) -> Result<()> {
    check_same_shape("accumulator", &acc.view(), &x)?;
    *acc += &x;
    Ok(())
}

/// Elementwise (Hadamard) product of two vectors.
pub fn hadamard(a: ArrayView1<f32>, b: ArrayView1<f32>) -> Result<Array1<f32>> {
    check_same_shape("hadamard operands", &a, &b)?;
    Ok(&a * &b)
}

/// Computes the row vector times matrix product `v · m`.
///
/// # Returns
/// A vector with as many elements as `m` has columns, or an error if `v`'s length
/// differs from `m`'s row count.
pub fn vec_mat_mul(v: ArrayView1<f32>, m: ArrayView2<f32>) -> Result<Array1<f32>> {
    if v.len() != m.nrows() {
        return Err(MlErr::SizeMismatch {
            what: "vector-matrix product",
            got: v.len(),
            expected: m.nrows(),
        });
    }

    Ok(v.dot(&m))
}

/// Returns the transposed view of `m`.
pub fn transpose(m: ArrayView2<'_, f32>) -> ArrayView2<'_, f32> {
    m.reversed_axes()
}

/// Outer product `a ⊗ b`, of shape `(a.len(), b.len())`.
pub fn outer(a: ArrayView1<f32>, b: ArrayView1<f32>) -> Array2<f32> {
    let a = a.insert_axis(Axis(1));
    let b = b.insert_axis(Axis(0));
    a.dot(&b)
}

fn check_same_shape<D: Dimension>(
    what: &'static str,
    a: &ArrayView<f32, D>,
    b: &ArrayView<f32, D>,
) -> Result<()> {
    if a.shape() == b.shape() {
        return Ok(());
    }

    let (got, expected) = a
        .shape()
        .iter()
        .zip(b.shape())
        .find(|(x, y)| x != y)
        .map(|(&x, &y)| (y, x))
        .unwrap_or((b.len(), a.len()));

    Err(MlErr::SizeMismatch {
        what,
        got,
        expected,
    })
}
