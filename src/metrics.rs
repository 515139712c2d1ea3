use ndarray::{ArrayView1, ArrayView2};

use crate::{MlErr, Result};

/// Computes the fraction of samples whose predicted class matches the expected one.
///
/// The class of a row is the index of its largest element, ties resolve to the lowest
/// index.
///
/// # Arguments
/// * `y_pred` - The model's outputs, one sample per row.
/// * `y_true` - The one-hot encoded expected classes.
///
/// # Returns
/// The accuracy in `[0, 1]`, or an error if the shapes disagree or there are no samples.
pub fn accuracy(y_pred: ArrayView2<f32>, y_true: ArrayView2<f32>) -> Result<f32> {
    if y_pred.dim() != y_true.dim() {
        let (got, expected) = if y_pred.nrows() != y_true.nrows() {
            (y_pred.nrows(), y_true.nrows())
        } else {
            (y_pred.ncols(), y_true.ncols())
        };

        return Err(MlErr::SizeMismatch {
            what: "predictions",
            got,
            expected,
        });
    }

    if y_pred.nrows() == 0 {
        return Err(MlErr::IllegalState("accuracy of an empty batch"));
    }

    let hits = y_pred
        .outer_iter()
        .zip(y_true.outer_iter())
        .filter(|(p, t)| argmax(*p) == argmax(*t))
        .count();

    Ok(hits as f32 / y_pred.nrows() as f32)
}

/// Index of the largest element of `v`, `None` if it's empty.
pub fn argmax(v: ArrayView1<f32>) -> Option<usize> {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &x)| match best {
            Some((_, max)) if max >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn test_argmax_picks_first_maximum() {
        assert_eq!(argmax(arr1(&[0.1, 0.7, 0.2]).view()), Some(1));
        assert_eq!(argmax(arr1(&[0.5, 0.5]).view()), Some(0));
        assert_eq!(argmax(arr1(&[-3., -1., -2.]).view()), Some(1));
        assert_eq!(argmax(ndarray::Array1::<f32>::zeros(0).view()), None);
    }

    #[test]
    fn test_accuracy() {
        let y_pred = arr2(&[[0.9, 0.1, 0.], [0.2, 0.3, 0.5], [0.1, 0.8, 0.1], [0.3, 0.3, 0.4]]);
        let y_true = arr2(&[[1., 0., 0.], [0., 0., 1.], [1., 0., 0.], [0., 1., 0.]]);

        let acc = accuracy(y_pred.view(), y_true.view()).unwrap();

        assert_relative_eq!(acc, 0.5);
    }

    #[test]
    fn test_accuracy_rejects_bad_shapes() {
        let y_pred = arr2(&[[0.9, 0.1]]);

        assert!(matches!(
            accuracy(y_pred.view(), arr2(&[[1., 0., 0.]]).view()),
            Err(MlErr::SizeMismatch {
                got: 2,
                expected: 3,
                ..
            })
        ));
        assert!(matches!(
            accuracy(y_pred.view(), arr2(&[[1., 0.], [0., 1.]]).view()),
            Err(MlErr::SizeMismatch { .. })
        ));

        let empty = ndarray::Array2::<f32>::zeros((0, 2));
        assert!(matches!(
            accuracy(empty.view(), empty.view()),
            Err(MlErr::IllegalState(_))
        ));
    }
}
