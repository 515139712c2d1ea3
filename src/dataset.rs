use std::{
    fs::File,
    io::{BufRead, BufReader},
    num::NonZeroUsize,
    path::Path,
};

use ndarray::{Array2, ArrayView2, Axis};

use crate::{MlErr, Result};

/// An in-memory set of samples and their expected outputs, one sample per row.
#[derive(Clone, Debug)]
pub struct Dataset {
    x: Array2<f32>,
    y: Array2<f32>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Returns
    /// A new `Dataset` or `MlErr::SizeMismatch` if `x` and `y` differ in their row count.
    pub fn new(x: Array2<f32>, y: Array2<f32>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "dataset labels",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        Ok(Self { x, y })
    }

    /// Loads a dataset stored as lines of `label,f1,f2,...`.
    ///
    /// Blank lines are skipped. Every line must have the same amount of features.
    ///
    /// # Arguments
    /// * `path` - The path of the file.
    /// * `num_classes` - The amount of classes, the labels are one-hot encoded into it.
    /// * `scale` - Every feature is divided by this value.
    ///
    /// # Returns
    /// The loaded dataset, or `MlErr::Parse` with the 1-based line number of the first
    /// malformed line.
    pub fn from_labeled_csv<P: AsRef<Path>>(
        path: P,
        num_classes: usize,
        scale: f32,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(MlErr::InvalidConfig(
                "the amount of classes must be positive".to_string(),
            ));
        }

        let reader = BufReader::new(File::open(path)?);

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut num_features = None;
        let mut rows = 0;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let lineno = i + 1;
            let parse_err = |msg: String| MlErr::Parse { line: lineno, msg };

            let mut values = line.split(',').map(str::trim);

            let label = values.next().unwrap_or_default();
            let label: usize = label
                .parse()
                .map_err(|_| parse_err(format!("cannot parse '{label}' as a label")))?;

            if label >= num_classes {
                return Err(parse_err(format!(
                    "label {label} is out of range for {num_classes} classes"
                )));
            }

            let start = features.len();
            for v in values {
                let v: f32 = v
                    .parse()
                    .map_err(|_| parse_err(format!("cannot parse '{v}' as f32")))?;
                features.push(v / scale);
            }

            let count = features.len() - start;
            match num_features {
                None if count == 0 => return Err(parse_err("the line has no features".into())),
                None => num_features = Some(count),
                Some(n) if n != count => {
                    return Err(parse_err(format!("expected {n} features, got {count}")));
                }
                Some(_) => {}
            }

            let mut one_hot = vec![0.; num_classes];
            one_hot[label] = 1.;
            labels.extend(one_hot);
            rows += 1;
        }

        let num_features = num_features.unwrap_or(0);
        let x = Array2::from_shape_vec((rows, num_features), features)
            .map_err(|e| MlErr::InvalidConfig(e.to_string()))?;
        let y = Array2::from_shape_vec((rows, num_classes), labels)
            .map_err(|e| MlErr::InvalidConfig(e.to_string()))?;

        Self::new(x, y)
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView2<'_, f32> {
        self.y.view()
    }

    /// Splits the dataset in contiguous `(x, y)` batches, the last one may be smaller.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        batches(self.x(), self.y(), batch_size)
    }
}

/// Splits the samples `x` and their expected outputs `y` in contiguous batches of
/// `batch_size` rows, in order. The last batch may be smaller.
pub fn batches<'a>(
    x: ArrayView2<'a, f32>,
    y: ArrayView2<'a, f32>,
    batch_size: NonZeroUsize,
) -> impl Iterator<Item = (ArrayView2<'a, f32>, ArrayView2<'a, f32>)> {
    let batch_size = batch_size.get();

    x.into_axis_chunks_iter(Axis(0), batch_size)
        .zip(y.into_axis_chunks_iter(Axis(0), batch_size))
}
