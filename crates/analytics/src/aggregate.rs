use crate::error::AnalyticsError;
use core_types::RelativeMatrix;

/// Cell-wise mean of matrices sharing one axis, skipping `NaN` contributions.
///
/// A cell with no defined contribution is `NaN`. Returns the mean matrix and
/// the number of contributions behind each cell, column-major like the matrix.
pub fn mean_ignoring_nan<'a, I>(matrices: I) -> Result<(RelativeMatrix, Vec<Vec<usize>>), AnalyticsError>
where
    I: IntoIterator<Item = &'a RelativeMatrix>,
{
    let mut iter = matrices.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| AnalyticsError::InvalidParameter("no matrices to average".to_string()))?;

    let rows = first.len();
    let instruments = first.instruments().to_vec();
    let mut sums = vec![vec![0.0_f64; rows]; instruments.len()];
    let mut counts = vec![vec![0_usize; rows]; instruments.len()];

    for matrix in std::iter::once(first).chain(iter) {
        if matrix.offsets() != first.offsets() || matrix.instruments() != first.instruments() {
            return Err(AnalyticsError::MisalignedAxes);
        }
        for (col, symbol) in instruments.iter().enumerate() {
            let values = matrix.column(symbol).ok_or(AnalyticsError::MisalignedAxes)?;
            for (row, value) in values.iter().enumerate() {
                if !value.is_nan() {
                    sums[col][row] += value;
                    counts[col][row] += 1;
                }
            }
        }
    }

    let columns: Vec<Vec<f64>> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, count)| {
            sum.iter()
                .zip(count)
                .map(|(s, n)| if *n == 0 { f64::NAN } else { s / *n as f64 })
                .collect()
        })
        .collect();

    let mean = RelativeMatrix::new(first.offsets().to_vec(), instruments, columns)?;
    Ok((mean, counts))
}
