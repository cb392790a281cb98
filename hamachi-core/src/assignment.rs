//! Optimal assignment over a dense integer weight matrix.
//!
//! Implements the Hungarian method in its shortest-augmenting-path form with
//! row and column potentials. Each row is inserted in turn and matched along
//! the cheapest alternating path, giving `O(n^2 m)` time for an `n x m` matrix
//! with `n <= m`. Taller-than-wide inputs are solved on the transpose.
//!
//! Weights are `i64` so the optimum is exact; callers working with counts never
//! pay for floating-point rounding.

use tracing::{debug, instrument};

use crate::error::{EvaluationError, Result};

const UNREACHABLE_COST: i64 = i64::MAX / 4;

/// Row-major matrix of integer weights.
///
/// # Examples
/// ```
/// use hamachi_core::WeightMatrix;
///
/// let matrix = WeightMatrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]])?;
/// assert_eq!((matrix.rows(), matrix.cols()), (2, 3));
/// assert_eq!(matrix.get(1, 2), Some(6));
/// assert_eq!(matrix.transpose().get(2, 1), Some(6));
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    weights: Vec<i64>,
}

impl WeightMatrix {
    /// Wraps `weights` laid out row by row.
    ///
    /// # Errors
    /// Returns [`EvaluationError::MatrixShape`] when `weights.len()` differs from
    /// `rows * cols`.
    pub fn new(rows: usize, cols: usize, weights: Vec<i64>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(weights.len()) {
            return Err(EvaluationError::MatrixShape {
                rows,
                cols,
                values: weights.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            weights,
        })
    }

    /// Builds a matrix from nested rows.
    ///
    /// # Errors
    /// Returns [`EvaluationError::MatrixShape`] when the rows are ragged.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let weights: Vec<i64> = rows.into_iter().flatten().collect();
        Self::new(height, width, weights)
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Weight at (`row`, `col`), or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<i64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.weights.get(row * self.cols + col).copied()
    }

    /// Returns the transposed matrix.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut weights = Vec::with_capacity(self.weights.len());
        for col in 0..self.cols {
            weights.extend((0..self.rows).filter_map(|row| self.get(row, col)));
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            weights,
        }
    }

    fn negated(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            weights: self.weights.iter().map(|w| w.saturating_neg()).collect(),
        }
    }

    #[expect(
        clippy::indexing_slicing,
        reason = "callers pass coordinates taken from the matrix's own shape"
    )]
    fn weight(&self, row: usize, col: usize) -> i64 {
        self.weights[row * self.cols + col]
    }
}

/// A matching of `min(rows, cols)` row/column pairs and its total weight.
///
/// # Examples
/// ```
/// use hamachi_core::{Assignment, WeightMatrix};
///
/// let matrix = WeightMatrix::from_rows(vec![vec![4, 1, 3], vec![2, 0, 5], vec![3, 2, 2]])?;
/// let best = Assignment::minimise(&matrix);
/// assert_eq!(best.pairs(), &[(0, 1), (1, 0), (2, 2)]);
/// assert_eq!(best.total(), 5);
/// # Ok::<(), hamachi_core::EvaluationError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pairs: Vec<(usize, usize)>,
    total: i64,
}

impl Assignment {
    /// Finds the matching with the largest total weight.
    #[instrument(
        name = "core.assignment",
        level = "debug",
        skip_all,
        fields(rows = matrix.rows(), cols = matrix.cols(), objective = "max"),
    )]
    #[must_use]
    pub fn maximise(matrix: &WeightMatrix) -> Self {
        let pairs = solve(&matrix.negated());
        Self::from_pairs(matrix, pairs)
    }

    /// Finds the matching with the smallest total weight.
    #[instrument(
        name = "core.assignment",
        level = "debug",
        skip_all,
        fields(rows = matrix.rows(), cols = matrix.cols(), objective = "min"),
    )]
    #[must_use]
    pub fn minimise(matrix: &WeightMatrix) -> Self {
        let pairs = solve(matrix);
        Self::from_pairs(matrix, pairs)
    }

    fn from_pairs(matrix: &WeightMatrix, pairs: Vec<(usize, usize)>) -> Self {
        let total = pairs
            .iter()
            .map(|&(row, col)| matrix.weight(row, col))
            .fold(0_i64, i64::saturating_add);
        debug!(matched = pairs.len(), total, "assignment solved");
        Self { pairs, total }
    }

    /// Matched `(row, col)` pairs in ascending row order.
    #[must_use]
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Sum of the weights of the matched cells.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    /// Number of matched pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` when nothing was matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Column matched to `row`, if any.
    #[must_use]
    pub fn column_for(&self, row: usize) -> Option<usize> {
        self.pairs
            .binary_search_by_key(&row, |&(r, _)| r)
            .ok()
            .and_then(|index| self.pairs.get(index))
            .map(|&(_, col)| col)
    }
}

/// Minimum-cost matching, transposing when the matrix is taller than wide.
fn solve(costs: &WeightMatrix) -> Vec<(usize, usize)> {
    if costs.rows() == 0 || costs.cols() == 0 {
        return Vec::new();
    }
    if costs.rows() <= costs.cols() {
        return solve_wide(costs);
    }
    let mut pairs: Vec<(usize, usize)> = solve_wide(&costs.transpose())
        .into_iter()
        .map(|(row, col)| (col, row))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Shortest-augmenting-path Hungarian method for `rows <= cols`.
///
/// Index `0` of the potential and matching arrays is a sentinel column that
/// anchors the alternating path of the row being inserted; real rows and
/// columns are shifted up by one.
#[expect(
    clippy::indexing_slicing,
    reason = "every index is bounded by `rows + 1` or `cols + 1`, the lengths of the work arrays"
)]
fn solve_wide(costs: &WeightMatrix) -> Vec<(usize, usize)> {
    let rows = costs.rows();
    let cols = costs.cols();
    let mut row_potential = vec![0_i64; rows + 1];
    let mut col_potential = vec![0_i64; cols + 1];
    let mut matched_row = vec![0_usize; cols + 1];
    let mut previous_col = vec![0_usize; cols + 1];

    for row in 1..=rows {
        matched_row[0] = row;
        let mut current_col = 0_usize;
        let mut slack = vec![UNREACHABLE_COST; cols + 1];
        let mut visited = vec![false; cols + 1];

        loop {
            visited[current_col] = true;
            let current_row = matched_row[current_col];
            let mut delta = UNREACHABLE_COST;
            let mut next_col = 0_usize;

            for col in 1..=cols {
                if visited[col] {
                    continue;
                }
                let reduced = costs.weight(current_row - 1, col - 1)
                    - row_potential[current_row]
                    - col_potential[col];
                if reduced < slack[col] {
                    slack[col] = reduced;
                    previous_col[col] = current_col;
                }
                if slack[col] < delta {
                    delta = slack[col];
                    next_col = col;
                }
            }

            for col in 0..=cols {
                if visited[col] {
                    row_potential[matched_row[col]] += delta;
                    col_potential[col] -= delta;
                } else {
                    slack[col] -= delta;
                }
            }

            current_col = next_col;
            if matched_row[current_col] == 0 {
                break;
            }
        }

        // Flip the alternating path back to the sentinel.
        while current_col != 0 {
            let prior = previous_col[current_col];
            matched_row[current_col] = matched_row[prior];
            current_col = prior;
        }
    }

    let mut pairs: Vec<(usize, usize)> = matched_row
        .iter()
        .enumerate()
        .skip(1)
        .filter(|&(_, &row)| row != 0)
        .map(|(col, &row)| (row - 1, col - 1))
        .collect();
    pairs.sort_unstable();
    pairs
}
