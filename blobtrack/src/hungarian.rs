/// Hungarian algorithm implementation for optimal assignment
///
/// This module solves the rectangular minimum-cost assignment between
/// predicted track positions (rows) and detections (columns).
use crate::error::{Result, TrackerError};
use ndarray::{Array2, ArrayView2};

/// Result of Hungarian assignment algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentResult {
    /// Matched column for every row, `None` when the row is unmatched
    pub row_to_col: Vec<Option<usize>>,
    /// Whether each column was consumed by some row
    pub col_assigned: Vec<bool>,
    /// Sum of the costs of all matched pairs
    pub total_cost: f64,
}

impl AssignmentResult {
    fn empty(rows: usize, cols: usize) -> Self {
        Self {
            row_to_col: vec![None; rows],
            col_assigned: vec![false; cols],
            total_cost: 0.0,
        }
    }

    /// Matched pairs as (row, col), in row order
    pub fn assignments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| (row, c)))
    }

    pub fn unassigned_rows(&self) -> Vec<usize> {
        self.row_to_col
            .iter()
            .enumerate()
            .filter(|(_, col)| col.is_none())
            .map(|(row, _)| row)
            .collect()
    }

    pub fn unassigned_cols(&self) -> Vec<usize> {
        self.col_assigned
            .iter()
            .enumerate()
            .filter(|(_, assigned)| !**assigned)
            .map(|(col, _)| col)
            .collect()
    }
}

/// Hungarian assignment solver
pub struct HungarianSolver;

/// Dual variables of an optimal solution.
///
/// `cost[[i, j]] - row[i] - col[j]` is never negative, and it is zero on every
/// pair that any optimal assignment uses.
struct Potentials {
    row: Vec<f64>,
    col: Vec<f64>,
}

impl HungarianSolver {
    /// Solve the rectangular assignment problem.
    ///
    /// Every row is matched to at most one column and vice versa, and
    /// `min(rows, cols)` pairs are always formed, which is the same as padding
    /// the matrix to square with zero-cost dummy entries. When several
    /// assignments reach the optimal cost the lowest-index one is returned:
    /// row 0 gets the lowest column it can take without losing optimality,
    /// then row 1, and so on, with "unmatched" ranking after every column.
    ///
    /// # Arguments
    /// * `cost_matrix` - cost_matrix\[i\]\[j\] is the cost of assigning row i to column j
    pub fn solve(cost_matrix: ArrayView2<f64>) -> Result<AssignmentResult> {
        let (rows, cols) = cost_matrix.dim();

        for ((row, col), &value) in cost_matrix.indexed_iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::InvalidCost { row, col, value });
            }
        }

        if rows == 0 || cols == 0 {
            return Ok(AssignmentResult::empty(rows, cols));
        }

        let (optimal, potentials) = Self::optimal(cost_matrix);
        let row_to_col = Self::lowest_index_optimum(cost_matrix, optimal, &potentials);

        let mut result = AssignmentResult::empty(rows, cols);
        for col in row_to_col.iter().flatten() {
            result.col_assigned[*col] = true;
        }
        result.total_cost = Self::cost_of(cost_matrix, &row_to_col);
        result.row_to_col = row_to_col;
        Ok(result)
    }

    /// Some optimal assignment together with its potentials
    fn optimal(cost: ArrayView2<f64>) -> (Vec<Option<usize>>, Potentials) {
        let (rows, cols) = cost.dim();
        if rows == 0 || cols == 0 {
            let potentials = Potentials {
                row: vec![0.0; rows],
                col: vec![0.0; cols],
            };
            return (vec![None; rows], potentials);
        }

        if rows <= cols {
            let (row_to_col, u, v) = Self::solve_wide(cost);
            (row_to_col, Potentials { row: u, col: v })
        } else {
            // Solve with detections as rows, then invert the mapping
            let (col_to_row, u, v) = Self::solve_wide(cost.t());
            let mut row_to_col = vec![None; rows];
            for (col, row) in col_to_row.into_iter().enumerate() {
                if let Some(row) = row {
                    row_to_col[row] = Some(col);
                }
            }
            (row_to_col, Potentials { row: v, col: u })
        }
    }

    fn cost_of(cost: ArrayView2<f64>, row_to_col: &[Option<usize>]) -> f64 {
        row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| cost[[row, c]]))
            .sum()
    }

    /// Walk the rows in order and move each to the lowest column that still
    /// admits an optimal completion of the remaining rows.
    ///
    /// Only pairs with zero reduced cost can appear in an optimal assignment,
    /// so other columns are skipped without re-solving.
    fn lowest_index_optimum(
        cost: ArrayView2<f64>,
        mut current: Vec<Option<usize>>,
        potentials: &Potentials,
    ) -> Vec<Option<usize>> {
        let (rows, cols) = cost.dim();
        let pairs = rows.min(cols);
        let optimum = Self::cost_of(cost, &current);
        let largest = cost.iter().fold(0.0f64, |m, &c| m.max(c));
        let tolerance = 1e-9 * (1.0 + largest * pairs as f64);

        let mut col_taken = vec![false; cols];
        let mut prefix_cost = 0.0;
        let mut prefix_pairs = 0;

        for i in 0..rows {
            let limit = current[i].unwrap_or(cols);
            for j in 0..limit {
                if col_taken[j] {
                    continue;
                }
                let reduced = cost[[i, j]] - potentials.row[i] - potentials.col[j];
                if reduced > tolerance {
                    continue;
                }

                let rest_rows: Vec<usize> = (i + 1..rows).collect();
                let rest_cols: Vec<usize> = (0..cols)
                    .filter(|&c| c != j && !col_taken[c])
                    .collect();
                let needed = pairs - prefix_pairs - 1;
                if rest_rows.len().min(rest_cols.len()) != needed {
                    continue;
                }

                let rest = Array2::from_shape_fn((rest_rows.len(), rest_cols.len()), |(r, c)| {
                    cost[[rest_rows[r], rest_cols[c]]]
                });
                let (rest_assignment, _) = Self::optimal(rest.view());
                let total =
                    prefix_cost + cost[[i, j]] + Self::cost_of(rest.view(), &rest_assignment);

                if (total - optimum).abs() <= tolerance {
                    current[i] = Some(j);
                    for (row, col) in rest_rows.iter().zip(&rest_assignment) {
                        current[*row] = col.map(|c| rest_cols[c]);
                    }
                    break;
                }
            }

            if let Some(j) = current[i] {
                col_taken[j] = true;
                prefix_cost += cost[[i, j]];
                prefix_pairs += 1;
            }
        }
        current
    }

    /// Shortest augmenting path Hungarian method for `rows <= cols`.
    ///
    /// Uses 1-based potentials `u` (rows) and `v` (columns); column 0 is a
    /// virtual source. Runs in O(rows^2 * cols). Returns the assignment and
    /// the 0-based row and column potentials.
    fn solve_wide(cost: ArrayView2<f64>) -> (Vec<Option<usize>>, Vec<f64>, Vec<f64>) {
        let (n, m) = cost.dim();
        debug_assert!(n <= m);

        let mut u = vec![0.0f64; n + 1];
        let mut v = vec![0.0f64; m + 1];
        // p[j] = row matched to column j (1-based, 0 = free)
        let mut p = vec![0usize; m + 1];
        let mut way = vec![0usize; m + 1];

        for i in 1..=n {
            p[0] = i;
            let mut j0 = 0usize;
            let mut minv = vec![f64::INFINITY; m + 1];
            let mut used = vec![false; m + 1];

            loop {
                used[j0] = true;
                let i0 = p[j0];
                let mut delta = f64::INFINITY;
                let mut j1 = 0usize;

                for j in 1..=m {
                    if used[j] {
                        continue;
                    }
                    let reduced = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                    if reduced < minv[j] {
                        minv[j] = reduced;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }

                for j in 0..=m {
                    if used[j] {
                        u[p[j]] += delta;
                        v[j] -= delta;
                    } else {
                        minv[j] -= delta;
                    }
                }

                j0 = j1;
                if p[j0] == 0 {
                    break;
                }
            }

            // Flip the augmenting path back to the source
            loop {
                let j1 = way[j0];
                p[j0] = p[j1];
                j0 = j1;
                if j0 == 0 {
                    break;
                }
            }
        }

        let mut row_to_col = vec![None; n];
        for j in 1..=m {
            if p[j] != 0 {
                row_to_col[p[j] - 1] = Some(j - 1);
            }
        }
        (row_to_col, u[1..].to_vec(), v[1..].to_vec())
    }
}
