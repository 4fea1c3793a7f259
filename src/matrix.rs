use ndarray::{Array2, ArrayView2, Zip};

use crate::{
    error::{AcoError, Result},
    math::kbn_sum,
};

/// Pairwise travel costs between nodes. Read-only once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    costs: Array2<f64>,
}

#[allow(clippy::len_without_is_empty)]
impl DistanceMatrix {
    /// The matrix must be square with at least two nodes, and every entry finite
    /// and non-negative with a zero diagonal.
    pub fn new(costs: Array2<f64>) -> Result<Self> {
        let (rows, columns) = costs.dim();
        if rows != columns {
            return Err(AcoError::invalid(format!(
                "distance matrix must be square, got {rows}x{columns}"
            )));
        }
        if rows < 2 {
            return Err(AcoError::invalid(format!(
                "distance matrix needs at least 2 nodes, got {rows}"
            )));
        }
        for ((i, j), cost) in costs.indexed_iter() {
            if !cost.is_finite() || *cost < 0. {
                return Err(AcoError::invalid(format!(
                    "distance ({i}, {j}) must be finite and non-negative, got {cost}"
                )));
            }
            if i == j && *cost != 0. {
                return Err(AcoError::invalid(format!(
                    "distance ({i}, {i}) must be zero, got {cost}"
                )));
            }
        }
        Ok(Self { costs })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(AcoError::invalid(format!(
                "distance matrix row {i} has {} entries, expected {n}",
                row.len()
            )));
        }
        let flat = rows.into_iter().flatten().collect::<Vec<_>>();
        let costs = Array2::from_shape_vec((n, n), flat)
            .map_err(|err| AcoError::invalid(format!("malformed distance matrix: {err}")))?;
        Self::new(costs)
    }

    pub fn len(&self) -> usize {
        self.costs.nrows()
    }

    pub fn cost(&self, i: usize, j: usize) -> Result<f64> {
        check_bounds(self.len(), i, j)?;
        Ok(self.costs[[i, j]])
    }

    pub fn view(&self) -> ArrayView2<f64> {
        self.costs.view()
    }

    /// Off-diagonal pairs with zero cost, which would otherwise become divisors.
    pub fn zero_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.costs
            .indexed_iter()
            .filter(|((i, j), cost)| i != j && **cost == 0.)
            .map(|(idx, _)| idx)
    }

    /// Length of a sequence of nodes, including the edge from the last node back
    /// to the first when `closed`.
    pub fn tour_length(&self, tour: &[usize], closed: bool) -> Result<f64> {
        let closing = match (closed, tour.first(), tour.last()) {
            (true, Some(first), Some(last)) if tour.len() > 1 => Some((*last, *first)),
            _ => None,
        };
        let costs = tour
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(closing)
            .map(|(from, to)| self.cost(from, to))
            .collect::<Result<Vec<_>>>()?;
        Ok(kbn_sum(costs))
    }
}

/// Pheromone intensity on every directed edge. Only the colony writes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneMatrix {
    levels: Array2<f64>,
}

#[allow(clippy::len_without_is_empty)]
impl PheromoneMatrix {
    pub fn new(len: usize, initial_level: f64) -> Self {
        Self {
            levels: Array2::from_elem((len, len), initial_level),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.nrows()
    }

    pub fn pheromone(&self, i: usize, j: usize) -> Result<f64> {
        check_bounds(self.len(), i, j)?;
        Ok(self.levels[[i, j]])
    }

    pub fn set_pheromone(&mut self, i: usize, j: usize, level: f64) -> Result<()> {
        check_bounds(self.len(), i, j)?;
        self.levels[[i, j]] = level;
        Ok(())
    }

    pub fn deposit(&mut self, i: usize, j: usize, amount: f64) -> Result<()> {
        check_bounds(self.len(), i, j)?;
        self.levels[[i, j]] += amount;
        Ok(())
    }

    /// Scale every off-diagonal entry by `1 - rate`.
    pub fn evaporate(&mut self, rate: f64) {
        let retained = 1. - rate;
        Zip::indexed(&mut self.levels).par_for_each(|(i, j), level| {
            if i != j {
                *level *= retained;
            }
        });
    }

    /// Summed off-diagonal intensity
    pub fn total(&self) -> f64 {
        kbn_sum(
            self.levels
                .indexed_iter()
                .filter(|((i, j), _)| i != j)
                .map(|(_, level)| *level),
        )
    }

    pub fn view(&self) -> ArrayView2<f64> {
        self.levels.view()
    }
}

fn check_bounds(len: usize, i: usize, j: usize) -> Result<()> {
    match [i, j].into_iter().find(|index| *index >= len) {
        Some(index) => Err(AcoError::OutOfRange { index, len }),
        None => Ok(()),
    }
}
