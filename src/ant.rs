use bitvec::prelude::*;
use rand::Rng;
use rustc_hash::FxHashMap as HashMap;

use crate::{
    config::Problem,
    error::{AcoError, Result},
    matrix::{DistanceMatrix, PheromoneMatrix},
    sampling::weighted_choice,
};

/// Everything an ant may read while it builds a tour.
///
/// Holding shared borrows of both matrices for the whole construction phase is
/// what keeps pheromone writes out until every ant of a generation is done.
#[derive(Debug, Clone, Copy)]
pub struct ColonyView<'a> {
    pub distances: &'a DistanceMatrix,
    pub pheromones: &'a PheromoneMatrix,
    pub alpha: f64,
    pub beta: f64,
}

#[allow(clippy::len_without_is_empty)]
impl ColonyView<'_> {
    pub fn len(&self) -> usize {
        self.distances.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ant {
    tour: Vec<usize>,
    tour_length: f64,
    visited: BitVec,
    /// Pheromone level of the edge chosen when leaving each node
    memory: HashMap<usize, f64>,
    closed: bool,
}

impl Ant {
    pub fn new(start: usize, len: usize) -> Result<Self> {
        if start >= len {
            return Err(AcoError::OutOfRange { index: start, len });
        }
        let mut visited = bitvec![0; len];
        visited.set(start, true);
        let mut tour = Vec::with_capacity(len + 1);
        tour.push(start);
        Ok(Self {
            tour,
            tour_length: 0.,
            visited,
            memory: HashMap::default(),
            closed: false,
        })
    }

    /// Build a complete tour (or path) starting from `start`.
    pub fn construct<R: Rng + ?Sized>(
        start: usize,
        view: ColonyView,
        problem: Problem,
        step_limit: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut ant = Self::new(start, view.len())?;
        match problem {
            Problem::Tour => {
                while ant.tour.len() < view.len() {
                    ant.step(view, false, rng)?;
                }
                ant.close(view)?;
            }
            Problem::Path { destination, .. } => {
                let mut steps = 0;
                while ant.current() != destination {
                    if steps >= step_limit {
                        return Err(AcoError::StepLimitExceeded { limit: step_limit });
                    }
                    ant.step(view, true, rng)?;
                    steps += 1;
                }
            }
        }
        Ok(ant)
    }

    pub fn start(&self) -> usize {
        self.tour[0]
    }

    pub fn current(&self) -> usize {
        // Never empty, the start node is pushed on creation
        self.tour[self.tour.len() - 1]
    }

    /// Visited nodes in order. A closed tour does not repeat its start node.
    pub fn tour(&self) -> &[usize] {
        &self.tour
    }

    pub fn tour_length(&self) -> f64 {
        self.tour_length
    }

    pub fn into_tour(self) -> Vec<usize> {
        self.tour
    }

    pub fn has_visited(&self, node: usize) -> bool {
        self.visited.get(node).map(|bit| *bit).unwrap_or(false)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Pheromone level the ant saw on the edge it took out of `node`
    pub fn remembered(&self, node: usize) -> Option<f64> {
        self.memory.get(&node).copied()
    }

    /// Traversed edges, including the closing edge of a closed tour
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let closing = self
            .closed
            .then(|| (self.current(), self.start()))
            .filter(|_| self.tour.len() > 1);
        self.tour
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(closing)
    }

    /// Pick the next node with the pheromone/distance weighted rule.
    ///
    /// With `edges_only`, a zero pheromone level also marks a missing edge.
    pub fn select_next<R: Rng + ?Sized>(
        &self,
        view: ColonyView,
        edges_only: bool,
        rng: &mut R,
    ) -> Result<usize> {
        let current = self.current();
        let distances = view.distances.view();
        let pheromones = view.pheromones.view();

        let mut candidates = Vec::with_capacity(view.len());
        let mut weights = Vec::with_capacity(view.len());
        for (j, (distance, pheromone)) in distances
            .row(current)
            .iter()
            .zip(pheromones.row(current))
            .enumerate()
        {
            if self.visited[j] || *distance <= 0. || (edges_only && *pheromone <= 0.) {
                continue;
            }
            candidates.push(j);
            weights.push(pheromone.powf(view.alpha) * distance.recip().powf(view.beta));
        }

        weighted_choice(&candidates, &weights, rng).ok_or(AcoError::NoEligibleMove {
            node: current,
            visited: self.tour.len(),
        })
    }

    /// Select and move to the next node, returning it.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        view: ColonyView,
        edges_only: bool,
        rng: &mut R,
    ) -> Result<usize> {
        let next = self.select_next(view, edges_only, rng)?;
        self.move_to(next, view)?;
        Ok(next)
    }

    fn move_to(&mut self, next: usize, view: ColonyView) -> Result<()> {
        let current = self.current();
        self.tour_length += view.distances.cost(current, next)?;
        self.memory
            .insert(current, view.pheromones.pheromone(current, next)?);
        self.visited.set(next, true);
        self.tour.push(next);
        Ok(())
    }

    /// Return to the start node
    fn close(&mut self, view: ColonyView) -> Result<()> {
        let (current, start) = (self.current(), self.start());
        if current != start {
            self.tour_length += view.distances.cost(current, start)?;
            self.memory
                .insert(current, view.pheromones.pheromone(current, start)?);
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn view<'a>(distances: &'a DistanceMatrix, pheromones: &'a PheromoneMatrix) -> ColonyView<'a> {
        ColonyView {
            distances,
            pheromones,
            alpha: 1.,
            beta: 2.,
        }
    }

    fn four_cities() -> DistanceMatrix {
        DistanceMatrix::new(array![
            [0., 10., 15., 20.],
            [10., 0., 35., 25.],
            [15., 35., 0., 30.],
            [20., 25., 30., 0.],
        ])
        .unwrap()
    }

    /// 0 - 1 - 2 - 3, zero meaning no edge
    fn chain() -> DistanceMatrix {
        DistanceMatrix::new(array![
            [0., 1., 0., 0.],
            [1., 0., 2., 0.],
            [0., 2., 0., 3.],
            [0., 0., 3., 0.],
        ])
        .unwrap()
    }

    #[test]
    fn two_nodes_go_and_return() {
        let distances = DistanceMatrix::new(array![[0., 5.], [5., 0.]]).unwrap();
        let pheromones = PheromoneMatrix::new(2, 1.);
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for start in 0..2 {
                let ant = Ant::construct(start, view(&distances, &pheromones), Problem::Tour, 1, &mut rng)
                    .unwrap();
                assert_eq!(ant.tour_length(), 10.);
                assert_eq!(ant.tour().len(), 2);
                assert_eq!(ant.edges().count(), 2);
            }
        }
    }

    #[test]
    fn tour_visits_every_node_once() {
        let distances = four_cities();
        let pheromones = PheromoneMatrix::new(4, 1.);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for start in 0..4 {
            let ant =
                Ant::construct(start, view(&distances, &pheromones), Problem::Tour, 3, &mut rng)
                    .unwrap();
            let mut sorted = ant.tour().to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3]);
            assert_eq!(ant.start(), start);
            assert!(ant.is_closed());
            assert_eq!(
                ant.tour_length(),
                distances.tour_length(ant.tour(), true).unwrap()
            );
            assert_eq!(ant.edges().last(), Some((*ant.tour().last().unwrap(), start)));
        }
    }

    #[test]
    fn only_remaining_neighbor_is_always_chosen() {
        let distances = four_cities();
        let mut pheromones = PheromoneMatrix::new(4, 1.);
        pheromones.set_pheromone(1, 3, 1e-12).unwrap();
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ant = Ant::new(0, 4).unwrap();
            ant.move_to(2, view(&distances, &pheromones)).unwrap();
            ant.move_to(1, view(&distances, &pheromones)).unwrap();
            assert_eq!(
                ant.select_next(view(&distances, &pheromones), false, &mut rng),
                Ok(3)
            );
        }
    }

    #[test]
    fn overwhelming_weight_is_always_chosen() {
        // (1 / 1e-200)^2 overflows to infinity
        let distances = DistanceMatrix::new(array![
            [0., 1., 1e-200],
            [1., 0., 1.],
            [1e-200, 1., 0.],
        ])
        .unwrap();
        let pheromones = PheromoneMatrix::new(3, 1.);
        let ant = Ant::new(0, 3).unwrap();
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert_eq!(
                ant.select_next(view(&distances, &pheromones), false, &mut rng),
                Ok(2)
            );
        }
    }

    #[test]
    fn completed_tour_has_no_move() {
        let distances = four_cities();
        let pheromones = PheromoneMatrix::new(4, 1.);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let ant =
            Ant::construct(1, view(&distances, &pheromones), Problem::Tour, 3, &mut rng).unwrap();
        let last = *ant.tour().last().unwrap();
        assert_eq!(
            ant.select_next(view(&distances, &pheromones), false, &mut rng),
            Err(AcoError::NoEligibleMove {
                node: last,
                visited: 4
            })
        );
    }

    #[test]
    fn path_follows_the_only_edges() {
        let distances = chain();
        let pheromones = PheromoneMatrix::new(4, 1.);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let problem = Problem::Path {
            origin: 0,
            destination: 3,
        };
        let ant = Ant::construct(0, view(&distances, &pheromones), problem, 3, &mut rng).unwrap();
        assert_eq!(ant.tour(), &[0, 1, 2, 3]);
        assert_eq!(ant.tour_length(), 6.);
        assert!(!ant.is_closed());
        assert_eq!(ant.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn path_skips_edges_without_pheromone() {
        let distances =
            DistanceMatrix::new(array![[0., 3., 4.], [3., 0., 5.], [4., 5., 0.]]).unwrap();
        let mut pheromones = PheromoneMatrix::new(3, 1.);
        pheromones.set_pheromone(0, 2, 0.).unwrap();
        let problem = Problem::Path {
            origin: 0,
            destination: 2,
        };
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let ant =
                Ant::construct(0, view(&distances, &pheromones), problem, 2, &mut rng).unwrap();
            assert_eq!(ant.tour(), &[0, 1, 2]);
        }
    }

    #[test]
    fn unreachable_destination_is_stuck() {
        let distances = DistanceMatrix::new(array![
            [0., 1., 0.],
            [1., 0., 0.],
            [0., 0., 0.],
        ])
        .unwrap();
        let pheromones = PheromoneMatrix::new(3, 1.);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let problem = Problem::Path {
            origin: 0,
            destination: 2,
        };
        assert_eq!(
            Ant::construct(0, view(&distances, &pheromones), problem, 2, &mut rng),
            Err(AcoError::NoEligibleMove {
                node: 1,
                visited: 2
            })
        );
    }

    #[test]
    fn step_limit_stops_long_paths() {
        let distances = chain();
        let pheromones = PheromoneMatrix::new(4, 1.);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let problem = Problem::Path {
            origin: 0,
            destination: 3,
        };
        assert_eq!(
            Ant::construct(0, view(&distances, &pheromones), problem, 2, &mut rng),
            Err(AcoError::StepLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn remembers_pheromone_on_chosen_edges() {
        let distances = chain();
        let mut pheromones = PheromoneMatrix::new(4, 1.);
        pheromones.set_pheromone(0, 1, 0.25).unwrap();
        pheromones.set_pheromone(1, 2, 0.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let problem = Problem::Path {
            origin: 0,
            destination: 2,
        };
        let ant = Ant::construct(0, view(&distances, &pheromones), problem, 3, &mut rng).unwrap();
        assert_eq!(ant.remembered(0), Some(0.25));
        assert_eq!(ant.remembered(1), Some(0.5));
        assert_eq!(ant.remembered(2), None);
    }

    #[test]
    fn start_must_be_in_range() {
        assert_eq!(
            Ant::new(3, 3),
            Err(AcoError::OutOfRange { index: 3, len: 3 })
        );
        let ant = Ant::new(1, 3).unwrap();
        assert!(ant.has_visited(1));
        assert!(!ant.has_visited(0));
        assert!(!ant.has_visited(10));
        assert_eq!(ant.edges().count(), 0);
    }
}
