//! Genetic Algorithm over candidate walks.
//!
//! An individual is a walk of adjacent open cells that begins at the start.
//! Individuals are scored by a penalty (lower is better): heuristic distance
//! from the walk's end to the goal, plus half its length, minus a large bonus
//! for reaching the goal. Each generation keeps its elite, then fills the
//! rest with tournament-selected parents, spliced at a shared cell and
//! occasionally mutated by regrowing a random tail.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

use super::local::erase_loops;
use super::{Outcome, SearchOptions};
use crate::config::{GeneticParams, Limits};
use crate::geometry::Position;
use crate::grid::Grid;
use crate::trace::{SearchStep, StepKind, Termination, Trace};

const GOAL_BONUS: f64 = 1000.0;
const LENGTH_WEIGHT: f64 = 0.5;
const MAX_MUTATION_STEPS: usize = 5;

type Walk = Vec<Position>;

struct Population<'a> {
    grid: &'a Grid,
    goal: Position,
    options: &'a SearchOptions,
    params: &'a GeneticParams,
    rng: StdRng,
}

impl Population<'_> {
    fn h(&self, pos: Position) -> f64 {
        self.options.heuristic.distance(pos, self.goal)
    }

    fn penalty(&self, walk: &[Position]) -> f64 {
        let Some(&last) = walk.last() else {
            return f64::INFINITY;
        };
        let bonus = if last == self.goal { GOAL_BONUS } else { 0.0 };
        self.h(last) + walk.len() as f64 * LENGTH_WEIGHT - bonus
    }

    /// Cuts a walk right after its first arrival at the goal.
    fn truncate_at_goal(&self, mut walk: Walk) -> Walk {
        if let Some(index) = walk.iter().position(|&pos| pos == self.goal) {
            walk.truncate(index + 1);
        }
        walk
    }

    /// Builds a walk that prefers unvisited cells and, with probability
    /// `greedy_bias`, the neighbor closest to the goal.
    fn random_walk(&mut self, start: Position) -> Walk {
        let mut walk = vec![start];
        let mut seen: FxHashSet<Position> = FxHashSet::default();
        seen.insert(start);
        let mut current = start;

        for _ in 0..self.grid.rows() * self.grid.cols() {
            if current == self.goal {
                break;
            }
            let open = self.grid.open_neighbors(current, self.options.movement);
            let fresh: Vec<Position> = open.iter().copied().filter(|p| !seen.contains(p)).collect();
            let candidates = if fresh.is_empty() { open } else { fresh };
            if candidates.is_empty() {
                break;
            }

            let next = if self.rng.gen_bool(self.params.greedy_bias) {
                candidates
                    .iter()
                    .copied()
                    .min_by(|&a, &b| self.h(a).total_cmp(&self.h(b)))
            } else {
                candidates.choose(&mut self.rng).copied()
            };
            let Some(next) = next else { break };

            walk.push(next);
            seen.insert(next);
            current = next;
        }

        walk
    }

    /// Picks the best of `tournament_size` distinct random individuals.
    fn tournament<'w>(&mut self, walks: &'w [Walk], penalties: &[f64]) -> &'w Walk {
        let picks = index::sample(&mut self.rng, walks.len(), self.params.tournament_size);
        let winner = picks
            .into_iter()
            .min_by(|&a, &b| penalties[a].total_cmp(&penalties[b]))
            .unwrap_or(0);
        &walks[winner]
    }

    /// Splices `first` and `second` at a random cell they share (other than the start).
    fn crossover(&mut self, first: &[Position], second: &[Position]) -> Walk {
        if first.len() < 2 || second.len() < 2 {
            return first.to_vec();
        }
        let in_second: FxHashSet<Position> = second.iter().copied().collect();
        let shared: Vec<Position> = first[1..]
            .iter()
            .copied()
            .filter(|pos| in_second.contains(pos))
            .collect();
        let Some(&cut) = shared.choose(&mut self.rng) else {
            return first.to_vec();
        };

        let (Some(i), Some(j)) = (
            first.iter().position(|&p| p == cut),
            second.iter().position(|&p| p == cut),
        ) else {
            return first.to_vec();
        };
        let mut child = first[..=i].to_vec();
        child.extend_from_slice(&second[j + 1..]);
        child
    }

    /// With probability `mutation_rate`, regrows the walk from a random point
    /// with up to `MAX_MUTATION_STEPS` random moves.
    fn mutate(&mut self, walk: Walk) -> Walk {
        if walk.len() < 3 || self.rng.gen::<f64>() >= self.params.mutation_rate {
            return walk;
        }
        let point = self.rng.gen_range(1..walk.len());
        let mut mutated = walk[..point].to_vec();
        let mut current = mutated[mutated.len() - 1];

        for _ in 0..self.rng.gen_range(1..=MAX_MUTATION_STEPS) {
            let open = self.grid.open_neighbors(current, self.options.movement);
            let Some(&next) = open.choose(&mut self.rng) else {
                break;
            };
            mutated.push(next);
            current = next;
            if current == self.goal {
                break;
            }
        }
        mutated
    }
}

pub(crate) fn evolve(
    grid: &Grid,
    start: Position,
    goal: Position,
    options: &SearchOptions,
    params: &GeneticParams,
    limits: &Limits,
) -> Outcome {
    let mut trace = Trace::with_limit(limits.max_trace_steps);
    let mut touched: FxHashSet<Position> = FxHashSet::default();
    let mut population = Population {
        grid,
        goal,
        options,
        params,
        rng: StdRng::seed_from_u64(options.seed),
    };

    let mut walks: Vec<Walk> = (0..params.population_size)
        .map(|_| population.random_walk(start))
        .collect();
    let mut best: Option<(Walk, f64)> = None;
    let mut generations = 0;

    for generation in 0..params.generations {
        generations = generation + 1;

        for &pos in walks.iter().flatten() {
            if touched.insert(pos) {
                trace.record(SearchStep::new(StepKind::Visit, pos));
            }
        }

        let penalties: Vec<f64> = walks.iter().map(|walk| population.penalty(walk)).collect();
        let leader = (0..walks.len()).min_by(|&a, &b| penalties[a].total_cmp(&penalties[b]));
        if let Some(leader) = leader {
            if best.as_ref().map_or(true, |(_, score)| penalties[leader] < *score) {
                let walk = walks[leader].clone();
                for &pos in &walk {
                    trace.record(
                        SearchStep::new(StepKind::Current, pos)
                            .with_heuristic(Some(population.h(pos))),
                    );
                }
                best = Some((walk, penalties[leader]));
            }
        }

        if best.as_ref().is_some_and(|(walk, _)| walk.last() == Some(&goal)) {
            break;
        }

        let mut ranked: Vec<usize> = (0..walks.len()).collect();
        ranked.sort_by(|&a, &b| penalties[a].total_cmp(&penalties[b]));
        let mut next_generation: Vec<Walk> = ranked
            .iter()
            .take(params.elite_size)
            .map(|&i| walks[i].clone())
            .collect();

        while next_generation.len() < params.population_size {
            let first = population.tournament(&walks, &penalties).clone();
            let second = population.tournament(&walks, &penalties).clone();
            let child = population.crossover(&first, &second);
            let child = population.mutate(child);
            next_generation.push(population.truncate_at_goal(child));
        }

        walks = next_generation;
    }

    let explored = touched.len();
    match best {
        Some((walk, _)) if walk.last() == Some(&goal) => {
            Outcome::found(erase_loops(&walk), trace, explored).with_generations(generations)
        }
        Some((walk, _)) => {
            let end = walk.last().copied().unwrap_or(start);
            Outcome::failed(
                trace,
                explored,
                Termination::CapReached,
                format!(
                    "generation cap reached; best walk ended at {end}, {} from goal",
                    population.h(end)
                ),
            )
            .with_generations(generations)
        }
        None => Outcome::failed(trace, explored, Termination::CapReached, "empty population")
            .with_generations(generations),
    }
}
