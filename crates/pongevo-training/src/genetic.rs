//! Genetic algorithm over neural network parameters.
//!
//! # Generation Cycle
//!
//! 1. **Breed** - Build a population of `species_count` agents from the
//!    current elite ([`PopulationEvolver::next_generation`])
//! 2. **Evaluate** - Every agent plays one session and receives a fitness
//!    (see [`trainer`](crate::trainer))
//! 3. **Select** - Keep the best agents as the next elite
//!    ([`PopulationEvolver::select_survivors`])
//!
//! # Breeding
//!
//! The elite is carried over unchanged. Children are produced until the
//! population holds `species_count - elite_count` agents: each child averages
//! two distinct parents drawn from the top [`PopulationEvolver::elite_count`]
//! agents and is then mutated. The remaining slots are filled with freshly
//! initialized agents, so every generation injects some unrelated genetic
//! material.
//!
//! With an empty elite (cold start) the whole population is random.
//!
//! # Selection
//!
//! After evaluation the population is sorted by fitness. The top
//! `elite_count` agents always survive. Below them, agents keep surviving while
//! their fitness stays strictly above `survival_ratio × best`; the first agent
//! under the threshold ends the survivor list.

use pongevo_evaluator::network::NeuralNetwork;
use rand::{Rng, seq::IndexedRandom};

use crate::{stats::FitnessStats, weights};

/// Standard deviation of freshly initialized weights.
pub const INITIAL_WEIGHT_SCALE: f64 = 1.0;
/// Standard deviation of freshly initialized biases.
pub const INITIAL_BIAS_SCALE: f64 = 0.1;

/// One candidate network and its most recent fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    network: NeuralNetwork,
    fitness: f64,
    ordinal: usize,
}

impl Agent {
    #[must_use]
    pub fn new(network: NeuralNetwork, fitness: f64) -> Self {
        Self {
            network,
            fitness,
            ordinal: 0,
        }
    }

    /// Creates an agent with `N(0, 1)` weights and `0.1 × N(0, 1)` biases.
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut network = NeuralNetwork::zeros();
        for layer in network.layers_mut() {
            weights::fill_gaussian(layer.weights, INITIAL_WEIGHT_SCALE, rng);
            weights::fill_gaussian(layer.biases, INITIAL_BIAS_SCALE, rng);
        }
        Self::new(network, 0.0)
    }

    /// Creates a child whose every parameter is the mean of its parents'.
    #[must_use]
    pub fn crossover(p1: &Self, p2: &Self) -> Self {
        let mut network = p1.network.clone();
        for (child, other) in network.layers_mut().into_iter().zip(p2.network.layers()) {
            weights::average_into(child.weights, other.weights);
            weights::average_into(child.biases, other.biases);
        }
        Self::new(network, 0.0)
    }

    #[must_use]
    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Position of this agent in its population at evaluation time.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Per-element replacement mutation applied to one kind of parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutation {
    /// Probability of replacing each element.
    pub rate: f64,
    /// Standard deviation of the replacement value.
    pub scale: f64,
}

/// The agents evaluated together in one generation.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    /// Collects `agents` into a population, numbering them in order and
    /// resetting their fitness.
    #[must_use]
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        let agents = agents
            .into_iter()
            .enumerate()
            .map(|(ordinal, agent)| Agent {
                ordinal,
                fitness: 0.0,
                ..agent
            })
            .collect();
        Self { agents }
    }

    /// Creates `count` freshly initialized agents.
    #[must_use]
    pub fn random<R>(count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::from_agents((0..count).map(|_| Agent::random(rng)).collect())
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Stores the fitness of the agent numbered `ordinal`.
    ///
    /// Returns `false` if no agent has that ordinal.
    pub fn record_fitness(&mut self, ordinal: usize, fitness: f64) -> bool {
        let Some(agent) = self.agents.get_mut(ordinal) else {
            return false;
        };
        debug_assert_eq!(agent.ordinal, ordinal);
        agent.fitness = fitness;
        true
    }

    #[must_use]
    pub fn compute_fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.agents.iter().map(Agent::fitness))
    }
}

/// Controls how one generation becomes the next.
#[derive(Debug, Clone)]
pub struct PopulationEvolver {
    /// Agents that always survive selection and parent all children.
    pub elite_count: usize,
    /// Agents beyond the elite survive while above this fraction of the best
    /// fitness.
    pub survival_ratio: f64,
    pub weight_mutation: Mutation,
    pub bias_mutation: Mutation,
}

impl Default for PopulationEvolver {
    fn default() -> Self {
        Self {
            elite_count: 5,
            survival_ratio: 0.9,
            weight_mutation: Mutation {
                rate: 0.1,
                scale: 0.1,
            },
            bias_mutation: Mutation {
                rate: 0.05,
                scale: 0.05,
            },
        }
    }
}

impl PopulationEvolver {
    /// Builds a population of exactly `species_count` agents from `elite`.
    ///
    /// `elite` is ordered best first; only its first `species_count` agents are
    /// carried over.
    pub fn next_generation<R>(&self, elite: &[Agent], species_count: usize, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        let mut agents = elite.iter().take(species_count).cloned().collect::<Vec<_>>();

        let parents = &elite[..elite.len().min(self.elite_count)];
        let breed_target = species_count.saturating_sub(self.elite_count);
        if parents.len() >= 2 {
            while agents.len() < breed_target {
                let mut pair = parents.choose_multiple(rng, 2);
                let (Some(p1), Some(p2)) = (pair.next(), pair.next()) else {
                    break;
                };
                let mut child = Agent::crossover(p1, p2);
                self.mutate(&mut child, rng);
                agents.push(child);
            }
        }

        while agents.len() < species_count {
            agents.push(Agent::random(rng));
        }
        Population::from_agents(agents)
    }

    /// Mutates weights and biases of `agent` in place.
    pub fn mutate<R>(&self, agent: &mut Agent, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let Self {
            weight_mutation: w,
            bias_mutation: b,
            ..
        } = *self;
        for layer in agent.network.layers_mut() {
            weights::mutate(layer.weights, w.rate, w.scale, rng);
            weights::mutate(layer.biases, b.rate, b.scale, rng);
        }
    }

    /// Sorts the evaluated population and returns the survivors, best first.
    #[must_use]
    pub fn select_survivors(&self, population: Population) -> Vec<Agent> {
        let mut agents = population.agents;
        agents.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        let Some(best) = agents.first().map(Agent::fitness) else {
            return agents;
        };

        let threshold = self.survival_ratio * best;
        let keep = self.elite_count.min(agents.len())
            + agents
                .iter()
                .skip(self.elite_count)
                .take_while(|agent| agent.fitness > threshold)
                .count();
        agents.truncate(keep);
        agents
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn with_fitness(values: &[f64]) -> Population {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut population = Population::random(values.len(), &mut rng);
        for (ordinal, fitness) in values.iter().enumerate() {
            assert!(population.record_fitness(ordinal, *fitness));
        }
        population
    }

    fn parameters(network: &NeuralNetwork) -> Vec<f64> {
        network
            .layers()
            .into_iter()
            .flat_map(|layer| layer.weights.iter().chain(layer.biases).copied())
            .collect()
    }

    #[test]
    fn test_crossover_is_exact_mean() {
        let mut rng = Pcg32::seed_from_u64(2);
        let p1 = Agent::random(&mut rng);
        let p2 = Agent::random(&mut rng);
        let child = Agent::crossover(&p1, &p2);

        let expected = parameters(p1.network())
            .into_iter()
            .zip(parameters(p2.network()))
            .map(|(a, b)| (a + b) / 2.0);
        for (actual, expected) in parameters(child.network()).into_iter().zip(expected) {
            assert_eq!(actual.to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn test_crossover_leaves_parents_untouched() {
        let mut rng = Pcg32::seed_from_u64(3);
        let p1 = Agent::random(&mut rng);
        let p2 = Agent::random(&mut rng);
        let (before1, before2) = (p1.clone(), p2.clone());
        let _child = Agent::crossover(&p1, &p2);
        assert_eq!(p1, before1);
        assert_eq!(p2, before2);
    }

    #[test]
    fn test_cold_start_agents_are_distinct() {
        let mut rng = Pcg32::seed_from_u64(4);
        let population = PopulationEvolver::default().next_generation(&[], 20, &mut rng);
        assert_eq!(population.len(), 20);
        let agents = population.agents();
        for (i, a) in agents.iter().enumerate() {
            assert_eq!(a.ordinal(), i);
            assert_eq!(a.fitness(), 0.0);
            for b in &agents[i + 1..] {
                assert_ne!(a.network(), b.network());
            }
        }
    }

    #[test]
    fn test_random_biases_are_small() {
        let mut rng = Pcg32::seed_from_u64(5);
        let agent = Agent::random(&mut rng);
        for layer in agent.network().layers() {
            assert!(layer.biases.iter().all(|b| b.abs() < 1.0));
        }
    }

    #[test]
    fn test_population_size_is_preserved() {
        let evolver = PopulationEvolver::default();
        let mut rng = Pcg32::seed_from_u64(6);
        for species_count in [1, 2, 5, 6, 20, 50] {
            for elite_len in [0, 1, 2, 5, 8, 60] {
                let elite = Population::random(elite_len, &mut rng).agents().to_vec();
                let population = evolver.next_generation(&elite, species_count, &mut rng);
                assert_eq!(population.len(), species_count, "{species_count} / {elite_len}");
            }
        }
    }

    #[test]
    fn test_warm_start_keeps_elite_and_breeds() {
        let evolver = PopulationEvolver::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let elite = evolver.select_survivors(with_fitness(&[9.0, 8.0, 7.0, 6.0, 5.0, 1.0]));
        assert_eq!(elite.len(), 5);

        let population = evolver.next_generation(&elite, 20, &mut rng);
        assert_eq!(population.len(), 20);
        for (carried, original) in population.agents().iter().zip(&elite) {
            assert_eq!(carried.network(), original.network());
            assert_eq!(carried.fitness(), 0.0);
        }
    }

    #[test]
    fn test_single_parent_falls_back_to_random() {
        let evolver = PopulationEvolver::default();
        let mut rng = Pcg32::seed_from_u64(8);
        let elite = Population::random(1, &mut rng).agents().to_vec();
        let population = evolver.next_generation(&elite, 10, &mut rng);
        assert_eq!(population.len(), 10);
        assert_eq!(population.agents()[0].network(), elite[0].network());
    }

    #[test]
    fn test_selection_keeps_top_and_prefix() {
        let evolver = PopulationEvolver::default();
        let survivors = evolver.select_survivors(with_fitness(&[
            10.0, 2.0, 9.5, 3.0, 9.2, 1.0, 9.8, 9.1, 4.0, 9.05, 8.0, 9.9,
        ]));
        let fitness = survivors.iter().map(Agent::fitness).collect::<Vec<_>>();
        // top five, then 9.1 and 9.05 are above 9.0; 8.0 ends the prefix
        assert_eq!(fitness, [10.0, 9.9, 9.8, 9.5, 9.2, 9.1, 9.05]);
    }

    #[test]
    fn test_selection_threshold_is_strict() {
        let evolver = PopulationEvolver::default();
        let survivors = evolver.select_survivors(with_fitness(&[10.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0]));
        assert_eq!(survivors.len(), 5);
    }

    #[test]
    fn test_selection_of_small_population() {
        let evolver = PopulationEvolver::default();
        let survivors = evolver.select_survivors(with_fitness(&[1.0, 3.0, 2.0]));
        let fitness = survivors.iter().map(Agent::fitness).collect::<Vec<_>>();
        assert_eq!(fitness, [3.0, 2.0, 1.0]);
        assert!(evolver.select_survivors(Population::default()).is_empty());
    }

    #[test]
    fn test_failed_agents_sort_last() {
        let evolver = PopulationEvolver::default();
        let survivors = evolver.select_survivors(with_fitness(&[-1.0, 0.0, -1.0, 0.0]));
        let fitness = survivors.iter().map(Agent::fitness).collect::<Vec<_>>();
        assert_eq!(fitness, [0.0, 0.0, -1.0, -1.0]);
    }

    #[test]
    fn test_record_fitness_rejects_unknown_ordinal() {
        let mut population = with_fitness(&[1.0, 2.0]);
        assert!(!population.record_fitness(2, 5.0));
        let stats = population.compute_fitness_stats().unwrap();
        assert_eq!(stats.max, 2.0);
    }

    #[test]
    fn test_mutation_changes_some_parameters() {
        let evolver = PopulationEvolver::default();
        let mut rng = Pcg32::seed_from_u64(9);
        let original = Agent::random(&mut rng);
        let mut changed = 0;
        for _ in 0..20 {
            let mut agent = original.clone();
            evolver.mutate(&mut agent, &mut rng);
            changed += parameters(agent.network())
                .into_iter()
                .zip(parameters(original.network()))
                .filter(|(a, b)| a != b)
                .count();
        }
        assert!(changed > 0);
    }
}
