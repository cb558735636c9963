//! Epsilon-greedy agent learning action values over canonical states.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use super::trajectory::Trajectory;
use crate::{
    Error, Result,
    app::AgentConfig,
    cache::Memory,
    ports::Learner,
    quarto::{Action, Cell, Dimensions, State},
    types::{Outcome, Reward, Value},
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Learning engine for one player.
///
/// Every decision is made on the canonical representative of the current
/// state, so experience gathered in one orientation benefits all symmetric
/// ones. Values live in the shared [`Memory`]; the agent itself only keeps the
/// moves of the game in progress.
pub struct ReasoningAgent {
    config: AgentConfig,
    dimensions: Arc<Dimensions>,
    memory: Memory,
    epsilon: f64,
    rng: StdRng,
    trajectory: Trajectory,
}

impl ReasoningAgent {
    pub fn new(config: AgentConfig, dimensions: Arc<Dimensions>, memory: Memory) -> Result<Self> {
        config.validate()?;
        debug!(
            "Creating agent '{}' (alpha {}, gamma {}, exploration {})",
            config.name, config.alpha, config.gamma, config.exploration
        );
        Ok(Self {
            epsilon: config.exploration,
            rng: build_rng(config.seed),
            config,
            dimensions,
            memory,
            trajectory: Trajectory::new(),
        })
    }

    /// Choose a move for `board` (one optional cell per token id) after
    /// receiving `given_token`.
    ///
    /// The returned action is in the caller's frame.
    pub fn get_action(&mut self, board: &[Option<Cell>], given_token: usize) -> Result<Action> {
        let state =
            State::from_board(Arc::clone(&self.dimensions), board)?.with_given(given_token)?;
        let canonical = self.memory.canonicalize(&state)?;

        let actions = self.action_values(&canonical.state)?;
        let chosen = if self.rng.random::<f64>() < self.epsilon {
            actions.choose(&mut self.rng).copied()
        } else {
            best_action(&actions)
        }
        .ok_or_else(|| Error::InvalidState {
            message: format!("state '{}' has no actions", canonical.key()),
        })?;

        self.trajectory.record(canonical.state.clone(), chosen);
        Ok(canonical.to_original(&chosen))
    }

    /// Propagate the terminal reward over the recorded game.
    ///
    /// Steps are visited in the order they were played; step `i` of `n` uses
    /// the discount `gamma^(n - i)`, so the earliest moves are discounted the
    /// most. The target of each step bootstraps from the best stored value of
    /// the state the move led to, or 0 when that state has no record.
    ///
    /// # Errors
    ///
    /// An invalid reward is rejected before any value changes. Store failures
    /// while the targets are resolved also leave every value untouched. If an
    /// update fails, the steps not yet updated stay in the trajectory and a
    /// later call finishes them with the same discounts.
    pub fn give_reward(&mut self, reward: f64) -> Result<()> {
        let reward = Reward::new(reward)?;
        let targets = self.targets(reward)?;
        let steps = self.trajectory.take();
        let alpha = self.config.alpha;
        let values = self.memory.values();

        for (i, (step, target)) in steps.iter().zip(&targets).enumerate() {
            let target = *target;
            let applied = values.adjust(&step.state.key(), &step.action.key(), |old| {
                Value::new((1.0 - alpha) * old.get() + alpha * target)
            });
            if let Err(e) = applied {
                warn!(
                    "Agent '{}' stopped after {i} of {} updates: {e}",
                    self.config.name,
                    steps.len()
                );
                self.trajectory.restore(steps[i..].to_vec());
                return Err(e);
            }
        }

        self.decay_epsilon();
        info!(
            "Agent '{}' learned from {} moves with reward {}",
            self.config.name,
            steps.len(),
            reward.get()
        );
        Ok(())
    }

    /// Update target of every recorded step, read without changing anything.
    fn targets(&self, reward: Reward) -> Result<Vec<f64>> {
        let steps = self.trajectory.steps();
        let len = steps.len();
        let values = self.memory.values();

        steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let key = step.state.key();
                if values.find(&key)?.is_none() {
                    return Err(Error::UnknownState {
                        state: key.to_string(),
                    });
                }
                let best_next = values
                    .find(&step.next_state.key())?
                    .and_then(|record| record.best_value())
                    .map_or(0.0, Value::get);
                let discount = self.config.gamma.powi((len - i) as i32);
                Ok(reward.get() + discount * best_next)
            })
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Stored actions of a canonical state, creating the record if needed.
    fn action_values(&self, state: &State) -> Result<Vec<Action>> {
        let values = self.memory.values();
        let record = match values.find(&state.key())? {
            Some(record) => record,
            None => values.insert(state, &state.legal_actions()?)?,
        };
        record.actions(&self.dimensions)
    }

    fn decay_epsilon(&mut self) {
        self.epsilon =
            (self.epsilon * self.config.exploration_decay).max(self.config.min_exploration);
    }
}

/// First action holding the highest value.
fn best_action(actions: &[Action]) -> Option<Action> {
    actions.iter().copied().reduce(|best, action| {
        if action.value > best.value {
            action
        } else {
            best
        }
    })
}

impl Learner for ReasoningAgent {
    fn select_action(&mut self, board: &[Option<Cell>], given_token: usize) -> Result<Action> {
        self.get_action(board, given_token)
    }

    fn apply_outcome(&mut self, outcome: Outcome) -> Result<()> {
        self.give_reward(outcome.reward().get())
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn reset_trajectory(&mut self) -> Result<()> {
        self.trajectory.clear();
        Ok(())
    }
}
