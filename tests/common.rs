//! Common test utilities for the quarto-memory test suite.

#![allow(dead_code)]

use std::sync::Arc;

use quarto_memory::{
    Result,
    adapters::InMemoryStore,
    identifiers::StateKey,
    ports::{Learner, ValueRepository},
    quarto::{Action, Cell, Dimensions, State, orbit_states},
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn quarto() -> Arc<Dimensions> {
    Arc::new(Dimensions::quarto())
}

/// Let one learner make every move of a game until no token is left to give.
///
/// Returns the actions in the order they were played.
pub fn play_solo_game<L: Learner>(learner: &mut L, first_given: usize) -> Result<Vec<Action>> {
    let mut board: Vec<Option<Cell>> = vec![None; 16];
    let mut given = first_given;
    let mut played = Vec::new();

    loop {
        let action = learner.select_action(&board, given)?;
        assert_eq!(action.token, given, "learner must place the token it was given");
        assert!(
            board.iter().all(|cell| *cell != Some(action.cell)),
            "cell {} is already occupied",
            action.cell
        );
        board[action.token] = Some(action.cell);
        played.push(action);
        match action.returned {
            Some(next) => given = next,
            None => break,
        }
    }
    Ok(played)
}

/// Play `moves` moves of a solo game, stopping before the game ends.
pub fn play_moves<L: Learner>(learner: &mut L, moves: usize) -> Result<Vec<Action>> {
    let mut board: Vec<Option<Cell>> = vec![None; 16];
    let mut given = 0;
    let mut played = Vec::new();

    for _ in 0..moves {
        let action = learner.select_action(&board, given)?;
        board[action.token] = Some(action.cell);
        played.push(action);
        match action.returned {
            Some(next) => given = next,
            None => break,
        }
    }
    Ok(played)
}

/// Assert that no two stored value records belong to the same orbit and
/// return the number of stored records.
pub fn assert_one_record_per_orbit(store: &InMemoryStore) -> usize {
    let dimensions = quarto();
    let keys = store.keys().expect("store should be available");

    let mut orbits: Vec<Vec<StateKey>> = Vec::new();
    for key in &keys {
        let record = store.peek(key).expect("listed key should be stored");
        let state = State::from_slots(Arc::clone(&dimensions), record.raw_state.clone())
            .expect("stored raw state should be valid");
        let mut orbit: Vec<StateKey> = orbit_states(&state)
            .expect("orbit should be computable")
            .into_iter()
            .map(|(_, image)| image.key())
            .collect();
        orbit.sort();
        orbit.dedup();
        orbits.push(orbit);
    }

    for (i, key) in keys.iter().enumerate() {
        for (j, orbit) in orbits.iter().enumerate() {
            if i != j {
                assert!(
                    orbit.binary_search(key).is_err(),
                    "{key} shares an orbit with {}",
                    keys[j]
                );
            }
        }
    }
    keys.len()
}

/// Every stored action value of every record.
pub fn all_values(store: &InMemoryStore) -> Vec<f64> {
    store
        .keys()
        .expect("store should be available")
        .iter()
        .filter_map(|key| store.peek(key))
        .flat_map(|record| record.action_values.into_iter().map(|(_, v)| v.get()))
        .collect()
}
