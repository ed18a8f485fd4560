//! Rounds shared between concurrent callers.
//!
//! A request-handling host keeps one round per player session. `Sessions`
//! maps each [`SessionId`] to its own lock, so requests for the same
//! session are serialized while other sessions proceed, including while a
//! snippet is being cut. Starting a round for a session discards whatever
//! round it had before.
//!
//! Rounds stay registered after they end, so their outcome can still be
//! read. Hosts bound memory by calling [`Sessions::remove`] when a player
//! leaves, or [`Sessions::prune`] periodically to drop every finished round.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    error::{Error, Result},
    game::{Game, GuessResult, Round, Status},
    track::TrackRecord,
    uuid::SessionId,
};

pub struct Sessions {
    game: Game,
    rounds: Mutex<HashMap<SessionId, Arc<Mutex<Round>>>>,
}

impl Sessions {
    #[must_use]
    pub fn new(game: Game) -> Self {
        Self {
            game,
            rounds: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Starts a round for `session`, replacing any previous one.
    pub fn start(&self, session: SessionId, target: TrackRecord) -> Result<()> {
        let round = self.game.start_round(target);
        let previous = self
            .rounds
            .lock()?
            .insert(session, Arc::new(Mutex::new(round)));
        if previous.is_some() {
            debug!("session {session} replaced its round");
        }
        Ok(())
    }

    /// Submits a guess to the round of `session`.
    ///
    /// # Errors
    ///
    /// `FailedPrecondition` when the session has no round, plus everything
    /// [`Game::submit_guess`] returns.
    pub fn guess(&self, session: SessionId, guess: &str) -> Result<GuessResult> {
        let round = self.round(session)?;
        let mut round = round.lock()?;
        self.game.submit_guess(&mut round, guess)
    }

    /// Ends the round of `session`. Ending an ended round is a no-op.
    pub fn end(&self, session: SessionId) -> Result<()> {
        let round = self.round(session)?;
        let mut round = round.lock()?;
        self.game.end_round(&mut round);
        Ok(())
    }

    /// The status of the round of `session`, if it has one.
    pub fn status(&self, session: SessionId) -> Result<Option<Status>> {
        let Some(round) = self.rounds.lock()?.get(&session).cloned() else {
            return Ok(None);
        };
        let status = round.lock()?.status();
        Ok(Some(status))
    }

    /// Forgets the round of `session`. Returns whether there was one.
    pub fn remove(&self, session: SessionId) -> Result<bool> {
        Ok(self.rounds.lock()?.remove(&session).is_some())
    }

    /// Forgets every round that is over and returns how many were dropped.
    ///
    /// Rounds busy with a guess are kept; they are still active or get
    /// pruned next time.
    pub fn prune(&self) -> Result<usize> {
        let mut rounds = self.rounds.lock()?;
        let before = rounds.len();
        rounds.retain(|_, round| match round.try_lock() {
            Ok(round) => !round.is_over(),
            Err(_) => true,
        });

        let pruned = before - rounds.len();
        if pruned > 0 {
            debug!("pruned {pruned} finished rounds");
        }
        Ok(pruned)
    }

    /// Number of sessions with a round.
    pub fn len(&self) -> Result<usize> {
        Ok(self.rounds.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.rounds.lock()?.is_empty())
    }

    /// Looks up a round, releasing the map lock before it is used.
    fn round(&self, session: SessionId) -> Result<Arc<Mutex<Round>>> {
        self.rounds
            .lock()?
            .get(&session)
            .cloned()
            .ok_or_else(|| Error::invalid_state(format!("session {session} has no round started")))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{audio_source::MemoryAudio, config::Config, game::Outcome};

    fn sessions() -> Sessions {
        Sessions::new(Game::new(Config::default(), MemoryAudio::default()))
    }

    #[test]
    fn guessing_without_round_is_invalid() {
        let sessions = sessions();
        let err = sessions.guess(SessionId::fast_v4(), "Yesterday").unwrap_err();
        assert!(err.is_invalid_state());
        assert!(sessions.end(SessionId::fast_v4()).unwrap_err().is_invalid_state());
    }

    #[test]
    fn sessions_play_independently() {
        let sessions = sessions();
        let alice = SessionId::fast_v4();
        let bob = SessionId::fast_v4();
        sessions.start(alice, TrackRecord::new("Yesterday")).unwrap();
        sessions.start(bob, TrackRecord::new("Help!")).unwrap();

        let result = sessions.guess(alice, "Yesterday").unwrap();
        assert_eq!(result.outcome(), Some(Outcome::Won));
        assert_eq!(sessions.status(alice).unwrap(), Some(Status::Won));
        assert_eq!(sessions.status(bob).unwrap(), Some(Status::Active));
        assert_eq!(sessions.len().unwrap(), 2);
    }

    #[test]
    fn starting_again_replaces_round() {
        let sessions = sessions();
        let id = SessionId::fast_v4();
        sessions.start(id, TrackRecord::new("Yesterday")).unwrap();
        sessions.end(id).unwrap();
        assert_eq!(sessions.status(id).unwrap(), Some(Status::Abandoned));

        sessions.start(id, TrackRecord::new("Help!")).unwrap();
        assert_eq!(sessions.status(id).unwrap(), Some(Status::Active));
        let result = sessions.guess(id, "help!").unwrap();
        assert_eq!(result.guess_count(), 1);
        assert_eq!(result.outcome(), Some(Outcome::Won));
        assert_eq!(sessions.len().unwrap(), 1);
    }

    #[test]
    fn end_is_idempotent_and_remove_forgets() {
        let sessions = sessions();
        let id = SessionId::fast_v4();
        sessions.start(id, TrackRecord::new("Yesterday")).unwrap();
        sessions.end(id).unwrap();
        sessions.end(id).unwrap();

        assert!(sessions.remove(id).unwrap());
        assert!(!sessions.remove(id).unwrap());
        assert_eq!(sessions.status(id).unwrap(), None);
        assert!(sessions.is_empty().unwrap());
    }

    #[test]
    fn prune_drops_only_finished_rounds() {
        let sessions = sessions();
        let won = SessionId::fast_v4();
        let abandoned = SessionId::fast_v4();
        let playing = SessionId::fast_v4();
        for id in [won, abandoned, playing] {
            sessions.start(id, TrackRecord::new("Yesterday")).unwrap();
        }
        sessions.guess(won, "Yesterday").unwrap();
        sessions.end(abandoned).unwrap();
        sessions.guess(playing, "Help").unwrap();

        assert_eq!(sessions.prune().unwrap(), 2);
        assert_eq!(sessions.len().unwrap(), 1);
        assert_eq!(sessions.status(won).unwrap(), None);
        assert_eq!(sessions.status(abandoned).unwrap(), None);
        assert_eq!(sessions.status(playing).unwrap(), Some(Status::Active));
        assert_eq!(sessions.prune().unwrap(), 0);
    }

    #[test]
    fn concurrent_guesses_are_each_counted_once() {
        let sessions = sessions();
        let id = SessionId::fast_v4();
        sessions.start(id, TrackRecord::new("Yesterday")).unwrap();

        // Three wrong guesses from different threads: none may be lost.
        thread::scope(|scope| {
            for _ in 0..3 {
                scope.spawn(|| sessions.guess(id, "Help").unwrap());
            }
        });

        let result = sessions.guess(id, "Yesterday").unwrap();
        assert_eq!(result.guess_count(), 4);
        assert_eq!(result.outcome(), Some(Outcome::Won));
    }
}
