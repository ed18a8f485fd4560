//! The round state machine.
//!
//! A [`Round`] is played against one [`TrackRecord`]. Every guess costs one
//! of five tries and, unless it ends the round, reveals the next hint:
//!
//! | Guess | Hint                          |
//! |-------|-------------------------------|
//! | 1     | genres                        |
//! | 2     | release date                  |
//! | 3     | artist                        |
//! | 4     | audio snippet                 |
//! | 5     | unblur the album art          |
//!
//! A sixth guess loses the round whatever it is. A correct guess wins it at
//! any point before that. Only the hint for the current guess is returned;
//! callers keep earlier hints themselves.
//!
//! # Example
//!
//! ```rust
//! use spotle::{audio_source::MemoryAudio, config::Config, game::{Game, HintKind, Outcome}, track::TrackRecord};
//!
//! let game = Game::new(Config::default(), MemoryAudio::default());
//! let mut round = game.start_round(TrackRecord::new("Yesterday").with_artist("The Beatles"));
//!
//! let result = game.submit_guess(&mut round, "Help")?;
//! assert_eq!(result.hint_kind(), Some(HintKind::Genre));
//!
//! let result = game.submit_guess(&mut round, "yesterday")?;
//! assert_eq!(result.outcome(), Some(Outcome::Won));
//! ```

use crate::{
    audio_source::AudioSource,
    config::Config,
    error::{Error, Result},
    matcher,
    snippet::{self, Snippet},
    track::TrackRecord,
};

/// Number of guesses that reveal a hint. The guess after the last hint
/// loses the round.
pub const MAX_GUESSES: u8 = 5;

/// Where a round stands.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Active,
    Won,
    Lost,
    /// Ended by the caller before a win or loss.
    Abandoned,
}

impl Status {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }
}

/// How a guess ended the round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Won,
    Lost,
}

impl From<Outcome> for Status {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won => Self::Won,
            Outcome::Lost => Self::Lost,
        }
    }
}

/// Hint tiers in the order they are revealed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HintKind {
    Genre,
    ReleaseDate,
    Artist,
    Snippet,
    UnblurAlbumArt,
}

impl HintKind {
    /// The hint revealed by the given non-losing guess, counted from 1.
    ///
    /// Returns `None` outside `1..=MAX_GUESSES`.
    #[must_use]
    pub fn for_guess(guess_count: u8) -> Option<Self> {
        let kind = match guess_count {
            1 => Self::Genre,
            2 => Self::ReleaseDate,
            3 => Self::Artist,
            4 => Self::Snippet,
            5 => Self::UnblurAlbumArt,
            _ => return None,
        };
        Some(kind)
    }
}

/// A revealed hint and its payload.
///
/// Payloads mirror the target's metadata, so missing metadata gives an
/// empty payload rather than an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hint {
    Genre(Vec<String>),
    ReleaseDate(String),
    Artist(String),
    Snippet(Snippet),
    /// Signal to progressively reveal the album art; carries no data.
    UnblurAlbumArt,
}

impl Hint {
    #[must_use]
    pub fn kind(&self) -> HintKind {
        match self {
            Self::Genre(_) => HintKind::Genre,
            Self::ReleaseDate(_) => HintKind::ReleaseDate,
            Self::Artist(_) => HintKind::Artist,
            Self::Snippet(_) => HintKind::Snippet,
            Self::UnblurAlbumArt => HintKind::UnblurAlbumArt,
        }
    }
}

/// What a single guess produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuessResult {
    guess_count: u8,
    outcome: Option<Outcome>,
    hint: Option<Hint>,
}

impl GuessResult {
    /// The guess number this result answers, counted from 1.
    #[must_use]
    pub fn guess_count(&self) -> u8 {
        self.guess_count
    }

    /// `None` while the round goes on.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// The hint for this guess; `None` when the round ended.
    #[must_use]
    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    #[must_use]
    pub fn into_hint(self) -> Option<Hint> {
        self.hint
    }

    #[must_use]
    pub fn hint_kind(&self) -> Option<HintKind> {
        self.hint.as_ref().map(Hint::kind)
    }
}

/// State of one round. Owned by a single caller; see
/// [`Sessions`](crate::session::Sessions) for sharing between requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    target: TrackRecord,
    guess_count: u8,
    status: Status,
}

impl Round {
    #[must_use]
    pub fn new(target: TrackRecord) -> Self {
        Self {
            target,
            guess_count: 0,
            status: Status::Active,
        }
    }

    #[must_use]
    pub fn target(&self) -> &TrackRecord {
        &self.target
    }

    #[must_use]
    pub fn guess_count(&self) -> u8 {
        self.guess_count
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Counts a guess and decides whether it ends the round.
    ///
    /// Running out of guesses takes precedence over a correct guess.
    fn record_guess(&mut self, guess: &str) -> Result<Option<Outcome>> {
        if self.is_over() {
            return Err(Error::invalid_state(format!(
                "round for track {} is already {:?}",
                self.target, self.status
            )));
        }

        self.guess_count = self.guess_count.saturating_add(1);

        let outcome = if self.guess_count > MAX_GUESSES {
            Some(Outcome::Lost)
        } else if matcher::matches(guess, self.target.display_name()) {
            Some(Outcome::Won)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            self.status = outcome.into();
        }
        Ok(outcome)
    }

    /// Ends the round without a winner. No-op when already over.
    pub fn abandon(&mut self) {
        if !self.is_over() {
            self.status = Status::Abandoned;
        }
    }
}

/// Runs rounds: starts them, judges guesses and produces hints.
pub struct Game {
    config: Config,
    audio: Box<dyn AudioSource>,
}

impl Game {
    pub fn new<A>(config: Config, audio: A) -> Self
    where
        A: AudioSource + 'static,
    {
        Self {
            config,
            audio: Box::new(audio),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a fresh round against `target`.
    #[must_use]
    pub fn start_round(&self, target: TrackRecord) -> Round {
        debug!("starting round for track {target}");
        Round::new(target)
    }

    /// Submits a guess and returns either the round's outcome or the next
    /// hint.
    ///
    /// # Errors
    ///
    /// * `FailedPrecondition` (invalid state) when the round is already
    ///   over; the round is left unchanged.
    /// * `OutOfRange` (insufficient audio) or a decoder error when the
    ///   snippet hint is due and the preview cannot provide it. The guess
    ///   still counts and the round stays active, so the caller can fall
    ///   back to another hint and continue.
    pub fn submit_guess(&self, round: &mut Round, guess: &str) -> Result<GuessResult> {
        let outcome = round.record_guess(guess)?;
        let guess_count = round.guess_count;

        if let Some(outcome) = outcome {
            debug!("guess {guess_count} on track {}: {outcome:?}", round.target);
            return Ok(GuessResult {
                guess_count,
                outcome: Some(outcome),
                hint: None,
            });
        }

        let kind = HintKind::for_guess(guess_count).ok_or_else(|| {
            Error::internal(format!("no hint for active round at guess {guess_count}"))
        })?;
        trace!("guess {guess_count} on track {}: revealing {kind:?}", round.target);

        let hint = self.hint(&round.target, kind)?;
        Ok(GuessResult {
            guess_count,
            outcome: None,
            hint: Some(hint),
        })
    }

    /// Ends the round at the caller's request, as `Abandoned`. Safe to call
    /// on a round that is already over.
    pub fn end_round(&self, round: &mut Round) {
        if !round.is_over() {
            debug!("abandoning round for track {}", round.target);
        }
        round.abandon();
    }

    fn hint(&self, target: &TrackRecord, kind: HintKind) -> Result<Hint> {
        let hint = match kind {
            HintKind::Genre => Hint::Genre(target.genres().to_vec()),
            HintKind::ReleaseDate => Hint::ReleaseDate(target.release_date().to_owned()),
            HintKind::Artist => Hint::Artist(target.artist().to_owned()),
            HintKind::Snippet => Hint::Snippet(self.snippet(target)?),
            HintKind::UnblurAlbumArt => Hint::UnblurAlbumArt,
        };
        Ok(hint)
    }

    fn snippet(&self, target: &TrackRecord) -> Result<Snippet> {
        let audio = self.audio.fetch(target)?;
        snippet::extract(
            audio,
            target.preview_codec(),
            self.config.clip_length,
            &mut fastrand::Rng::new(),
        )
    }
}
