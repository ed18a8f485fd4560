//! A "guess the song" round engine.
//!
//! Start a [`game::Round`] against a [`track::TrackRecord`], feed it guesses
//! through [`game::Game`], and get back either the next hint (genres,
//! release date, artist, an audio [`snippet`], then an album art unblur
//! signal) or the round's outcome. Guesses are judged by the fuzzy
//! [`matcher`]. Hosts serving several players keep their rounds in
//! [`session::Sessions`].
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod audio_file;
pub mod audio_source;
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod game;
pub mod matcher;
pub mod session;
pub mod snippet;
pub mod track;
pub mod uuid;
