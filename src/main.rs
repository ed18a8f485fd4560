use std::{
    error::Error,
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use clap::{command, Parser, ValueHint};
use log::{debug, error, info, warn, LevelFilter};

use spotle::{
    audio_source::{FileAudio, MemoryAudio},
    catalog::Catalog,
    config::Config,
    game::{Game, Hint, Outcome},
    snippet::Snippet,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Typed at the prompt to give up the round.
const GIVE_UP: &str = "/giveup";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tracks file
    ///
    /// JSON array of tracks (or a single track) to draw the round's target
    /// from, with fields such as `track_name`, `artist_name`,
    /// `release_date`, `genre` and `clip`.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, env = "SPOTLE_TRACKS")]
    tracks: String,

    /// Preview audio file
    ///
    /// Audio to cut the snippet hint from. When omitted, the target's
    /// `clip` URL is read if it is a `file://` URL.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    preview: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, env = "SPOTLE_CONFIG")]
    config: Option<String>,

    /// Snippet length in milliseconds
    ///
    /// [default: 1500]
    #[arg(long, value_name = "MS")]
    clip_length: Option<u64>,

    /// Directory to write snippets to as WAV files
    ///
    /// Snippets are printed as base64 data URIs otherwise.
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    snippet_dir: Option<PathBuf>,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            // Quiet and verbose are mutually exclusive, and `verbose` is 0
            // by default. So this arm means: quiet mode.
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        logger.filter_module(module_path!(), level);
        logger.filter_module("spotle", level);
    }

    logger.init();
}

/// Merges the configuration file with command line overrides.
fn load_config(args: &Args) -> spotle::error::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(ms) = args.clip_length {
        config = config.with_clip_length(Duration::from_millis(ms))?;
    }
    if args.snippet_dir.is_some() {
        config.snippet_dir.clone_from(&args.snippet_dir);
    }

    Ok(config)
}

/// Builds the game, reading previews from `--preview` or the track's own
/// `file://` preview URL.
fn new_game(args: &Args, config: Config) -> io::Result<Game> {
    let game = match &args.preview {
        Some(path) => Game::new(config, MemoryAudio::new(fs::read(path)?)),
        None => Game::new(config, FileAudio::new()),
    };
    Ok(game)
}

/// Writes `snippet` to `dir` and returns the path written to.
fn save_snippet(dir: &Path, snippet: &Snippet) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("snippet-{}ms.wav", snippet.start().as_millis()));
    fs::write(&path, snippet.data())?;
    Ok(path)
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}

fn show_hint(hint: &Hint, config: &Config) -> io::Result<()> {
    match hint {
        Hint::Genre(genres) => {
            println!("Genre: {}", or_unknown(&genres.join(", ")));
        }
        Hint::ReleaseDate(date) => println!("Released: {}", or_unknown(date)),
        Hint::Artist(artist) => println!("Artist: {}", or_unknown(artist)),
        Hint::Snippet(snippet) => match &config.snippet_dir {
            Some(dir) => {
                let path = save_snippet(dir, snippet)?;
                println!("Listen: {}", path.display());
            }
            None => println!("Listen: {}", snippet.to_data_uri()),
        },
        Hint::UnblurAlbumArt => println!("The album art is getting clearer..."),
    }
    Ok(())
}

/// Plays one round on standard input and output.
///
/// # Errors
///
/// Returns an error when the tracks, preview or configuration cannot be
/// loaded, or when standard input or output fail.
fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(args)?;
    let catalog = Catalog::from_file(&args.tracks)?;
    let target = catalog.choose(&mut fastrand::Rng::new())?.clone();
    let album_art = target.album_art().cloned();

    let game = new_game(args, config.clone())?;
    let mut round = game.start_round(target);

    println!("Guess the song! Type {GIVE_UP} to give up.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Guess {}: ", round.guess_count() + 1);
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            game.end_round(&mut round);
            break;
        };
        let guess = line.trim();
        if guess == GIVE_UP {
            game.end_round(&mut round);
            break;
        }

        match game.submit_guess(&mut round, guess) {
            Ok(result) => {
                if let Some(hint) = result.hint() {
                    show_hint(hint, &config)?;
                }
                match result.outcome() {
                    Some(Outcome::Won) => {
                        println!("Correct, in {} guesses!", result.guess_count());
                        break;
                    }
                    Some(Outcome::Lost) => {
                        println!("Out of guesses.");
                        break;
                    }
                    None => {}
                }
            }
            // The only fallible hint is the snippet: skip that tier.
            Err(e) => {
                warn!("no snippet for this track: {e}");
                println!("No audio hint this time.");
            }
        }
    }

    let target = round.target();
    println!("It was {target}.");
    if let Some(url) = album_art {
        println!("Album art: {url}");
    }
    debug!("round ended as {:?}", round.status());

    Ok(())
}

/// Main entry point of the application.
fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}
