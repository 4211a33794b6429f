//! ESP Trials - terminal psychic-ability diagnosis
//!
//! Three short randomized trials (telekinesis, clairvoyance, precognition),
//! each scored on its own, then combined into one composite diagnosis.
//! Single playthrough, in memory only.

mod cli;
mod config;
mod diagnosis;
mod error;
mod registry;
mod rng;
mod scheduler;
mod session;

use clap::Parser;
use cli::{Display, InputHandler, MenuChoice};
use config::AppConfig;
use diagnosis::diagnose;
use registry::PlaythroughContext;
use rng::{RandomSource, StdRandom};
use session::{TrialRunner, TrialSession};
use std::error::Error;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ESP Trials")]
#[command(about = "Telekinesis, clairvoyance and precognition tests with a composite ESP diagnosis")]
struct Args {
    /// Path to a JSON config file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for reproducible trials
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the final diagnosis as JSON on exit
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Which screen the terminal is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Screen {
    Menu,
    Trial,
    Diagnosis,
}

fn init_logging(debug: bool) {
    let default = if debug {
        "esp_trials=debug"
    } else {
        "esp_trials=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Menu-driven loop: forwards keys to the runner and fires due timers
/// between keystrokes.
fn event_loop<R: RandomSource>(
    runner: &mut TrialRunner<R>,
    ctx: &mut PlaythroughContext,
    display: &mut Display,
    input: &InputHandler,
) -> Result<(), Box<dyn Error>> {
    let mut screen = Screen::Menu;
    let mut notice: Option<String> = None;
    let mut dirty = true;

    'app: loop {
        if runner.advance(Instant::now(), ctx) > 0 {
            dirty = true;
        }

        if dirty {
            match screen {
                Screen::Menu => display.show_menu(&ctx.completed(), notice.as_deref())?,
                Screen::Trial => {
                    if let Some(session) = runner.session() {
                        display.show_session(session, notice.as_deref())?;
                    }
                }
                Screen::Diagnosis => display.show_diagnosis(&diagnose(&ctx.registry.snapshot()))?,
            }
            dirty = false;
        }

        let Some(key) = input.read_key(runner.time_until_next(Instant::now()))? else {
            continue;
        };
        if InputHandler::is_exit(&key) {
            break 'app;
        }
        notice = None;
        dirty = true;

        match screen {
            Screen::Menu => match InputHandler::menu_choice(&key) {
                Some(MenuChoice::Trial(trial)) => {
                    runner.start(trial, Instant::now());
                    screen = Screen::Trial;
                }
                Some(MenuChoice::Diagnosis) => screen = Screen::Diagnosis,
                Some(MenuChoice::Quit) => break 'app,
                None => {}
            },
            Screen::Trial => {
                let finished = runner
                    .session()
                    .map_or(true, |s| s.phase().is_finished());
                if finished {
                    runner.exit();
                    screen = Screen::Menu;
                } else if InputHandler::is_escape(&key) {
                    runner.abandon();
                    screen = Screen::Menu;
                } else if let Some(trial) = runner.session().map(TrialSession::trial) {
                    if let Some(raw) = InputHandler::selection(trial, &key) {
                        if let Err(e) = runner.select(raw, Instant::now(), ctx) {
                            notice = Some(e.to_string());
                        }
                    }
                }
            }
            Screen::Diagnosis => screen = Screen::Menu,
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    tracing::debug!(?config, seed = ?args.seed, "configuration loaded");

    let rng = match args.seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_entropy(),
    };
    let mut runner = TrialRunner::new(config, rng);
    let mut ctx = PlaythroughContext::new();

    let mut display = Display::new();
    InputHandler::enable_raw_mode()?;
    let input = InputHandler::new();

    let outcome = event_loop(&mut runner, &mut ctx, &mut display, &input);

    // Cleanup
    runner.abandon();
    InputHandler::disable_raw_mode()?;
    display.shutdown()?;
    display.clear()?;
    outcome?;

    // Summary
    let view = diagnose(&ctx.registry.snapshot());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("ESP diagnosis");
        let [telekinesis, clairvoyance, precognition] = view.percentages();
        println!(
            "Telekinesis {} | Clairvoyance {}% | Precognition {}%",
            telekinesis, clairvoyance, precognition
        );
        println!(
            "Composite score: {} -> {} ({})",
            view.composite_score,
            view.tier_label,
            view.tier.remark()
        );
    }

    Ok(())
}
