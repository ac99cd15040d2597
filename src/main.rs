//! Droneroo CLI — run the TUI, bounce a drone to WAV, or list MIDI ports.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use droneroo::audio::{bounce, AudioEngine, BounceOptions, Timbre};
use droneroo::config::{self, Config};
use droneroo::drone::Droner;
use droneroo::midi::{PedalConfig, PedalInput};
use droneroo::theory::{note_to_midi, Series, SeriesKind};
use droneroo::tui::{pedal_channel, App};

#[derive(Parser)]
#[command(name = "droneroo", version, about = "Practice drone and metronome for the terminal")]
struct Cli {
    /// Tonal series to start with: fourths, flats, or chromatic.
    #[arg(long)]
    series: Option<String>,

    /// Starting metronome tempo in BPM (30-300).
    #[arg(long)]
    bpm: Option<f64>,

    /// Starting note name (e.g. C, D♭, F#); picks the matching series entry.
    #[arg(long)]
    note: Option<String>,

    /// Run without connecting to a MIDI pedal.
    #[arg(long)]
    no_pedal: bool,

    /// Settings file to use instead of ~/.droneroo/config.yaml.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Render a drone to a WAV file without opening an audio device.
    Render {
        /// Note name of the drone root.
        #[arg(long, default_value = "C")]
        note: String,
        /// Length of the rendered file in seconds.
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        /// Metronome tempo, used when --tick is given.
        #[arg(long, default_value_t = 60.0)]
        bpm: f64,
        /// Include the metronome click.
        #[arg(long)]
        tick: bool,
        /// Drone timbre: strings or beep.
        #[arg(long, default_value = "strings")]
        timbre: String,
        /// Output WAV path.
        output: PathBuf,
    },
    /// List available MIDI input ports.
    Devices,
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Some(Command::Render {
            note,
            seconds,
            bpm,
            tick,
            timbre,
            output,
        }) => run_render(note, *seconds, *bpm, *tick, timbre, output),
        Some(Command::Devices) => run_devices(),
        None => run_tui(&cli),
    };

    if let Err(e) = result {
        eprintln!("droneroo: {e}");
        std::process::exit(1);
    }
}

fn run_tui(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut saved = config::load(&config_path)?;
    apply_overrides(&mut saved, cli)?;

    let (engine, commands) = AudioEngine::start()?;
    let droner = Droner::new(commands, &saved)?;

    let (pedal_tx, pedal_rx) = pedal_channel();
    let pedal = if cli.no_pedal {
        None
    } else {
        let pedal_config = PedalConfig::load().unwrap_or_default();
        // A machine without MIDI ports is normal; just run without the pedal.
        PedalInput::start(&pedal_config, pedal_tx).ok()
    };
    let pedal_port = pedal.as_ref().map(|p| p.port_name().to_string());

    let mut terminal = ratatui::init();
    let mut app = App::new(droner, config_path, pedal_rx, pedal_port);
    let result = app.run(&mut terminal);
    ratatui::restore();

    drop(engine);
    result.map_err(Into::into)
}

fn apply_overrides(saved: &mut Config, cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(ref series) = cli.series {
        saved.series = series.parse::<SeriesKind>()?;
        saved.index = 0;
    }
    if let Some(bpm) = cli.bpm {
        saved.bpm = bpm;
    }
    if let Some(ref note) = cli.note {
        let midi = note_to_midi(note)?;
        let series = Series::new(saved.series);
        saved.index = series.index_of(midi).ok_or_else(|| {
            format!(
                "note {note:?} is not in the {} series",
                saved.series.label()
            )
        })?;
    }
    Ok(())
}

fn run_render(
    note: &str,
    seconds: f64,
    bpm: f64,
    tick: bool,
    timbre: &str,
    output: &PathBuf,
) -> Result<(), Box<dyn Error>> {
    let opts = BounceOptions {
        note: note_to_midi(note)?,
        seconds,
        bpm,
        tick,
        timbre: timbre.parse::<Timbre>()?,
        ..BounceOptions::default()
    };
    bounce(&opts, output)?;
    println!(
        "wrote {:.1}s of {} drone to {}",
        seconds,
        note,
        output.display()
    );
    Ok(())
}

fn run_devices() -> Result<(), Box<dyn Error>> {
    let devices = PedalInput::list_devices();
    if devices.is_empty() {
        println!("no MIDI input ports found");
    } else {
        for (i, name) in devices.iter().enumerate() {
            println!("{i}: {name}");
        }
    }
    Ok(())
}
