mod tui;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{value_parser, Arg, ArgAction, Command};

use groove_trainer::audio::timing::clamp_bpm;
use groove_trainer::audio::RodioClock;
use groove_trainer::console::{self, Level};
use groove_trainer::model::rhythm::{list_presets, RhythmPattern};
use groove_trainer::model::settings::Settings;
use groove_trainer::storage;
use groove_trainer::Engine;

fn cli() -> Command {
    Command::new("groove-trainer")
        .about("Rhythm trainer: play along with a looping beat and get scored live")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Load settings from a YAML file"),
        )
        .arg(
            Arg::new("bpm")
                .short('b')
                .long("bpm")
                .value_name("BPM")
                .value_parser(value_parser!(u32))
                .help("Tempo (clamped to 40..140)"),
        )
        .arg(
            Arg::new("rhythm")
                .short('r')
                .long("rhythm")
                .value_name("ID")
                .help("Rhythm preset id (see --list-rhythms)"),
        )
        .arg(
            Arg::new("samples")
                .short('s')
                .long("samples")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding kick/snare/metronome samples"),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .value_name("FORMAT")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("How to print the session summary on exit"),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write the effective settings to FILE and exit"),
        )
        .arg(
            Arg::new("list-rhythms")
                .long("list-rhythms")
                .action(ArgAction::SetTrue)
                .help("List rhythm presets and exit"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Skip the startup banner and sample warnings"),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    if matches.get_flag("list-rhythms") {
        print!("{}", list_presets());
        return Ok(());
    }

    let mut settings = if let Some(path) = matches.get_one::<String>("config") {
        match storage::settings::open(path) {
            Ok(s) => s,
            Err(e) => {
                console::warn(format!("failed to open {}: {:#}; using default settings", path, e));
                Settings::default()
            }
        }
    } else {
        Settings::default()
    };

    if let Some(bpm) = matches.get_one::<u32>("bpm") {
        settings.bpm = clamp_bpm(*bpm);
    }
    if let Some(id) = matches.get_one::<String>("rhythm") {
        if RhythmPattern::find(id).is_none() {
            bail!("unknown rhythm '{}' (see --list-rhythms)", id);
        }
        settings.rhythm = id.to_ascii_lowercase();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("samples") {
        settings.samples_dir = dir.clone();
    }

    if let Some(path) = matches.get_one::<PathBuf>("write-config") {
        storage::settings::save(&settings, path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let quiet = matches.get_flag("quiet");
    if quiet {
        console::set_fallback_level(Level::Error);
    }

    let rhythm = settings.rhythm_pattern();
    if !quiet {
        println!(
            "GROOVE TRAINER — bpm: {} rhythm: {} ({}) samples: {}",
            settings.effective_bpm(),
            rhythm.label,
            rhythm.grid(),
            settings.samples_dir.display()
        );
    }

    let clock = RodioClock::new(&settings.samples_dir, settings.gains.master)?;
    let mut engine = Engine::new(clock, settings.engine).with_gains(settings.gains);
    engine.set_bpm(settings.effective_bpm());
    engine.set_rhythm(rhythm);

    if let Some(summary) = tui::run(engine)? {
        match matches.get_one::<String>("summary").map(String::as_str) {
            Some("json") => println!("{}", serde_json::to_string_pretty(&summary)?),
            _ => {
                for line in summary.summary_lines() {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}
