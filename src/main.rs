// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pocketmix::audio::{self, AudioEngine, Sound, SoundType};
use pocketmix::config::Player;
use pocketmix::fs::{DirFileSystem, FileSystem};
use pocketmix::util::{duration_display, filename_display, seconds_to_frames};

const DEFAULT_RENDER_SECONDS: f64 = 10.0;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A QOA/MP3 sound mixer."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads sounds and prints their properties.
    Info {
        /// The directory the sounds live in.
        root: String,
        /// Sound paths, relative to the root.
        files: Vec<String>,
        /// The engine sample rate to load against.
        #[arg[short, long, default_value_t = 44100]]
        sample_rate: u32,
    },
    /// Plays the cues in a player config offline into a WAV file.
    Render {
        /// The path to the player config.
        player_path: String,
        /// The WAV file to write.
        output_path: String,
        /// Maximum length to render. Rendering stops early once nothing is playing.
        #[arg[short, long]]
        seconds: Option<f64>,
    },
    /// Plays the cues in a player config through the audio device.
    Play {
        /// The path to the player config.
        player_path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info {
            root,
            files,
            sample_rate,
        } => {
            let fs: Arc<dyn FileSystem> = Arc::new(DirFileSystem::new(&root));
            let engine = AudioEngine::new(sample_rate, audio::Channels::Stereo);

            println!("Sounds (count: {}):", files.len());
            for file in files.iter() {
                match engine.load(fs.clone(), file, SoundType::Streamed) {
                    Ok(sound) => {
                        println!(
                            "- {} ({}, {} ch, {} Hz, {} frames, {})",
                            filename_display(Path::new(sound.path())),
                            sound.format(),
                            sound.channels().count(),
                            sound.sample_rate(),
                            sound.total_frames(),
                            duration_display(sound.duration()),
                        );
                        engine.unload(sound);
                    }
                    Err(e) => println!("- {}: {}", file, e),
                }
            }
        }
        Commands::Render {
            player_path,
            output_path,
            seconds,
        } => {
            let player_path = PathBuf::from(player_path);
            let player = Player::deserialize(&player_path)?;
            let engine = AudioEngine::from_config(player.audio())?;
            let sounds = start_cues(&engine, &player, &player_path)?;

            let max_frames = seconds_to_frames(
                seconds.unwrap_or(DEFAULT_RENDER_SECONDS),
                engine.sample_rate(),
            );
            let frames = audio::render::render_wav(
                &engine,
                Path::new(&output_path),
                max_frames,
                player.audio().buffer_size(),
            )?;
            println!(
                "Rendered {} frames to {}",
                frames,
                filename_display(Path::new(&output_path))
            );

            sounds.into_iter().for_each(|sound| engine.unload(sound));
        }
        Commands::Play { player_path } => {
            let player_path = PathBuf::from(player_path);
            let player = Player::deserialize(&player_path)?;
            let engine = Arc::new(AudioEngine::from_config(player.audio())?);
            let sounds = start_cues(&engine, &player, &player_path)?;

            let output = audio::cpal::Output::open(engine.clone(), player.audio())?;
            info!(device = output.name(), "Playing");
            while engine.active_instances() > 0 {
                thread::sleep(POLL_INTERVAL);
            }
            output.pause()?;
            drop(output);

            sounds.into_iter().for_each(|sound| engine.unload(sound));
        }
        Commands::Devices {} => {
            let devices = audio::cpal::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(())
}

/// Loads every cue's sound and starts it. Cues that fail to load are skipped
/// with a warning.
fn start_cues(
    engine: &AudioEngine,
    player: &Player,
    player_path: &Path,
) -> Result<Vec<Sound>, Box<dyn Error>> {
    let assets = player.assets_dir(player_path);
    let fs: Arc<dyn FileSystem> = Arc::new(DirFileSystem::new(&assets));

    let mut sounds = Vec::with_capacity(player.cues().len());
    for cue in player.cues() {
        let sound = match engine.load(fs.clone(), cue.file(), cue.sound_type()) {
            Ok(sound) => sound,
            Err(e) => {
                warn!(file = cue.file(), err = %e, "Skipping cue");
                continue;
            }
        };
        engine.play(&sound, cue.volume(), cue.pan(), cue.mode())?;
        sounds.push(sound);
    }

    if sounds.is_empty() && !player.cues().is_empty() {
        return Err("no cue could be loaded".into());
    }
    Ok(sounds)
}
