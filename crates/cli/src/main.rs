use std::path::PathBuf;
use std::process;

use clap::Parser;

use slow_movie_core::config::configuration::Configuration;
use slow_movie_core::display::domain::display_updater::DisplayUpdater;
use slow_movie_core::display::infrastructure::update_display_process::UpdateDisplayProcess;
use slow_movie_core::imaging::frame_encoder::FourBppEncoder;
use slow_movie_core::library::video_library::VideoLibrary;
use slow_movie_core::player::slow_movie_player::SlowMoviePlayer;
use slow_movie_core::shared::constants::{
    DEFAULT_CONFIG_DIRECTORY, DEFAULT_RUNTIME_DIRECTORY, UPDATE_DISPLAY_PATH,
};
use slow_movie_core::video::infrastructure::ffmpeg_source::FfmpegOpener;

/// Plays the videos of a directory on an e-paper panel, one frame per refresh.
#[derive(Parser)]
#[command(name = "slow-movie-player", version)]
struct Cli {
    /// Blank the panel and exit.
    #[arg(long)]
    clear: bool,

    /// Directory holding the *.conf file.
    #[arg(long, env = "CONFIGURATION_DIRECTORY", default_value = DEFAULT_CONFIG_DIRECTORY)]
    config_dir: PathBuf,

    /// Directory for the encoded frame handed to the display helper.
    #[arg(long, env = "RUNTIME_DIRECTORY", default_value = DEFAULT_RUNTIME_DIRECTORY)]
    runtime_dir: PathBuf,

    /// Path of the display update helper.
    #[arg(long, default_value = UPDATE_DISPLAY_PATH)]
    update_display: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Configuration::load(&cli.config_dir)?;

    let mut display =
        UpdateDisplayProcess::new(config.vcom).with_program(&cli.update_display);
    if cli.clear {
        display.clear()?;
        log::info!("Display cleared");
        return Ok(());
    }

    log::info!(
        "Playing {} on a {}x{} panel, {:?} per frame, {}",
        config.video_directory.display(),
        config.screen_width,
        config.screen_height,
        config.refresh_timeout,
        if config.random_frame {
            "random frames".to_string()
        } else {
            config.skip.to_string()
        }
    );

    let library = VideoLibrary::new(&config.video_directory, Box::new(FfmpegOpener))?;
    let encoder = FourBppEncoder::new(
        config.screen_width,
        config.screen_height,
        config.grayscale_method,
    );

    let mut player = SlowMoviePlayer::new(
        library,
        Box::new(encoder),
        Box::new(display),
        &cli.runtime_dir,
    )
    .with_skip(config.skip)
    .with_random_frame(config.random_frame)
    .with_refresh_timeout(config.refresh_timeout);

    player.run()?;
    Ok(())
}
