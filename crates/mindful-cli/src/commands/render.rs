use std::path::PathBuf;

use clap::Args;
use mindful_core::audio::render::render_voice;
use mindful_core::audio::{render_theme, write_wav};
use mindful_core::notify::CompletionTone;
use mindful_core::{Config, SoundTheme};

use crate::output::CliResult;

#[derive(Args)]
pub struct RenderArgs {
    /// Theme to render: none, rain, ocean, forest, birds, wind (default from config)
    theme: Option<SoundTheme>,
    /// Output WAV path
    #[arg(long, short)]
    out: PathBuf,
    /// Length in seconds
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Noise seed, for reproducible output
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Sample rate in Hz (default from config)
    #[arg(long)]
    sample_rate: Option<u32>,
    /// Render the completion chime instead of a theme
    #[arg(long, conflicts_with = "theme")]
    chime: bool,
}

pub fn run(args: RenderArgs) -> CliResult {
    let config = Config::load_or_default();
    let sample_rate = args.sample_rate.unwrap_or(config.audio.sample_rate);
    if sample_rate == 0 {
        return Err("sample rate must be positive".into());
    }

    let (label, samples) = if args.chime {
        let mut tone = CompletionTone::new(sample_rate);
        let frames = (args.seconds.max(0.0) * f64::from(sample_rate)) as usize;
        ("chime".to_string(), render_voice(&mut tone, frames))
    } else {
        let theme = args.theme.unwrap_or(config.audio.default_theme);
        let samples = render_theme(theme, args.seconds, sample_rate, config.audio.master_gain, args.seed);
        (theme.to_string(), samples)
    };

    write_wav(&args.out, &samples, sample_rate)?;
    println!(
        "rendered {label}: {:.2}s at {sample_rate} Hz -> {}",
        samples.len() as f64 / f64::from(sample_rate),
        args.out.display()
    );
    Ok(())
}
