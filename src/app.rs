use crate::cli::{Cli, Commands, ConvertArgs};
use anyhow::{Context, Result, bail};
use ffbatch::engine::filter::{Filter, MirrorAxis, Rotation, VideoFilterOptions, parse_resolution};
use ffbatch::engine::{backend, hardware, probe};
use ffbatch::{config, engine};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::warn;

pub fn run(cli: Cli) {
    let config = config::Config::load().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "config unusable, using built-in defaults");
        config::Config::default()
    });
    let settings = config.settings(cli.verbose);

    let result = match cli.command {
        Commands::Convert(args) => handle_convert(args, &config, settings),
        Commands::Check { inputs } => handle_check(inputs, &settings),
        Commands::Probe { file } => handle_probe(file, &settings),
        Commands::Codecs { format } => handle_codecs(format, &settings),
        Commands::CheckFfmpeg => handle_check_ffmpeg(&settings),
        Commands::InitConfig => {
            handle_init_config();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn build_request(args: &ConvertArgs, config: &config::Config) -> Result<engine::EncodeRequest> {
    let custom_video = args
        .video_filters
        .iter()
        .map(|f| Filter::parse(f))
        .collect::<engine::Result<Vec<_>>>()?;
    let audio_filters = args
        .audio_filters
        .iter()
        .map(|f| Filter::parse(f))
        .collect::<engine::Result<Vec<_>>>()?;

    let video_filters = VideoFilterOptions {
        rotation: args.rotate.map(Rotation::try_from).transpose()?,
        mirror: args
            .mirror
            .as_deref()
            .map(str::parse::<MirrorAxis>)
            .transpose()?,
        deshake: args.deshake,
        unsharp: args.unsharp,
        resolution: args.resolution.as_deref().map(parse_resolution).transpose()?,
        fps: args.fps,
        brightness: args.brightness,
        contrast: args.contrast,
        color: args.color,
        gamma: args.gamma,
        custom: custom_video,
    }
    .build()?;

    let target_size = args
        .target_size
        .as_deref()
        .map(engine::parse_target_size)
        .transpose()?
        .unwrap_or(0);

    Ok(engine::EncodeRequest {
        audio_codec: args.audio_codec,
        video_codec: args.video_codec,
        audio_bitrate: args.audio_bitrate,
        video_bitrate: args.video_bitrate,
        audio_filters,
        video_filters,
        quality: args.quality.or(config.defaults.video_quality),
        speed: args.speed.or(config.defaults.encoding_speed),
        profile: args.profile.or(config.defaults.video_profile),
        target_size,
        extra_args: args.ffmpeg_args.clone().unwrap_or_default(),
        ..engine::EncodeRequest::default()
    })
}

fn handle_convert(
    args: ConvertArgs,
    config: &config::Config,
    mut settings: engine::Settings,
) -> Result<()> {
    let request = build_request(&args, config)?;
    settings.overwrite |= args.overwrite;

    let inputs = engine::expand_inputs(&args.inputs)?;
    if inputs.is_empty() {
        bail!("No media files found in the given inputs");
    }

    let options = engine::ConvertOptions {
        output_dir: args.output_dir.or_else(|| config.defaults.output_dir.clone()),
        out_stem: args.stem,
        error_mode: if args.keep_going {
            engine::ErrorMode::Continue
        } else {
            engine::ErrorMode::FailFast
        },
        cancel: Some(cancel_flag()),
    };
    let probe = engine::Ffprobe::new(settings.ffprobe_bin.clone());

    if args.dry_run {
        let plans =
            engine::plan_batch(inputs, &args.format, &request, &options, &settings, &probe)?;
        for (job, plan) in &plans {
            println!(
                "# {} -> {}",
                job.input_path.display(),
                job.output_path.display()
            );
            println!("{}", engine::format_plan(&settings.ffmpeg_bin, plan));
        }
        println!("Total jobs: {}", plans.len());
        return Ok(());
    }

    let mut line = ProgressLine::new(settings.show_progress);
    let result = engine::convert_batch(
        inputs,
        &args.format,
        &request,
        &options,
        &settings,
        &probe,
        |pct| line.update(pct),
    );
    line.finish();

    let report = result?;
    println!("Converted {} file(s)", report.succeeded());
    Ok(())
}

fn handle_check(inputs: Vec<PathBuf>, settings: &engine::Settings) -> Result<()> {
    let inputs = engine::expand_inputs(&inputs)?;
    if inputs.is_empty() {
        bail!("No media files found in the given inputs");
    }
    let probe = engine::Ffprobe::new(settings.ffprobe_bin.clone());

    let mut line = ProgressLine::new(settings.show_progress);
    let result = engine::check_batch(
        inputs,
        settings,
        &probe,
        Some(cancel_flag()),
        |pct| line.update(pct),
    );
    line.finish();

    let report = result?;
    println!("All {} file(s) decoded without errors", report.succeeded());
    Ok(())
}

fn handle_probe(file: PathBuf, settings: &engine::Settings) -> Result<()> {
    let info = probe::probe_media_info(&settings.ffprobe_bin, &file)
        .with_context(|| format!("Failed to probe {}", file.display()))?;

    println!("File: {}", file.display());
    if let Some(format) = &info.format_name {
        println!("Format: {}", format);
    }
    match info.duration {
        Some(duration) => println!("Duration: {:.2} seconds", duration),
        None => println!("Duration: unknown"),
    }
    if let Some(bit_rate) = info.bit_rate {
        println!("Bitrate: {} kbit/s", bit_rate / 1000);
    }
    for stream in &info.streams {
        let codec = stream.codec_name.as_deref().unwrap_or("unknown");
        let mut line = format!("  #{} {}: {}", stream.index, stream.codec_type, codec);
        if let (Some(w), Some(h)) = (stream.width, stream.height) {
            line.push_str(&format!(" {}x{}", w, h));
        }
        if let Some(fps) = stream.fps {
            line.push_str(&format!(" {:.2} fps", fps));
        }
        if let Some(rate) = stream.sample_rate {
            line.push_str(&format!(" {} Hz", rate));
        }
        if let Some(channels) = stream.channels {
            line.push_str(&format!(" {} ch", channels));
        }
        println!("{}", line);
    }
    Ok(())
}

fn handle_codecs(format: Option<String>, settings: &engine::Settings) -> Result<()> {
    let formats = match format {
        Some(name) => vec![backend::resolve_backend(&name)?.container],
        None => backend::supported_formats(),
    };

    let encoders = hardware::available_encoders_with(&settings.ffmpeg_bin);
    let known = !encoders.is_empty();
    let mark = |name: &str| {
        if known && !encoders.contains(name) && name != "null" && name != "copy" {
            format!("{name} (unavailable)")
        } else {
            name.to_string()
        }
    };

    for format in formats {
        println!("{} (muxer {})", format, format.muxer());
        let audio: Vec<String> = format
            .allowed_audio_codecs()
            .iter()
            .map(|c| mark(c.ffmpeg_name()))
            .collect();
        println!("  audio: {} [default {}]", audio.join(", "), format.default_audio());
        let video: Vec<String> = format
            .allowed_video_codecs()
            .iter()
            .map(|c| mark(c.ffmpeg_name()))
            .collect();
        println!("  video: {} [default {}]", video.join(", "), format.default_video());
    }

    if !known {
        println!("Could not query {} for encoders; availability not shown", settings.ffmpeg_bin);
    }
    Ok(())
}

fn handle_check_ffmpeg(settings: &engine::Settings) -> Result<()> {
    let version = engine::ffmpeg_version(&settings.ffmpeg_bin)?;
    println!("ffmpeg found: {}", version);
    let probe_version = engine::ffprobe_version(&settings.ffprobe_bin)?;
    println!("ffprobe found: {}", probe_version);

    let encoders = hardware::available_encoders_with(&settings.ffmpeg_bin);
    let apis = hardware::available_apis(encoders);
    if apis.is_empty() {
        println!("Hardware encoders: none");
    } else {
        let names: Vec<String> = apis.iter().map(|a| a.to_string()).collect();
        println!("Hardware encoders: {}", names.join(", "));
    }
    match hardware::detect_render_device() {
        Some(device) => println!("Render device: {}", device),
        None => println!("Render device: none"),
    }
    Ok(())
}

fn handle_init_config() {
    match config::Config::load() {
        Ok(cfg) => {
            match config::Config::config_path() {
                Ok(path) => println!("Config loaded successfully from {}", path.display()),
                Err(e) => println!("Config loaded, but config path unknown: {:#}", e),
            }
            println!("{:#?}", cfg);
        }
        Err(e) => {
            println!("Config missing or invalid: {:#}", e);
            println!("Creating default config...");

            let cfg = config::Config::default();
            if let Err(err) = cfg.save() {
                eprintln!("Failed to save default config: {:#}", err);
                process::exit(1);
            } else {
                match config::Config::config_path() {
                    Ok(path) => println!("Default config saved to {}", path.display()),
                    Err(e) => println!("Default config saved (path unknown): {:#}", e),
                }
            }
        }
    }
}

/// Single-line batch progress bar on stdout
struct ProgressLine {
    enabled: bool,
    drawn: bool,
}

impl ProgressLine {
    const WIDTH: usize = 30;

    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            drawn: false,
        }
    }

    fn update(&mut self, pct: f64) {
        if !self.enabled {
            return;
        }
        let filled = ((pct / 100.0) * Self::WIDTH as f64).round() as usize;
        let filled = filled.min(Self::WIDTH);
        print!(
            "\r[{}{}] {:5.1}%",
            "#".repeat(filled),
            "-".repeat(Self::WIDTH - filled),
            pct
        );
        let _ = io::stdout().flush();
        self.drawn = true;
    }

    fn finish(&mut self) {
        if self.drawn {
            println!();
            self.drawn = false;
        }
    }
}

static CANCEL_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Flag set by Ctrl-C; the batch stops before its next file
fn cancel_flag() -> Arc<AtomicBool> {
    let flag = CANCEL_FLAG.get_or_init(|| {
        #[cfg(unix)]
        install_sigint_handler();
        Arc::new(AtomicBool::new(false))
    });
    Arc::clone(flag)
}

#[cfg(unix)]
extern "C" fn on_sigint(_signal: libc::c_int) {
    if let Some(flag) = CANCEL_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
    // A second Ctrl-C terminates immediately
    // SAFETY: signal() is async-signal-safe
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

#[cfg(unix)]
fn install_sigint_handler() {
    let handler = on_sigint as extern "C" fn(libc::c_int);
    // SAFETY: the handler only performs an atomic store and resets itself
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}
