//! Genstudio - restyle photos with Gemini or Gommo image models.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod credentials;
mod error;
mod gallery;
mod model;
mod output;
mod params;
mod poller;
mod ports;
mod rotation;
mod workset;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Cli, Command, GalleryCommand, GenerateArgs, KeyArgs};
use crate::config::Config;
use crate::context::{RecordingSession, ServiceContext};
use crate::error::ImageError;
use crate::gallery::{Gallery, GalleryEntry};
use crate::model::{detect_provider, resolve_model, Provider};
use crate::output::{resolve_output_path, save_image};
use crate::params::{
    build_prompt, validate_aspect_ratio, validate_format, validate_framing, validate_style,
};
use crate::ports::{ImageAnalyzer, ImageRequest, ImageResponse};
use crate::workset::{load_input, WorkingSet};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "genstudio=debug" } else { "genstudio=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), ImageError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(ImageError::Config)?;
    tracing::debug!(path = %config_path.display(), "config loaded");

    match cli.command {
        Command::Generate(args) => generate(args, &config).await,
        Command::Analyze(args) => analyze(args, &config).await,
        Command::ValidateKeys(keys) => validate_keys(&keys, &config).await,
        Command::Gallery(command) => gallery_command(&command, &config),
    }
}

/// Pick live, recording, or replaying mode from the environment.
fn build_context(
    provider: Provider,
    config: &Config,
    user_keys: Option<&str>,
) -> Result<(ServiceContext, Option<RecordingSession>), ImageError> {
    let replay_path = std::env::var("GENSTUDIO_REPLAY").ok().filter(|v| !v.is_empty());
    let is_recording = std::env::var("GENSTUDIO_REC").is_ok_and(|v| v == "true" || v == "1");

    if let Some(ref cassette_path) = replay_path {
        tracing::info!(cassette = %cassette_path, "replaying");
        Ok((ServiceContext::replaying(provider, Path::new(cassette_path), config)?, None))
    } else if is_recording {
        tracing::info!("recording mode enabled");
        let (ctx, session) = ServiceContext::recording(provider, config, user_keys)?;
        Ok((ctx, Some(session)))
    } else {
        Ok((ServiceContext::live(provider, config, user_keys)?, None))
    }
}

async fn generate(args: GenerateArgs, config: &Config) -> Result<(), ImageError> {
    let resolved_model = resolve_model(&args.model);
    let provider = detect_provider(&resolved_model).map_err(ImageError::InvalidArgument)?;
    tracing::debug!(model = %resolved_model, alias = %args.model, provider = provider.as_str());

    validate_style(&args.style).map_err(ImageError::InvalidArgument)?;
    validate_framing(&args.framing).map_err(ImageError::InvalidArgument)?;
    validate_aspect_ratio(&args.aspect_ratio, provider).map_err(ImageError::InvalidArgument)?;
    validate_format(&args.format).map_err(ImageError::InvalidArgument)?;

    let mut set = WorkingSet::new();
    for path in &args.inputs {
        let id = set.add(path.clone(), load_input(path)?);
        if set.iter().any(|item| item.id != id && item.source == *path) {
            tracing::warn!(path = %path.display(), "skipping duplicate input");
            set.remove(id);
        }
    }

    let mut gallery =
        if args.no_gallery { None } else { Some(Gallery::load(&config.gallery_path())?) };

    if args.skip_existing {
        if let Some(ref gallery) = gallery {
            let done: Vec<usize> = set
                .iter()
                .filter(|item| gallery.list().iter().any(|e| e.source == item.source))
                .map(|item| item.id)
                .collect();
            for id in done {
                set.set_selected(id, false);
            }
        }
    }

    let prompt = build_prompt(&args.style, &args.framing, args.prompt.as_deref());
    let (ctx, recording_session) =
        build_context(provider, config, args.keys.api_key.as_deref())?;

    let mut last_error = None;
    for id in set.pending_selection() {
        let Some(item) = set.get(id) else { continue };
        let source = item.source.clone();
        let request = ImageRequest {
            model: resolved_model.clone(),
            prompt: prompt.clone(),
            aspect_ratio: args.aspect_ratio.clone(),
            format: args.format.clone(),
            input: Some(item.image.clone()),
        };

        set.mark_generating(id);
        let outcome = match ctx.generator.generate(&request).await {
            Ok(response) => save_results(&response, &source, &args),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(saved) => {
                if let Some(ref mut gallery) = gallery {
                    for (path, remote_url) in &saved {
                        gallery.add(GalleryEntry::new(
                            provider.as_str(),
                            &resolved_model,
                            &prompt,
                            source.clone(),
                            path.clone(),
                            remote_url.clone(),
                        ));
                    }
                }
                if let Some((first, _)) = saved.into_iter().next() {
                    set.mark_completed(id, first);
                }
            }
            Err(e) => {
                tracing::warn!(source = %source.display(), error = %e, "generation failed");
                set.mark_error(id, e.to_string());
                last_error = Some(e);
            }
        }
    }

    if let Some(gallery) = gallery {
        gallery.save()?;
    }

    if let Some(session) = recording_session {
        match session.finish() {
            Ok((path, count)) => {
                eprintln!("Cassette saved: {} ({count} interactions)", path.display());
            }
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }

    let summary = set.summary();
    let total = summary.completed + summary.failed;
    tracing::debug!(generating = summary.generating, idle = summary.idle, "batch finished");
    if total > 1 || summary.idle > 0 {
        for item in set.iter() {
            match (&item.result_path, &item.error) {
                (Some(path), _) => {
                    let source = item.source.display();
                    eprintln!("  [{}] {source} -> {}", item.status, path.display());
                }
                (None, Some(message)) => {
                    eprintln!("Failed: {}: {message}", item.source.display());
                }
                (None, None) if !item.selected => {
                    eprintln!("  [skipped] {} (already in gallery)", item.source.display());
                }
                (None, None) => eprintln!("  [{}] {}", item.status, item.source.display()),
            }
        }
        eprintln!(
            "Done: {} completed, {} failed, {} skipped",
            summary.completed, summary.failed, summary.idle
        );
    }

    match (summary.failed, last_error) {
        (0, _) | (_, None) => Ok(()),
        (1, Some(e)) if total == 1 => Err(e),
        (failed, Some(_)) => Err(ImageError::BatchFailed { failed, total }),
    }
}

/// Save every image in a response; returns saved paths with the remote URL.
fn save_results(
    response: &ImageResponse,
    source: &Path,
    args: &GenerateArgs,
) -> Result<Vec<(PathBuf, Option<String>)>, ImageError> {
    if response.images.is_empty() {
        return Err(ImageError::ImageConversion("Provider returned no image".into()));
    }

    let base_path =
        resolve_output_path(args.output_dir.as_deref(), source, &args.style, &args.format);
    let mut saved = Vec::with_capacity(response.images.len());

    for (i, image) in response.images.iter().enumerate() {
        let output_path = if i == 0 {
            base_path.clone()
        } else {
            let stem = base_path.file_stem().unwrap_or_default().to_string_lossy();
            let ext = base_path.extension().unwrap_or_default().to_string_lossy();
            base_path.with_file_name(format!("{stem}-{}.{ext}", i + 1))
        };

        save_image(&image.data, &image.mime_type, &args.format, &output_path)?;
        eprintln!("Saved: {}", output_path.display());
        saved.push((output_path, response.source_url.clone()));
    }

    Ok(saved)
}

async fn analyze(args: AnalyzeArgs, config: &Config) -> Result<(), ImageError> {
    let image = load_input(&args.input)?;
    let analyzer = context::gemini_generator(config, args.keys.api_key.as_deref());
    let text = analyzer.analyze(&image, &args.instruction).await?;
    println!("{}", text.trim());
    Ok(())
}

async fn validate_keys(keys: &KeyArgs, config: &Config) -> Result<(), ImageError> {
    let generator = context::gemini_generator(config, keys.api_key.as_deref());
    eprintln!("Checking {} key(s)...", generator.credentials().len());
    let (key, models) = generator.validate().await?;
    println!("Key {key} works ({models} models visible)");
    Ok(())
}

fn gallery_command(command: &GalleryCommand, config: &Config) -> Result<(), ImageError> {
    let mut gallery = Gallery::load(&config.gallery_path())?;

    match command {
        GalleryCommand::List => {
            if gallery.list().is_empty() {
                eprintln!("Gallery is empty");
            }
            for entry in gallery.list() {
                let id = entry.id.to_string();
                println!(
                    "{}  {}  {}/{}  {}",
                    &id[..8],
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.provider,
                    entry.model,
                    entry.output.display()
                );
            }
        }
        GalleryCommand::Remove { id } => {
            let removed = gallery.remove(id)?;
            gallery.save()?;
            eprintln!("Removed: {}", removed.output.display());
        }
        GalleryCommand::Clear => {
            let count = gallery.clear();
            gallery.save()?;
            eprintln!("Removed {count} entries");
        }
    }

    Ok(())
}
