//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Image generation studio: restyle photos with Gemini or Gommo.
#[derive(Parser, Debug)]
#[command(name = "genstudio", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate styled images from one or more photos.
    Generate(GenerateArgs),
    /// Describe a photo in text (Gemini).
    Analyze(AnalyzeArgs),
    /// Check which Gemini key works.
    ValidateKeys(KeyArgs),
    /// Inspect or edit the local gallery.
    #[command(subcommand)]
    Gallery(GalleryCommand),
}

/// User-supplied API keys.
#[derive(Args, Debug, Default)]
pub struct KeyArgs {
    /// Gemini API keys, separated by commas, semicolons, or newlines.
    #[arg(short = 'k', long = "api-key")]
    pub api_key: Option<String>,
}

/// Arguments for `generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source photo(s).
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Extra prompt text.
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Style preset (e.g., anime, watercolor, sketch).
    #[arg(short, long, default_value = "none")]
    pub style: String,

    /// Framing: auto, close-up, half-body, full-body.
    #[arg(long, default_value = "auto")]
    pub framing: String,

    /// Model name or short alias.
    #[arg(short, long, default_value = "nano-banana")]
    pub model: String,

    /// Aspect ratio (e.g., 1:1, 16:9, 9:16).
    #[arg(short, long, default_value = "1:1")]
    pub aspect_ratio: String,

    /// Output format: jpeg, png, webp.
    #[arg(short, long, default_value = "jpeg")]
    pub format: String,

    /// Directory for results (current directory if not specified).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Do not record results in the gallery.
    #[arg(long)]
    pub no_gallery: bool,

    /// Skip photos that already have a result in the gallery.
    #[arg(long, conflicts_with = "no_gallery")]
    pub skip_existing: bool,

    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Arguments for `analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Photo to describe.
    #[arg(short, long)]
    pub input: PathBuf,

    /// What to ask about the photo.
    #[arg(
        long,
        default_value = "Describe the subject, setting, lighting and mood of this photo in a few sentences."
    )]
    pub instruction: String,

    #[command(flatten)]
    pub keys: KeyArgs,
}

/// Gallery subcommands.
#[derive(Subcommand, Debug)]
pub enum GalleryCommand {
    /// List saved results.
    List,
    /// Remove an entry by id (or unique id prefix).
    Remove {
        /// Entry id or prefix.
        id: String,
    },
    /// Remove every entry.
    Clear,
}
