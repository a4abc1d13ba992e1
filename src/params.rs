//! Style and composition options, prompt assembly, and parameter validation.

use crate::model::Provider;

/// Style presets and the prompt fragment each one adds.
const STYLES: &[(&str, &str)] = &[
    ("none", ""),
    ("anime", "Redraw the subject as a clean, vibrant anime illustration with cel shading."),
    ("watercolor", "Repaint the photo as a soft watercolor painting on textured paper."),
    ("oil-painting", "Render the photo as a classical oil painting with visible brush strokes."),
    ("pixar-3d", "Turn the subject into a stylized 3D animated character with soft lighting."),
    ("sketch", "Convert the photo into a detailed pencil sketch with cross-hatching."),
    ("cinematic", "Give the photo a cinematic film look with dramatic lighting and color grading."),
    ("pop-art", "Restyle the image as bold pop art with halftone dots and flat colors."),
    ("cyberpunk", "Place the subject in a neon-lit cyberpunk setting at night."),
];

/// Framings and the prompt fragment each one adds.
const FRAMINGS: &[(&str, &str)] = &[
    ("auto", ""),
    ("close-up", "Frame the shot as a close-up portrait of the face."),
    ("half-body", "Frame the subject from the waist up."),
    ("full-body", "Show the subject's full body in frame."),
];

const GEMINI_RATIOS: &[&str] =
    &["1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9"];
const GOMMO_RATIOS: &[&str] = &["1:1", "16:9", "9:16", "4:3", "3:4"];

fn lookup<'a>(table: &'a [(&str, &str)], name: &str) -> Option<&'a str> {
    table.iter().find(|(n, _)| *n == name).map(|(_, fragment)| *fragment)
}

fn names(table: &[(&str, &str)]) -> String {
    table.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ")
}

/// Validate a style preset name.
///
/// # Errors
///
/// Returns an error if the style is not recognized.
pub fn validate_style(style: &str) -> Result<(), String> {
    lookup(STYLES, style)
        .map(|_| ())
        .ok_or_else(|| format!("Unsupported style '{style}'. Valid: {}", names(STYLES)))
}

/// Validate a framing name.
///
/// # Errors
///
/// Returns an error if the framing is not recognized.
pub fn validate_framing(framing: &str) -> Result<(), String> {
    lookup(FRAMINGS, framing)
        .map(|_| ())
        .ok_or_else(|| format!("Unsupported framing '{framing}'. Valid: {}", names(FRAMINGS)))
}

/// Validate that an aspect ratio is supported by the given provider.
///
/// # Errors
///
/// Returns an error if the ratio is not recognized.
pub fn validate_aspect_ratio(ratio: &str, provider: Provider) -> Result<(), String> {
    let valid = match provider {
        Provider::Gemini => GEMINI_RATIOS,
        Provider::Gommo => GOMMO_RATIOS,
    };

    if valid.contains(&ratio) {
        Ok(())
    } else {
        Err(format!("Unsupported aspect ratio '{ratio}' for {provider:?}. Valid: {valid:?}"))
    }
}

/// Validate the output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    match format {
        "jpeg" | "png" | "webp" => Ok(()),
        _ => Err(format!("Unsupported format '{format}'. Valid: jpeg, png, webp")),
    }
}

/// Compose the final prompt from style, framing, and free text.
///
/// Unknown style or framing names contribute nothing; validate first.
#[must_use]
pub fn build_prompt(style: &str, framing: &str, extra: Option<&str>) -> String {
    let parts = [
        lookup(STYLES, style).unwrap_or_default(),
        lookup(FRAMINGS, framing).unwrap_or_default(),
        extra.map_or("", str::trim),
    ];
    let prompt = parts.iter().filter(|p| !p.is_empty()).copied().collect::<Vec<_>>().join(" ");

    if prompt.is_empty() {
        "Enhance this photo while keeping the subject recognizable.".to_string()
    } else {
        prompt
    }
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "webp" => "webp",
        // jpeg and any unknown format default to jpg
        _ => "jpg",
    }
}
