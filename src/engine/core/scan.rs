use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Audio and video extensions accepted as batch inputs
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "aac", "ac3", "flac", "m4a", "mp3", "ogg", "opus", "wav", "wma", "3gp", "asf", "avi", "flv",
    "h264", "hevc", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "webm", "wmv",
];

/// Check if a path has a supported media extension
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Scan a directory recursively for media files and invoke a callback for each file found
pub fn scan_streaming<F>(root: &Path, mut on_file: F) -> Result<()>
where
    F: FnMut(PathBuf),
{
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_media_file(path) {
            on_file(path.to_path_buf());
        }
    }

    Ok(())
}

/// Scan a directory recursively for media files
pub fn scan(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    scan_streaming(root, |path| files.push(path))?;
    Ok(files)
}

/// Expand command-line inputs: directories are scanned, files are kept as
/// given (even with an unknown extension) so a missing one is reported later.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            scan_streaming(input, |path| files.push(path))?;
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// Output path for `input`: `<dir>/<stem><out_stem><suffix>`.
///
/// `dir` defaults to the input's directory and `suffix` (with its leading
/// dot) to the input's own extension.
pub fn derive_output_path(
    input: &Path,
    output_dir: Option<&Path>,
    out_stem: &str,
    out_suffix: Option<&str>,
) -> PathBuf {
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = match out_suffix {
        Some(s) if s.is_empty() || s.starts_with('.') => s.to_string(),
        Some(s) => format!(".{s}"),
        None => input
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default(),
    };
    dir.join(format!("{stem}{out_stem}{suffix}"))
}

/// Intermediate file for step `step` of a multi-step job, beside `output`
pub fn step_output_path(output: &Path, step: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_step{step}.{}", ext.to_string_lossy()),
        None => format!("{stem}_step{step}"),
    };
    output.with_file_name(name)
}
