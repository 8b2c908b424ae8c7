//! Alarm sound files: uploads are copied into the sounds directory under
//! their own name, recordings are named after the time they were made.

use std::path::{Path, PathBuf};

use log::info;

/// extensions offered by the file dialog
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "ogg", "flac", "m4a"];

/// extension used for recordings
pub const RECORDING_EXTENSION: &str = "wav";

/// `recording-<ms>.wav`, or `<label>-<ms>.wav` for a non-blank label.
/// Separators and `..` in the label are replaced so the name always stays a
/// single file in the sounds directory.
#[must_use]
pub fn recording_file_name(label: Option<&str>, epoch_ms: i64) -> String {
    let prefix = label
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map_or_else(|| "recording".to_string(), safe_label);
    format!("{prefix}-{epoch_ms}.{RECORDING_EXTENSION}")
}

fn safe_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if std::path::is_separator(c) || c == ':' {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .replace("..", "_")
}

/// Copies `src` into `dir` under its file name, replacing a file of the same
/// name, and returns the new path.
///
/// # Errors
/// if `src` has no file name, or the directory or copy fails
pub fn import_upload(src: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let name = src.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a file", src.display()),
        )
    })?;
    std::fs::create_dir_all(dir)?;
    let destination = dir.join(name);
    // copying a file onto itself truncates it
    if destination.exists()
        && std::fs::canonicalize(src)? == std::fs::canonicalize(&destination)?
    {
        info!("{} is already in {}", src.display(), dir.display());
        return Ok(destination);
    }
    std::fs::copy(src, &destination)?;
    info!("copied {} to {}", src.display(), destination.display());
    Ok(destination)
}

/// Asks the user for an audio file. `None` if they cancel.
#[must_use]
pub fn pick_audio_file() -> Option<PathBuf> {
    // TODO: rfd with gnome opens Recents not audio folder https://github.com/PolyMeilex/rfd/issues/237
    let file_dialog = rfd::FileDialog::new()
        .set_title("Pick alarm sound")
        .add_filter("audio", &AUDIO_EXTENSIONS);
    let file_dialog = match directories::UserDirs::new()
        .and_then(|u| u.audio_dir().map(Path::to_path_buf))
    {
        Some(audio_path) => file_dialog.set_directory(audio_path),
        None => file_dialog,
    };
    file_dialog.pick_file()
}
