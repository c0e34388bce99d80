//! Hand-offs to the operating system: clipboard, browser, audio player.

use anyhow::Result;
use locus_core::VoiceClip;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const CLIPBOARD_COMMANDS: &[&[&str]] = &[
    &["pbcopy"],
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["xsel", "--clipboard", "--input"],
    &["clip.exe"],
];

const AUDIO_PLAYERS: &[&[&str]] = &[
    &["afplay"],
    &["paplay"],
    &["aplay", "-q"],
    &["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"],
];

/// Try each known clipboard tool in turn. `true` once one accepts the text.
pub async fn copy_to_clipboard(text: &str) -> bool {
    for cmd in CLIPBOARD_COMMANDS {
        let Some((program, args)) = cmd.split_first() else {
            continue;
        };
        let Ok(mut child) = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        let written = match child.stdin.take() {
            // Dropping stdin closes the pipe so the tool sees EOF
            Some(mut stdin) => stdin.write_all(text.as_bytes()).await.is_ok(),
            None => false,
        };
        let status = child.wait().await;
        match status {
            Ok(status) if written && status.success() => {
                debug!(target: "system::clipboard", program, "Copied to clipboard");
                return true;
            }
            _ => continue,
        }
    }
    warn!(target: "system::clipboard", "No clipboard tool available");
    false
}

pub fn open_url(url: &str) -> Result<()> {
    open::that(url)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Played,
    /// No player could be found; the clip was left on disk.
    Saved(PathBuf),
    Failed(String),
}

pub async fn write_wav(clip: &VoiceClip, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, clip.to_wav()).await?;
    Ok(())
}

/// Write the clip to `path` and play it with the first available player,
/// returning once playback has ended.
pub async fn play_clip(clip: &VoiceClip, path: &Path) -> PlaybackOutcome {
    if let Err(e) = write_wav(clip, path).await {
        return PlaybackOutcome::Failed(e.to_string());
    }

    for cmd in AUDIO_PLAYERS {
        let Some((program, args)) = cmd.split_first() else {
            continue;
        };
        let status = tokio::process::Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => return PlaybackOutcome::Played,
            Ok(status) => {
                warn!(target: "system::audio", program, %status, "Audio player exited with failure");
            }
            Err(_) => continue,
        }
    }

    PlaybackOutcome::Saved(path.to_path_buf())
}

/// Where generated guidance audio is written.
pub fn guidance_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("locus")
        .join("guidance.wav")
}
