/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// Configuration covers the show's external collaborators only — the
/// greeting text, the emoji row, the photo deck labels, the music file —
/// plus the frame tick rate. Show timing (burst thresholds, fade marks,
/// ramp steps) is behavior, not configuration.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct ShowConfig {
    pub greeting: String,
    pub emojis: Vec<String>,
    /// The photo deck: a fixed, ordered set of placard labels.
    pub photos: Vec<String>,
    pub music_path: PathBuf,
    /// Simulated track length when no audio device/file is available.
    pub silent_track_secs: u64,
    pub frame_ms: u64,
}

impl Default for ShowConfig {
    fn default() -> Self {
        ShowConfig {
            greeting: default_greeting(),
            emojis: default_emojis(),
            photos: default_photos(),
            music_path: PathBuf::from(default_music()),
            silent_track_secs: default_silent_track_secs(),
            frame_ms: default_frame_ms(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    show: TomlShow,
    #[serde(default)]
    timing: TomlTiming,
}

#[derive(Deserialize, Debug)]
struct TomlShow {
    #[serde(default = "default_greeting")]
    greeting: String,
    #[serde(default = "default_emojis")]
    emojis: Vec<String>,
    #[serde(default = "default_photos")]
    photos: Vec<String>,
    #[serde(default = "default_music")]
    music: String,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_silent_track_secs")]
    silent_track_secs: u64,
}

// ── Defaults ──

fn default_greeting() -> String { "HAPPY BIRTHDAY!".into() }

fn default_emojis() -> Vec<String> {
    vec!["🎉".into(), "🎂".into(), "🎈".into()]
}

fn default_photos() -> Vec<String> {
    vec![
        "photo-1".into(),
        "photo-2".into(),
        "photo-3".into(),
        "photo-4".into(),
        "photo-5".into(),
    ]
}

fn default_music() -> String { "music.ogg".into() }
fn default_frame_ms() -> u64 { 16 }
fn default_silent_track_secs() -> u64 { 90 }

impl Default for TomlShow {
    fn default() -> Self {
        TomlShow {
            greeting: default_greeting(),
            emojis: default_emojis(),
            photos: default_photos(),
            music: default_music(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            silent_track_secs: default_silent_track_secs(),
        }
    }
}

// ── Loading ──

impl ShowConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve the music file against the same candidate dirs.
        let music = &toml_cfg.show.music;
        let music_path = if PathBuf::from(music).is_absolute() {
            PathBuf::from(music)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(music))
                .find(|p| p.is_file())
                .unwrap_or_else(|| PathBuf::from(music))
        };

        let photos = if toml_cfg.show.photos.is_empty() {
            eprintln!("Warning: empty [show] photos list, using defaults.");
            default_photos()
        } else {
            toml_cfg.show.photos
        };

        ShowConfig {
            greeting: toml_cfg.show.greeting,
            emojis: toml_cfg.show.emojis,
            photos,
            music_path,
            silent_track_secs: toml_cfg.timing.silent_track_secs,
            frame_ms: toml_cfg.timing.frame_ms.max(1),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_a_five_photo_deck() {
        let cfg = ShowConfig::default();
        assert_eq!(cfg.photos.len(), 5);
        assert!(!cfg.greeting.is_empty());
        assert!(!cfg.emojis.is_empty());
    }

    #[test]
    fn partial_toml_falls_back_per_field() {
        let cfg: TomlConfig = toml::from_str(
            r#"
            [show]
            greeting = "CONGRATS!"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.show.greeting, "CONGRATS!");
        assert_eq!(cfg.show.photos.len(), 5);
        assert_eq!(cfg.timing.frame_ms, 16);
    }
}
