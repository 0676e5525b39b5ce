//! Composition and encoding configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! produces a usable configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::mode::{AvatarSide, Position};

/// Default output resolution (portrait 9:16)
pub const DEFAULT_RESOLUTION: (u32, u32) = (1080, 1920);
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Default loudness target (LUFS)
pub const DEFAULT_TARGET_LOUDNESS: i32 = -14;
/// Sample rate every audio segment is resampled to
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
/// Loudness normalization true-peak ceiling (dBTP)
pub const LOUDNORM_TRUE_PEAK: f64 = -1.5;
/// Loudness normalization range (LU)
pub const LOUDNORM_RANGE: f64 = 11.0;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Overlay mode: screencast in a corner over the avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct OverlayConfig {
    /// Screencast width as a fraction of output width
    #[validate(range(min = 0.05, max = 1.0))]
    pub scale: f64,
    pub position: Position,
    pub margin: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            scale: 0.4,
            position: Position::BottomRight,
            margin: 50,
        }
    }
}

/// PiP mode: fullscreen screencast with a head cutout in a corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct PipConfig {
    /// Head cutout width as a fraction of output width (used by the cutout producer)
    #[validate(range(min = 0.05, max = 1.0))]
    pub head_scale: f64,
    pub head_position: Position,
    pub head_margin: u32,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            head_scale: 0.25,
            head_position: Position::TopRight,
            head_margin: 30,
        }
    }
}

/// Split mode: avatar and screencast side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of output width kept for the avatar
    #[validate(range(min = 0.1, max = 0.9))]
    pub split_ratio: f64,
    pub avatar_side: AvatarSide,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            split_ratio: 0.5,
            avatar_side: AvatarSide::Left,
        }
    }
}

/// Green screen mode: screencast background, transparent avatar on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct GreenscreenConfig {
    /// Transparent avatar width as a fraction of output width
    #[validate(range(min = 0.05, max = 1.0))]
    pub avatar_scale: f64,
    pub avatar_position: Position,
    pub avatar_margin: u32,
}

impl Default for GreenscreenConfig {
    fn default() -> Self {
        Self {
            avatar_scale: 0.8,
            avatar_position: Position::BottomRight,
            avatar_margin: 30,
        }
    }
}

/// Per-mode geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct CompositionConfig {
    #[validate(nested)]
    pub overlay: OverlayConfig,
    #[validate(nested)]
    pub pip: PipConfig,
    #[validate(nested)]
    pub split: SplitConfig,
    #[validate(nested)]
    pub greenscreen: GreenscreenConfig,
}

/// Output video encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct OutputConfig {
    #[validate(range(min = 1, max = 240))]
    pub fps: u32,
    #[validate(custom(function = "validate_resolution"))]
    pub resolution: (u32, u32),
    pub codec: String,
    pub preset: String,
    #[validate(range(max = 51))]
    pub crf: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            resolution: DEFAULT_RESOLUTION,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
        }
    }
}

impl OutputConfig {
    pub fn width(&self) -> u32 {
        self.resolution.0
    }

    pub fn height(&self) -> u32 {
        self.resolution.1
    }

    /// Convert to FFmpeg output arguments for the video stream.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            self.fps.to_string(),
        ]
    }
}

fn validate_resolution(resolution: &(u32, u32)) -> Result<(), ValidationError> {
    if resolution.0 == 0 || resolution.1 == 0 {
        return Err(ValidationError::new("resolution_zero"));
    }
    Ok(())
}

/// Audio processing and encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct AudioConfig {
    pub normalize: bool,
    /// Integrated loudness target in LUFS
    #[validate(range(min = -70, max = -5))]
    pub target_loudness: i32,
    pub codec: String,
    pub bitrate: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            target_loudness: DEFAULT_TARGET_LOUDNESS,
            codec: DEFAULT_AUDIO_CODEC.to_string(),
            bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl AudioConfig {
    /// Convert to FFmpeg output arguments for the audio stream.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.codec.clone(),
            "-b:a".to_string(),
            self.bitrate.clone(),
        ]
    }
}

/// Background music mixed under the narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct MusicConfig {
    pub enabled: bool,
    pub file: Option<PathBuf>,
    /// Music weight relative to the narration
    #[validate(range(min = 0.0, max = 1.0))]
    pub volume: f64,
    /// Fade-out length in seconds, ending at the video end
    #[validate(range(min = 0.0))]
    pub fade_out_duration: f64,
    /// Loop the track when it is shorter than the video
    #[serde(rename = "loop")]
    pub loop_track: bool,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file: None,
            volume: 0.15,
            fade_out_duration: 2.0,
            loop_track: true,
        }
    }
}

impl MusicConfig {
    /// Music file to mix, if any. An explicit file wins over the configured one.
    pub fn effective_file(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None if self.enabled => self.file.clone(),
            None => None,
        }
    }
}

/// Subtitle styling handed to the subtitle generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct SubtitleConfig {
    pub enabled: bool,
    #[validate(range(min = 8, max = 200))]
    pub font_size: u32,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            font_size: 48,
        }
    }
}

/// Default asset locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PathsConfig {
    pub screencasts: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            screencasts: PathBuf::from("./assets/screencasts"),
            output: PathBuf::from("./assets/output"),
        }
    }
}

/// Full composition configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(default)]
pub struct ComposeConfig {
    #[validate(nested)]
    pub composition: CompositionConfig,
    #[validate(nested)]
    pub output: OutputConfig,
    #[validate(nested)]
    pub audio: AudioConfig,
    #[validate(nested)]
    pub music: MusicConfig,
    #[validate(nested)]
    pub subtitles: SubtitleConfig,
    pub paths: PathsConfig,
}

impl ComposeConfig {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&raw).map_err(|source| ConfigLoadError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = ComposeConfig::default();
        assert_eq!(cfg.output.fps, 30);
        assert_eq!(cfg.output.resolution, (1080, 1920));
        assert_eq!(cfg.output.codec, "libx264");
        assert_eq!(cfg.output.crf, 23);
        assert!(cfg.audio.normalize);
        assert_eq!(cfg.audio.target_loudness, -14);
        assert_eq!(cfg.composition.overlay.scale, 0.4);
        assert_eq!(cfg.composition.overlay.position, Position::BottomRight);
        assert_eq!(cfg.composition.split.avatar_side, AvatarSide::Left);
        assert!(!cfg.music.enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let cfg: ComposeConfig = serde_json::from_str(
            r#"{"output": {"fps": 60, "crf": 18}, "audio": {"normalize": false}}"#,
        )
        .unwrap();
        assert_eq!(cfg.output.fps, 60);
        assert_eq!(cfg.output.crf, 18);
        assert_eq!(cfg.output.resolution, (1080, 1920));
        assert!(!cfg.audio.normalize);
        assert_eq!(cfg.audio.target_loudness, -14);
    }

    #[test]
    fn test_resolution_as_array() {
        let cfg: ComposeConfig =
            serde_json::from_str(r#"{"output": {"resolution": [720, 1280]}}"#).unwrap();
        assert_eq!(cfg.output.resolution, (720, 1280));
    }

    #[test]
    fn test_music_loop_key() {
        let cfg: ComposeConfig =
            serde_json::from_str(r#"{"music": {"enabled": true, "loop": false}}"#).unwrap();
        assert!(cfg.music.enabled);
        assert!(!cfg.music.loop_track);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut cfg = ComposeConfig::default();
        cfg.composition.split.split_ratio = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = ComposeConfig::default();
        cfg.output.resolution = (0, 1920);
        assert!(cfg.validate().is_err());

        let mut cfg = ComposeConfig::default();
        cfg.output.crf = 60;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_effective_music_file() {
        let mut music = MusicConfig::default();
        assert_eq!(music.effective_file(None), None);

        music.file = Some(PathBuf::from("/music/bed.mp3"));
        assert_eq!(music.effective_file(None), None);

        music.enabled = true;
        assert_eq!(music.effective_file(None), Some(PathBuf::from("/music/bed.mp3")));
        assert_eq!(
            music.effective_file(Some(Path::new("/music/other.mp3"))),
            Some(PathBuf::from("/music/other.mp3"))
        );
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ComposeConfig::from_json_file(dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, ComposeConfig::default());
    }

    #[test]
    fn test_load_custom_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"paths": {"screencasts": "/tmp/sc"}}"#).unwrap();
        let cfg = ComposeConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.paths.screencasts, PathBuf::from("/tmp/sc"));
        assert_eq!(cfg.paths.output, PathBuf::from("./assets/output"));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ComposeConfig::from_json_file(&path),
            Err(ConfigLoadError::Json { .. })
        ));
    }

    #[test]
    fn test_output_args() {
        let args = OutputConfig::default().to_ffmpeg_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
        assert!(args.contains(&"30".to_string()));
    }
}
