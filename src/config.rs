use crate::error::{DemoError, Result};
use crate::frame::{Position, Rgba};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the demo used to hard-code. Every key is optional in the TOML
/// file; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub title: String,
    /// Window size, also the size of the screen space sprites live in.
    pub width: u32,
    pub height: u32,
    pub texture_path: PathBuf,
    /// Side of the square the texture is drawn into.
    pub sprite_size: u32,
    /// Distance moved per key press per frame.
    pub step: i32,
    pub frame_delay_ms: u64,
    pub start: Position,
    /// Linear RGBA in 0..=1.
    pub clear_color: [f64; 4],
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Moving Texture".to_string(),
            width: 640,
            height: 480,
            texture_path: PathBuf::from("assets/tex.bmp"),
            sprite_size: 64,
            step: 5,
            frame_delay_ms: 50,
            start: Position::new(100, 100),
            clear_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl DemoConfig {
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|source| DemoError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| DemoError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source, path)
    }

    /// Builds the effective configuration: the config file if one was named,
    /// then the positional texture path on top.
    pub fn resolve(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(texture) = &args.texture {
            config.texture_path = texture.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DemoError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.sprite_size == 0 {
            return Err(DemoError::InvalidConfig(
                "sprite_size must be non-zero".to_string(),
            ));
        }
        if self.step < 0 {
            return Err(DemoError::InvalidConfig(format!(
                "step must not be negative, got {}",
                self.step
            )));
        }
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(DemoError::InvalidConfig(format!(
                "clear_color components must be within 0..=1, got {:?}",
                self.clear_color
            )));
        }
        Ok(())
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn clear_color(&self) -> Rgba {
        Rgba::from(self.clear_color)
    }
}

pub const USAGE: &str = "\
usage: movingtexture [--config FILE] [TEXTURE]

Move the texture around with W/A/S/D, close the window or press Ctrl-C to quit.

  -c, --config FILE   read settings from a TOML file
  -h, --help          print this message
  TEXTURE             image to draw (default: assets/tex.bmp)";

/// Command line as understood by the binary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub help: bool,
}

impl CliArgs {
    /// Parses arguments, not including the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "-c" | "--config" => {
                    let path = args
                        .next()
                        .ok_or_else(|| DemoError::Usage(format!("{arg} needs a file")))?;
                    parsed.config = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => {
                    return Err(DemoError::Usage(format!("unknown option {flag}")));
                }
                _ if parsed.texture.is_some() => {
                    return Err(DemoError::Usage(format!("unexpected argument {arg}")));
                }
                _ => parsed.texture = Some(PathBuf::from(&arg)),
            }
        }
        Ok(parsed)
    }
}
