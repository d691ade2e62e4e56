use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop the demo before the frame loop starts.
/// Once the loop is running nothing here can happen anymore.
#[derive(Error, Debug)]
pub enum DemoError {
    #[error("could not read config file {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("bad command line: {0}")]
    Usage(String),

    #[error("error while creating a window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("error while creating a drawing surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find an appropriate adapter")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("could not load image file {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("could not create a texture from {path:?}: image is {width}x{height}")]
    EmptyTexture {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("could not create a texture from {path:?}: {width}x{height} exceeds the device limit of {limit}")]
    TextureTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        limit: u32,
    },
}

/// Coarse classification used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Config file, config values or arguments.
    Config,
    /// Windowing or rendering subsystem could not come up.
    Init,
    /// The bitmap could not be decoded or turned into a texture.
    Load,
}

impl DemoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigIo { .. }
            | Self::ConfigParse { .. }
            | Self::InvalidConfig(_)
            | Self::Usage(_) => ErrorKind::Config,
            Self::Window(_)
            | Self::Surface(_)
            | Self::NoAdapter
            | Self::Device(_)
            | Self::NoSurfaceFormat => ErrorKind::Init,
            Self::Decode { .. } | Self::EmptyTexture { .. } | Self::TextureTooLarge { .. } => {
                ErrorKind::Load
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DemoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_startup_phase() {
        assert_eq!(DemoError::NoAdapter.kind(), ErrorKind::Init);
        assert_eq!(DemoError::NoSurfaceFormat.kind(), ErrorKind::Init);
        assert_eq!(
            DemoError::InvalidConfig("step".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(DemoError::Usage("--bogus".into()).kind(), ErrorKind::Config);

        let empty = DemoError::EmptyTexture {
            path: PathBuf::from("assets/tex.bmp"),
            width: 0,
            height: 16,
        };
        assert_eq!(empty.kind(), ErrorKind::Load);
        assert!(empty.to_string().contains("0x16"));
    }

    #[test]
    fn decode_errors_are_load_failures() {
        let source = image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = DemoError::Decode {
            path: PathBuf::from("nope.bmp"),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.to_string().contains("nope.bmp"));
    }
}
