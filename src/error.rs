use std::io;

/// All error types for timezone resolution.
#[derive(thiserror::Error, Debug)]
pub enum TzError {
    #[error("Input error: {0}")]
    Input(String),
    #[error("Artifact error: {0}")]
    Artifact(String),
    #[error("Index error: {0}")]
    Index(String),
    #[error("Ring error: {0}")]
    Ring(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Time(#[from] jiff::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_strings() {
        let e = TzError::Input("latitude 91 out of range".into());
        assert_eq!(e.to_string(), "Input error: latitude 91 out of range");

        let e = TzError::Artifact("bvh.json missing".into());
        assert_eq!(e.to_string(), "Artifact error: bvh.json missing");

        let e = TzError::Index("child 9 out of range".into());
        assert_eq!(e.to_string(), "Index error: child 9 out of range");

        let e = TzError::Ring("truncated".into());
        assert_eq!(e.to_string(), "Ring error: truncated");

        let e = TzError::Config("bad path".into());
        assert_eq!(e.to_string(), "Config error: bad path");
    }

    #[test]
    fn from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let e: TzError = io_err.into();
        assert!(matches!(e, TzError::Io(_)));
        assert!(e.to_string().contains("file missing"));
    }

    #[test]
    fn from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let e: TzError = json_err.into();
        assert!(matches!(e, TzError::Json(_)));
    }
}
