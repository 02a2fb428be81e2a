use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or parse one label source. Fails the whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse GeoJSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },

    #[error("{path} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
}

/// Tuning values that cannot drive a decluttering pass.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite number greater than zero (got {value})")]
    NotPositive { name: &'static str, value: f64 },

    #[error("viewport padding must be finite and non-negative (got {0})")]
    BadPadding(f64),

    #[error("city soft height {soft} m is above the city enable height {enable} m")]
    SoftAboveEnable { soft: f64, enable: f64 },
}
