//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (DRIVE_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "$DRIVE_SW_ROOT/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_drive_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    // Load the file into a string
    let params_str = read_to_string(path).map_err(LoadError::FileLoadError)?;

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

/// Load a parameter file, falling back to the default parameters if the file
/// cannot be loaded.
///
/// A malformed file is still an error, only a missing root or file is
/// substituted.
pub fn load_or_default<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned + Default
{
    match load(param_file_path) {
        Ok(p) => Ok(p),
        Err(e @ LoadError::DeserialiseError(_)) => Err(e),
        Err(e) => {
            warn!("Using default parameters for {}: {}", param_file_path, e);
            Ok(P::default())
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct TestParams {
        gain: f64,
        limit: Option<f64>,
    }

    #[test]
    fn test_from_str() {
        let p: TestParams = from_str("gain = 0.5\nlimit = 2.0\n").unwrap();
        assert_eq!(p, TestParams { gain: 0.5, limit: Some(2.0) });

        let p: TestParams = from_str("gain = 1.0\n").unwrap();
        assert_eq!(p.limit, None);

        assert!(matches!(
            from_str::<TestParams>("gain = \"fast\""),
            Err(LoadError::DeserialiseError(_))
        ));
    }
}
