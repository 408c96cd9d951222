//! Helpers for connectors built on the SDK.

use std::io;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cap_std::{ambient_authority, fs::Dir};
use serde_json::Value;
use tracing::error;

use crate::client::ClientError;

mod report;

pub use report::build_report;
pub use crate::validation::{DEFAULT_TRUNCATE_LENGTH, truncate_string};

fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path must name a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read(Path::new(file_name))
}

fn read_error(path: &Path, source: &io::Error) -> ClientError {
    ClientError::from(io::Error::new(
        source.kind(),
        format!("Error reading file {}: {source}", path.display()),
    ))
}

/// Loads and parses a JSON file.
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the file cannot be read and
/// [`ClientError::InvalidArgument`] when it is not valid JSON.
pub fn load_json_from_file(path: &Path) -> Result<Value, ClientError> {
    let contents = read_file(path).map_err(|source| read_error(path, &source))?;
    serde_json::from_slice(&contents).map_err(|source| {
        ClientError::invalid_argument(format!(
            "Unable to process JSON from {}: {source}",
            path.display()
        ))
    })
}

/// Reads an icon file and returns its base64 encoding, ready for
/// [`OaaClient::update_provider_icon`](crate::client::OaaClient::update_provider_icon).
///
/// # Errors
///
/// Returns [`ClientError::Io`] when the file cannot be read.
pub fn encode_icon_file(path: &Path) -> Result<String, ClientError> {
    let contents = read_file(path).map_err(|source| read_error(path, &source))?;
    Ok(STANDARD.encode(contents))
}

/// Logs a consistent message for a required parameter that was neither
/// passed as `arg` nor set in the `env` variable.
///
/// # Errors
///
/// Returns [`ClientError::InvalidArgument`] when neither name is given.
///
/// # Examples
///
/// ```
/// use oaaclient::utils::log_arg_error;
///
/// log_arg_error(Some("--veza-url"), Some("VEZA_URL"))?;
/// assert!(log_arg_error(None, None).is_err());
/// # Ok::<(), oaaclient::client::ClientError>(())
/// ```
pub fn log_arg_error(arg: Option<&str>, env: Option<&str>) -> Result<(), ClientError> {
    match (arg, env) {
        (Some(option), Some(variable)) => {
            error!(
                "Unable to load required parameter, must supply {option} or set OS environment variable {variable}"
            );
        }
        (Some(option), None) => {
            error!("Unable to load required parameter, must supply {option}");
        }
        (None, Some(variable)) => {
            error!("Unable to load required parameter, must set OS environment variable {variable}");
        }
        (None, None) => {
            return Err(ClientError::invalid_argument(
                "Must provide arg or env to include in error message",
            ));
        }
    }
    Ok(())
}
