//! Command line interface of the `oaaclient` binary.
//!
//! Parsing and command execution live here so they can be exercised
//! against a mock transport; the binary only wires up logging, the runtime
//! and the connection.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::client::{ClientConfig, ClientError, HttpTransport, OaaClient, PushOptions};
use crate::templates::CustomTemplate;
use crate::utils::{build_report, load_json_from_file};

/// `oaaclient` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "oaaclient",
    about = "Push OAA payloads and manage assessment reports",
    version
)]
pub struct Cli {
    /// Platform URL. Falls back to `VEZA_URL`; the API key is always read
    /// from `VEZA_API_KEY`.
    #[arg(long, global = true, value_name = "url")]
    pub host: Option<String>,
    /// JSON file with `host` and `token`; both win over `--host` and the
    /// environment.
    #[arg(long, global = true, value_name = "path")]
    pub auth_file: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Push a metadata file, creating the provider when missing. The data
    /// source is named after the metadata file.
    Push {
        /// Provider definition with `name` and `custom_template`.
        #[arg(long, value_name = "path")]
        provider: PathBuf,
        /// Directory to save a copy of the payload to before the push.
        #[arg(long, value_name = "dir")]
        save_json: Option<PathBuf>,
        /// OAA payload to push.
        metadata: PathBuf,
    },
    /// Create a report, or add missing queries to it, from a definition
    /// file with `name` and `queries`.
    Report {
        /// Report definition.
        file: PathBuf,
    },
}

impl Cli {
    /// Client configuration from `--auth-file`, `--host` and the
    /// environment, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] when the auth file is
    /// missing or lacks `host` or `token`, and the errors of
    /// [`ClientConfig::from_env`].
    pub fn client_config(&self) -> Result<ClientConfig, ClientError> {
        let Some(path) = &self.auth_file else {
            return ClientConfig::from_env(self.host.as_deref(), None);
        };
        if !path.is_file() {
            return Err(ClientError::invalid_argument(format!(
                "Unable to locate auth file {}",
                path.display()
            )));
        }
        let auth = load_json_from_file(path)?;
        let field = |key: &str| {
            auth.get(key).and_then(Value::as_str).ok_or_else(|| {
                ClientError::invalid_argument(format!("Missing value in auth file: {key}"))
            })
        };
        ClientConfig::from_env(Some(field("host")?), Some(field("token")?))
    }
}

/// Provider file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDefinition {
    /// Provider name.
    pub name: String,
    /// Template the provider is created with.
    pub custom_template: CustomTemplate,
}

impl ProviderDefinition {
    /// Reads the definition from parsed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidArgument`] when a field is missing or
    /// the template is unknown.
    pub fn from_json(definition: &Value) -> Result<Self, ClientError> {
        let field = |key: &str| {
            definition
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ClientError::invalid_argument(format!("Missing value in provider file: {key}"))
                })
        };
        let name = field("name")?.to_owned();
        let custom_template = CustomTemplate::from_str(field("custom_template")?)?;
        Ok(Self {
            name,
            custom_template,
        })
    }
}

/// Data source name for a metadata file: its name without extension.
///
/// # Errors
///
/// Returns [`ClientError::InvalidArgument`] when the path has no usable
/// file name.
pub fn data_source_name(metadata: &Path) -> Result<String, ClientError> {
    metadata
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            ClientError::invalid_argument(format!(
                "Unable to derive data source name from {}",
                metadata.display()
            ))
        })
}

/// Runs `command`, writing progress to `out`.
///
/// # Errors
///
/// Returns the first [`ClientError`] raised while loading files or calling
/// the platform.
pub async fn run<T, W>(client: &OaaClient<T>, command: &Command, out: &mut W) -> Result<(), ClientError>
where
    T: HttpTransport,
    W: Write,
{
    match command {
        Command::Push {
            provider,
            save_json,
            metadata,
        } => push(client, provider, metadata, save_json.as_deref(), out).await,
        Command::Report { file } => {
            let definition = load_json_from_file(file)?;
            let report = build_report(client, &definition).await?;
            writeln!(
                out,
                "-- Report: {} ({})",
                text(&report, "name"),
                text(&report, "id")
            )?;
            Ok(())
        }
    }
}

async fn push<T, W>(
    client: &OaaClient<T>,
    provider_file: &Path,
    metadata_file: &Path,
    save_json: Option<&Path>,
    out: &mut W,
) -> Result<(), ClientError>
where
    T: HttpTransport,
    W: Write,
{
    let definition = ProviderDefinition::from_json(&load_json_from_file(provider_file)?)?;
    let provider = if let Some(existing) = client.get_provider(&definition.name).await? {
        writeln!(out, "-- Found existing provider")?;
        existing
    } else {
        writeln!(
            out,
            "++ Creating Provider {} of type {}",
            definition.name, definition.custom_template
        )?;
        client
            .create_provider(&definition.name, definition.custom_template, None)
            .await?
    };
    writeln!(
        out,
        "-- Provider: {} ({})",
        text(&provider, "name"),
        text(&provider, "id")
    )?;

    let data_source = data_source_name(metadata_file)?;
    writeln!(out, "-- Pushing metadata")?;
    let metadata = load_json_from_file(metadata_file)?;
    let options = PushOptions {
        save_json: save_json.map(Path::to_path_buf),
        ..PushOptions::default()
    };
    let response = client
        .push_metadata(&definition.name, &data_source, &metadata, &options)
        .await?;

    let warnings = response
        .get("warnings")
        .and_then(Value::as_array)
        .filter(|warnings| !warnings.is_empty());
    if let Some(warnings) = warnings {
        writeln!(out, "-- Push succeeded with warnings:")?;
        for warning in warnings {
            writeln!(out, "  - {warning}")?;
        }
    }
    Ok(())
}

/// Writes `error` with its code, status and any platform details.
///
/// # Errors
///
/// Returns the write error.
pub fn write_error<W: Write>(error: &ClientError, out: &mut W) -> std::io::Result<()> {
    let status = error
        .status_code()
        .map_or_else(|| "None".to_owned(), |status| status.to_string());
    writeln!(
        out,
        "-- Error: {}: {} ({status})",
        error.error_code(),
        error.message()
    )?;
    for detail in error.details() {
        let rendered = serde_json::to_string_pretty(detail).unwrap_or_else(|_| detail.to_string());
        writeln!(out, "  -- {rendered}")?;
    }
    Ok(())
}

fn text<'a>(object: &'a Value, key: &str) -> &'a str {
    object.get(key).and_then(Value::as_str).unwrap_or_default()
}
