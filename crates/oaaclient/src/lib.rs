//! Client SDK for the Open Authorization API (OAA).
//!
//! The crate builds authorization payloads for custom applications,
//! identity providers and HRIS systems, validates them locally, and pushes
//! them to the platform over its REST API.
//!
//! # Overview
//!
//! - [`templates`]: typed payload models rendered to JSON
//! - [`client`]: async API client with retries, pagination and gzip pushes
//! - [`utils`]: file helpers and report building
//! - [`cli`]: the `oaaclient` command line tool
//!
//! # Example
//!
//! ```
//! use oaaclient::templates::{CustomApplication, OaaPermission, OaaTemplate};
//!
//! let mut app = CustomApplication::new("Wiki", "wiki", Some("Team wiki"));
//! app.add_custom_permission("edit", &[OaaPermission::DataWrite], false, &[])?;
//! app.add_local_user("bob", &["bob@example.com"], &[], None)?;
//! app.add_access("bob", oaaclient::templates::OaaIdentityType::LocalUser, "edit", None)?;
//!
//! let payload = app.payload()?;
//! assert_eq!(payload["applications"][0]["name"], "Wiki");
//! # Ok::<(), oaaclient::error::TemplateError>(())
//! ```
//!
//! Pushing requires a running platform:
//!
//! ```rust,ignore
//! use oaaclient::client::{ClientConfig, OaaClient, PushOptions};
//!
//! let client = OaaClient::connect(ClientConfig::from_env(None, None)?).await?;
//! let options = PushOptions { create_provider: true, ..PushOptions::default() };
//! let response = client.push_application("Wiki", "wiki-prod", &app, &options).await?;
//! ```

pub mod cli;
pub mod client;
pub mod error;
pub mod keyed;
pub mod templates;
pub mod utils;
pub mod validation;
