//! # Pylon Demo
//!
//! A small service on the Pylon pipeline: an artist catalog and account
//! registration, both on in-memory storage.
//!
//! | Route | Request | Answer |
//! |-------|---------|--------|
//! | `POST /artists` | `{"name"}` | `{"id"}` |
//! | `GET /artists/{id}` | path `id` | `{"id","name"}` |
//! | `DELETE /artists/{id}` | path `id` | empty 200 |
//! | `POST /auth/register` | account fields | `{"token"}` |
//! | `POST /auth/login` | `{"email","password"}` | `{"token"}` |

#![doc(html_root_url = "https://docs.rs/pylon-demo/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod artists;
pub mod auth;
pub mod password;
pub mod store;
pub mod token;

pub use app::{
    build_server, load_config, pipeline_config, server_config, telemetry_config, DemoState,
    DEFAULT_CONFIG_FILE, ENV_PREFIX,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
