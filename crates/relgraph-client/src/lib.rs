//! Session wiring for relgraph.
//!
//! Loads a [`ClientConfig`], installs logging, and builds the transport and
//! engine pair for one client session.
//!
//! ```no_run
//! use relgraph_client::{logging, ClientConfig, Session};
//! use relgraph_core::KindRegistry;
//!
//! # async fn demo() -> relgraph_client::ClientResult<()> {
//! let config = ClientConfig::load("relgraph.toml")?;
//! logging::init(&config.log)?;
//! let session = Session::new(config, KindRegistry::new())?;
//! let supplier = session.resource("supplier", "1", "resource").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{ClientConfig, LogConfig};
pub use error::{ClientError, ClientResult};
pub use session::Session;
