//! HTTP transport capability for relgraph.
//!
//! The hydration engine never talks to the network directly. It consumes the
//! narrow [`HttpTransport`] interface, so the concrete client can be swapped
//! for a scripted one in tests.
//!
//! # Backends
//!
//! - [`FetchTransport`] — `reqwest`-backed transport for real servers
//! - [`InMemoryTransport`] — canned responses and a call log, for tests

pub mod cancel;
pub mod error;
pub mod fetch;
pub mod memory;
pub mod transport;
pub mod types;

pub use cancel::Cancellable;
pub use error::{HttpError, HttpResult};
pub use fetch::{FetchConfig, FetchTransport};
pub use memory::{InMemoryTransport, RecordedCall};
pub use transport::HttpTransport;
pub use types::{Headers, HttpMethod, HttpResponse};
