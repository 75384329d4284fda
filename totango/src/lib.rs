//! Client for Totango's tracking pixel endpoint.
//!
//! Events are posted as form-encoded `sdr_*` fields, one request per call:
//!
//! ```rust,no_run
//! use totango::{Attributes, Config, EventClient, Identity};
//!
//! # async fn run() -> Result<(), totango::ClientError> {
//! let client = EventClient::new(Config::new("SP-1234-56").with_region("eu", "app-token"))?;
//!
//! client
//!     .track_activity(
//!         "billing",
//!         "opened",
//!         &Identity::user("u@example.com").with_account_name("Acme"),
//!         &Attributes::new(),
//!         &Attributes::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod region;

pub use client::{EventClient, USER_AGENT};
pub use config::Config;
pub use error::ClientError;
pub use payload::{Attributes, Identity, Payload};
pub use region::Region;
