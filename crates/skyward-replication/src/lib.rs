//! Host/client entity replication.
//!
//! A session keeps one authoritative host and any number of participants
//! converging on the same entity state. The host owns identifier allocation
//! and entity lifecycle; participants mirror what they are told and send
//! back only updates about their own avatar, which the host relays to
//! everyone else. Everything runs on the caller's tick: one `tick()` call
//! accepts joins, drains the sockets, applies messages and flushes output.

mod client;
mod error;
mod host;
mod registry;
mod router;
mod session;

pub use client::{ClientConfig, ClientSession};
pub use error::ReplicationError;
pub use host::{HostConfig, HostSession};
pub use registry::{EntityRegistry, IdMap};
pub use router::{Outcome, apply_as_client, apply_as_host};
pub use session::{NoopSession, ReplicationSession};
