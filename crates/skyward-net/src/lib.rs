//! Transport layer for Skyward sessions.
//!
//! Ordered, reliable, framed byte transport over TCP, driven by a
//! single-threaded poll-per-tick loop: sockets are non-blocking, each tick
//! drains whatever has arrived and pushes out whatever fits, and partial
//! writes carry over to the next tick. Only the initial client connect
//! blocks, with a bounded timeout per attempt.

mod connection;
mod framing;
mod listener;

pub use connection::{ConnectPolicy, Connection, TransportError};
pub use framing::{FrameConfig, FrameDecoder, FrameError, encode_frame};
pub use listener::Listener;
