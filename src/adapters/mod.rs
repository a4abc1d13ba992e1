//! Port implementations.
//!
//! `live` talks to Gemini and Gommo over HTTP. `recording` wraps a live
//! adapter and writes each call to a cassette, and `replaying` serves those
//! calls back without touching the network.

pub mod live;
pub mod recording;
pub mod replaying;
