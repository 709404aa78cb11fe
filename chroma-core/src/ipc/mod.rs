//! Types that leave the engine: per-block control outputs.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` so hosts can
//! forward them as JSON (the CLI prints them as JSON lines).

pub mod events;
