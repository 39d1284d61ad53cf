//! pet-core: time-driven state reconciliation for a virtual pet.
//!
//! Two independent engines advance over real wall-clock time:
//! `growth` (age and stage, caught up once on resume) and `ambient`
//! (hour-of-day and weather, recomputed fresh). `session` owns both and
//! pumps them from a cooperative `scheduler`.

pub mod achievement;
pub mod ambient;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod growth;
pub mod rng;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod types;
