//! evb - EditVideoBot API client
//! 
//! An async client for the EditVideoBot media editing service: build typed
//! edit commands, submit media to the API, and fetch the edited result.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod responses;
pub mod session;

pub use commands::{parse_sequence, serialize_sequence, Command, VolumeLevel};
pub use error::{EvbError, Result};
pub use responses::{Authorization, EditResult, StatsResult};
pub use session::Session;
