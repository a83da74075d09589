//! # nav_core - Navigation Trial Tracker
//!
//! Core of the spatial navigation task used in wayfinding experiments: the
//! participant is asked to find one destination among many, and the task
//! records how far they walked compared to the straight-line distance.
//!
//! ## Features
//! - Frame-driven, single-threaded state machine (`start` / `tick` / `pause` / `end`)
//! - Real and scaled avatar path tracking
//! - Score with time penalty, delayed target reveal
//! - Tab-delimited trial output for the experiment log
//!
//! The host engine plugs in through the traits in [`host`].

// Doc formatting lints - purely cosmetic
#![allow(clippy::doc_lazy_continuation)]

pub mod config;
pub mod destinations;
pub mod error;
pub mod host;
pub mod task;

pub use config::{NavigationConfig, RevealClock, TargetRevealMode};
pub use destinations::{Destination, DestinationList, DestinationProvider, ObjectId, SceneObject};
pub use error::{Result, TaskError};
pub use host::{AvatarTracker, Clock, HudSink, LogSink, SystemClock, TaskBindings};
pub use task::{FrameInput, NavigationTask, TaskState, TrialContext, TrialRecord};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
