//! Core domain models for saagie-ci
//!
//! This module defines the configuration files, the pipeline graph
//! definition and the graph that is sent to the platform.

pub mod alias;
pub mod config;
pub mod definition;
pub mod graph;
pub mod release;
pub mod status;

pub use alias::*;
pub use config::*;
pub use definition::*;
pub use graph::*;
pub use release::*;
pub use status::*;
