//! # marquee-core
//!
//! Foundation types for the Marquee orchestration engine.
//!
//! This crate provides the shared vocabulary that all other Marquee crates
//! depend on:
//!
//! - **Frames**: [`frame::Frame`] with entity mentions and their resolutions
//! - **Candidates**: [`frame::EntityCandidate`] fuzzy-match results with
//!   confidence scores and disambiguation text
//! - **Tasks**: [`task::Task`] and the append-only [`task::TaskResult`] log
//! - **Decisions**: [`decision::Decision`] returned by the planner oracle
//! - **Capabilities**: [`capability::CapabilityDescriptor`] registration-time
//!   metadata
//! - **Responses**: [`response::FinalResponse`] synthesized at completion
//! - **Events**: [`events::MarqueeEvent`] lifecycle trace entries
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other marquee crates. Leaf value
//! types (`EntityCandidate`) are defined before their aggregates
//! (`ResolvedEntity`, `Frame`) so composition stays one-directional.

#![deny(unsafe_code)]

pub mod capability;
pub mod decision;
pub mod events;
pub mod frame;
pub mod response;
pub mod task;
