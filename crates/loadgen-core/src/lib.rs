//! Core types and collaborator contracts for the changeset workload generator.
//!
//! This crate provides the foundational pieces the generator is built on:
//!
//! - [`DbGateway`] - lifecycle operations on the local replica (elements,
//!   containers, categories, naming namespaces, local commits)
//! - [`HubClient`] - remote synchronization primitives against the shared hub
//!   (reserve, pull-and-merge, push, named-version tagging)
//! - Identifier newtypes ([`ElementId`], [`ChangesetId`], ...) and the
//!   [`RemoteIdentity`] a run is scoped to
//! - [`RunContext`] - the per-run context value threaded through every call
//!
//! # Architecture
//!
//! The loadgen-core crate sits at the foundation of the workload generator:
//!
//! ```text
//! loadgen-core (this crate)
//!    │
//!    └─── changeset-loadgen   (plan, bootstrap, round loop, CLI;
//!                              in-memory DbGateway/HubClient implementations)
//! ```
//!
//! The generator never talks to a concrete database or hub directly - it only
//! depends on the two traits defined here, so live transports and test doubles
//! are interchangeable.

pub mod context;
pub mod gateway;
pub mod hub;
pub mod id;

// Re-exports for convenience
pub use context::RunContext;
pub use gateway::{DbGateway, ElementSpec, GatewayError};
pub use hub::{HubClient, HubError, NamedVersion};
pub use id::{CategoryId, ChangesetId, ContainerId, ElementId, NamespaceId, RemoteIdentity};
