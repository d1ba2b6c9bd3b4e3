//! Shared test fixtures for the drover workspace.
//!
//! Lightweight, settable implementations of the `drover-core` world traits
//! so controller and environment suites can run without a physics engine.

pub mod world;

pub use world::{MockObject, MockRobot, MockWorld};
