//! Adaptive multiplication-table quiz: a weighted fact pool that learns from
//! each answer, timed multiple-choice sessions and per-player high scores.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod roster;
pub mod session;
pub mod store;
pub mod ui;
