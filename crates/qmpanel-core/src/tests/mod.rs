//! Test module for qmpanel-core
//!
//! Scenario tests driving the components the way a frontend does:
//! - Window registry bookkeeping against a fake window system
//! - Drag-hover activation timing (paused tokio clock)
//! - Main menu browse/search transitions and keyboard handling
//! - Panel dispatch end to end
//! - Configuration loading and defaults
