//! Library-level integration tests.
//!
//! Each module builds a throwaway workspace and drives the public API the
//! way a tool host would.

mod edit_scenarios;
mod tool_requests;
