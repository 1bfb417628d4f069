//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - conversation messages, retained per conversation id in memory
//! - turn messages with tool requests/responses, exchanged with the orchestrator
//! - tool definitions and calls, dispatched through the registry
//! - directory records (regions and users) returned by the store
//!
//! Conversions between conversation and turn messages live next to the types.
pub mod directory;
pub mod message;
pub mod role;
pub mod tool;
