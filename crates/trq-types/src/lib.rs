//! Common types module for the TRQ service.
//!
//! This module defines the core data types and structures used throughout
//! the transport-request system. It provides a centralized location for
//! shared types to ensure consistency across all components.

/// Order types: the transport request record, statuses, vehicles, contacts.
pub mod order;
/// Request-number formatting and parsing helpers.
pub mod sequence;
/// User and actor types for identity and authorization.
pub mod user;

// Re-export all types for convenient access
pub use order::*;
pub use sequence::*;
pub use user::*;
