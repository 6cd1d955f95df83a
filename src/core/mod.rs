//! Core business logic - framework-agnostic ledger operations.
//!
//! Everything in here takes an explicit database connection and returns
//! `Result`; nothing depends on the binary's runtime wiring.

/// Audit logger - append-only log of successful mutations
pub mod audit;

/// Threshold alert engine - periodic budget threshold evaluation
pub mod alerts;

/// Audit exporter - CSV serialization of the audit log
pub mod export;

/// Mutation gateway - the single audited, atomic mutation path
pub mod gateway;

/// Ledger store - typed per-table queries and tab management
pub mod ledger;

/// Receipt scan parsing - total-amount extraction from scanned text
pub mod scan;

/// Reactive view layer - versioned pub/sub over derived values
pub mod views;
