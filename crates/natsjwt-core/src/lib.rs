//! # natsjwt-core
//!
//! Configuration types shared by the natsjwt crates.
//!
//! Everything here is plain data: option structs that describe what an
//! operator, account or user token should contain, and the declarative
//! trust manifest ([`TrustConfig`]) that lists a whole hierarchy at once.
//! Turning options into signed tokens is the job of `natsjwt-jwt`.

// Configuration types shared across all natsjwt crates
pub mod config;

pub use config::{
    AccountEntry,
    AccountLimitsOptions,
    AccountOptions,
    ConfigError,
    ConnectionType,
    ExportKind,
    ExportOptions,
    JetStreamLimitBlock,
    NatsLimitsOptions,
    OperatorEntry,
    OperatorOptions,
    PermissionOptions,
    ResponseKind,
    SeedSource,
    TemporalOptions,
    TimeRangeOptions,
    TraceOptions,
    // Manifest
    TrustConfig,
    UserEntry,
    UserOptions,
    UserPermissionOptions,
};
