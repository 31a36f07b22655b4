//! # natsjwt-jwt
//!
//! Offline issuance of NATS operator, account and user tokens.
//!
//! This crate provides functionality for:
//! - Decoding NKey seeds and enforcing key roles
//! - Building claim sets from `natsjwt-core` options
//! - Signing claim sets into byte-stable tokens
//! - Checking operator → account → user linkage
//! - Assembling the server trust bundle from signed tokens
//! - Rendering and parsing user `.creds` files
//!
//! ## Trust Hierarchy
//!
//! | Entity | Signed By | Carries |
//! |--------|-----------|---------|
//! | **Operator** | Itself | Signing keys, service URLs, system account |
//! | **Account** | Operator | Limits, JetStream tiers, exports, default permissions |
//! | **User** | Account (or its signing key) | Permissions, network/time/connection restrictions |
//!
//! ## Determinism
//!
//! Tokens never carry the wall-clock time or a random identifier: `iat`
//! defaults to 0 and `jti` is always empty. Signing the same claims with the
//! same key yields the same token, so a declarative tool sees no drift when
//! nothing changed.

pub mod bundle;
pub mod chain;
pub mod claims;
pub mod creds;
pub mod error;
pub mod hierarchy;
pub mod keys;
pub mod token;
pub mod validate;

pub use bundle::{Bundle, ResolverKind, assemble};
pub use chain::{verify_account_parent, verify_chain, verify_user_parent};
pub use claims::{
    AccountClaims, ClaimSet, EntityClaims, Export, JetStreamLimits, OperatorClaims, Permissions,
    UserClaims,
};
pub use creds::{Creds, parse_creds, render_user_creds};
pub use error::{AssemblyFailure, SigningFailure, TrustError};
pub use hierarchy::{
    JetStreamPlacement, account_claims, build_account, build_operator, build_system_account,
    build_user, effective_permissions, operator_claims, place_jetstream_limits,
    system_account_claims, user_claims,
};
pub use keys::{KeyKind, KeyMaterial, expect_public_key, public_key_from_seed, public_key_kind};
pub use token::{
    DeterministicSigner, SignedToken, TokenInfo, decode, decode_account, inspect_token_unverified,
};
