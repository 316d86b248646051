// handlers/mod.rs - HTTP handlers split by security tier
//
// Public (no credential) -> Protected (credential bound to an existing user)

pub mod protected;
pub mod public;
