// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (JWT auth). Route registration in `app`
// decides which tier a handler lives behind.
pub mod extract;
pub mod protected;
pub mod public;
