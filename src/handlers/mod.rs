// Two security tiers: public (no auth, /register) and protected
// (staff JWT required, /api/*).
pub mod protected;
pub mod public;
