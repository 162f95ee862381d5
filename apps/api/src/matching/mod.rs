// Skill matching: per-skill scoring, the exact-match gate and ranking,
// and the selection endpoints built on them.

pub mod engine;
pub mod handlers;
pub mod scoring;
