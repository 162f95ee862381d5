// Candidates and the skills they hold.
// Record CRUD plus batch skill management; matching lives in crate::matching.

pub mod handlers;
