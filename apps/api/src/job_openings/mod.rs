// Job openings and their required skills.
// Every required-skill write keeps `skills_quantity` in step inside the store.

pub mod handlers;
