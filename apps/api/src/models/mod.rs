pub mod candidate;
pub mod job_opening;
pub mod skill;

pub use candidate::{Candidate, CandidateFields, CandidatePatch, NewCandidate};
pub use job_opening::{JobOpening, JobOpeningFields, JobOpeningPatch, NewJobOpening};
pub use skill::{
    CandidateSkill, CandidateSkillInput, CandidateSkillPatch, NewCandidateSkill,
    NewRequiredSkill, RequiredSkill, RequiredSkillInput, RequiredSkillPatch, SkillRecord,
};
