mod account;
mod artifact;
mod job;
mod job_status;

pub use account::AccountId;
pub use artifact::normalize_artifact_url;
pub use job::{DEFAULT_LANGUAGE, DEFAULT_STYLE, DEFAULT_TONE, Job, JobId, SongBrief};
pub use job_status::JobStatus;
