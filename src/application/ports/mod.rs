mod audio_client;
mod job_store;
mod ledger;
mod lyrics_client;
mod store_error;

pub use audio_client::{AudioClient, AudioSubmission, SubmitError};
pub use job_store::{AudioClaim, JobStore};
pub use ledger::Ledger;
pub use lyrics_client::{GenerationError, LyricsClient};
pub use store_error::StoreError;
