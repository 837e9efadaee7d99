use std::fmt;
use std::str::FromStr;

/// Lifecycle states of a song job. The lyrics stage runs first; the
/// audio stage is entered only by an explicit client call once lyrics
/// are ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    LyricsPending,
    LyricsProcessing,
    LyricsComplete,
    LyricsError,
    AudioPending,
    AudioProcessing,
    /// Audio request accepted by the external service; waiting for its
    /// out-of-band callback.
    Processing,
    Complete,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::LyricsPending => "lyrics_pending",
            JobStatus::LyricsProcessing => "lyrics_processing",
            JobStatus::LyricsComplete => "lyrics_complete",
            JobStatus::LyricsError => "lyrics_error",
            JobStatus::AudioPending => "audio_pending",
            JobStatus::AudioProcessing => "audio_processing",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::LyricsError | JobStatus::Complete | JobStatus::Error
        )
    }

    /// Allowed-transitions table. Every status mutation in the store
    /// layer is guarded by this, so an illegal transition cannot be
    /// committed even by a buggy caller.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (LyricsPending, LyricsProcessing) => true,
            (LyricsProcessing, LyricsComplete) => true,
            (LyricsProcessing, LyricsError) => true,
            (LyricsComplete, AudioPending) => true,
            // Insufficient balance at claim fails the job without a charge.
            (AudioPending, AudioProcessing) | (AudioPending, Error) => true,
            (AudioProcessing, Processing) => true,
            // Transient submission failure: refunded and re-claimable.
            (AudioProcessing, AudioPending) => true,
            (AudioProcessing, Error) => true,
            (Processing, Complete) | (Processing, Error) => true,
            _ => false,
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lyrics_pending" => Ok(JobStatus::LyricsPending),
            "lyrics_processing" => Ok(JobStatus::LyricsProcessing),
            "lyrics_complete" => Ok(JobStatus::LyricsComplete),
            "lyrics_error" => Ok(JobStatus::LyricsError),
            "audio_pending" => Ok(JobStatus::AudioPending),
            "audio_processing" => Ok(JobStatus::AudioProcessing),
            "processing" => Ok(JobStatus::Processing),
            "complete" => Ok(JobStatus::Complete),
            "error" => Ok(JobStatus::Error),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 9] = [
        JobStatus::LyricsPending,
        JobStatus::LyricsProcessing,
        JobStatus::LyricsComplete,
        JobStatus::LyricsError,
        JobStatus::AudioPending,
        JobStatus::AudioProcessing,
        JobStatus::Processing,
        JobStatus::Complete,
        JobStatus::Error,
    ];

    #[test]
    fn round_trips_through_string_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for from in [JobStatus::LyricsError, JobStatus::Complete, JobStatus::Error] {
            for to in ALL {
                assert!(
                    !from.can_transition_to(to),
                    "{} -> {} should be rejected",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn audio_processing_may_retry_or_fail_or_advance() {
        let from = JobStatus::AudioProcessing;
        assert!(from.can_transition_to(JobStatus::Processing));
        assert!(from.can_transition_to(JobStatus::AudioPending));
        assert!(from.can_transition_to(JobStatus::Error));
        assert!(!from.can_transition_to(JobStatus::Complete));
    }

    #[test]
    fn complete_is_reachable_only_from_processing() {
        for from in ALL {
            assert_eq!(
                from.can_transition_to(JobStatus::Complete),
                from == JobStatus::Processing
            );
        }
    }

    #[test]
    fn audio_stage_requires_explicit_client_advance() {
        assert!(!JobStatus::LyricsComplete.can_transition_to(JobStatus::AudioProcessing));
        assert!(JobStatus::LyricsComplete.can_transition_to(JobStatus::AudioPending));
    }
}
