use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AccountId, JobStatus};

pub const DEFAULT_STYLE: &str = "pop";
pub const DEFAULT_TONE: &str = "uplifting";
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-supplied inputs for one song request.
#[derive(Debug, Clone)]
pub struct SongBrief {
    pub title: String,
    pub description: String,
    pub style_preset: Option<String>,
    pub style_custom: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
}

/// One song-generation request and its durable state.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub account_id: AccountId,
    pub title: String,
    pub description: String,
    pub style_preset: Option<String>,
    pub style_custom: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
    pub status: JobStatus,
    pub lyrics: Option<String>,
    /// Task id assigned by the audio service. Write-once.
    pub task_ref: Option<String>,
    pub artifact_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(account_id: AccountId, brief: SongBrief) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            account_id,
            title: brief.title,
            description: brief.description,
            style_preset: brief.style_preset,
            style_custom: brief.style_custom,
            tone: brief.tone,
            language: brief.language,
            status: JobStatus::LyricsPending,
            lyrics: None,
            task_ref: None,
            artifact_url: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective style: a custom style overrides the preset.
    pub fn style(&self) -> &str {
        self.style_custom
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.style_preset
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or(DEFAULT_STYLE)
    }

    /// Prompt for the lyrics service, with the fallback precedence
    /// applied: custom style over preset, fixed defaults for tone and
    /// language.
    pub fn lyrics_prompt(&self) -> String {
        let tone = self
            .tone
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_TONE);
        let language = self
            .language
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);

        format!(
            "Write complete song lyrics titled \"{}\" about: {}. \
             Musical style: {}. Tone: {}. Language: {}. \
             Return only the lyrics, with verse and chorus markers.",
            self.title,
            self.description,
            self.style(),
            tone,
            language,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief() -> SongBrief {
        SongBrief {
            title: "Night Drive".to_string(),
            description: "driving alone through a sleeping city".to_string(),
            style_preset: None,
            style_custom: None,
            tone: None,
            language: None,
        }
    }

    #[test]
    fn custom_style_overrides_preset() {
        let mut b = brief();
        b.style_preset = Some("synthwave".to_string());
        b.style_custom = Some("lo-fi garage rock".to_string());
        let job = Job::new(AccountId::new(), b);
        assert_eq!(job.style(), "lo-fi garage rock");
    }

    #[test]
    fn preset_used_when_custom_absent_or_blank() {
        let mut b = brief();
        b.style_preset = Some("synthwave".to_string());
        b.style_custom = Some("   ".to_string());
        let job = Job::new(AccountId::new(), b);
        assert_eq!(job.style(), "synthwave");
    }

    #[test]
    fn prompt_falls_back_to_fixed_defaults() {
        let job = Job::new(AccountId::new(), brief());
        let prompt = job.lyrics_prompt();
        assert!(prompt.contains(DEFAULT_STYLE));
        assert!(prompt.contains(DEFAULT_TONE));
        assert!(prompt.contains(DEFAULT_LANGUAGE));
        assert!(prompt.contains("Night Drive"));
    }

    #[test]
    fn prompt_uses_supplied_tone_and_language() {
        let mut b = brief();
        b.tone = Some("melancholic".to_string());
        b.language = Some("Portuguese".to_string());
        let job = Job::new(AccountId::new(), b);
        let prompt = job.lyrics_prompt();
        assert!(prompt.contains("melancholic"));
        assert!(prompt.contains("Portuguese"));
    }

    #[test]
    fn new_job_starts_in_lyrics_pending() {
        let job = Job::new(AccountId::new(), brief());
        assert_eq!(job.status, JobStatus::LyricsPending);
        assert!(job.lyrics.is_none());
        assert!(job.task_ref.is_none());
        assert!(job.artifact_url.is_none());
    }
}
