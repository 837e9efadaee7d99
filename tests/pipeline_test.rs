mod helpers;

use songsmith::application::ports::SubmitError;
use songsmith::application::services::{
    CallbackPayload, DequeueOutcome, JobKey, ReconcileOutcome, ServiceError,
};
use songsmith::domain::JobStatus;

use crate::helpers::{DEFAULT_LYRICS, DEFAULT_TASK_REF, TestHarness, brief};

#[tokio::test]
async fn given_one_credit_when_full_pipeline_runs_then_song_completes_and_balance_is_spent() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let job_id = h
        .songs
        .create_job(account, brief())
        .await
        .expect("admission should succeed");
    assert_eq!(h.job_status(job_id).await, JobStatus::LyricsPending);

    assert_eq!(
        h.lyrics_worker.run_once().await.unwrap(),
        DequeueOutcome::ProcessedOne
    );
    let lyrics = h.status.lyrics_status(account, job_id).await.unwrap();
    assert_eq!(lyrics.status, JobStatus::LyricsComplete);
    assert_eq!(lyrics.text.as_deref(), Some(DEFAULT_LYRICS));

    h.songs
        .request_audio_stage(account, job_id)
        .await
        .expect("audio advance should succeed");
    assert_eq!(h.job_status(job_id).await, JobStatus::AudioPending);
    // Advancing gates on the balance but does not charge.
    assert_eq!(h.balance(account).await, 1);

    assert_eq!(
        h.audio_worker.run_once().await.unwrap(),
        DequeueOutcome::ProcessedOne
    );
    assert_eq!(h.balance(account).await, 0);
    let job = h.job(job_id).await;
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.task_ref.as_deref(), Some(DEFAULT_TASK_REF));

    let outcome = h
        .reconciler
        .apply(
            job_id,
            CallbackPayload {
                task_id: Some(DEFAULT_TASK_REF.to_string()),
                outcome: Some("complete".to_string()),
                artifact_url: Some("https://cdn/x.mp3".to_string()),
                failure_message: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Completed);

    let audio = h.status.audio_status(account, JobKey::Job(job_id)).await.unwrap();
    assert_eq!(audio.status, JobStatus::Complete);
    assert_eq!(audio.artifact_url.as_deref(), Some("https://cdn/x.mp3"));
    assert_eq!(h.balance(account).await, 0);
}

#[tokio::test]
async fn given_zero_balance_when_requesting_audio_then_job_and_balance_are_untouched() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    h.lyrics_worker.run_once().await.unwrap();
    assert_eq!(h.job_status(job_id).await, JobStatus::LyricsComplete);

    // Balance drained between admission and the audio request.
    h.store.put_account(account, 0);

    let err = h.songs.request_audio_stage(account, job_id).await;
    assert!(matches!(err, Err(ServiceError::InsufficientCredits)));
    assert_eq!(h.job_status(job_id).await, JobStatus::LyricsComplete);
    assert_eq!(h.balance(account).await, 0);
}

#[tokio::test]
async fn given_permanent_submission_failure_then_job_errors_and_debit_is_refunded() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    h.lyrics_worker.run_once().await.unwrap();
    h.songs.request_audio_stage(account, job_id).await.unwrap();

    h.audio_client
        .push(Err(SubmitError::Rejected("style not supported".to_string())));

    assert_eq!(
        h.audio_worker.run_once().await.unwrap(),
        DequeueOutcome::ProcessedOne
    );
    assert_eq!(h.job_status(job_id).await, JobStatus::Error);
    assert_eq!(h.balance(account).await, 1);
}

#[tokio::test]
async fn given_submission_then_callback_address_embeds_the_job_id_and_lyrics_are_the_prompt() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    h.lyrics_worker.run_once().await.unwrap();
    h.songs.request_audio_stage(account, job_id).await.unwrap();
    h.audio_worker.run_once().await.unwrap();

    let submission = h
        .audio_client
        .last_submission()
        .expect("a submission should have been made");
    assert!(submission.callback_url.ends_with(&format!(
        "/api/v1/callbacks/audio/{}",
        job_id.as_uuid()
    )));
    assert_eq!(submission.prompt, DEFAULT_LYRICS);
    assert_eq!(submission.style, "synthwave");
    assert_eq!(submission.title, "Night Drive");
}

#[tokio::test]
async fn given_insufficient_admission_balance_then_create_job_is_rejected() {
    let h = TestHarness::new();
    let account = h.account_with_balance(0);

    let err = h.songs.create_job(account, brief()).await;
    assert!(matches!(err, Err(ServiceError::InsufficientCredits)));
}

#[tokio::test]
async fn given_blank_title_then_create_job_fails_validation() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let mut bad = brief();
    bad.title = "   ".to_string();
    let err = h.songs.create_job(account, bad).await;
    assert!(matches!(err, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn given_foreign_job_then_reads_and_commands_are_forbidden() {
    let h = TestHarness::new();
    let owner = h.account_with_balance(1);
    let stranger = h.account_with_balance(1);

    let job_id = h.songs.create_job(owner, brief()).await.unwrap();

    assert!(matches!(
        h.status.lyrics_status(stranger, job_id).await,
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        h.songs.request_audio_stage(stranger, job_id).await,
        Err(ServiceError::Forbidden)
    ));
    assert!(matches!(
        h.songs.delete_job(stranger, job_id).await,
        Err(ServiceError::Forbidden)
    ));
}

#[tokio::test]
async fn given_unknown_job_then_reads_report_not_found() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let missing = songsmith::domain::JobId::new();
    assert!(matches!(
        h.status.lyrics_status(account, missing).await,
        Err(ServiceError::NotFound)
    ));
    assert!(matches!(
        h.status
            .audio_status(account, JobKey::TaskRef("no-such-task".to_string()))
            .await,
        Err(ServiceError::NotFound)
    ));
}

#[tokio::test]
async fn given_task_ref_then_audio_status_resolves_it() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    h.lyrics_worker.run_once().await.unwrap();
    h.songs.request_audio_stage(account, job_id).await.unwrap();
    h.audio_worker.run_once().await.unwrap();

    let view = h
        .status
        .audio_status(account, JobKey::TaskRef(DEFAULT_TASK_REF.to_string()))
        .await
        .unwrap();
    assert_eq!(view.job_id, job_id);
    assert_eq!(view.status, JobStatus::Processing);
    // Artifact is only exposed once complete.
    assert!(view.artifact_url.is_none());
}

#[tokio::test]
async fn given_live_job_then_delete_is_rejected_until_terminal() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);

    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    assert!(matches!(
        h.songs.delete_job(account, job_id).await,
        Err(ServiceError::WrongState { .. })
    ));

    h.lyrics_client.push(Err(
        songsmith::application::ports::GenerationError::Timeout,
    ));
    h.lyrics_worker.run_once().await.unwrap();
    assert_eq!(h.job_status(job_id).await, JobStatus::LyricsError);

    h.songs.delete_job(account, job_id).await.unwrap();
    assert!(matches!(
        h.status.lyrics_status(account, job_id).await,
        Err(ServiceError::NotFound)
    ));
}
