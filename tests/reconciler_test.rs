mod helpers;

use songsmith::application::services::{CallbackPayload, ReconcileOutcome};
use songsmith::domain::{JobId, JobStatus};

use crate::helpers::{DEFAULT_TASK_REF, TestHarness, brief};

async fn job_in_processing(h: &TestHarness) -> (songsmith::domain::AccountId, JobId) {
    let account = h.account_with_balance(1);
    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    h.lyrics_worker.run_once().await.unwrap();
    h.songs.request_audio_stage(account, job_id).await.unwrap();
    h.audio_worker.run_once().await.unwrap();
    assert_eq!(h.job_status(job_id).await, JobStatus::Processing);
    (account, job_id)
}

fn complete_payload(url: &str) -> CallbackPayload {
    CallbackPayload {
        task_id: Some(DEFAULT_TASK_REF.to_string()),
        outcome: Some("complete".to_string()),
        artifact_url: Some(url.to_string()),
        failure_message: None,
    }
}

fn fail_payload() -> CallbackPayload {
    CallbackPayload {
        task_id: Some(DEFAULT_TASK_REF.to_string()),
        outcome: Some("fail".to_string()),
        artifact_url: None,
        failure_message: Some("generation failed upstream".to_string()),
    }
}

#[tokio::test]
async fn given_duplicate_complete_callbacks_then_second_changes_nothing() {
    let h = TestHarness::new();
    let (account, job_id) = job_in_processing(&h).await;

    let first = h
        .reconciler
        .apply(job_id, complete_payload("https://cdn/x.mp3"))
        .await
        .unwrap();
    assert_eq!(first, ReconcileOutcome::Completed);

    let balance_after_first = h.balance(account).await;
    let job_after_first = h.job(job_id).await;

    let second = h
        .reconciler
        .apply(job_id, complete_payload("https://cdn/x.mp3"))
        .await
        .unwrap();
    assert_eq!(second, ReconcileOutcome::AlreadyTerminal);

    let job_after_second = h.job(job_id).await;
    assert_eq!(job_after_second.status, job_after_first.status);
    assert_eq!(job_after_second.artifact_url, job_after_first.artifact_url);
    assert_eq!(h.balance(account).await, balance_after_first);
}

#[tokio::test]
async fn given_unknown_job_id_then_callback_is_acknowledged_with_no_effect() {
    let h = TestHarness::new();
    let (account, job_id) = job_in_processing(&h).await;

    let outcome = h
        .reconciler
        .apply(JobId::new(), complete_payload("https://cdn/x.mp3"))
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::UnknownJob);

    // The real job is untouched.
    assert_eq!(h.job_status(job_id).await, JobStatus::Processing);
    assert_eq!(h.balance(account).await, 0);
}

#[tokio::test]
async fn given_fail_callback_then_job_errors_and_debit_is_refunded_once() {
    let h = TestHarness::new();
    let (account, job_id) = job_in_processing(&h).await;
    assert_eq!(h.balance(account).await, 0);

    let first = h.reconciler.apply(job_id, fail_payload()).await.unwrap();
    assert_eq!(first, ReconcileOutcome::Failed);
    assert_eq!(h.job_status(job_id).await, JobStatus::Error);
    assert_eq!(h.balance(account).await, 1);

    // A duplicate failure callback must not refund again.
    let second = h.reconciler.apply(job_id, fail_payload()).await.unwrap();
    assert_eq!(second, ReconcileOutcome::AlreadyTerminal);
    assert_eq!(h.balance(account).await, 1);
}

#[tokio::test]
async fn given_corrupted_artifact_url_then_it_is_repaired_before_storing() {
    let h = TestHarness::new();
    let (_, job_id) = job_in_processing(&h).await;

    let outcome = h
        .reconciler
        .apply(job_id, complete_payload("https://https://cdn/x.mp3"))
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Completed);

    let job = h.job(job_id).await;
    assert_eq!(job.artifact_url.as_deref(), Some("https://cdn/x.mp3"));
}

#[tokio::test]
async fn given_malformed_payload_then_job_errors_without_ledger_change() {
    let h = TestHarness::new();
    let (account, job_id) = job_in_processing(&h).await;
    assert_eq!(h.balance(account).await, 0);

    let outcome = h
        .reconciler
        .apply(job_id, CallbackPayload::default())
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Malformed);

    // Failed for operator inspection, but the debit is not unwound.
    assert_eq!(h.job_status(job_id).await, JobStatus::Error);
    assert_eq!(h.balance(account).await, 0);
}

#[tokio::test]
async fn given_complete_callback_without_artifact_then_it_is_malformed() {
    let h = TestHarness::new();
    let (_, job_id) = job_in_processing(&h).await;

    let payload = CallbackPayload {
        task_id: Some(DEFAULT_TASK_REF.to_string()),
        outcome: Some("complete".to_string()),
        artifact_url: None,
        failure_message: None,
    };
    let outcome = h.reconciler.apply(job_id, payload).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Malformed);
    assert_eq!(h.job_status(job_id).await, JobStatus::Error);
}

#[tokio::test]
async fn given_task_ref_mismatch_then_routing_still_follows_the_job_id() {
    let h = TestHarness::new();
    let (_, job_id) = job_in_processing(&h).await;

    let payload = CallbackPayload {
        task_id: Some("some-other-task".to_string()),
        outcome: Some("complete".to_string()),
        artifact_url: Some("https://cdn/x.mp3".to_string()),
        failure_message: None,
    };

    // Mismatch is logged as a conflict but the callback applies to the
    // job named in the callback address.
    let outcome = h.reconciler.apply(job_id, payload).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Completed);
    assert_eq!(h.job_status(job_id).await, JobStatus::Complete);
}

#[tokio::test]
async fn given_callback_before_audio_stage_then_nothing_is_applied() {
    let h = TestHarness::new();
    let account = h.account_with_balance(1);
    let job_id = h.songs.create_job(account, brief()).await.unwrap();
    h.lyrics_worker.run_once().await.unwrap();

    let outcome = h
        .reconciler
        .apply(job_id, complete_payload("https://cdn/x.mp3"))
        .await
        .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Conflict);
    assert_eq!(h.job_status(job_id).await, JobStatus::LyricsComplete);
}
