//! Admission, supervision and lifecycle behaviour of the scheduler with
//! fake runners.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::*;
use genflow_core::job::JobStatus;
use genflow_core::outcome::JobOutcome;
use genflow_scheduler::{JobEvent, Scheduler, SchedulerConfig, SchedulerError, Service, ServiceConfig};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: cap=2, three submissions, third promoted when the first completes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn third_job_waits_then_runs_when_a_slot_frees() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(2));

    let j1 = scheduler.submit(SERVICE, json!({"n": 1})).await.unwrap();
    let j2 = scheduler.submit(SERVICE, json!({"n": 2})).await.unwrap();
    let j3 = scheduler.submit(SERVICE, json!({"n": 3})).await.unwrap();
    let (id1, id2, id3) = (j1.id(), j2.id(), j3.id());

    runner.wait_started(id1).await;
    runner.wait_started(id2).await;

    assert_eq!(scheduler.get_job(id1).await.unwrap().status, JobStatus::Running);
    assert_eq!(scheduler.get_job(id2).await.unwrap().status, JobStatus::Running);
    assert_eq!(scheduler.get_job(id3).await.unwrap().status, JobStatus::Pending);
    assert_eq!(scheduler.running_count(SERVICE).await, 2);
    assert_eq!(scheduler.pending_count(SERVICE).await, 1);
    assert!(!runner.is_started(id3));

    runner.release(id1, Release::Succeed(json!({"images": []}))).await;
    assert_matches!(j1.wait().await, JobOutcome::Completed(_));

    runner.wait_started(id3).await;
    assert_eq!(scheduler.get_job(id3).await.unwrap().status, JobStatus::Running);
    assert_eq!(scheduler.running_count(SERVICE).await, 2);
    assert_eq!(scheduler.pending_count(SERVICE).await, 0);

    runner.release(id2, Release::Succeed(json!({}))).await;
    runner.release(id3, Release::Succeed(json!({}))).await;
    assert!(j2.wait().await.is_success());
    assert!(j3.wait().await.is_success());
    assert_eq!(scheduler.running_count(SERVICE).await, 0);
}

// ---------------------------------------------------------------------------
// Test: running never exceeds the cap across a burst
// ---------------------------------------------------------------------------

#[tokio::test]
async fn running_never_exceeds_cap() {
    const CAP: usize = 3;
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(CAP));
    let mut events = scheduler.subscribe();

    let mut handles = Vec::new();
    for n in 0..10 {
        handles.push(scheduler.submit(SERVICE, json!({ "n": n })).await.unwrap());
    }
    let ids: Vec<_> = handles.iter().map(|h| h.id()).collect();

    for (i, id) in ids.iter().enumerate() {
        runner.wait_started(*id).await;
        assert!(scheduler.running_count(SERVICE).await <= CAP);
        let how = if i % 2 == 0 {
            Release::Succeed(json!({ "i": i }))
        } else {
            Release::Fail(format!("job {i} failed"))
        };
        runner.release(*id, how).await;
    }

    for handle in handles {
        handle.wait().await;
    }

    // Replay the event stream and check the cap after every transition.
    let mut running = 0usize;
    while let Ok(event) = events.try_recv() {
        match event {
            JobEvent::Started { .. } => running += 1,
            JobEvent::Completed { .. } | JobEvent::Failed { .. } => running -= 1,
            JobEvent::Submitted { .. } | JobEvent::Progress { .. } => {}
        }
        assert!(running <= CAP, "{running} jobs running");
    }
    assert_eq!(running, 0);
    assert!(runner.peak() <= CAP, "peak concurrency {}", runner.peak());
    assert_eq!(scheduler.list_by_status(JobStatus::Completed).await.len(), 5);
    assert_eq!(scheduler.list_by_status(JobStatus::Failed).await.len(), 5);
}

// ---------------------------------------------------------------------------
// Test: exactly cap+1 submissions leave one pending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cap_plus_one_leaves_exactly_one_pending() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(2));

    let handles: Vec<_> = submit_many(&scheduler, 3).await;
    runner.wait_started(handles[0]).await;
    runner.wait_started(handles[1]).await;

    assert_eq!(scheduler.pending_count(SERVICE).await, 1);
    assert_eq!(scheduler.list_by_status(JobStatus::Pending).await[0].id, handles[2]);

    runner.release(handles[1], Release::Fail("nope".into())).await;
    runner.wait_started(handles[2]).await;
    assert_eq!(scheduler.pending_count(SERVICE).await, 0);
}

async fn submit_many(scheduler: &Scheduler, n: usize) -> Vec<genflow_core::types::JobId> {
    let mut ids = Vec::new();
    for i in 0..n {
        ids.push(scheduler.submit(SERVICE, json!({ "i": i })).await.unwrap().id());
    }
    ids
}

// ---------------------------------------------------------------------------
// Test: duplicate terminal messages set the terminal state once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_terminal_messages_are_ignored() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(1));

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();
    runner.release(id, Release::Duplicate).await;

    assert_eq!(handle.wait().await, JobOutcome::Completed(json!({ "first": true })));

    let job = scheduler.get_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result, Some(json!({ "first": true })));
    assert!(job.error.is_none());
    assert!(job.finished_at.is_some());
}

// ---------------------------------------------------------------------------
// Test: abnormal worker exits are synthesized as failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn panicking_worker_fails_with_generic_message() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(1));

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();
    runner.release(id, Release::Panic).await;

    assert_eq!(
        handle.wait().await,
        JobOutcome::Failed("Worker terminated unexpectedly".into())
    );
    let job = scheduler.get_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(scheduler.list_by_status(JobStatus::Running).await.is_empty());
    assert_eq!(scheduler.active_count().await, 0);
}

#[tokio::test]
async fn silent_worker_fails_and_frees_its_slot() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(1));

    let first = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let second = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let second_id = second.id();

    runner.release(first.id(), Release::Silent).await;
    assert_eq!(
        first.wait().await,
        JobOutcome::Failed("Worker terminated unexpectedly".into())
    );

    runner.release(second_id, Release::Succeed(json!({"ok": 1}))).await;
    assert!(second.wait().await.is_success());
}

#[tokio::test]
async fn worker_exit_is_detected_while_a_helper_holds_the_outbox() {
    for exit in [StrayExit::Panic, StrayExit::Return] {
        let scheduler = start_with(
            Arc::new(StrayOutboxRunner(exit)),
            service(1).with_job_timeout(None),
        );

        let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
        let id = handle.id();
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle.wait()).await;

        assert_eq!(
            outcome.ok(),
            Some(JobOutcome::Failed("Worker terminated unexpectedly".into())),
            "exit: {exit:?}",
        );
        assert_eq!(scheduler.get_job(id).await.unwrap().status, JobStatus::Failed);
        assert_eq!(scheduler.running_count(SERVICE).await, 0);
        scheduler.shutdown().await;
    }
}

#[tokio::test]
async fn result_queued_before_worker_exit_still_completes_the_job() {
    let scheduler = start_with(
        Arc::new(StrayOutboxRunner(StrayExit::Report)),
        service(1).with_job_timeout(None),
    );

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();
    let outcome = tokio::time::timeout(Duration::from_secs(2), handle.wait())
        .await
        .expect("job finished");

    assert_eq!(outcome, JobOutcome::Completed(json!({ "job": id })));
    assert_eq!(scheduler.get_job(id).await.unwrap().status, JobStatus::Completed);
}

// ---------------------------------------------------------------------------
// Test: per-job timeout
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn hung_worker_times_out() {
    let scheduler = start_with(
        Arc::new(HangingRunner),
        service(1).with_job_timeout(Some(Duration::from_secs(5))),
    );

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();

    assert_eq!(
        handle.wait().await,
        JobOutcome::Failed("Generation timed out after 5s".into())
    );
    assert_eq!(scheduler.get_job(id).await.unwrap().status, JobStatus::Failed);
    assert_eq!(scheduler.running_count(SERVICE).await, 0);
}

// ---------------------------------------------------------------------------
// Test: worker messages update progress; foreign job ids are ignored
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_messages_update_progress() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(1));

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();
    runner.wait_started(id).await;

    eventually(|| {
        let scheduler = scheduler.clone();
        async move {
            scheduler.get_job(id).await.and_then(|j| j.progress) == Some(json!({ "stage": "waiting" }))
        }
    })
    .await;
    let job = scheduler.get_job(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.updated_at >= job.created_at);

    runner.release(id, Release::Succeed(json!({}))).await;
    handle.wait().await;
}

#[tokio::test]
async fn messages_for_other_jobs_are_ignored() {
    let scheduler = start_with(Arc::new(ImpostorRunner), service(1));

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();

    assert_eq!(handle.wait().await, JobOutcome::Completed(json!({ "job": id })));
}

// ---------------------------------------------------------------------------
// Test: events are emitted in lifecycle order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lifecycle_events_in_order() {
    let scheduler = start_with(Arc::new(EchoRunner), service(1));
    let mut events = scheduler.subscribe();

    let handle = scheduler.submit(SERVICE, json!({"x": 1})).await.unwrap();
    let id = handle.id();
    handle.wait().await;

    let mut seen = Vec::new();
    while seen.len() < 4 {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.job_id(), id);
        seen.push(event);
    }

    assert_matches!(seen[0], JobEvent::Submitted { .. });
    assert_matches!(seen[1], JobEvent::Started { .. });
    assert_matches!(&seen[2], JobEvent::Progress { data, .. } if data["stage"] == "echoing");
    assert_matches!(seen[3], JobEvent::Completed { .. });
}

// ---------------------------------------------------------------------------
// Test: submission errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_service_is_rejected_synchronously() {
    let scheduler = start_with(Arc::new(EchoRunner), service(1));

    let result = scheduler.submit("video-generation", json!({})).await;

    assert_matches!(result, Err(SchedulerError::UnknownService(id)) if id == "video-generation");
    assert!(scheduler.list_jobs().await.is_empty());
}

#[tokio::test]
async fn invalid_service_definitions_fail_start() {
    let zero_cap = Scheduler::start(
        SchedulerConfig::default(),
        vec![Service::new(ServiceConfig::new("svc", 0), Arc::new(EchoRunner))],
    );
    assert_matches!(zero_cap, Err(SchedulerError::InvalidService { .. }));

    let duplicate = Scheduler::start(
        SchedulerConfig::default(),
        vec![
            Service::new(ServiceConfig::new("svc", 1), Arc::new(EchoRunner)),
            Service::new(ServiceConfig::new("svc", 2), Arc::new(EchoRunner)),
        ],
    );
    assert_matches!(duplicate, Err(SchedulerError::InvalidService { id, .. }) if id == "svc");
}

// ---------------------------------------------------------------------------
// Test: services have independent caps
// ---------------------------------------------------------------------------

#[tokio::test]
async fn services_do_not_share_capacity() {
    let runner = GatedRunner::new();
    let scheduler = Scheduler::start(
        SchedulerConfig::default(),
        vec![
            Service::new(ServiceConfig::new("a", 1), runner.clone()),
            Service::new(ServiceConfig::new("b", 1), runner.clone()),
        ],
    )
    .unwrap();

    let a1 = scheduler.submit("a", json!({})).await.unwrap();
    let a2 = scheduler.submit("a", json!({})).await.unwrap();
    let b1 = scheduler.submit("b", json!({})).await.unwrap();

    runner.wait_started(a1.id()).await;
    runner.wait_started(b1.id()).await;
    assert!(!runner.is_started(a2.id()));
    assert_eq!(scheduler.running_count("a").await, 1);
    assert_eq!(scheduler.running_count("b").await, 1);
    assert_eq!(scheduler.pending_count("a").await, 1);

    scheduler.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: shutdown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_fails_waiters_and_rejects_new_jobs() {
    let runner = GatedRunner::new();
    let scheduler = start_with(runner.clone(), service(1));

    let running = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let pending = scheduler.submit(SERVICE, json!({})).await.unwrap();
    runner.wait_started(running.id()).await;

    scheduler.shutdown().await;

    assert_eq!(running.wait().await, JobOutcome::Failed("Scheduler shut down".into()));
    assert_eq!(pending.wait().await, JobOutcome::Failed("Scheduler shut down".into()));
    assert!(scheduler.list_jobs().await.is_empty());
    assert_eq!(scheduler.active_count().await, 0);
    assert_matches!(
        scheduler.submit(SERVICE, json!({})).await,
        Err(SchedulerError::ShutDown)
    );

    // Second call is a no-op.
    scheduler.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: retention sweep drops finished jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn finished_jobs_are_swept_after_retention() {
    let config = SchedulerConfig {
        retention: Duration::ZERO,
        sweep_interval: Duration::from_millis(10),
    };
    let scheduler = Scheduler::start(
        config,
        vec![Service::new(service(1), Arc::new(EchoRunner))],
    )
    .unwrap();

    let handle = scheduler.submit(SERVICE, json!({})).await.unwrap();
    let id = handle.id();
    handle.wait().await;

    eventually(|| {
        let scheduler = scheduler.clone();
        async move { scheduler.get_job(id).await.is_none() }
    })
    .await;
}
