// ABOUTME: Integration tests for the deployment orchestrator state machine.
// ABOUTME: Drives start, abort, sync, finish, service and report against fake collaborators.

mod support;

use std::path::PathBuf;
use support::Harness;
use trigger::confirm::{Answer, Stage};
use trigger::deploy::{AbortOptions, DeploymentState, OrchestratorErrorKind, ReportKind};
use trigger::diagnostics::WarningKind;
use trigger::dispatch::FleetFunction;
use trigger::drivers::{DeployRecord, LockDriver, SyncArgs};
use trigger::fleet::status::{FETCH_TAG, RESTART_STATUS, TAG};
use trigger::types::BatchSpec;

// =============================================================================
// start
// =============================================================================

#[tokio::test]
async fn start_takes_lock_and_writes_start_tag() {
    support::init_tracing();
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");

    let outcome = orchestrator.start().await.unwrap();

    match outcome.state {
        DeploymentState::Started(info) => assert!(info.is_held_by("alice")),
        other => panic!("unexpected state {other:?}"),
    }
    let tags = harness.tags();
    assert_eq!(tags.len(), 1);
    assert!(tags[0].starts_with("web-start-"), "tag: {}", tags[0]);
    assert!(harness.lock_path().exists());
}

#[tokio::test]
async fn start_twice_fails_and_leaves_lock_unchanged() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    let before = std::fs::read_to_string(harness.lock_path()).unwrap();

    let err = harness.orchestrator("bob").start().await.unwrap_err();

    assert_eq!(err.code(), 100);
    assert!(err.to_string().contains("already started by alice"));
    assert_eq!(std::fs::read_to_string(harness.lock_path()).unwrap(), before);
    assert_eq!(harness.tags().len(), 1);
}

#[tokio::test]
async fn start_tag_failure_releases_lock() {
    let harness = Harness::new();
    harness.vcs.repo.lock().fail_tag = true;

    let err = harness.orchestrator("alice").start().await.unwrap_err();

    assert_eq!(err.code(), 102);
    assert_eq!(err.kind(), OrchestratorErrorKind::Vcs);
    assert!(!harness.lock_path().exists());
}

#[tokio::test]
async fn start_on_repository_without_commits_explains_itself() {
    let harness = Harness::new();
    harness.vcs.repo.lock().head = None;

    let err = harness.orchestrator("alice").start().await.unwrap_err();

    assert_eq!(err.code(), 103);
    assert!(err.to_string().contains("initial commit"));
    assert!(!harness.lock_path().exists());
}

// =============================================================================
// abort
// =============================================================================

#[tokio::test]
async fn abort_without_deployment_fails() {
    let harness = Harness::new();
    let err = harness
        .orchestrator("alice")
        .abort(AbortOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), 130);
}

#[tokio::test]
async fn abort_resets_to_latest_start_tag_and_unlocks() {
    let harness = Harness::new();
    harness.vcs.repo.lock().tags = vec![
        "web-start-20240101-000000".to_string(),
        "web-start-20240301-000000".to_string(),
        "web-sync-20240401-000000".to_string(),
        "api-start-20250101-000000".to_string(),
        "v1.0".to_string(),
    ];
    harness.lock_driver().add_lock("alice").await.unwrap();

    let outcome = harness
        .orchestrator("alice")
        .abort(AbortOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.state, DeploymentState::Aborted);
    assert!(!outcome.diagnostics.has_warnings());
    assert_eq!(
        harness.vcs.repo.lock().resets,
        vec!["web-start-20240301-000000".to_string()]
    );
    assert!(!harness.lock_path().exists());
}

#[tokio::test]
async fn abort_releases_lock_even_when_reset_fails() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    harness.vcs.repo.lock().fail_reset = true;

    let outcome = orchestrator.abort(AbortOptions::default()).await.unwrap();

    let kinds: Vec<_> = outcome
        .diagnostics
        .warnings()
        .iter()
        .map(|w| w.kind)
        .collect();
    assert_eq!(kinds, vec![WarningKind::ResetFailed]);
    assert!(!harness.lock_path().exists());
    assert_eq!(orchestrator.state().await, DeploymentState::NotStarted);
}

#[tokio::test]
async fn abort_noreset_leaves_tree_alone() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    orchestrator
        .abort(AbortOptions {
            noreset: true,
            force: false,
        })
        .await
        .unwrap();

    assert!(harness.vcs.repo.lock().resets.is_empty());
    assert!(!harness.lock_path().exists());
}

#[tokio::test]
async fn abort_of_another_users_deployment_needs_force() {
    let harness = Harness::new();
    harness.orchestrator("bob").start().await.unwrap();
    let alice = harness.orchestrator("alice");

    let err = alice.abort(AbortOptions::default()).await.unwrap_err();
    assert_eq!(err.code(), 132);
    assert!(harness.lock_path().exists());

    alice
        .abort(AbortOptions {
            noreset: false,
            force: true,
        })
        .await
        .unwrap();
    assert!(!harness.lock_path().exists());
}

#[tokio::test]
async fn abort_of_unreadable_lock_warns_and_proceeds() {
    let harness = Harness::new();
    std::fs::create_dir_all(harness.lock_path().parent().unwrap()).unwrap();
    std::fs::write(harness.lock_path(), "garbage").unwrap();

    let outcome = harness
        .orchestrator("alice")
        .abort(AbortOptions {
            noreset: true,
            force: false,
        })
        .await
        .unwrap();

    assert_eq!(
        outcome.diagnostics.warnings()[0].kind,
        WarningKind::UnknownHolder
    );
    assert!(!harness.lock_path().exists());
}

// =============================================================================
// sync
// =============================================================================

#[tokio::test]
async fn sync_requires_a_started_deployment() {
    let harness = Harness::new();
    let err = harness
        .orchestrator("alice")
        .sync(SyncArgs::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), 160);
    assert!(harness.dispatcher.calls().is_empty());
}

#[tokio::test]
async fn sync_on_dirty_tree_fails_before_tagging() {
    let harness = Harness::with_answers([Answer::Yes, Answer::Yes]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    harness.vcs.repo.lock().dirty = true;

    let err = orchestrator.sync(SyncArgs::default()).await.unwrap_err();

    assert_eq!(err.code(), 161);
    assert!(harness.tags().iter().all(|t| !t.contains("-sync-")));
    assert!(harness.dispatcher.calls().is_empty());
    assert!(harness.lock_path().exists());
}

#[tokio::test]
async fn sync_reports_uninspectable_tree() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    harness.vcs.repo.lock().fail_status = true;

    let err = orchestrator.sync(SyncArgs::default()).await.unwrap_err();
    assert_eq!(err.code(), 162);
}

#[tokio::test]
async fn sync_tag_failure_has_its_own_code() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    harness.vcs.repo.lock().fail_tag = true;

    let err = orchestrator.sync(SyncArgs::default()).await.unwrap_err();
    assert_eq!(err.code(), 169);
    assert!(!harness.record_path().exists());
}

#[tokio::test]
async fn sync_rejected_at_fetch_never_checks_out() {
    let harness = Harness::with_answers([Answer::No]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    let err = orchestrator.sync(SyncArgs::default()).await.unwrap_err();

    assert_eq!(err.code(), 164);
    assert_eq!(harness.dispatcher.functions(), vec![FleetFunction::Fetch]);
    assert_eq!(harness.prompt.stages_asked(), vec![Stage::Fetch]);
    assert!(harness.lock_path().exists());
}

#[tokio::test]
async fn sync_rejected_at_checkout() {
    let harness = Harness::with_answers([Answer::Yes, Answer::No]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    let err = orchestrator.sync(SyncArgs::default()).await.unwrap_err();

    assert_eq!(err.code(), 165);
    assert_eq!(
        harness.dispatcher.functions(),
        vec![FleetFunction::Fetch, FleetFunction::Checkout]
    );
}

#[tokio::test]
async fn sync_dispatch_failure_is_a_sync_error() {
    let harness = Harness::with_answers([Answer::Yes, Answer::Yes]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    harness.dispatcher.fail();

    let err = orchestrator.sync(SyncArgs::default()).await.unwrap_err();
    assert_eq!(err.code(), 166);
    assert!(harness.prompt.stages_asked().is_empty());
}

#[tokio::test]
async fn sync_publishes_confirms_and_unlocks() {
    let harness = Harness::with_answers([Answer::Yes, Answer::Yes]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    let outcome = orchestrator.sync(SyncArgs { force: true }).await.unwrap();

    let tag = match outcome.state {
        DeploymentState::Synced(tag) => tag,
        other => panic!("unexpected state {other:?}"),
    };
    assert!(harness.tags().contains(&tag.name()));
    assert_eq!(
        harness.dispatcher.calls(),
        vec![
            (FleetFunction::Fetch, "web".to_string()),
            (FleetFunction::Checkout, "web,True".to_string()),
        ]
    );
    assert_eq!(harness.vcs.repo.lock().server_info_updates, 1);

    let record = DeployRecord::read(&harness.record_path()).await.unwrap();
    assert_eq!(record.tag, tag.name());
    assert_eq!(record.user, "alice");
    assert_eq!(record.sync_time, tag.timestamp());

    assert!(!harness.lock_path().exists());
    assert!(harness.lock_driver().check_lock().await.is_none());
}

#[tokio::test]
async fn retry_redispatches_the_stage() {
    let harness = Harness::with_answers([
        Answer::Retry,
        Answer::Detailed,
        Answer::Yes,
        Answer::Concise,
        Answer::Yes,
    ]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    orchestrator.sync(SyncArgs::default()).await.unwrap();

    assert_eq!(
        harness.dispatcher.functions(),
        vec![
            FleetFunction::Fetch,
            FleetFunction::Fetch,
            FleetFunction::Checkout
        ]
    );
    assert_eq!(
        harness.prompt.stages_asked(),
        vec![
            Stage::Fetch,
            Stage::Fetch,
            Stage::Fetch,
            Stage::Checkout,
            Stage::Checkout
        ]
    );
}

#[tokio::test]
async fn submodule_failures_do_not_stop_publication() {
    let mut harness = Harness::with_answers([Answer::Yes, Answer::Yes]);
    harness.checkout_submodules = true;
    {
        let mut repo = harness.vcs.repo.lock();
        repo.submodules = vec![PathBuf::from("/w/vendor/a"), PathBuf::from("/w/vendor/b")];
        repo.failing_submodules = vec![PathBuf::from("/w/vendor/a")];
    }
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    let outcome = orchestrator.sync(SyncArgs::default()).await.unwrap();

    let tag = match outcome.state {
        DeploymentState::Synced(tag) => tag.name(),
        other => panic!("unexpected state {other:?}"),
    };
    let repo = harness.vcs.repo.lock();
    assert_eq!(
        repo.submodule_tags,
        vec![(PathBuf::from("/w/vendor/b"), tag)]
    );
    assert_eq!(repo.submodule_server_info, vec![PathBuf::from("/w/vendor/b")]);
    assert_eq!(outcome.diagnostics.count(WarningKind::SubmodulePublish), 2);
}

// =============================================================================
// finish
// =============================================================================

#[tokio::test]
async fn finish_requires_a_started_deployment() {
    let harness = Harness::new();
    let err = harness.orchestrator("alice").finish().await.unwrap_err();
    assert_eq!(err.code(), 180);
    assert_eq!(err.kind(), OrchestratorErrorKind::InvalidState);
}

#[tokio::test]
async fn finish_releases_lock() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();

    let outcome = orchestrator.finish().await.unwrap();

    assert_eq!(outcome.state, DeploymentState::Finished);
    assert_eq!(orchestrator.state().await, DeploymentState::NotStarted);
}

// =============================================================================
// service
// =============================================================================

#[tokio::test]
async fn unknown_service_action_is_a_usage_error() {
    let harness = Harness::new();
    let err = harness
        .orchestrator("alice")
        .service("bounce", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 200);
    assert_eq!(err.kind(), OrchestratorErrorKind::Usage);
}

#[tokio::test]
async fn unimplemented_service_action() {
    let harness = Harness::new();
    let err = harness
        .orchestrator("alice")
        .service("stop", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 201);
    assert!(err.to_string().contains("not implemented by this driver"));
    assert!(harness.dispatcher.calls().is_empty());
}

#[tokio::test]
async fn restart_reports_each_node() {
    let harness = Harness::new();
    harness
        .dispatcher
        .reply_with(r#"{"local": {"n1": {"status": 0}, "n2": {}}}"#);

    let report = harness
        .orchestrator("alice")
        .service("restart", Some(BatchSpec::Percent(10)))
        .await
        .unwrap();

    assert_eq!(report.lines(), vec!["n1: 0", "n2: no status available"]);
    assert_eq!(
        harness.dispatcher.calls(),
        vec![(FleetFunction::Restart, "web,10%".to_string())]
    );
}

#[tokio::test]
async fn malformed_restart_reply() {
    let harness = Harness::new();
    harness.dispatcher.reply_with("Traceback (most recent call last)");

    let err = harness
        .orchestrator("alice")
        .service("restart", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 202);
}

// =============================================================================
// report
// =============================================================================

#[tokio::test]
async fn report_before_any_sync() {
    let harness = Harness::new();
    let err = harness
        .orchestrator("alice")
        .report(ReportKind::Sync, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 210);
}

#[tokio::test]
async fn report_uses_last_synced_tag() {
    let harness = Harness::with_answers([Answer::Yes, Answer::Yes]);
    let orchestrator = harness.orchestrator("alice");
    orchestrator.start().await.unwrap();
    let tag = match orchestrator.sync(SyncArgs::default()).await.unwrap().state {
        DeploymentState::Synced(tag) => tag.name(),
        other => panic!("unexpected state {other:?}"),
    };

    harness.store.set_field(&harness.repo, "n1", FETCH_TAG, tag.as_str());
    harness.store.set_field(&harness.repo, "n1", TAG, tag.as_str());
    harness.store.set_field(&harness.repo, "n2", FETCH_TAG, tag.as_str());
    harness.store.set_field(&harness.repo, "n3", FETCH_TAG, "web-sync-20200101-000000");

    let report = orchestrator.report(ReportKind::Sync, false).await.unwrap();
    assert_eq!(
        report.lines(),
        vec!["2/3 minions completed fetch", "1/3 minions completed checkout"]
    );
}

#[tokio::test]
async fn service_report_counts_restarts() {
    let harness = Harness::new();
    harness.store.set_field(&harness.repo, "n1", RESTART_STATUS, "0");
    harness.store.set_field(&harness.repo, "n2", RESTART_STATUS, "1");

    let report = harness
        .orchestrator("alice")
        .report(ReportKind::Service, true)
        .await
        .unwrap();

    assert_eq!(report.summaries[0].to_string(), "1/2 minions completed restart");
    assert_eq!(report.details.len(), 2);
    assert!(report.details[1].starts_with("n2: restart 1"));
}

#[tokio::test]
async fn corrupt_deploy_record_is_reported() {
    let harness = Harness::new();
    std::fs::create_dir_all(harness.record_path().parent().unwrap()).unwrap();
    std::fs::write(harness.record_path(), "{").unwrap();

    let err = harness
        .orchestrator("alice")
        .report(ReportKind::Sync, false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 210);
    assert!(err.to_string().contains("corrupt"));
}
