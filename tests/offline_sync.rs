use chrono::NaiveDate;
use nehemiah_sync::application::ports::remote_store::RemoteDataStore;
use nehemiah_sync::domain::entities::member::{BaptizedMemberDraft, Gender};
use nehemiah_sync::domain::entities::report::{Attendance, Offering, WorshipServiceDraft};
use nehemiah_sync::domain::value_objects::{record_id, RecordStatus};
use nehemiah_sync::{AppConfig, AppError, AppState};

async fn setup_state() -> AppState {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.simulation.latency_ms = 0;
    AppState::new(&config).await.expect("app state")
}

async fn setup_session(username: &str) -> AppState {
    let state = setup_state().await;
    state
        .session_service
        .login(username, "pw")
        .await
        .expect("login");
    state
}

fn report_draft(date: &str, speaker: &str) -> WorshipServiceDraft {
    WorshipServiceDraft {
        date: date.parse::<NaiveDate>().expect("date"),
        speaker: speaker.to_string(),
        president: "P".to_string(),
        attendance: Attendance {
            men: 5,
            women: 5,
            children: 0,
        },
        offering: Offering {
            tithes: 10.0,
            regular: 0.0,
            special: 0.0,
        },
    }
}

fn member_draft(name: &str) -> BaptizedMemberDraft {
    BaptizedMemberDraft {
        full_name: name.to_string(),
        gender: Gender::Unknown,
        date_of_birth: None,
        date_of_baptism: None,
        address: None,
        phone: "0102030405".to_string(),
        email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
        notes: None,
    }
}

#[tokio::test]
async fn offline_report_lands_with_canonical_id_after_sync() {
    let state = setup_session("church_1_admin").await;

    // Offline: one optimistic report and one queue entry carrying the
    // temporary id.
    let created = state
        .data_service
        .add_worship_service_offline("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();
    assert!(record_id::is_offline(&created.id));

    let data = state.snapshot.data().await.unwrap();
    let services = &data.church("church_1").unwrap().worship_services;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].status, RecordStatus::Offline);

    let queue = state.data_service.offline_queue().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].mutation.offline_id(), Some(created.id.as_str()));

    // Back online: one successful replay, empty queue, canonical id.
    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (1, 1));
    assert!(state.data_service.offline_queue().await.unwrap().is_empty());

    let data = state.snapshot.data().await.unwrap();
    let services = &data.church("church_1").unwrap().worship_services;
    assert_eq!(services.len(), 1, "no duplicate after reconciliation");
    assert!(!record_id::is_offline(&services[0].id));
    assert_eq!(services[0].status, RecordStatus::Pending);
}

#[tokio::test]
async fn offline_edit_of_synced_record_becomes_pending() {
    let state = setup_session("church_1_admin").await;

    let created = state
        .data_service
        .add_worship_service("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();

    let mut edited = created.clone();
    edited.speaker = "B".to_string();
    let patched = state
        .data_service
        .update_worship_service_offline("church_1", edited)
        .await
        .unwrap();
    assert_eq!(patched.status, RecordStatus::OfflineModified);

    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (1, 1));

    let data = state.snapshot.data().await.unwrap();
    let services = &data.church("church_1").unwrap().worship_services;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].speaker, "B");
    assert_eq!(services[0].status, RecordStatus::Pending);
}

#[tokio::test]
async fn syncing_one_scope_leaves_the_other_untouched() {
    let state = setup_session("national_admin").await;

    for i in 0..5 {
        state
            .data_service
            .add_worship_service_offline("church_1", report_draft("2024-01-15", &format!("S{i}")))
            .await
            .unwrap();
    }
    for name in ["Ama Kone", "Bintou Traore", "Chiaka Diarra"] {
        state
            .data_service
            .add_baptized_member_offline("church_2", member_draft(name))
            .await
            .unwrap();
    }

    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (5, 5));

    assert_eq!(state.data_service.pending_count("church_1").await.unwrap(), 0);
    assert_eq!(state.data_service.pending_count("church_2").await.unwrap(), 3);

    let data = state.snapshot.data().await.unwrap();
    assert!(data.church("church_2").unwrap().baptized_members.is_empty());
}

#[tokio::test]
async fn partial_failure_keeps_failed_entries_for_retry() {
    let state = setup_session("church_1_admin").await;

    // Two entries that will replay cleanly, one engineered to fail: it
    // deletes a record that no longer exists on the server.
    state
        .data_service
        .add_worship_service_offline("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();
    state
        .data_service
        .delete_worship_service_offline("church_1", "ws_already_gone")
        .await
        .unwrap();
    state
        .data_service
        .add_baptized_member_offline("church_1", member_draft("Ama Kone"))
        .await
        .unwrap();

    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (2, 3));
    assert!(!outcome.is_complete());

    let remaining = state.data_service.offline_queue().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].mutation.kind(), "DELETE_WORSHIP_SERVICE");

    // The snapshot still refreshed, so the two landed records show.
    let data = state.snapshot.data().await.unwrap();
    let church = data.church("church_1").unwrap();
    assert_eq!(church.worship_services.len(), 1);
    assert_eq!(church.baptized_members.len(), 1);
}

#[tokio::test]
async fn create_then_update_of_one_temp_id_yields_one_record() {
    let state = setup_session("church_1_admin").await;

    let created = state
        .data_service
        .add_worship_service_offline("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();
    let mut edited = created.clone();
    edited.speaker = "B".to_string();
    state
        .data_service
        .update_worship_service_offline("church_1", edited)
        .await
        .unwrap();

    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (2, 2));

    let data = state.snapshot.data().await.unwrap();
    let services = &data.church("church_1").unwrap().worship_services;
    assert_eq!(services.len(), 1, "update must land on the created record");
    assert!(!record_id::is_offline(&services[0].id));
    assert_eq!(services[0].speaker, "B");
    assert_eq!(services[0].status, RecordStatus::Pending);
}

#[tokio::test]
async fn create_then_delete_of_one_temp_id_leaves_nothing() {
    let state = setup_session("church_1_admin").await;

    let created = state
        .data_service
        .add_worship_service_offline("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();
    state
        .data_service
        .delete_worship_service_offline("church_1", &created.id)
        .await
        .unwrap();

    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (2, 2));

    let data = state.snapshot.data().await.unwrap();
    assert!(data.church("church_1").unwrap().worship_services.is_empty());
}

#[tokio::test]
async fn validated_report_is_immutable() {
    let state = setup_session("national_admin").await;

    let created = state
        .data_service
        .add_worship_service("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();
    state
        .data_service
        .validate_worship_service("church_1", &created.id)
        .await
        .unwrap();

    let err = state
        .data_service
        .update_worship_service("church_1", created.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Consistency(_)));

    let err = state
        .data_service
        .delete_worship_service("church_1", &created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Consistency(_)));

    let data = state.snapshot.data().await.unwrap();
    let stored = &data.church("church_1").unwrap().worship_services[0];
    assert_eq!(stored.status, RecordStatus::Validated);
}

#[tokio::test]
async fn refresh_is_idempotent_against_canonical_state() {
    let state = setup_session("church_1_admin").await;

    state
        .data_service
        .add_worship_service("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();
    state
        .data_service
        .add_baptized_member("church_1", member_draft("Ama Kone"))
        .await
        .unwrap();

    let first = state.snapshot.full().await.unwrap();
    state.data_service.refresh().await.unwrap();
    let second = state.snapshot.full().await.unwrap();
    assert_eq!(first, second);

    // A server rebuilt from the same durable blobs reports the same
    // canonical state.
    let rebuilt = nehemiah_sync::infrastructure::server::ServerSimulator::bootstrap(
        state.durable.clone(),
        0,
    )
    .await
    .unwrap();
    let replayed = rebuilt.get_full_snapshot().await.unwrap();
    assert_eq!(replayed, second);
}

#[tokio::test]
async fn sync_refuses_to_run_while_disconnected() {
    let state = setup_session("church_1_admin").await;
    state
        .data_service
        .add_worship_service_offline("church_1", report_draft("2024-01-15", "A"))
        .await
        .unwrap();

    state.connectivity.set_online(false);
    let err = state.sync_service.sync_scope("church_1").await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
    assert_eq!(state.data_service.pending_count("church_1").await.unwrap(), 1);

    state.connectivity.set_online(true);
    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (1, 1));
}

#[tokio::test]
async fn empty_queue_sync_returns_zero_without_server_contact() {
    let state = setup_session("church_1_admin").await;

    // A transport failure would surface if the engine contacted the
    // server for an empty scope.
    state.remote.set_transport_failure(true);
    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (0, 0));
    state.remote.set_transport_failure(false);
}

#[tokio::test]
async fn queue_survives_process_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("nehemiah.db").display()
    );
    let mut config = AppConfig::default();
    config.database.url = url.clone();
    config.database.max_connections = 1;
    config.simulation.latency_ms = 0;

    {
        let state = AppState::new(&config).await.expect("first boot");
        state
            .session_service
            .login("church_1_admin", "pw")
            .await
            .unwrap();
        state
            .data_service
            .add_worship_service_offline("church_1", report_draft("2024-01-15", "A"))
            .await
            .unwrap();
        state.db_pool.close().await;
    }

    let state = AppState::new(&config).await.expect("second boot");
    assert_eq!(state.data_service.pending_count("church_1").await.unwrap(), 1);

    state
        .session_service
        .login("church_1_admin", "pw")
        .await
        .unwrap();
    let outcome = state.sync_service.sync_scope("church_1").await.unwrap();
    assert_eq!((outcome.success_count, outcome.total_count), (1, 1));
}

#[tokio::test]
async fn logout_tears_the_snapshot_down() {
    let state = setup_session("church_1_admin").await;
    assert!(state.snapshot.is_loaded().await);

    state.session_service.logout().await.unwrap();
    assert!(!state.snapshot.is_loaded().await);
    assert!(state
        .session_service
        .current_user()
        .await
        .unwrap()
        .is_none());
}
