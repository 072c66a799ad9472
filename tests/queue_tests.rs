use chrono::Utc;
use spendsync::{
    HttpMethod, MutationPatch, MutationQueue, NewMutation, QueueError, SyncState,
};

fn sample(url: &str) -> NewMutation {
    NewMutation {
        url: url.to_string(),
        method: HttpMethod::Post,
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), "Bearer token-1".to_string()),
        ],
        body: Some(r#"{"amount":12.5,"description":"Coffee"}"#.to_string()),
        created_at: Utc::now(),
    }
}

fn open_queue(dir: &tempfile::TempDir) -> MutationQueue {
    MutationQueue::open(dir.path().join("queue.redb")).unwrap()
}

#[test]
fn test_enqueue_increments_count() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);

    assert_eq!(queue.count().unwrap(), 0);
    queue.enqueue(sample("http://localhost:3000/api/expenses/add")).unwrap();
    assert_eq!(queue.count().unwrap(), 1);
    queue.enqueue(sample("http://localhost:3000/api/expenses/add")).unwrap();
    assert_eq!(queue.count().unwrap(), 2);
}

#[test]
fn test_list_pending_is_insertion_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);

    let first = queue.enqueue(sample("http://host/api/a")).unwrap();
    let second = queue.enqueue(sample("http://host/api/b")).unwrap();
    let third = queue.enqueue(sample("http://host/api/c")).unwrap();
    assert!(first < second && second < third);

    let pending = queue.list_pending().unwrap();
    let ids: Vec<u64> = pending.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![first, second, third]);
    let urls: Vec<&str> = pending.iter().map(|m| m.url.as_str()).collect();
    assert_eq!(urls, vec!["http://host/api/a", "http://host/api/b", "http://host/api/c"]);
}

#[test]
fn test_round_trip_preserves_request_fields() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);

    let new = sample("http://localhost:3000/api/expenses/add");
    let id = queue.enqueue(new.clone()).unwrap();

    let stored = &queue.list_pending().unwrap()[0];
    assert_eq!(stored.id, id);
    assert_eq!(stored.url, new.url);
    assert_eq!(stored.method, new.method);
    assert_eq!(stored.headers, new.headers);
    assert_eq!(stored.body, new.body);
    assert_eq!(stored.sync_state, SyncState::Pending);
    assert_eq!(stored.retry_count, 0);
    assert_eq!(stored.failure_reason, None);
}

#[test]
fn test_update_bumps_retry_count() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);
    let id = queue.enqueue(sample("http://host/api/a")).unwrap();

    queue
        .update(
            id,
            MutationPatch {
                retry_count: Some(1),
                ..Default::default()
            },
        )
        .unwrap();

    let stored = queue.get(id).unwrap().unwrap();
    assert_eq!(stored.retry_count, 1);
    assert_eq!(stored.sync_state, SyncState::Pending);
}

#[test]
fn test_update_missing_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);

    let err = queue
        .update(42, MutationPatch::default())
        .unwrap_err();
    assert!(matches!(err, QueueError::NotFound(42)));
}

#[test]
fn test_delete_twice_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);
    let id = queue.enqueue(sample("http://host/api/a")).unwrap();

    queue.delete(id).unwrap();
    assert_eq!(queue.count().unwrap(), 0);
    // Second delete: no error, no state change.
    queue.delete(id).unwrap();
    assert_eq!(queue.count().unwrap(), 0);
}

#[test]
fn test_failed_entries_leave_pending_list_but_are_retained() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);
    let id = queue.enqueue(sample("http://host/api/a")).unwrap();

    queue
        .update(
            id,
            MutationPatch {
                sync_state: Some(SyncState::Failed),
                failure_reason: Some("authorization rejected: expired".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(queue.list_pending().unwrap().is_empty());
    let failed = queue.list_failed().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(
        failed[0].failure_reason.as_deref(),
        Some("authorization rejected: expired")
    );
    // Retained, not deleted.
    assert_eq!(queue.count().unwrap(), 1);
}

#[test]
fn test_requeue_failed_entry_gets_fresh_id_and_state() {
    let dir = tempfile::tempdir().unwrap();
    let queue = open_queue(&dir);
    let id = queue.enqueue(sample("http://host/api/a")).unwrap();
    queue
        .update(
            id,
            MutationPatch {
                retry_count: Some(3),
                sync_state: Some(SyncState::Failed),
                failure_reason: Some("network error".to_string()),
            },
        )
        .unwrap();

    let new_id = queue.requeue(id).unwrap();
    assert!(new_id > id);
    assert_eq!(queue.count().unwrap(), 1);

    let pending = queue.list_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, new_id);
    assert_eq!(pending[0].url, "http://host/api/a");
    assert_eq!(pending[0].sync_state, SyncState::Pending);
    assert_eq!(pending[0].retry_count, 0);
    assert_eq!(pending[0].failure_reason, None);

    assert!(matches!(
        queue.requeue(id).unwrap_err(),
        QueueError::NotFound(_)
    ));
}

#[test]
fn test_queue_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.redb");

    let first_id;
    {
        let queue = MutationQueue::open(&path).unwrap();
        first_id = queue.enqueue(sample("http://host/api/a")).unwrap();
        queue
            .update(
                first_id,
                MutationPatch {
                    retry_count: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let queue = MutationQueue::open(&path).unwrap();
    assert_eq!(queue.count().unwrap(), 1);

    let stored = queue.get(first_id).unwrap().unwrap();
    assert_eq!(stored.retry_count, 2);
    assert_eq!(stored.sync_state, SyncState::Pending);

    // The id counter continues past the persisted entries.
    let next_id = queue.enqueue(sample("http://host/api/b")).unwrap();
    assert!(next_id > first_id);
}
