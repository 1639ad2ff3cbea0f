//! Timing behavior of the expiring store: lazy expiry on reads, background
//! reaping, renewal, and shutdown.

use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use wicket_store::{Expiring, ExpiringStore, StoreError};
use wicket_types::Timestamp;

#[derive(Clone, Debug, PartialEq)]
struct Lease {
    id: Uuid,
    owner: Uuid,
    expires_at: Timestamp,
}

impl Lease {
    fn with_ttl(ttl: Duration) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner: Uuid::now_v7(),
            expires_at: Timestamp::now() + ttl,
        }
    }
}

impl Expiring for Lease {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner(&self) -> Uuid {
        self.owner
    }
    fn expires_at(&self) -> Timestamp {
        self.expires_at
    }
    fn set_expires_at(&mut self, at: Timestamp) {
        self.expires_at = at;
    }
}

fn store() -> (ExpiringStore<Lease>, broadcast::Sender<()>) {
    let (tx, rx) = broadcast::channel(1);
    (ExpiringStore::new(rx), tx)
}

/// Poll until the table no longer physically holds `id`, up to `bound`.
async fn reaped_within(store: &ExpiringStore<Lease>, id: Uuid, bound: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + bound;
    while tokio::time::Instant::now() < deadline {
        if !store.contains(id).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn get_hides_expired_record() {
    let (store, _guard) = store();
    let lease = Lease::with_ttl(Duration::from_millis(40));
    store.create(lease.clone()).await;

    assert!(store.get(lease.id).await.is_ok());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(store.get(lease.id).await, Err(StoreError::NotFound));
}

#[tokio::test]
async fn get_by_owner_hides_expired_record() {
    let (store, _guard) = store();
    let lease = Lease::with_ttl(Duration::from_millis(40));
    store.create(lease.clone()).await;

    assert!(store.get_by_owner(lease.owner).await.is_ok());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(
        store.get_by_owner(lease.owner).await,
        Err(StoreError::NotFound)
    );
}

#[tokio::test]
async fn expired_record_is_reaped_without_reads() {
    let (store, _guard) = store();
    let lease = Lease::with_ttl(Duration::from_millis(30));
    store.create(lease.clone()).await;

    // No read ever touches the record; the reaper alone must remove it.
    assert!(reaped_within(&store, lease.id, Duration::from_millis(500)).await);
    assert_eq!(store.len().await, 0);
}

#[tokio::test]
async fn renewed_record_survives_its_original_deadline() {
    let (store, _guard) = store();
    let lease = Lease::with_ttl(Duration::from_millis(100));
    store.create(lease.clone()).await;

    // Renew well past the original deadline before it fires.
    store
        .update(lease.id, Timestamp::now() + Duration::from_secs(10))
        .await
        .unwrap();

    // Past the original 100ms deadline the record must still be there:
    // the stale deadline fires, gets re-validated, and is discarded.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(store.get(lease.id).await.is_ok());
    assert!(store.contains(lease.id).await);
}

#[tokio::test]
async fn owner_keeps_only_latest_record() {
    let (store, _guard) = store();
    let owner = Uuid::now_v7();
    let mut latest = None;

    for _ in 0..4 {
        let lease = Lease {
            id: Uuid::now_v7(),
            owner,
            expires_at: Timestamp::now() + Duration::from_secs(60),
        };
        store.create(lease.clone()).await;
        assert_eq!(store.get_by_owner(owner).await.unwrap().id, lease.id);
        latest = Some(lease);
    }

    assert_eq!(store.len().await, 1);
    assert_eq!(
        store.get_by_owner(owner).await.unwrap().id,
        latest.unwrap().id
    );
}

#[tokio::test]
async fn reap_racing_explicit_delete_is_benign() {
    let (store, _guard) = store();
    let lease = Lease::with_ttl(Duration::from_millis(30));
    store.create(lease.clone()).await;
    store.delete(lease.id).await;

    // The deadline still fires against the now-absent id.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.len().await, 0);

    // The store keeps working afterwards.
    let next = Lease::with_ttl(Duration::from_secs(60));
    store.create(next.clone()).await;
    assert!(store.get(next.id).await.is_ok());
}

#[tokio::test]
async fn shutdown_stops_reaping_but_reads_stay_safe() {
    let (store, shutdown) = store();
    let lease = Lease::with_ttl(Duration::from_millis(40));
    store.create(lease.clone()).await;

    let _ = shutdown.send(());
    tokio::time::sleep(Duration::from_millis(120)).await;

    // No reaper anymore, so the record is physically still present …
    assert!(store.contains(lease.id).await);
    // … but reads refuse it and drop it lazily.
    assert_eq!(store.get(lease.id).await, Err(StoreError::NotFound));
    assert!(!store.contains(lease.id).await);
}
