use std::error::Error;
use std::time::Duration;

use soloist_test_utils::builders::LeaseBuilder;
use soloist_test_utils::{MemoryStore, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn exactly_one_winner_among_concurrent_acquires() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();

    let mut handles = Vec::new();
    for i in 0..5 {
        let lease = LeaseBuilder::new(&store)
            .token(&format!("node-{i}"))
            .ttl(Duration::from_millis(900))
            .build();
        handles.push(tokio::spawn(async move {
            let won = lease.acquire(false).await.unwrap();
            (lease.token().to_string(), won)
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        let (token, won) = handle.await?;
        if won {
            winners.push(token);
        }
    }
    assert_eq!(winners.len(), 1, "expected exactly one winner, got {winners:?}");

    // Everyone else observes the winner through who().
    let probe = LeaseBuilder::new(&store).token("probe").build();
    assert_eq!(probe.who().await?, Some(winners[0].clone()));

    Ok(())
}

#[tokio::test]
async fn three_nodes_racing_leave_two_blocked() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let ttl = Duration::from_millis(900);

    let first = LeaseBuilder::new(&store).token("node-1").ttl(ttl).build();
    assert!(first.acquire(true).await?);

    let second = LeaseBuilder::new(&store).token("node-2").ttl(ttl).build();
    let third = LeaseBuilder::new(&store).token("node-3").ttl(ttl).build();
    let h2 = tokio::spawn(async move { second.acquire(true).await });
    let h3 = tokio::spawn(async move { third.acquire(true).await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!h2.is_finished(), "node-2 should still be blocked in acquisition");
    assert!(!h3.is_finished(), "node-3 should still be blocked in acquisition");
    assert_eq!(first.who().await?, Some("node-1".to_string()));

    h2.abort();
    h3.abort();
    Ok(())
}

#[tokio::test]
async fn renewal_keeps_lease_alive_and_silence_expires_it() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let lease = LeaseBuilder::new(&store)
        .token("holder")
        .ttl(Duration::from_millis(120))
        .build();
    assert!(lease.acquire(false).await?);

    // Keep renewing well past the original TTL window.
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(lease.renew().await?, "renewal should succeed while we own the key");
    }
    assert_eq!(lease.who().await?, Some("holder".to_string()));

    // Stop renewing; the lease lapses.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(lease.who().await?, None);

    Ok(())
}

#[tokio::test]
async fn renew_from_non_owner_fails_and_mutates_nothing() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let owner = LeaseBuilder::new(&store)
        .token("owner")
        .ttl(Duration::from_millis(500))
        .build();
    assert!(owner.acquire(false).await?);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let (_, remaining_before) = store.raw_get(owner.key()).expect("entry should be live");

    let intruder = LeaseBuilder::new(&store)
        .token("intruder")
        .ttl(Duration::from_millis(500))
        .build();
    assert!(!intruder.renew().await?);

    let (value, remaining_after) = store.raw_get(owner.key()).expect("entry should still be live");
    assert_eq!(value, "owner");
    assert!(
        remaining_after <= remaining_before,
        "a failed renewal must not extend the TTL"
    );

    Ok(())
}

#[tokio::test]
async fn nonblocking_reacquire_of_expired_key_has_one_winner() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let original = LeaseBuilder::new(&store)
        .token("original")
        .ttl(Duration::from_millis(60))
        .build();
    assert!(original.acquire(false).await?);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(original.who().await?, None, "lease should have expired");

    let mut handles = Vec::new();
    for i in 0..4 {
        let lease = LeaseBuilder::new(&store)
            .token(&format!("racer-{i}"))
            .ttl(Duration::from_millis(500))
            .build();
        handles.push(tokio::spawn(async move { lease.acquire(false).await }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await?? {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);

    Ok(())
}

#[tokio::test]
async fn blocking_acquire_waits_out_the_current_holder() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let holder = LeaseBuilder::new(&store)
        .token("holder")
        .ttl(Duration::from_millis(100))
        .build();
    assert!(holder.acquire(false).await?);

    // The holder never renews, so the waiter gets its turn within one TTL.
    let waiter = LeaseBuilder::new(&store)
        .token("waiter")
        .ttl(Duration::from_millis(500))
        .build();
    assert!(with_timeout(waiter.acquire(true)).await?);
    assert_eq!(waiter.who().await?, Some("waiter".to_string()));

    Ok(())
}
