//! Live updates through the engine facade with an in-process feed.

use std::sync::Arc;
use std::time::Duration;

use blocktime_core::traits::{BlockFeed, BlockSource};
use blocktime_core::types::{ReferencePoint, Resolution};
use blocktime_engine::{BlockTime, EngineConfig, ListenerState};
use blocktime_source::ChannelFeed;
use blocktime_tests::helpers::{MockSource, SyntheticChain};

const TIP: u64 = 1_000;

fn setup() -> (Arc<MockSource>, Arc<ChannelFeed>, BlockTime) {
    let source = Arc::new(MockSource::new(SyntheticChain::new(TIP)));
    let feed = Arc::new(ChannelFeed::new());
    let chain = source.chain().clone();

    let dyn_source: Arc<dyn BlockSource> = source.clone();
    let dyn_feed: Arc<dyn BlockFeed> = feed.clone();
    let engine = BlockTime::with_index(
        &EngineConfig::default(),
        chain.sparse_index(&[0, 500]),
        Some(dyn_source),
        Some(dyn_feed),
    );
    (source, feed, engine)
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}

#[tokio::test]
async fn start_syncs_then_listens() {
    let (source, feed, engine) = setup();
    assert_eq!(engine.listener_state(), Some(ListenerState::Idle));

    engine.start().await.unwrap();
    assert_eq!(source.calls(), 1);
    assert!(engine.is_listening());
    assert!(feed.is_connected());
    assert_eq!(engine.history().read().frontier(), Some(source.chain().point(TIP)));
}

#[tokio::test]
async fn announced_blocks_resolve_without_fetching() {
    let (source, feed, engine) = setup();
    engine.start().await.unwrap();
    let calls = source.calls();

    let tip_ts = source.chain().timestamp(TIP);
    let next = ReferencePoint::new(TIP + 1, tip_ts + 600);
    let after = ReferencePoint::new(TIP + 2, tip_ts + 1_200);
    assert!(feed.announce(vec![next]));
    assert!(feed.announce(vec![after]));

    wait_until(|| engine.history().read().frontier() == Some(after)).await;
    assert_eq!(engine.resolve(tip_ts + 700).await.unwrap(), Resolution::Resolved(TIP + 1));
    assert_eq!(engine.resolve(tip_ts + 9_999).await.unwrap(), Resolution::Resolved(TIP + 2));
    assert_eq!(source.calls(), calls);
}

#[tokio::test]
async fn closed_feed_stays_disconnected_until_listen() {
    let (_, feed, engine) = setup();
    engine.listen().await.unwrap();

    feed.disconnect();
    wait_until(|| engine.listener_state() == Some(ListenerState::Disconnected)).await;
    assert!(!engine.is_listening());

    // Announcements are dropped while disconnected.
    assert!(!feed.announce(vec![ReferencePoint::new(2_000, 2_000_000_000)]));

    engine.listen().await.unwrap();
    assert_eq!(engine.listener_state(), Some(ListenerState::Listening));
    assert!(feed.announce(vec![ReferencePoint::new(2_000, 2_000_000_000)]));
    wait_until(|| engine.history().read().contains_height(2_000)).await;
}

#[tokio::test]
async fn stop_listening_is_final_until_listen() {
    let (_, feed, engine) = setup();
    engine.listen().await.unwrap();
    engine.stop_listening().await;
    assert_eq!(engine.listener_state(), Some(ListenerState::Stopped));
    wait_until(|| !feed.is_connected()).await;
}

#[tokio::test]
async fn going_offline_keeps_the_listener() {
    let (_, feed, engine) = setup();
    engine.listen().await.unwrap();
    engine.go_offline();
    assert!(!engine.is_online());
    assert!(engine.is_listening());

    assert!(feed.announce(vec![ReferencePoint::new(3_000, 2_100_000_000)]));
    wait_until(|| engine.history().read().contains_height(3_000)).await;
}
