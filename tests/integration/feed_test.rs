//! End-to-end test: push frames through the client into the feed.

use std::sync::Arc;

use beacon_core::config::FeedConfig;
use beacon_feed::{LogNotifier, MemoryReadStateStore, NotificationFeed};
use beacon_realtime::PushClient;

use crate::helpers::{StubApi, TestServer, fast_realtime, wait_for};

#[tokio::test]
async fn test_push_events_flow_into_the_feed() {
    let mut server = TestServer::spawn().await;
    let client = Arc::new(PushClient::new(server.api_config(), fast_realtime()));
    let feed = Arc::new(NotificationFeed::new(
        FeedConfig::default(),
        Arc::new(StubApi),
        Arc::new(MemoryReadStateStore::new()),
        Arc::new(LogNotifier),
    ));

    feed.attach(&client);
    client.connect("tok").await.expect("connect");
    let mut conn = server.next_conn().await;

    conn.send_json(serde_json::json!({
        "type": "new_welfare_report",
        "data": {
            "report_id": 9,
            "first_name": "Ada",
            "last_name": "Reyes",
            "additional_info": "trapped upstairs"
        }
    }))
    .await;

    wait_for(|| feed.merged().len() == 1).await;
    let merged = feed.merged();
    assert_eq!(merged[0].id, "welfare_9");
    assert_eq!(merged[0].title, "Ada Reyes");
    assert_eq!(feed.unread_count(), 1);
    assert_eq!(feed.priority_count(), 1);
    assert_eq!(feed.toasts().len(), 1);

    feed.mark_read("welfare_9");
    assert_eq!(feed.unread_count(), 0);

    // An update merges into the same item instead of appending.
    conn.send_json(serde_json::json!({
        "type": "welfare_updated",
        "data": {"report_id": 9, "description": "safe now"}
    }))
    .await;

    wait_for(|| feed.merged()[0].message == "safe now").await;
    assert_eq!(feed.merged().len(), 1);

    client.disconnect();
}
