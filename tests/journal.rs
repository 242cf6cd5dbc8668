use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use binp::{JournalId, Journals, MemoryJournalStore, SearchQuery};
use serde_json::json;
use tokio::sync::oneshot;

fn journals() -> Journals {
    Journals::new(Arc::new(MemoryJournalStore::new()))
}

async fn traced_id(journals: &Journals, operation: &str) -> JournalId {
    journals
        .trace(operation, "", |ctx| async move { Ok::<_, anyhow::Error>(ctx.id()) })
        .await
        .expect("trace succeeds")
}

#[tokio::test(start_paused = true)]
async fn trace_finishes_journal() {
    let journals = journals();

    let id = journals
        .trace("sample", "Some description", |ctx| async move {
            tokio::time::sleep(Duration::from_millis(15)).await;
            Ok::<_, anyhow::Error>(ctx.id())
        })
        .await
        .expect("trace succeeds");
    assert!(id > 0);

    let journal = journals.get(id).await.expect("store").expect("journal exists");
    let head = journal.headline;
    assert_eq!(head.operation, "sample");
    assert_eq!(head.description, "Some description");
    assert!(head.finished_at.is_some_and(|end| end >= head.started_at));
    assert!(head.error.is_none());
    assert!(head.duration.is_some_and(|d| d >= 0.015));
}

#[tokio::test]
async fn history_contains_traced_ids() {
    let journals = journals();
    let mut ids = HashSet::new();
    for _ in 0..3 {
        ids.insert(traced_id(&journals, "sample").await);
    }

    let history: HashSet<_> = journals.history(0).await.expect("store").iter().map(|h| h.id).collect();
    assert_eq!(history, ids);
}

#[tokio::test]
async fn history_pages_newest_first() {
    let journals = journals().with_page_size(2);
    let a = traced_id(&journals, "a").await;
    let b = traced_id(&journals, "b").await;
    let c = traced_id(&journals, "c").await;

    let first: Vec<_> = journals.history(0).await.expect("store").iter().map(|h| h.id).collect();
    let second: Vec<_> = journals.history(1).await.expect("store").iter().map(|h| h.id).collect();
    assert_eq!(first, vec![c, b]);
    assert_eq!(second, vec![a]);

    let window: Vec<_> = journals.history_range(1, 5).await.expect("store").iter().map(|h| h.id).collect();
    assert_eq!(window, vec![b, a]);
}

#[tokio::test]
async fn records_are_newest_first_with_params() {
    let journals = journals();

    let id = journals
        .trace("sample", "", |ctx| async move {
            ctx.record("some message 1", json!({ "stage": "init" })).await?;
            ctx.record("some message 2", json!({ "stage": "working" })).await?;
            ctx.record("some message 3", json!({ "stage": "complete", "profit": -1 })).await?;
            ctx.record("no params", ()).await?;
            Ok::<_, anyhow::Error>(ctx.id())
        })
        .await
        .expect("trace succeeds");

    let records = journals.get(id).await.expect("store").expect("journal exists").records;
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].message, "no params");
    assert!(records[0].params.is_empty());
    assert_eq!(records[1].message, "some message 3");
    assert_eq!(json!(records[1].params), json!({ "stage": "complete", "profit": -1 }));
    assert_eq!(records[2].message, "some message 2");
    assert_eq!(json!(records[2].params), json!({ "stage": "working" }));
    assert_eq!(records[3].message, "some message 1");
    assert_eq!(json!(records[3].params), json!({ "stage": "init" }));
}

#[tokio::test]
async fn labels_are_merged() {
    let journals = journals();

    let id = journals
        .trace("sample", "", |ctx| async move {
            ctx.labels(["foo", "bar"]).await?;
            ctx.labels(["zoo", "foo"]).await?;
            Ok::<_, anyhow::Error>(ctx.id())
        })
        .await
        .expect("trace succeeds");

    let head = journals.get(id).await.expect("store").expect("journal exists").headline;
    assert_eq!(head.labels, vec!["bar", "foo", "zoo"]);
}

#[tokio::test]
async fn errors_are_recorded_and_returned() {
    let journals = journals();
    let mut updates = journals.journal_updated().subscribe();

    let err = journals
        .trace("failing", "", |_ctx| async { Err::<(), _>(anyhow::anyhow!("boooo")) })
        .await
        .expect_err("error is returned");
    assert_eq!(err.to_string(), "boooo");

    let id = updates.recv().await.expect("begin");
    assert_eq!(updates.recv().await, Some(id));

    let head = journals.get(id).await.expect("store").expect("journal exists").headline;
    assert_eq!(head.error.as_deref(), Some("boooo"));
    assert!(head.finished_at.is_some());
}

#[tokio::test]
async fn panics_are_recorded_and_resumed() {
    let journals = journals();
    let traced = journals.clone();

    let joined = tokio::spawn(async move {
        traced
            .trace("explodes", "", |_ctx| async {
                let armed = true;
                assert!(!armed, "kaboom");
                Ok::<_, anyhow::Error>(())
            })
            .await
    })
    .await;
    assert!(joined.expect_err("panic is resumed").is_panic());

    let failed = journals
        .search(&SearchQuery::default().with_failed(true))
        .await
        .expect("store");
    assert_eq!(failed.len(), 1);
    assert!(failed[0].error.as_deref().is_some_and(|e| e.contains("kaboom")));
}

#[tokio::test]
async fn record_added_fires_for_records_and_labels() {
    let journals = journals();
    let mut added = journals.record_added().subscribe();

    let id = journals
        .trace("sample", "", |ctx| async move {
            ctx.record("hello", ()).await?;
            ctx.labels(["x"]).await?;
            Ok::<_, anyhow::Error>(ctx.id())
        })
        .await
        .expect("trace succeeds");

    assert_eq!(added.try_recv(), Some(id));
    assert_eq!(added.try_recv(), Some(id));
    assert_eq!(added.try_recv(), None);
}

#[tokio::test]
async fn search_filters() {
    let journals = journals();

    for _ in 0..2 {
        journals
            .trace("sample", "", |ctx| async move {
                ctx.labels(["alfa", "beta"]).await?;
                Ok::<_, anyhow::Error>(())
            })
            .await
            .expect("trace succeeds");
    }
    let _ = journals
        .trace("failed", "", |ctx| async move {
            ctx.labels(["alfa", "gamma"]).await?;
            Err::<(), _>(anyhow::anyhow!("boooo"))
        })
        .await;

    let (started_tx, started_rx) = oneshot::channel();
    let pending_journals = journals.clone();
    let pending = tokio::spawn(async move {
        pending_journals
            .trace("pending", "", |_ctx| async move {
                let _ = started_tx.send(());
                std::future::pending::<()>().await;
                Ok::<_, anyhow::Error>(())
            })
            .await
    });
    started_rx.await.expect("pending operation started");

    let search = |query: SearchQuery| {
        let journals = journals.clone();
        async move { journals.search(&query).await.expect("store") }
    };
    let operations = |found: &[binp::Headline]| found.iter().map(|h| h.operation.clone()).collect::<HashSet<_>>();

    let found = search(SearchQuery::default().with_operation("sample")).await;
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|h| h.operation == "sample"));

    let found = search(SearchQuery::default().with_failed(true)).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].operation, "failed");

    let found = search(SearchQuery::default().with_failed(false)).await;
    assert_eq!(found.len(), 3);

    let found = search(SearchQuery::default().with_pending(true)).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].operation, "pending");

    let found = search(SearchQuery::default().with_pending(false)).await;
    assert_eq!(found.len(), 3);
    assert_eq!(operations(&found), HashSet::from(["sample".to_string(), "failed".to_string()]));

    let found = search(SearchQuery::default().with_labels(["alfa"])).await;
    assert_eq!(found.len(), 3);
    assert_eq!(operations(&found), HashSet::from(["sample".to_string(), "failed".to_string()]));

    let found = search(SearchQuery::default().with_page(1, 2)).await;
    assert_eq!(found.len(), 2);

    pending.abort();
    let _ = pending.await;
    assert_eq!(journals.remove_dead().await.expect("store"), 1);
    assert!(search(SearchQuery::default().with_pending(true)).await.is_empty());
}

#[tokio::test]
async fn search_defaults_to_configured_page_size() {
    let journals = journals().with_page_size(2);
    for op in ["a", "b", "c"] {
        traced_id(&journals, op).await;
    }

    let page = journals.search(&SearchQuery::default()).await.expect("store");
    let ops: Vec<_> = page.iter().map(|h| h.operation.as_str()).collect();
    assert_eq!(ops, vec!["c", "b"]);

    let wide = journals.search(&SearchQuery::default().with_page(0, 10)).await.expect("store");
    assert_eq!(wide.len(), 3);
}
