use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use binp::Emitter;
use tokio::sync::mpsc;

#[tokio::test]
async fn detached_subscriber_observes_a_prefix() {
    let emitter: Emitter<u32> = Emitter::new();
    let mut stay = emitter.subscribe();
    let mut leave = emitter.subscribe();

    for v in 0..10 {
        if v == 4 {
            let mut prefix = Vec::new();
            while let Some(v) = leave.try_recv() {
                prefix.push(v);
            }
            assert_eq!(prefix, vec![0, 1, 2, 3]);
        }
        if v == 6 {
            drop(std::mem::replace(&mut leave, emitter.subscribe()));
        }
        emitter.emit(v);
    }

    let mut all = Vec::new();
    while let Some(v) = stay.try_recv() {
        all.push(v);
    }
    assert_eq!(all, (0..10).collect::<Vec<_>>());

    let mut late = Vec::new();
    while let Some(v) = leave.try_recv() {
        late.push(v);
    }
    assert_eq!(late, vec![6, 7, 8, 9]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_deliver_each_value_once() {
    const PRODUCERS: u32 = 4;
    const PER_PRODUCER: u32 = 250;

    let emitter: Emitter<(u32, u32)> = Emitter::new();
    let mut subs: Vec<_> = (0..3).map(|_| emitter.subscribe()).collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let emitter = emitter.clone();
            tokio::spawn(async move {
                for seq in 0..PER_PRODUCER {
                    emitter.emit((p, seq));
                    if seq % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.expect("producer finished");
    }

    let mut orders: Vec<Vec<(u32, u32)>> = Vec::new();
    for sub in &mut subs {
        let mut next_seq: HashMap<u32, u32> = HashMap::new();
        let mut seen = Vec::new();
        while let Some((p, seq)) = sub.try_recv() {
            let expected = next_seq.entry(p).or_insert(0);
            assert_eq!(seq, *expected, "producer {p} reordered");
            *expected += 1;
            seen.push((p, seq));
        }
        assert_eq!(seen.len(), (PRODUCERS * PER_PRODUCER) as usize);
        orders.push(seen);
    }
    assert!(orders.windows(2).all(|w| w[0] == w[1]), "subscribers disagree on order");
}

#[tokio::test]
async fn attach_multiplexes_typed_streams() {
    #[derive(Clone, Debug, PartialEq)]
    enum Update {
        Service(String),
        Journal(u64),
    }

    let services: Emitter<Update> = Emitter::new();
    let journals: Emitter<Update> = Emitter::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _s = services.attach(tx.clone());
    let _j = journals.attach(tx);

    services.emit(Update::Service("poller".into()));
    journals.emit(Update::Journal(7));

    assert_eq!(rx.recv().await, Some(Update::Service("poller".into())));
    assert_eq!(rx.recv().await, Some(Update::Journal(7)));
}

#[tokio::test]
async fn listeners_run_independently() {
    let emitter: Emitter<u8> = Emitter::new();
    let ok = Arc::new(AtomicUsize::new(0));

    let failing = emitter.listen_once("failing", |_| async { Err::<(), _>(anyhow::anyhow!("bad payload")) });
    let counter = ok.clone();
    let working = emitter.listen_once("working", move |v| async move {
        counter.fetch_add(v as usize, Ordering::SeqCst);
        Ok::<_, anyhow::Error>(())
    });

    emitter.emit(3);
    failing.await.expect("failure is logged, not raised");
    working.await.expect("listener completed");

    assert_eq!(ok.load(Ordering::SeqCst), 3);
    assert_eq!(emitter.subscriber_count(), 0);
}
