use std::collections::HashSet;
use std::sync::Arc;

use binp::{Kv, KvStore, MemoryKvStore};
use serde::{Deserialize, Serialize};
use serde_json::json;

fn kv(namespace: &str) -> (Kv, Arc<MemoryKvStore>) {
    let store = Arc::new(MemoryKvStore::new());
    (Kv::new(store.clone(), namespace), store)
}

#[tokio::test]
async fn set_stores_json_values() {
    let (kv, store) = kv("default");
    kv.set([
        ("a", json!(1)),
        ("b", json!(true)),
        ("c", json!(0.3)),
        ("d", json!("hello world")),
    ])
    .await
    .expect("set");

    let mut raw = Vec::new();
    for key in ["a", "b", "c", "d"] {
        raw.push(store.get("default", key).await.expect("get").expect("present").to_string());
    }
    assert_eq!(raw, vec!["1", "true", "0.3", "\"hello world\""]);
}

#[tokio::test]
async fn set_replaces_existing_value() {
    let (kv, _) = kv("default");
    kv.insert("foo", &"bar").await.expect("insert");
    kv.insert("foo", &"zee").await.expect("insert");
    assert_eq!(kv.get::<String>("foo").await.expect("get").as_deref(), Some("zee"));
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let (kv_a, store) = kv("a");
    let kv_b = kv_a.select("b");
    kv_a.insert("spam", &"bar").await.expect("insert");
    kv_b.insert("spam", &"zee").await.expect("insert");

    assert_eq!(store.get("a", "spam").await.expect("get"), Some(json!("bar")));
    assert_eq!(store.get("b", "spam").await.expect("get"), Some(json!("zee")));
    assert_eq!(kv_b.namespace(), "b");
}

#[tokio::test]
async fn remove_deletes_keys() {
    let (kv, _) = kv("default");
    kv.set([("foo", "bar"), ("keep", "me")]).await.expect("set");
    assert_eq!(kv.get_value("foo").await.expect("get"), Some(json!("bar")));

    kv.remove(["foo", "missing"]).await.expect("remove");
    assert_eq!(kv.get_value("foo").await.expect("get"), None);
    assert_eq!(kv.get::<String>("keep").await.expect("get").as_deref(), Some("me"));
}

#[tokio::test]
async fn save_and_load_by_type() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        uid: u64,
    }

    let (kv, store) = kv("default");
    let user = User {
        name: "Foo Bar".into(),
        uid: 123,
    };
    kv.save(&user).await.expect("save");

    assert_eq!(kv.load::<User>().await.expect("load"), Some(user));
    assert!(store.get("default", "User").await.expect("get").is_some());
}

#[tokio::test]
async fn wrong_type_is_a_serialize_error() {
    let (kv, _) = kv("default");
    kv.insert("count", &"not a number").await.expect("insert");
    let err = kv.get::<u32>("count").await.expect_err("type mismatch");
    assert_eq!(err.as_label(), "store_serialize");
}

#[tokio::test]
async fn namespaces_lists_every_used_namespace() {
    let (alfa, _) = kv("alfa");
    let beta = alfa.select("beta");
    alfa.insert("foo", &"bar").await.expect("insert");
    beta.insert("foo", &"bar").await.expect("insert");

    let names: HashSet<_> = beta.namespaces().await.expect("namespaces").into_iter().collect();
    assert_eq!(names, HashSet::from(["alfa".to_string(), "beta".to_string()]));
}
