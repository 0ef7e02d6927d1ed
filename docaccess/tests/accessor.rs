use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use docaccess::{
    memory::InMemoryStore,
    prelude::*,
    query::{FieldLookup, FindOptions, WriteSummary},
};
use serde_json::json;

const DB: &str = "app";
const USERS: &str = "users";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn store() -> DocumentStore<InMemoryStore> {
    init_tracing();
    DocumentStore::new(InMemoryStore::builder().build().await.unwrap())
}

async fn seeded() -> DocumentStore<InMemoryStore> {
    let store = store().await;
    let users = store.collection(DB, USERS);
    for (name, age) in [("Ann", 31), ("Bob", 25), ("Cid", 40), ("Dee", 25)] {
        users.insert_one(datamap! { "name" => name, "age" => age }).await.unwrap();
    }
    store
}

fn hex(id: &Value) -> String {
    id.as_object_id().unwrap().to_hex()
}

fn names(documents: &[DataMap]) -> Vec<String> {
    documents
        .iter()
        .map(|doc| doc.get("name").map(Value::to_text).unwrap_or_default())
        .collect()
}

/// A backend whose every call fails, standing in for an unreachable store.
#[derive(Debug)]
struct BrokenBackend;

fn broken<T>() -> AccessResult<T> {
    Err(AccessError::Backend("connection reset by peer".into()))
}

#[async_trait]
impl StoreBackend for BrokenBackend {
    async fn insert_one(&self, _: &Namespace, _: DataMap) -> AccessResult<Value> {
        broken()
    }

    async fn update_one(&self, _: &Namespace, _: &DataMap, _: DataMap) -> AccessResult<WriteSummary> {
        broken()
    }

    async fn delete_one(&self, _: &Namespace, _: &DataMap) -> AccessResult<WriteSummary> {
        broken()
    }

    async fn find_one(&self, _: &Namespace, _: &DataMap) -> AccessResult<Option<DataMap>> {
        broken()
    }

    async fn find(&self, _: &Namespace, _: &DataMap, _: FindOptions) -> AccessResult<Vec<DataMap>> {
        broken()
    }

    async fn count(&self, _: &Namespace, _: &DataMap) -> AccessResult<u64> {
        broken()
    }

    async fn field_value(&self, _: &Namespace, _: &FieldLookup) -> AccessResult<Option<Value>> {
        broken()
    }
}

#[tokio::test]
async fn inserted_documents_read_back_equal() {
    let store = store().await;
    let users = store.collection(DB, USERS);
    let document = datamap! {
        "name" => "Ann",
        "age" => 31,
        "score" => 4.5,
        "active" => true,
        "tags" => vec!["admin", "ops"],
        "address" => datamap! { "city" => "Oslo" },
        "manager" => Value::Null,
    };

    let id = users.insert_one(document.clone()).await.unwrap();
    let found = users.find_one_by_id(&hex(&id)).await.unwrap();

    let mut expected = document;
    expected.insert("_id".into(), id);
    assert_eq!(found, expected);
}

#[tokio::test]
async fn caller_supplied_ids_are_kept() {
    let store = store().await;
    let users = store.collection(DB, USERS);
    let id = ObjectId::new();

    let inserted = users.insert_one(datamap! { "_id" => id, "name" => "Ann" }).await.unwrap();

    assert_eq!(inserted, Value::ObjectId(id));
    assert!(users.exists(&datamap! { "_id" => id }).await);
}

#[tokio::test]
async fn duplicate_keys_surface_the_store_error() {
    let store = store().await;
    let users = store.collection(DB, USERS);
    let id = ObjectId::new();

    users.insert_one(datamap! { "_id" => id }).await.unwrap();
    let err = users.insert_one(datamap! { "_id" => id }).await.unwrap_err();

    assert!(matches!(err, AccessError::Backend(ref msg) if msg.contains("duplicate key")));
}

#[tokio::test]
async fn json_payloads_can_be_inserted() {
    let store = store().await;
    let users = store.collection(DB, USERS);
    let payload = match Value::from(json!({ "name": "Eve", "langs": ["rust", "go"], "level": 3 })) {
        Value::Map(map) => map,
        other => panic!("expected a map, got {other:?}"),
    };

    users.insert_one(payload).await.unwrap();

    assert_eq!(users.get_field_value(&datamap! { "langs" => "rust" }, "level").await.unwrap(), "3");
}

#[tokio::test]
async fn update_merges_fields_and_preserves_the_rest() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    users
        .update_one(datamap! { "age" => 32, "role" => "lead" }, &datamap! { "name" => "Ann" })
        .await
        .unwrap();

    let ann = users.find_one(&datamap! { "name" => "Ann" }).await.unwrap();
    assert_eq!(ann.get("age"), Some(&Value::Int32(32)));
    assert_eq!(ann.get("role"), Some(&Value::from("lead")));
    assert!(ann.contains_key("_id"));
}

#[tokio::test]
async fn update_touches_only_the_first_match() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    users
        .update_one(datamap! { "flag" => true }, &datamap! { "age" => 25 })
        .await
        .unwrap();

    assert_eq!(users.count_rows(&datamap! { "flag" => true }).await.unwrap(), 1);
}

#[tokio::test]
async fn update_by_id_targets_that_document() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);
    let bob = users.find_one(&datamap! { "name" => "Bob" }).await.unwrap();
    let bob_id = hex(bob.get("_id").unwrap());

    users.update_one_by_id(datamap! { "age" => 26 }, &bob_id).await.unwrap();

    assert_eq!(users.get_field_value_by_id(&bob_id, "age").await.unwrap(), "26");
    assert_eq!(users.get_field_value(&datamap! { "name" => "Dee" }, "age").await.unwrap(), "25");
}

// Zero matches are reported as success with no effect.
#[tokio::test]
async fn zero_match_writes_succeed_without_effect() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);
    let before = users.find(&datamap! {}, &[], 0).await.unwrap();

    users
        .update_one(datamap! { "age" => 99 }, &datamap! { "name" => "Nobody" })
        .await
        .unwrap();
    users.delete_one(&datamap! { "name" => "Nobody" }).await.unwrap();
    users.update_one_by_id(datamap! { "age" => 99 }, &ObjectId::new().to_hex()).await.unwrap();
    users.delete_one_by_id(&ObjectId::new().to_hex()).await.unwrap();

    assert_eq!(users.find(&datamap! {}, &[], 0).await.unwrap(), before);
}

#[tokio::test]
async fn zero_match_writes_on_missing_collections_succeed() {
    let store = store().await;
    let ghosts = store.collection(DB, "ghosts");

    ghosts.update_one(datamap! { "a" => 1 }, &datamap! {}).await.unwrap();
    ghosts.delete_one(&datamap! {}).await.unwrap();

    assert_eq!(ghosts.count_rows(&datamap! {}).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_removes_exactly_one_document() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    users.delete_one(&datamap! { "age" => 25 }).await.unwrap();

    assert_eq!(users.count_rows(&datamap! { "age" => 25 }).await.unwrap(), 1);
    assert_eq!(users.count_rows(&datamap! {}).await.unwrap(), 3);
}

#[tokio::test]
async fn malformed_ids_are_parse_errors_not_not_found() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    for id in ["", "xyz", "507f1f77bcf86cd79943901", "507f1f77bcf86cd79943901g"] {
        assert!(matches!(users.find_one_by_id(id).await, Err(AccessError::InvalidObjectId(..))));
        assert!(matches!(users.update_one_by_id(datamap! { "a" => 1 }, id).await, Err(AccessError::InvalidObjectId(..))));
        assert!(matches!(users.delete_one_by_id(id).await, Err(AccessError::InvalidObjectId(..))));
        assert!(matches!(users.get_field_value_by_id(id, "name").await, Err(AccessError::InvalidObjectId(..))));
    }

    let missing = users.find_one_by_id(&ObjectId::new().to_hex()).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn find_one_reports_not_found() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    let err = users.find_one(&datamap! { "name" => "Zed" }).await.unwrap_err();

    assert_eq!(err, AccessError::NotFound { namespace: "app.users".into() });
}

#[tokio::test]
async fn find_without_positive_limit_returns_everything() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    assert_eq!(users.find(&datamap! {}, &[], 0).await.unwrap().len(), 4);
    assert_eq!(users.find(&datamap! {}, &[], -3).await.unwrap().len(), 4);
}

#[tokio::test]
async fn find_honors_sort_then_limit() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    let oldest = users.find(&datamap! {}, &[Sort::desc("age")], 2).await.unwrap();
    let by_age_then_name = users
        .find(&datamap! {}, &[Sort::asc("age"), Sort::desc("name")], 0)
        .await
        .unwrap();

    assert_eq!(names(&oldest), vec!["Cid", "Ann"]);
    assert_eq!(names(&by_age_then_name), vec!["Dee", "Bob", "Ann", "Cid"]);
}

#[tokio::test]
async fn find_with_no_matches_is_empty_not_an_error() {
    let store = seeded().await;

    let nothing = store
        .collection(DB, USERS)
        .find(&datamap! { "age" => datamap! { "$gt" => 100 } }, &[Sort::asc("name")], 5)
        .await
        .unwrap();
    let other_collection = store.collection(DB, "empty").find(&datamap! {}, &[], 0).await.unwrap();

    assert!(nothing.is_empty());
    assert!(other_collection.is_empty());
}

#[tokio::test]
async fn exists_reports_matches() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    assert!(users.exists(&datamap! { "name" => "Bob" }).await);
    assert!(!users.exists(&datamap! { "name" => "Zed" }).await);
}

// Callers cannot tell a failing store from an empty result.
#[tokio::test]
async fn exists_masks_store_failures_as_false() {
    init_tracing();
    let broken = DocumentStore::new(BrokenBackend);
    let unsupported = seeded().await;

    assert!(!broken.collection(DB, USERS).exists(&datamap! { "name" => "Bob" }).await);
    assert!(
        !unsupported
            .collection(DB, USERS)
            .exists(&datamap! { "$where" => "this.name == 'Bob'" })
            .await
    );
}

#[tokio::test]
async fn store_errors_pass_through_elsewhere() {
    let broken = DocumentStore::new(BrokenBackend);
    let users = broken.collection(DB, USERS);
    let expected = AccessError::Backend("connection reset by peer".into());

    assert_eq!(users.insert_one(datamap! {}).await.unwrap_err(), expected);
    assert_eq!(users.update_one(datamap! {}, &datamap! {}).await.unwrap_err(), expected);
    assert_eq!(users.delete_one(&datamap! {}).await.unwrap_err(), expected);
    assert_eq!(users.find_one(&datamap! {}).await.unwrap_err(), expected);
    assert_eq!(users.find(&datamap! {}, &[], 0).await.unwrap_err(), expected);
    assert_eq!(users.count_rows(&datamap! {}).await.unwrap_err(), expected);
    assert_eq!(users.get_field_value(&datamap! {}, "name").await.unwrap_err(), expected);
}

#[tokio::test]
async fn count_rows_counts_matches() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);

    assert_eq!(users.count_rows(&datamap! {}).await.unwrap(), 4);
    assert_eq!(users.count_rows(&datamap! { "age" => datamap! { "$lt" => 30 } }).await.unwrap(), 2);
    assert_eq!(users.count_rows(&datamap! { "name" => "Zed" }).await.unwrap(), 0);
}

// No match, an absent field and an empty value all read as "".
#[tokio::test]
async fn field_value_is_empty_when_unavailable() {
    let store = seeded().await;
    let users = store.collection(DB, USERS);
    users.insert_one(datamap! { "name" => "Fay", "note" => "" }).await.unwrap();

    assert_eq!(users.get_field_value(&datamap! { "name" => "Zed" }, "age").await.unwrap(), "");
    assert_eq!(users.get_field_value(&datamap! { "name" => "Ann" }, "note").await.unwrap(), "");
    assert_eq!(users.get_field_value(&datamap! { "name" => "Fay" }, "note").await.unwrap(), "");
    assert_eq!(users.get_field_value_by_id(&ObjectId::new().to_hex(), "name").await.unwrap(), "");
}

#[tokio::test]
async fn field_value_renders_text() {
    let store = store().await;
    let devices = store.collection(DB, "devices");
    let id = devices
        .insert_one(datamap! {
            "pc_name" => "lab-1",
            "cores" => 8,
            "ratio" => 0.75,
            "online" => false,
            "ports" => vec![22, 80],
            "location" => datamap! { "room" => "B2" },
        })
        .await
        .unwrap();
    let filter = datamap! { "pc_name" => "lab-1" };

    assert_eq!(devices.get_field_value(&filter, "pc_name").await.unwrap(), "lab-1");
    assert_eq!(devices.get_field_value(&filter, "cores").await.unwrap(), "8");
    assert_eq!(devices.get_field_value(&filter, "ratio").await.unwrap(), "0.75");
    assert_eq!(devices.get_field_value(&filter, "online").await.unwrap(), "false");
    assert_eq!(devices.get_field_value(&filter, "ports").await.unwrap(), "[22,80]");
    assert_eq!(devices.get_field_value(&filter, "location.room").await.unwrap(), "B2");
    assert_eq!(devices.get_field_value(&filter, "_id").await.unwrap(), hex(&id));
}

#[tokio::test]
async fn operations_are_scoped_to_their_namespace() {
    let store = seeded().await;

    assert_eq!(store.collection("other", USERS).count_rows(&datamap! {}).await.unwrap(), 0);
    assert!(!store.collection(DB, "admins").exists(&datamap! { "name" => "Ann" }).await);
    assert_eq!(store.collection(DB, USERS).namespace(), &Namespace::new(DB, USERS));
}

#[tokio::test]
async fn round_trip_example() {
    let store = store().await;
    let users = store.collection("app", "users");

    users.insert_one(datamap! { "name" => "Ann" }).await.unwrap();

    let ann = users.find_one(&datamap! { "name" => "Ann" }).await.unwrap();
    assert_eq!(ann.len(), 2);
    assert_eq!(ann.get("name"), Some(&Value::from("Ann")));

    let id = bare_object_id(&format!("ObjectID(\"{}\")", hex(ann.get("_id").unwrap())));
    assert!(parse_object_id(&id).is_ok());

    users.delete_one_by_id(&id).await.unwrap();
    assert!(users.find_one_by_id(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn one_handle_serves_concurrent_callers() {
    let store = Arc::new(store().await);

    let tasks = (0..16)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .collection(DB, "events")
                    .insert_one(datamap! { "seq" => n })
                    .await
            })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.collection(DB, "events").count_rows(&datamap! {}).await.unwrap(), 16);
}

#[tokio::test]
async fn shared_backend_handles_see_the_same_data() {
    let backend = Arc::new(InMemoryStore::new());
    let writer = DocumentStore::new(Arc::clone(&backend));
    let reader = DocumentStore::new(&*backend);

    writer.collection(DB, USERS).insert_one(datamap! { "name" => "Ann" }).await.unwrap();

    assert!(reader.collection(DB, USERS).exists(&datamap! { "name" => "Ann" }).await);
    writer.shutdown().await.unwrap();
}
