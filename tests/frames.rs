use std::sync::Arc;

use dynamo_frames::Error;
use dynamo_frames::dynamo::{
    AttributeValue, AttributeValueUpdate, Attributes, Condition, Conditions, Frame, QueryValve,
    ScanValve, Table,
};
use dynamo_frames::mock::MkData;

async fn events() -> (MkData, Arc<dyn Table>) {
    let data = MkData::new().with_table("events", &["group", "n"]).unwrap();
    for n in 0..7 {
        let color = if n % 2 == 0 { "red" } else { "blue" };
        data.insert(
            "events",
            Attributes::new()
                .with("group", "a")
                .with("n", n)
                .with("color", color),
        )
        .await
        .unwrap();
    }
    for n in 0..3 {
        data.insert(
            "events",
            Attributes::new().with("group", "b").with("n", n).with("color", "red"),
        )
        .await
        .unwrap();
    }
    let table = data.region().table("events");
    (data, table)
}

async fn numbers(frame: Arc<dyn Frame>) -> Vec<i64> {
    let cursor = frame.iterator();
    let mut found = Vec::new();
    while cursor.has_next().await.unwrap() {
        let item = cursor.next().await.unwrap();
        let n = item.get("n").await.unwrap();
        found.push(n.as_n().unwrap().parse().unwrap());
    }
    found
}

#[tokio::test]
async fn query_pages_add_up_for_any_limit() {
    let (_, table) = events().await;
    for limit in 1..=8 {
        let frame = table
            .frame()
            .where_eq("group", AttributeValue::from("a"))
            .through(Arc::new(QueryValve::new().with_limit(limit)));
        assert_eq!(numbers(frame.clone()).await, vec![0, 1, 2, 3, 4, 5, 6], "limit {limit}");
        assert_eq!(frame.size().await.unwrap(), 7, "limit {limit}");
    }
}

#[tokio::test]
async fn backward_query_reverses_the_order() {
    let (_, table) = events().await;
    let frame = table
        .frame()
        .where_eq("group", AttributeValue::from("b"))
        .through(Arc::new(QueryValve::new().with_limit(2).with_scan_index_forward(false)));
    assert_eq!(numbers(frame).await, vec![2, 1, 0]);
}

#[tokio::test]
async fn scan_pages_skip_filtered_rows() {
    let (_, table) = events().await;
    for limit in 1..=11 {
        let frame = table
            .frame()
            .where_eq("group", AttributeValue::from("a"))
            .where_eq("color", AttributeValue::from("blue"))
            .through(Arc::new(ScanValve::new().with_limit(limit)));
        assert_eq!(numbers(frame.clone()).await, vec![1, 3, 5], "limit {limit}");
        assert_eq!(frame.size().await.unwrap(), 3, "limit {limit}");
    }
}

#[tokio::test]
async fn zero_page_limit_is_an_error_not_an_empty_frame() {
    let (_, table) = events().await;
    let frame = table
        .frame()
        .through(Arc::new(ScanValve::new().with_limit(0)));
    let err = frame.iterator().has_next().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
    assert!(frame.is_empty().await.is_err());
}

#[tokio::test]
async fn where_all_merges_and_overwrites() {
    let (_, table) = events().await;
    let frame = table
        .frame()
        .where_eq("group", AttributeValue::from("b"))
        .where_eq("color", AttributeValue::from("blue"));
    assert!(frame.is_empty().await.unwrap());

    let merged = frame.where_all(
        &Conditions::new()
            .with_eq("group", "a")
            .with("n", Condition::less_than(4)),
    );
    assert_eq!(numbers(merged.clone()).await, vec![1, 3]);
    assert_eq!(merged.size().await.unwrap(), 2);
    assert!(frame.is_empty().await.unwrap());
}

#[tokio::test]
async fn range_conditions_narrow_the_frame() {
    let (_, table) = events().await;
    let frame = table
        .frame()
        .where_eq("group", AttributeValue::from("a"))
        .where_condition("n", Condition::greater_than(4))
        .through(Arc::new(QueryValve::new()));
    assert_eq!(numbers(frame).await, vec![5, 6]);
}

#[tokio::test]
async fn has_next_does_not_advance() {
    let (_, table) = events().await;
    let frame = table.frame().where_eq("group", AttributeValue::from("b"));
    let cursor = frame.iterator();
    for _ in 0..3 {
        assert!(cursor.has_next().await.unwrap());
    }
    let first = cursor.next().await.unwrap();
    assert_eq!(first.get("n").await.unwrap(), AttributeValue::from(0));
}

#[tokio::test]
async fn next_past_the_end_is_exhausted() {
    let (_, table) = events().await;
    let frame = table.frame().where_eq("group", AttributeValue::from("b"));
    let cursor = frame.iterator();
    for _ in 0..3 {
        cursor.next().await.unwrap();
    }
    assert!(!cursor.has_next().await.unwrap());
    let err = cursor.next().await.unwrap_err();
    assert!(matches!(err, Error::Exhausted(_)), "{err}");
}

#[tokio::test]
async fn remove_before_next_is_illegal() {
    let (_, table) = events().await;
    let cursor = table.frame().iterator();
    let err = cursor.remove().await.unwrap_err();
    assert!(matches!(err, Error::IllegalState(_)), "{err}");
}

#[tokio::test]
async fn removing_everything_empties_the_table() {
    let data = MkData::new().with_table("jobs", &["id"]).unwrap();
    for i in 0..6 {
        data.insert("jobs", Attributes::new().with("id", format!("i{i}")))
            .await
            .unwrap();
    }
    let table = data.region().table("jobs");
    let frame = table
        .frame()
        .through(Arc::new(ScanValve::new().with_limit(2)));
    let cursor = frame.iterator();
    let mut removed = 0;
    while cursor.has_next().await.unwrap() {
        cursor.next().await.unwrap();
        cursor.remove().await.unwrap();
        removed += 1;
    }
    assert_eq!(removed, 6);
    assert_eq!(frame.size().await.unwrap(), 0);
    assert!(frame.is_empty().await.unwrap());
    assert!(data.rows("jobs").await.unwrap().is_empty());
}

#[tokio::test]
async fn put_then_read_back() {
    let data = MkData::new().with_table("users", &["id"]).unwrap();
    let table = data.region().table("users");
    let item = table
        .put(&Attributes::new().with("id", "jeff").with("name", "Jeff").with("age", 31))
        .await
        .unwrap();

    assert!(item.has("name").await.unwrap());
    assert!(!item.has("email").await.unwrap());
    assert_eq!(item.get("name").await.unwrap(), AttributeValue::from("Jeff"));

    let updated = item
        .put("age", AttributeValueUpdate::add(1))
        .await
        .unwrap();
    assert_eq!(updated.get("age"), Some(&AttributeValue::from(32)));
    assert_eq!(item.get("age").await.unwrap(), AttributeValue::from(32));

    let err = item.get("email").await.unwrap_err();
    assert!(matches!(err, Error::MissingAttribute(_)), "{err}");
}

#[tokio::test]
async fn attribute_names_are_case_sensitive() {
    let data = MkData::new().with_table("users", &["id"]).unwrap();
    let table = data.region().table("users");
    table
        .put(&Attributes::new().with("id", "a").with("Name", "Ann"))
        .await
        .unwrap();

    let lower = table.frame().where_eq("name", AttributeValue::from("Ann"));
    assert!(lower.is_empty().await.unwrap());
    let exact = table.frame().where_eq("Name", AttributeValue::from("Ann"));
    assert_eq!(exact.size().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_by_keys() {
    let data = MkData::new().with_table("users", &["id"]).unwrap();
    let table = data.region().table("users");
    table.put(&Attributes::new().with("id", "a")).await.unwrap();
    table.put(&Attributes::new().with("id", "b")).await.unwrap();

    table.delete(&Attributes::new().with("id", "a")).await.unwrap();
    let rows = data.rows("users").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&AttributeValue::from("b")));
}
