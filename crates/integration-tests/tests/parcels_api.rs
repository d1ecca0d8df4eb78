//! Parcel CRUD over HTTP.

#![allow(clippy::unwrap_used)]

use parcelpath_integration_tests::TestContext;
use serde_json::{Value, json};

#[tokio::test]
async fn test_create_list_delete_lifecycle() {
    let ctx = TestContext::new().await;

    let id = ctx
        .create_parcel(json!({
            "created_by": "a@x.com",
            "parcel_type": "document",
            "weight": 2.5,
            "creation_date": "2024-05-01T10:00:00Z"
        }))
        .await;

    let resp = ctx
        .client
        .get(ctx.url("/parcels?email=a@x.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let parcels: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0]["_id"], json!(id));
    assert_eq!(parcels[0]["parcel_type"], json!("document"));
    assert_eq!(parcels[0]["weight"], json!(2.5));

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/parcels/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "deletedCount": 1}));

    let resp = ctx
        .client
        .get(ctx.url(&format!("/parcels/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], json!("Parcel not found"));
}

#[tokio::test]
async fn test_list_is_newest_first_and_filtered() {
    let ctx = TestContext::new().await;
    ctx.create_parcel(json!({"created_by": "a@x.com", "creation_date": "2024-01-01"}))
        .await;
    ctx.create_parcel(json!({"created_by": "a@x.com"})).await;
    ctx.create_parcel(json!({"created_by": "a@x.com", "creation_date": "2024-06-01"}))
        .await;
    ctx.create_parcel(json!({"created_by": "b@x.com", "creation_date": "2025-01-01"}))
        .await;

    let parcels: Vec<Value> = ctx
        .client
        .get(ctx.url("/parcels?email=a@x.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let dates: Vec<&Value> = parcels.iter().map(|p| &p["creation_date"]).collect();
    assert_eq!(
        dates,
        vec![&json!("2024-06-01"), &json!("2024-01-01"), &Value::Null]
    );

    let all: Vec<Value> = ctx
        .client
        .get(ctx.url("/parcels"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0]["created_by"], json!("b@x.com"));

    let none: Vec<Value> = ctx
        .client
        .get(ctx.url("/parcels?email=nobody@x.com"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/parcels/not-an-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], json!("Invalid parcel id"));
}

#[tokio::test]
async fn test_delete_twice_reports_not_deleted() {
    let ctx = TestContext::new().await;
    let id = ctx.create_parcel(json!({"created_by": "a@x.com"})).await;
    let url = ctx.url(&format!("/parcels/{id}"));

    ctx.client.delete(&url).send().await.unwrap();
    let resp = ctx.client.delete(&url).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "deletedCount": 0}));
}

#[tokio::test]
async fn test_delete_malformed_id_is_server_error() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .delete(ctx.url("/parcels/not-an-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], json!("Database operation failed"));
}

#[tokio::test]
async fn test_non_object_body_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/parcels"))
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());
}
