//! Booking client against the in-process Restful-Booker stub.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use acceptor::booking::schema::{AUTH_SCHEMA, BOOKING_CREATED_SCHEMA, BOOKING_SCHEMA};
use acceptor::booking::{Auth, Booking, BookingClient, BookingPatch, SchemaStore};
use acceptor::mock::BookingStub;
use acceptor::Credentials;

fn schemas() -> SchemaStore {
    SchemaStore::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../schemas"))
}

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn jim() -> Booking {
    Booking::from_row(&row(&[
        ("firstname", "Jim"),
        ("lastname", "Brown"),
        ("totalprice", "111"),
        ("depositpaid", "true"),
        ("checkin", "2018-01-01"),
        ("checkout", "2019-01-01"),
        ("additionalneeds", "Breakfast"),
    ]))
    .unwrap()
}

async fn client() -> (BookingStub, BookingClient) {
    let stub = BookingStub::spawn().await.unwrap();
    let client = BookingClient::new(stub.base_url(), Duration::from_secs(5)).unwrap();
    (stub, client)
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_token_for_valid_credentials() {
    let (_stub, client) = client().await;
    let response = client.auth(&Credentials::default()).await.unwrap();
    response.expect_status(200).unwrap();
    schemas()
        .validate(AUTH_SCHEMA, &response.value().unwrap())
        .unwrap();

    let auth = client.token(&Credentials::default()).await.unwrap();
    assert!(!auth.is_none());
}

#[tokio::test]
async fn test_bad_credentials_yield_reason_not_token() {
    let (_stub, client) = client().await;
    let bad = Credentials {
        username: "admin".to_string(),
        password: "nope".to_string(),
    };
    let response = client.auth(&bad).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(schemas()
        .validate(AUTH_SCHEMA, &response.value().unwrap())
        .is_err());
    assert!(client.token(&bad).await.is_err());
}

#[tokio::test]
async fn test_ping_answers_created() {
    let (_stub, client) = client().await;
    client.ping().await.unwrap().expect_status(201).unwrap();
}

// ============================================================================
// Booking lifecycle
// ============================================================================

#[tokio::test]
async fn test_create_then_get_round_trips_fields() {
    let (_stub, client) = client().await;
    let created = client.create_confirmed(&jim()).await.unwrap();
    assert_eq!(created.booking, jim());

    let response = client.get(&created.bookingid.to_string()).await.unwrap();
    response.expect_status(200).unwrap();
    schemas()
        .validate(BOOKING_SCHEMA, &response.value().unwrap())
        .unwrap();
    let fetched: Booking = response.json().unwrap();
    assert_eq!(fetched, jim());
}

#[tokio::test]
async fn test_dates_are_normalised_before_sending() {
    let (_stub, client) = client().await;
    let booking = Booking::from_row(&row(&[
        ("firstname", "Sally"),
        ("lastname", "Smith"),
        ("totalprice", "42"),
        ("depositpaid", "False"),
        ("checkin", "2024/03/05"),
        ("checkout", "2024-03-07T12:00:00Z"),
        ("additionalneeds", "None"),
    ]))
    .unwrap();

    let response = client.create(&booking).await.unwrap();
    response.expect_status(200).unwrap();
    schemas()
        .validate(BOOKING_CREATED_SCHEMA, &response.value().unwrap())
        .unwrap();
    let created: acceptor::booking::CreatedBooking = response.json().unwrap();
    assert_eq!(created.booking.bookingdates.checkin, "2024-03-05");
    assert_eq!(created.booking.bookingdates.checkout, "2024-03-07");
    assert_eq!(created.booking.additionalneeds, None);
}

#[tokio::test]
async fn test_cancel_answers_201_then_404() {
    let (_stub, client) = client().await;
    let id = client.create_confirmed(&jim()).await.unwrap().bookingid.to_string();
    let auth = client.token(&Credentials::default()).await.unwrap();

    let response = client.delete(&id, &auth).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(client.get(&id).await.unwrap().status, 404);
}

#[tokio::test]
async fn test_mutations_without_token_are_forbidden() {
    let (_stub, client) = client().await;
    let id = client.create_confirmed(&jim()).await.unwrap().bookingid.to_string();

    assert_eq!(client.update(&id, &jim(), &Auth::None).await.unwrap().status, 403);
    assert_eq!(
        client
            .update(&id, &jim(), &Auth::token("forged"))
            .await
            .unwrap()
            .status,
        403
    );
    assert_eq!(client.delete(&id, &Auth::None).await.unwrap().status, 403);
    assert_eq!(client.get(&id).await.unwrap().status, 200);
}

#[tokio::test]
async fn test_full_and_partial_update() {
    let (_stub, client) = client().await;
    let id = client.create_confirmed(&jim()).await.unwrap().bookingid.to_string();
    let auth = client.token(&Credentials::default()).await.unwrap();

    let mut replacement = jim();
    replacement.firstname = "James".to_string();
    replacement.totalprice = 222;
    let response = client.update(&id, &replacement, &auth).await.unwrap();
    response.expect_status(200).unwrap();
    assert_eq!(response.json::<Booking>().unwrap(), replacement);

    let patch = BookingPatch::from_row(&row(&[("lastname", "Green"), ("checkout", "2019-02-01")]))
        .unwrap();
    let response = client.partial_update(&id, &patch, &auth).await.unwrap();
    response.expect_status(200).unwrap();

    let mut expected = replacement;
    patch.apply(&mut expected);
    assert_eq!(response.json::<Booking>().unwrap(), expected);
    assert_eq!(expected.bookingdates.checkout, "2019-02-01");
}

#[tokio::test]
async fn test_unknown_id() {
    let (_stub, client) = client().await;
    let auth = client.token(&Credentials::default()).await.unwrap();
    assert_eq!(client.get("999999").await.unwrap().status, 404);
    assert_eq!(client.update("999999", &jim(), &auth).await.unwrap().status, 405);
    assert_eq!(client.delete("999999", &auth).await.unwrap().status, 405);
}

#[tokio::test]
async fn test_list_ids_grows_with_creates() {
    let (_stub, client) = client().await;
    assert!(client.list_ids().await.unwrap().is_empty());
    let first = client.create_confirmed(&jim()).await.unwrap();
    let second = client.create_confirmed(&jim()).await.unwrap();
    let ids: Vec<u64> = client
        .list_ids()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.bookingid)
        .collect();
    assert_eq!(ids, vec![first.bookingid, second.bookingid]);
}
