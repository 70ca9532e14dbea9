mod support;

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};

use support::{build_app, id_of, register, send};

struct Parties {
    client: String,
    mechanic: String,
    mechanic_id: String,
    request_id: String,
}

/// Client with a vehicle and an open request, plus a registered mechanic.
async fn open_request(app: &Router) -> anyhow::Result<Parties> {
    let (client, _) = register(app, "owner@example.com", "client").await?;
    let (mechanic, _) = register(app, "wrench@example.com", "mechanic").await?;
    let (_, profile) = send(app, "GET", "/api/auth/profile", Some(&mechanic), None).await?;
    let mechanic_id = profile["mechanic"]["id"].as_str().unwrap_or_default().to_string();

    let (status, vehicle) = send(
        app,
        "POST",
        "/api/vehicles",
        Some(&client),
        Some(json!({"make": "Honda", "model": "Accord", "year": 2003, "license_plate": "abc123", "vin": "1HGCM82633A004352"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "vehicle: {vehicle}");
    assert_eq!(vehicle["license_plate"], "ABC123");

    let (status, request) = send(
        app,
        "POST",
        "/api/requests",
        Some(&client),
        Some(json!({
            "vehicle_id": id_of(&vehicle),
            "service_type": "brakes",
            "description": "grinding noise when stopping",
            "location": "Springfield",
            "urgency": "high",
            "preferred_date": "2026-11-01"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "request: {request}");
    assert_eq!(request["status"], "open");

    Ok(Parties { client, mechanic, mechanic_id, request_id: id_of(&request) })
}

async fn quote(app: &Router, p: &Parties) -> anyhow::Result<(StatusCode, Value)> {
    send(
        app,
        "POST",
        "/api/quotes",
        Some(&p.mechanic),
        Some(json!({"request_id": p.request_id, "cost": 180.0, "time_required": "2 hours", "availability": "tomorrow"})),
    )
    .await
}

/// Quote, accept and book; returns the booking id.
async fn booked(app: &Router, p: &Parties) -> anyhow::Result<String> {
    let (status, q) = quote(app, p).await?;
    assert_eq!(status, StatusCode::CREATED, "quote: {q}");
    let quote_id = id_of(&q);
    let (status, accepted) = send(app, "PUT", &format!("/api/quotes/{quote_id}"), Some(&p.client), Some(json!({"status": "accepted"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (status, booking) = send(
        app,
        "POST",
        "/api/bookings",
        Some(&p.client),
        Some(json!({"quote_id": quote_id, "scheduled_date": "2026-11-02"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "booking: {booking}");
    Ok(id_of(&booking))
}

async fn request_status(app: &Router, p: &Parties) -> anyhow::Result<Value> {
    let (_, r) = send(app, "GET", &format!("/api/requests/{}", p.request_id), Some(&p.client), None).await?;
    Ok(r["status"].clone())
}

#[tokio::test]
async fn test_full_lifecycle_updates_mechanic_rating() -> anyhow::Result<()> {
    let app = build_app().await?;
    let p = open_request(&app).await?;

    let (status, open) = send(&app, "GET", "/api/requests", Some(&p.mechanic), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open.as_array().map(Vec::len), Some(1));

    let booking_id = booked(&app, &p).await?;
    assert_eq!(request_status(&app, &p).await?, "in_progress");

    let uri = format!("/api/bookings/{booking_id}");
    let (status, _) = send(&app, "PUT", &uri, Some(&p.mechanic), Some(json!({"status": "in_progress"}))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, done) = send(&app, "PUT", &uri, Some(&p.mechanic), Some(json!({"status": "completed"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(done["completed_at"].is_string());
    assert_eq!(request_status(&app, &p).await?, "completed");

    let (status, review) = send(
        &app,
        "POST",
        "/api/reviews",
        Some(&p.client),
        Some(json!({"booking_id": booking_id, "rating": 5, "comment": "quick and fair"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "review: {review}");

    let (status, mech) = send(&app, "GET", &format!("/api/mechanics/{}", p.mechanic_id), Some(&p.client), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mech["rating"], 5.0);
    assert_eq!(mech["review_count"], 1);

    let (status, listed) = send(&app, "GET", &format!("/api/reviews/mechanic/{}?sort=oldest", p.mechanic_id), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["stats"]["total_reviews"], 1);
    assert_eq!(listed["stats"]["five_star"], 1);
    assert_eq!(listed["reviews"][0]["reviewer_name"], "Test User");

    let (status, _) = send(&app, "GET", &format!("/api/reviews/mechanic/{}?sort=best", p.mechanic_id), None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a second review of the same booking
    let (status, _) = send(&app, "POST", "/api/reviews", Some(&p.client), Some(json!({"booking_id": booking_id, "rating": 3}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, mine) = send(&app, "GET", "/api/reviews/my-reviews?page=1&limit=5", Some(&p.client), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["pagination"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn test_client_cannot_complete_booking() -> anyhow::Result<()> {
    let app = build_app().await?;
    let p = open_request(&app).await?;
    let booking_id = booked(&app, &p).await?;
    let (status, body) = send(&app, "PUT", &format!("/api/bookings/{booking_id}"), Some(&p.client), Some(json!({"status": "completed"}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_second_quote_from_same_mechanic_is_rejected() -> anyhow::Result<()> {
    let app = build_app().await?;
    let p = open_request(&app).await?;
    let (status, _) = quote(&app, &p).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = quote(&app, &p).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // clients cannot quote at all
    let (status, _) = send(
        &app,
        "POST",
        "/api/quotes",
        Some(&p.client),
        Some(json!({"request_id": p.request_id, "cost": 10.0, "time_required": "1h", "availability": "now"})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_booking_reopens_request() -> anyhow::Result<()> {
    let app = build_app().await?;
    let p = open_request(&app).await?;
    let booking_id = booked(&app, &p).await?;
    let (status, cancelled) = send(&app, "PUT", &format!("/api/bookings/{booking_id}"), Some(&p.client), Some(json!({"status": "cancelled"}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(request_status(&app, &p).await?, "open");

    // terminal bookings stay put
    let (status, _) = send(&app, "PUT", &format!("/api/bookings/{booking_id}"), Some(&p.mechanic), Some(json!({"status": "in_progress"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_resources_are_scoped_to_owner() -> anyhow::Result<()> {
    let app = build_app().await?;
    let p = open_request(&app).await?;
    let (stranger, _) = register(&app, "stranger@example.com", "client").await?;
    let (status, _) = send(&app, "GET", &format!("/api/requests/{}", p.request_id), Some(&stranger), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, list) = send(&app, "GET", "/api/vehicles", Some(&stranger), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(0));

    // the request has no quotes yet, so its owner may delete it
    let (status, body) = send(&app, "DELETE", &format!("/api/requests/{}", p.request_id), Some(&p.client), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    Ok(())
}
