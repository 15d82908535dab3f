//! Integration tests for the authenticated resource gateways

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use common::{services, FakeTransport, RecordingStore};
use tokio_util::sync::CancellationToken;
use vitalens_core::gateway::multipart::FormPart;
use vitalens_core::gateway::transport::TransportError;
use vitalens_core::store::{CredentialStore, ACCESS_TOKEN_KEY};
use vitalens_core::{Error, MealType, MealUpload, ProgressReporter};

const MEAL_JSON: &str = r#"{
    "id": 7,
    "user_id": 42,
    "meal_type": "lunch",
    "source_type": "image",
    "source_file_path": "uploads/42/lunch.png",
    "food_items": [
        {"id": 1, "name": "Rice", "quantity": 200, "unit": "g", "created_at": "2025-12-21T12:31:00"}
    ],
    "created_at": "2025-12-21T12:31:00",
    "updated_at": "2025-12-21T12:31:00"
}"#;

const DAILY_JSON: &str = r#"{
    "date": "2025-12-20",
    "nutrients": [
        {"name": "Calories", "value": 1850, "unit": "kcal"},
        {"name": "Protein", "value": 92.5, "unit": "g"},
        {"name": "Carbohydrates", "value": 210, "unit": "g"},
        {"name": "Fat", "value": 61, "unit": "g"}
    ],
    "meal_count": 3
}"#;

fn authorized_store() -> Arc<RecordingStore> {
    let store = RecordingStore::new();
    store.save(ACCESS_TOKEN_KEY, "access-1").unwrap();
    store
}

fn recording_reporter() -> (ProgressReporter, Arc<Mutex<Vec<f64>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (
        ProgressReporter::new(move |p| sink.lock().unwrap().push(p)),
        seen,
    )
}

fn png_upload() -> MealUpload {
    MealUpload::new("lunch.png", vec![0u8; 64 * 1024]).with_meal_type(MealType::Lunch)
}

// ============================================================================
// Meal upload
// ============================================================================

#[tokio::test]
async fn test_upload_sends_multipart_with_bearer() {
    let transport = FakeTransport::with_progress_steps(4);
    let store = authorized_store();
    transport.respond(201, MEAL_JSON);

    let app = services(&transport, &store);
    let (reporter, seen) = recording_reporter();
    let meal = app.meals.upload_meal(&png_upload(), &reporter).await.unwrap();

    assert_eq!(meal.id, 7);
    assert_eq!(meal.meal_type, MealType::Lunch);

    let request = transport.last_request();
    assert_eq!(request.url.as_str(), "http://api.test/meals/upload");
    assert_eq!(request.header_value("Authorization"), Some("Bearer access-1"));
    assert!(request.body.is_none());

    let form = request.form.expect("upload is sent as a form");
    match form.part("file") {
        Some(FormPart::File {
            file_name,
            content_type,
            bytes,
            ..
        }) => {
            assert_eq!(file_name, "lunch.png");
            assert_eq!(content_type, "image/png");
            assert_eq!(bytes.len(), 64 * 1024);
        }
        other => panic!("unexpected file part: {:?}", other),
    }
    assert_eq!(form.text_value("meal_type"), Some("lunch"));

    let seen = seen.lock().unwrap().clone();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", seen);
    assert_eq!(seen.first(), Some(&0.0));
    assert_eq!(seen.last(), Some(&1.0));
    assert!(seen[..seen.len() - 1].iter().all(|p| *p <= 0.9));
}

#[tokio::test]
async fn test_upload_rejects_unsupported_file_before_sending() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    let app = services(&transport, &store);

    let upload = MealUpload::new("notes.txt", b"2 eggs".to_vec());
    let err = app
        .meals
        .upload_meal(&upload, &ProgressReporter::silent())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidFile(_)));
    assert_eq!(err.user_message(), "Invalid file selected");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_upload_file_from_disk() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(200, MEAL_JSON);

    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(b"food,grams\nrice,200\n").unwrap();

    let app = services(&transport, &store);
    app.meals
        .upload_file(file.path(), MealType::Dinner, None, &ProgressReporter::silent())
        .await
        .unwrap();

    let form = transport.last_request().form.unwrap();
    match form.part("file") {
        Some(FormPart::File {
            content_type,
            bytes,
            ..
        }) => {
            assert_eq!(content_type, "text/csv");
            assert_eq!(bytes.as_slice(), b"food,grams\nrice,200\n");
        }
        other => panic!("unexpected file part: {:?}", other),
    }
    assert_eq!(form.text_value("meal_type"), Some("dinner"));
    assert!(form.part("meal_date").is_none());
}

#[tokio::test]
async fn test_upload_401_is_unauthorized_regardless_of_body() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(401, r#"{"detail":"Token expired"}"#);

    let app = services(&transport, &store);
    let (reporter, seen) = recording_reporter();
    let err = app.meals.upload_meal(&png_upload(), &reporter).await.unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_ne!(seen.lock().unwrap().last(), Some(&1.0));
}

#[tokio::test]
async fn test_upload_server_error_uses_detail() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(413, r#"{"detail":"File too large"}"#);

    let app = services(&transport, &store);
    let err = app
        .meals
        .upload_meal(&png_upload(), &ProgressReporter::silent())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(413));
    assert_eq!(err.user_message(), "File too large");
}

#[tokio::test]
async fn test_upload_without_token() {
    let transport = FakeTransport::new();
    let store = RecordingStore::new();
    let app = services(&transport, &store);

    let err = app
        .meals
        .upload_meal(&png_upload(), &ProgressReporter::silent())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_upload_stops_reporting() {
    let transport = FakeTransport::with_progress_steps(8);
    let store = authorized_store();
    transport.respond(201, MEAL_JSON);

    let app = services(&transport, &store);
    let token = CancellationToken::new();
    let (reporter, seen) = recording_reporter();
    let reporter = reporter.with_cancellation(token.clone());
    token.cancel();

    let meal = app.meals.upload_meal(&png_upload(), &reporter).await.unwrap();

    assert_eq!(meal.id, 7);
    assert_eq!(transport.calls(), 1);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_network_failure() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.fail(TransportError::Timeout);

    let app = services(&transport, &store);
    let err = app
        .meals
        .upload_meal(&png_upload(), &ProgressReporter::silent())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network(TransportError::Timeout)));
    assert_eq!(err.user_message(), "Request timed out");
}

// ============================================================================
// Nutrition queries
// ============================================================================

#[tokio::test]
async fn test_daily_with_and_without_date() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(200, DAILY_JSON);
    transport.respond(200, DAILY_JSON);

    let app = services(&transport, &store);
    let date = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
    let daily = app.nutrition.daily(Some(date)).await.unwrap();
    assert_eq!(daily.meal_count, 3);
    app.nutrition.daily(None).await.unwrap();

    let requests = transport.requests();
    assert_eq!(
        requests[0].url.as_str(),
        "http://api.test/nutrition/daily?target_date=2025-12-20"
    );
    assert_eq!(requests[1].url.as_str(), "http://api.test/nutrition/daily");
    assert_eq!(requests[1].header_value("Authorization"), Some("Bearer access-1"));
}

#[tokio::test]
async fn test_today_summary() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(200, DAILY_JSON);

    let app = services(&transport, &store);
    let today = app.nutrition.today().await.unwrap();

    assert_eq!(today.calories, 1850.0);
    assert_eq!(today.protein, 92.5);
    assert_eq!(today.carbs, 210.0);
    assert_eq!(today.fat, 61.0);
    assert_eq!(today.fiber, None);
}

#[tokio::test]
async fn test_summary_and_insights_queries() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(
        200,
        r#"{"period_days": 30, "start_date": "2025-11-21", "end_date": "2025-12-20",
            "nutrients": [{"name": "Fiber", "total": 600, "average_per_day": 20, "unit": "g"}],
            "total_meals": 80}"#,
    );
    transport.respond(
        200,
        r#"{"period_days": 7, "nutrient_summary": {"Fiber": 140},
            "explanation": "Fiber is low.", "recommendations": "Eat beans.",
            "disclaimer": "Not medical advice."}"#,
    );

    let app = services(&transport, &store);
    let summary = app.nutrition.summary(30).await.unwrap();
    assert_eq!(summary.average_per_day("fiber"), Some(20.0));

    let insights = app.nutrition.insights(7).await.unwrap();
    assert_eq!(insights.recommendations, "Eat beans.");

    let requests = transport.requests();
    assert_eq!(requests[0].url.query(), Some("days=30"));
    assert_eq!(requests[1].url.path(), "/nutrition/insights");
    assert_eq!(requests[1].url.query(), Some("days=7"));
}

#[tokio::test]
async fn test_resource_calls_without_token_make_no_calls() {
    let transport = FakeTransport::new();
    let store = RecordingStore::new();
    let app = services(&transport, &store);

    assert!(matches!(app.nutrition.daily(None).await, Err(Error::Unauthorized)));
    assert!(matches!(app.nutrition.summary(7).await, Err(Error::Unauthorized)));
    assert!(matches!(app.nutrition.insights(7).await, Err(Error::Unauthorized)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_resource_401_and_malformed_body() {
    let transport = FakeTransport::new();
    let store = authorized_store();
    transport.respond(401, "not json at all");
    transport.respond(200, r#"{"date": "yesterday"}"#);

    let app = services(&transport, &store);
    assert!(matches!(app.nutrition.summary(7).await, Err(Error::Unauthorized)));
    assert!(matches!(app.nutrition.daily(None).await, Err(Error::Decoding(_))));
}
