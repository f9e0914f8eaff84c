use booking_engine::{
    AvailabilityRequest, BookingBackend, BookingContext, BookingEngine, BookingError,
    BookingsQuery, CreateBookingRequest, DayWindowRequest, EngineConfig, HttpBackend, RemoteError,
};
use chrono::NaiveDate;
use serde_json::json;
use slot_engine::Interval;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn backend_for(server: &MockServer) -> HttpBackend {
    let config = EngineConfig {
        base_url: format!("{}/api", server.uri()),
        api_token: Some("secret-token".into()),
        ..EngineConfig::default()
    };
    HttpBackend::new(&config).unwrap()
}

fn availability_request() -> AvailabilityRequest {
    AvailabilityRequest {
        user_id: "counsellor-3".into(),
        date: date(),
        slot_minutes: 15,
        timezone: "Asia/Kolkata".into(),
        business_hours_start: "09:00".into(),
        business_hours_end: "18:00".into(),
    }
}

fn create_request() -> CreateBookingRequest {
    CreateBookingRequest {
        lead_id: "lead-42".into(),
        user_id: "counsellor-3".into(),
        date: date(),
        start_time: "10:00".into(),
        end_time: "10:15".into(),
        scheduled_at: "2026-03-16T10:00:00Z".into(),
        tenant_id: "tenant-1".into(),
        student_id: "lead-42".into(),
        assigned_user_id: "agent-7".into(),
        created_by: "agent-7".into(),
        booking_type: "consultation".into(),
        booking_source: "user_ui".into(),
        timezone: "Asia/Kolkata".into(),
        user_name: None,
        user_email: None,
    }
}

#[tokio::test]
async fn availability_sends_query_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/availability"))
        .and(query_param("userId", "counsellor-3"))
        .and(query_param("date", "2026-03-16"))
        .and(query_param("slotMinutes", "15"))
        .and(query_param("timezone", "Asia/Kolkata"))
        .and(query_param("businessHoursStart", "09:00"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "availableSlots": [{"start": "10:00", "end": "11:00"}],
            "existingBookings": [{"start": "10:15", "end": "10:30"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = backend_for(&server)
        .availability(&availability_request())
        .await
        .unwrap();

    assert_eq!(payload.available_slots.len(), 1);
    assert_eq!(payload.bookings.len(), 1);
}

#[tokio::test]
async fn bare_array_availability_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking-availability"))
        .and(query_param("dayStart", "2026-03-16T00:00:00"))
        .and(query_param("dayEnd", "2026-03-16T23:59:59"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"start": "09:00", "end": "09:30"}])),
        )
        .mount(&server)
        .await;

    let payload = backend_for(&server)
        .booking_availability(&DayWindowRequest::for_day(&availability_request()))
        .await
        .unwrap();

    assert_eq!(payload.available_slots.len(), 1);
    assert!(payload.bookings.is_empty());
}

#[tokio::test]
async fn bookings_accepts_wrapped_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings"))
        .and(query_param("leadId", "lead-42"))
        .and(query_param("date", "2026-03-16"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "bk-1", "startTime": "10:00", "endTime": "10:15"}]
        })))
        .mount(&server)
        .await;

    let records = backend_for(&server)
        .list_bookings(&BookingsQuery {
            lead_id: "lead-42".into(),
            date: date(),
        })
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], "bk-1");
}

#[tokio::test]
async fn create_posts_camel_case_body_and_reads_nested_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .and(body_partial_json(json!({
            "leadId": "lead-42",
            "startTime": "10:00",
            "endTime": "10:15",
            "scheduledAt": "2026-03-16T10:00:00Z",
            "bookingSource": "user_ui",
            "assignedUserId": "agent-7",
            "date": "2026-03-16"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"booking": {"_id": "bk-77"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = backend_for(&server)
        .create_booking(&create_request())
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("bk-77"));
}

#[tokio::test]
async fn rejection_message_is_taken_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": "Slot already booked"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .create_booking(&create_request())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RemoteError::Status {
            status: 409,
            message: "Slot already booked".into()
        }
    );
    assert!(BookingError::from(err).is_conflict());
}

#[tokio::test]
async fn missing_endpoint_is_unsupported() {
    let server = MockServer::start().await;

    let err = backend_for(&server)
        .availability(&availability_request())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Unsupported(_)));
}

#[tokio::test]
async fn cancel_and_note_hit_nested_paths() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/bookings/bk-1/cancel"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/leads/lead-42/notes"))
        .and(body_json(json!({"note": "call after 6pm"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.cancel_booking("bk-1").await.unwrap();
    backend.add_note("lead-42", "call after 6pm").await.unwrap();
}

#[tokio::test]
async fn engine_falls_back_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/availability"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/booking-availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "slots": [{"startTime": "2026-03-16T13:00:00", "endTime": "2026-03-16T13:30:00"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = BookingEngine::new(backend_for(&server), EngineConfig::default()).unwrap();
    let context = BookingContext::for_user("counsellor-3", date(), "Asia/Kolkata");
    engine.load(&context).await.unwrap();

    let atomic = engine.state().atomic_slots;
    assert_eq!(
        atomic,
        vec![
            Interval::from_wall_clock("13:00", "13:15").unwrap(),
            Interval::from_wall_clock("13:15", "13:30").unwrap(),
        ]
    );
}
