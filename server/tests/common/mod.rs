#![allow(dead_code)]

use conbook_server::auth::{Actor, Role};
use conbook_server::config::Config;
use conbook_server::db::Database;
use conbook_server::models::attachment::Attachment;
use conbook_server::models::event::EventDetails;
use conbook_server::services::events::{EventInput, PaymentMethodInput, TicketTypeInput};
use conbook_server::state::AppState;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    // Keeps the media directory alive for the test's duration.
    pub media_dir: TempDir,
}

pub async fn spawn() -> TestApp {
    let media_dir = tempfile::tempdir().expect("tempdir");
    let db = Database::open_in_memory().await.expect("in-memory database");
    let config = Config::for_tests(media_dir.path().join("media"));
    TestApp {
        state: AppState::new(db, config),
        media_dir,
    }
}

/// Same as [`spawn`] but backed by a WAL database file with a real
/// connection pool, for tests that race requests against each other.
pub async fn spawn_file_backed() -> TestApp {
    let media_dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", media_dir.path().join("conbook.db").display());
    let db = Database::connect(&url).await.expect("file database");
    let config = Config::for_tests(media_dir.path().join("media"));
    TestApp {
        state: AppState::new(db, config),
        media_dir,
    }
}

pub fn organizer() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Organizer).with_profile("Olive Organizer", "olive@example.com")
}

pub fn registrant() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Subscriber).with_profile("Uma User", "uma@example.com")
}

pub fn staff() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Staff).with_profile("Sam Staff", "sam@example.com")
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin)
}

pub fn price(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("price")
}

pub fn ticket(name: &str, amount: &str) -> TicketTypeInput {
    TicketTypeInput {
        id: None,
        name: name.to_string(),
        description: format!("{} admission", name),
        price: Some(price(amount)),
    }
}

pub fn payment(name: &str, details: &str) -> PaymentMethodInput {
    PaymentMethodInput {
        id: None,
        name: name.to_string(),
        details: details.to_string(),
    }
}

/// An event that ends in 2099 with the two standard tickets and GCash.
pub fn event_input(title: &str) -> EventInput {
    EventInput {
        title: title.to_string(),
        description: "A gathering".to_string(),
        location: "SMX Convention Center".to_string(),
        start_date: "2099-06-01".to_string(),
        start_time: "09:00".to_string(),
        end_date: "2099-06-02".to_string(),
        end_time: "18:00".to_string(),
        cover_image_id: None,
        ticket_types: vec![ticket("General", "100.00"), ticket("VIP", "500.00")],
        payment_methods: vec![payment("GCash", "09171234567")],
    }
}

pub fn past_event_input(title: &str) -> EventInput {
    EventInput {
        start_date: "2001-01-01".to_string(),
        end_date: "2001-01-01".to_string(),
        ..event_input(title)
    }
}

pub async fn create_event(app: &TestApp, actor: &Actor, input: EventInput) -> EventDetails {
    app.state
        .events()
        .create_event(actor, input)
        .await
        .expect("create event")
}

pub async fn upload(app: &TestApp, actor: &Actor, content_type: &str) -> Attachment {
    app.state
        .media_library()
        .upload(actor, "receipt.png", content_type, b"\x89PNG fake image bytes")
        .await
        .expect("upload")
}

pub async fn count(app: &TestApp, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(app.state.db.pool())
        .await
        .expect("count")
}

pub fn blob_exists(app: &TestApp, storage_key: &str) -> bool {
    app.state.config.media_dir.join(storage_key).exists()
}
