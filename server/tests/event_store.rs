mod common;

use std::collections::HashSet;

use chrono::Utc;
use common::*;
use conbook_server::services::events::TicketTypeInput;
use conbook_server::services::registrations::RegistrationInput;
use conbook_server::models::registration::RegistrationStatus;
use conbook_server::services::review::StatusChange;
use conbook_server::utils::error::AppError;

#[tokio::test]
async fn test_create_event_stores_children_and_slug() {
    let app = spawn().await;
    let owner = organizer();

    let details = create_event(&app, &owner, event_input("ConBook Live")).await;

    assert_eq!(details.event.organizer_id, owner.user_id);
    assert_eq!(details.event.slug.len(), 10);
    assert_eq!(details.ticket_types.len(), 2);
    assert_eq!(details.ticket_types[1].name, "VIP");
    assert_eq!(details.ticket_types[1].price, price("500"));
    assert_eq!(details.payment_methods[0].details, "09171234567");
    assert!(details.is_open_for_registration());

    let fetched = app
        .state
        .events()
        .get_event_by_slug(&details.event.slug)
        .await
        .unwrap();
    assert_eq!(fetched.event.id, details.event.id);
    assert_eq!(fetched.ticket_types, details.ticket_types);
    assert_eq!(fetched.event.end_at, details.event.end_at);
}

#[tokio::test]
async fn test_slugs_are_unique() {
    let app = spawn().await;
    let owner = organizer();

    let mut slugs = HashSet::new();
    for i in 0..25 {
        let details = create_event(&app, &owner, event_input(&format!("Event {}", i))).await;
        assert!(slugs.insert(details.event.slug));
    }
}

#[tokio::test]
async fn test_create_rejects_blank_title_without_writing() {
    let app = spawn().await;
    let mut input = event_input("x");
    input.title = "".to_string();

    let result = app.state.events().create_event(&organizer(), input).await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
    assert_eq!(count(&app, "events").await, 0);
    assert_eq!(count(&app, "event_tickets").await, 0);
}

#[tokio::test]
async fn test_create_rejects_unparseable_schedule() {
    let app = spawn().await;
    let mut input = event_input("Bad clock");
    input.start_time = "noon".to_string();

    let result = app.state.events().create_event(&organizer(), input).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_event_without_options_is_not_open() {
    let app = spawn().await;
    let mut input = event_input("Draft");
    input.ticket_types.clear();
    input.payment_methods.clear();

    let details = create_event(&app, &organizer(), input).await;
    assert!(!details.is_open_for_registration());
}

#[tokio::test]
async fn test_update_preserves_slug() {
    let app = spawn().await;
    let owner = organizer();
    let created = create_event(&app, &owner, event_input("Before")).await;

    let updated = app
        .state
        .events()
        .update_event(&owner, created.event.id, event_input("After"))
        .await
        .unwrap();

    assert_eq!(updated.event.slug, created.event.slug);
    assert_eq!(updated.event.title, "After");
    assert_eq!(updated.event.created_at, created.event.created_at);
}

#[tokio::test]
async fn test_update_requires_owner_or_admin() {
    let app = spawn().await;
    let owner = organizer();
    let created = create_event(&app, &owner, event_input("Mine")).await;

    let stranger = organizer();
    let result = app
        .state
        .events()
        .update_event(&stranger, created.event.id, event_input("Hijacked"))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Staff may review registrations but not edit the event.
    let result = app
        .state
        .events()
        .update_event(&staff(), created.event.id, event_input("Hijacked"))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let by_admin = app
        .state
        .events()
        .update_event(&admin(), created.event.id, event_input("Fixed by admin"))
        .await
        .unwrap();
    assert_eq!(by_admin.event.title, "Fixed by admin");
    assert_eq!(by_admin.event.organizer_id, owner.user_id);
}

#[tokio::test]
async fn test_update_unknown_event_is_not_found() {
    let app = spawn().await;
    let result = app
        .state
        .events()
        .update_event(&admin(), uuid::Uuid::new_v4(), event_input("Ghost"))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_child_rows_upsert_by_id_and_drop_omitted() {
    let app = spawn().await;
    let owner = organizer();
    let created = create_event(&app, &owner, event_input("Tiers")).await;
    let general = created.ticket_types[0].clone();

    let mut input = event_input("Tiers");
    input.ticket_types = vec![
        TicketTypeInput {
            id: Some(general.id),
            name: "General Admission".to_string(),
            description: String::new(),
            price: Some(price("120.00")),
        },
        ticket("Student", "50.00"),
    ];

    let updated = app
        .state
        .events()
        .update_event(&owner, created.event.id, input)
        .await
        .unwrap();

    let stored = app
        .state
        .events()
        .get_event(created.event.id)
        .await
        .unwrap();
    assert_eq!(stored.ticket_types, updated.ticket_types);
    assert_eq!(stored.ticket_types.len(), 2);
    assert_eq!(stored.ticket_types[0].id, general.id);
    assert_eq!(stored.ticket_types[0].name, "General Admission");
    assert_eq!(stored.ticket_types[0].price, price("120"));
    assert_eq!(stored.ticket_types[1].name, "Student");
    assert!(stored
        .ticket_types
        .iter()
        .all(|t| t.id != created.ticket_types[1].id));
    assert_eq!(count(&app, "event_tickets").await, 2);
}

#[tokio::test]
async fn test_child_row_from_another_event_is_rejected() {
    let app = spawn().await;
    let owner = organizer();
    let first = create_event(&app, &owner, event_input("First")).await;
    let second = create_event(&app, &owner, event_input("Second")).await;

    let mut input = event_input("Second");
    input.ticket_types = vec![TicketTypeInput {
        id: Some(first.ticket_types[0].id),
        name: "Stolen".to_string(),
        description: String::new(),
        price: Some(price("1.00")),
    }];

    let result = app
        .state
        .events()
        .update_event(&owner, second.event.id, input)
        .await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));

    let untouched = app.state.events().get_event(first.event.id).await.unwrap();
    assert_eq!(untouched.ticket_types[0].name, "General");
}

#[tokio::test]
async fn test_ticket_type_in_use_cannot_be_dropped() {
    let app = spawn().await;
    let owner = organizer();
    let user = registrant();
    let created = create_event(&app, &owner, event_input("Busy")).await;
    let proof = upload(&app, &user, "image/png").await;

    app.state
        .registrations()
        .submit_registration(
            &user,
            created.event.id,
            RegistrationInput {
                ticket_type_id: Some(created.ticket_types[0].id),
                payment_method_id: Some(created.payment_methods[0].id),
                proof_id: Some(proof.id),
                contact_number: None,
            },
        )
        .await
        .unwrap();

    let mut input = event_input("Busy");
    input.ticket_types = vec![ticket("Replacement", "10.00")];
    let result = app
        .state
        .events()
        .update_event(&owner, created.event.id, input)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // Rolled back as a whole.
    let stored = app.state.events().get_event(created.event.id).await.unwrap();
    assert_eq!(stored.ticket_types.len(), 2);
    assert_eq!(stored.event.title, "Busy");
}

#[tokio::test]
async fn test_cover_image_must_be_owned_image() {
    let app = spawn().await;
    let owner = organizer();
    let other = organizer();

    let foreign = upload(&app, &other, "image/png").await;
    let mut input = event_input("Covered");
    input.cover_image_id = Some(foreign.id);
    let result = app.state.events().create_event(&owner, input).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));

    let pdf = upload(&app, &owner, "application/pdf").await;
    let mut input = event_input("Covered");
    input.cover_image_id = Some(pdf.id);
    let result = app.state.events().create_event(&owner, input).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));

    let mine = upload(&app, &owner, "image/png").await;
    let mut input = event_input("Covered");
    input.cover_image_id = Some(mine.id);
    let details = create_event(&app, &owner, input).await;
    assert_eq!(details.event.cover_image_id, Some(mine.id));
}

#[tokio::test]
async fn test_replacing_cover_removes_old_blob() {
    let app = spawn().await;
    let owner = organizer();
    let old_cover = upload(&app, &owner, "image/png").await;
    let mut input = event_input("Covered");
    input.cover_image_id = Some(old_cover.id);
    let created = create_event(&app, &owner, input).await;

    let new_cover = upload(&app, &owner, "image/jpeg").await;
    let mut input = event_input("Covered");
    input.cover_image_id = Some(new_cover.id);
    let updated = app
        .state
        .events()
        .update_event(&owner, created.event.id, input)
        .await
        .unwrap();

    assert_eq!(updated.event.cover_image_id, Some(new_cover.id));
    assert!(!blob_exists(&app, &old_cover.storage_key));
    assert!(blob_exists(&app, &new_cover.storage_key));
    assert_eq!(count(&app, "attachments").await, 1);
}

#[tokio::test]
async fn test_cancel_cascades_exactly_the_event() {
    let app = spawn().await;
    let owner = organizer();
    let user = registrant();

    let cover = upload(&app, &owner, "image/png").await;
    let mut input = event_input("Doomed");
    input.cover_image_id = Some(cover.id);
    let doomed = create_event(&app, &owner, input).await;
    let survivor = create_event(&app, &owner, event_input("Survivor")).await;

    let mut proofs = Vec::new();
    for details in [&doomed, &survivor] {
        let proof = upload(&app, &user, "image/png").await;
        let registration = app
            .state
            .registrations()
            .submit_registration(
                &user,
                details.event.id,
                RegistrationInput {
                    ticket_type_id: Some(details.ticket_types[0].id),
                    payment_method_id: Some(details.payment_methods[0].id),
                    proof_id: Some(proof.id),
                    contact_number: Some("09171234567".to_string()),
                },
            )
            .await
            .unwrap();
        app.state
            .review()
            .set_registration_status(
                &owner,
                registration.id,
                StatusChange {
                    status: RegistrationStatus::Accepted,
                    expected_status: None,
                },
            )
            .await
            .unwrap();
        proofs.push(proof);
    }
    assert_eq!(count(&app, "event_guests").await, 2);

    let summary = app
        .state
        .events()
        .cancel_event(&owner, doomed.event.id)
        .await
        .unwrap();

    assert_eq!(summary.registrations_removed, 1);
    assert_eq!(summary.guests_removed, 1);
    assert_eq!(summary.attachments_removed, 2);

    assert!(matches!(
        app.state.events().get_event(doomed.event.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(!blob_exists(&app, &cover.storage_key));
    assert!(!blob_exists(&app, &proofs[0].storage_key));

    // The other event is untouched.
    assert!(blob_exists(&app, &proofs[1].storage_key));
    assert_eq!(count(&app, "events").await, 1);
    assert_eq!(count(&app, "event_registrations").await, 1);
    assert_eq!(count(&app, "event_guests").await, 1);
    assert_eq!(count(&app, "event_tickets").await, 2);
    assert_eq!(count(&app, "event_payment_methods").await, 1);
    assert_eq!(count(&app, "attachments").await, 1);
}

#[tokio::test]
async fn test_cancel_requires_owner() {
    let app = spawn().await;
    let owner = organizer();
    let created = create_event(&app, &owner, event_input("Keep")).await;

    let result = app
        .state
        .events()
        .cancel_event(&registrant(), created.event.id)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(count(&app, "events").await, 1);

    let result = app
        .state
        .events()
        .cancel_event(&owner, uuid::Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_organizer_events_split_by_end() {
    let app = spawn().await;
    let owner = organizer();
    create_event(&app, &owner, event_input("Future")).await;
    create_event(&app, &owner, past_event_input("History")).await;
    create_event(&app, &organizer(), event_input("Someone else's")).await;

    let timeline = app
        .state
        .events()
        .list_organizer_events(owner.user_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(timeline.upcoming.len(), 1);
    assert_eq!(timeline.upcoming[0].title, "Future");
    assert_eq!(timeline.past.len(), 1);
    assert_eq!(timeline.past[0].title, "History");

    let public = app
        .state
        .events()
        .list_upcoming_events(Utc::now())
        .await
        .unwrap();
    assert_eq!(public.len(), 2);
    assert!(public.iter().all(|e| e.title != "History"));
}

#[tokio::test]
async fn test_cover_cannot_be_shared_between_events() {
    let app = spawn().await;
    let owner = organizer();
    let cover = upload(&app, &owner, "image/png").await;

    let mut input = event_input("First");
    input.cover_image_id = Some(cover.id);
    let first = create_event(&app, &owner, input).await;

    let mut input = event_input("Second");
    input.cover_image_id = Some(cover.id);
    let result = app.state.events().create_event(&owner, input).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));

    let second = create_event(&app, &owner, event_input("Second")).await;
    let mut input = event_input("Second");
    input.cover_image_id = Some(cover.id);
    let result = app
        .state
        .events()
        .update_event(&owner, second.event.id, input)
        .await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));

    // Resubmitting its own cover is not a reuse.
    let mut input = event_input("First, renamed");
    input.cover_image_id = Some(cover.id);
    let updated = app
        .state
        .events()
        .update_event(&owner, first.event.id, input)
        .await
        .unwrap();
    assert_eq!(updated.event.cover_image_id, Some(cover.id));

    app.state
        .events()
        .cancel_event(&owner, second.event.id)
        .await
        .unwrap();
    let kept = app.state.events().get_event(first.event.id).await.unwrap();
    assert_eq!(kept.event.cover_image_id, Some(cover.id));
    assert!(blob_exists(&app, &cover.storage_key));
}

#[tokio::test]
async fn test_failed_cancel_leaves_everything_in_place() {
    let app = spawn().await;
    let owner = organizer();
    let user = registrant();

    let cover = upload(&app, &owner, "image/png").await;
    let mut input = event_input("Sticky");
    input.cover_image_id = Some(cover.id);
    let details = create_event(&app, &owner, input).await;

    let proof = upload(&app, &user, "image/png").await;
    let registration = app
        .state
        .registrations()
        .submit_registration(
            &user,
            details.event.id,
            RegistrationInput {
                ticket_type_id: Some(details.ticket_types[0].id),
                payment_method_id: Some(details.payment_methods[0].id),
                proof_id: Some(proof.id),
                contact_number: None,
            },
        )
        .await
        .unwrap();
    app.state
        .review()
        .set_registration_status(
            &owner,
            registration.id,
            StatusChange {
                status: RegistrationStatus::Accepted,
                expected_status: None,
            },
        )
        .await
        .unwrap();

    // The event row is deleted after guests, registrations and proofs, so
    // failing there exercises the rollback of every earlier step.
    sqlx::query(
        "CREATE TRIGGER refuse_event_delete BEFORE DELETE ON events \
         BEGIN SELECT RAISE(ABORT, 'event is locked'); END",
    )
    .execute(app.state.db.pool())
    .await
    .unwrap();

    let result = app
        .state
        .events()
        .cancel_event(&owner, details.event.id)
        .await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    assert_eq!(count(&app, "events").await, 1);
    assert_eq!(count(&app, "event_registrations").await, 1);
    assert_eq!(count(&app, "event_guests").await, 1);
    assert_eq!(count(&app, "event_tickets").await, 2);
    assert_eq!(count(&app, "event_payment_methods").await, 1);
    assert_eq!(count(&app, "attachments").await, 2);
    assert!(blob_exists(&app, &cover.storage_key));
    assert!(blob_exists(&app, &proof.storage_key));

    let kept = app.state.events().get_event(details.event.id).await.unwrap();
    assert_eq!(kept.event.cover_image_id, Some(cover.id));
}
