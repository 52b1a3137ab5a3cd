//! Event store: create, edit and cancel events together with their
//! ticket types and payment methods.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::collections::HashSet;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::{attachments, events, guests, registrations, tickets, Database};
use crate::media::MediaStore;
use crate::models::event::{Event, EventDetails};
use crate::models::ticket::{PaymentMethod, TicketType};
use crate::models::Timeline;
use crate::services::media::{require_owned_attachment, AttachmentUse};
use crate::utils::error::AppError;
use crate::utils::random::random_slug;

const MAX_SLUG_ATTEMPTS: usize = 8;
const MAX_PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    /// Omitted on edit keeps the current cover.
    pub cover_image_id: Option<Uuid>,
    pub ticket_types: Vec<TicketTypeInput>,
    pub payment_methods: Vec<PaymentMethodInput>,
}

/// A ticket type row as submitted. `id` is set for rows that already exist.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicketTypeInput {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentMethodInput {
    pub id: Option<Uuid>,
    pub name: String,
    pub details: String,
}

/// What a cancellation removed.
#[derive(Debug, Clone, Serialize)]
pub struct CancelSummary {
    pub event_id: Uuid,
    pub slug: String,
    pub registrations_removed: u64,
    pub guests_removed: u64,
    pub attachments_removed: usize,
}

#[derive(Debug, Clone)]
struct Schedule {
    start_date: NaiveDate,
    start_time: NaiveTime,
    end_date: NaiveDate,
    end_time: NaiveTime,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ValidatedEvent {
    title: String,
    description: String,
    location: String,
    schedule: Schedule,
    cover_image_id: Option<Uuid>,
    ticket_types: Vec<(Option<Uuid>, String, String, Decimal)>,
    payment_methods: Vec<(Option<Uuid>, String, String)>,
}

#[derive(Clone)]
pub struct EventStore {
    db: Database,
    media: MediaStore,
    utc_offset: FixedOffset,
}

impl EventStore {
    pub fn new(db: Database, media: MediaStore, utc_offset: FixedOffset) -> Self {
        Self {
            db,
            media,
            utc_offset,
        }
    }

    pub async fn create_event(
        &self,
        actor: &Actor,
        input: EventInput,
    ) -> Result<EventDetails, AppError> {
        let valid = validate_event(&input, self.utc_offset)?;

        let mut tx = self.db.begin().await?;
        if let Some(cover_id) = valid.cover_image_id {
            require_owned_attachment(&mut tx, actor, cover_id, AttachmentUse::CoverImage).await?;
        }

        let slug = unique_slug(&mut tx).await?;
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            slug,
            organizer_id: actor.user_id,
            title: valid.title.clone(),
            description: valid.description.clone(),
            location: valid.location.clone(),
            start_date: valid.schedule.start_date,
            start_time: valid.schedule.start_time,
            end_date: valid.schedule.end_date,
            end_time: valid.schedule.end_time,
            start_at: valid.schedule.start_at,
            end_at: valid.schedule.end_at,
            cover_image_id: valid.cover_image_id,
            created_at: now,
            updated_at: now,
        };

        events::insert_event(&mut tx, &event).await.map_err(|e| {
            let err = AppError::from(e);
            if err.is_unique_violation() {
                AppError::Conflict("Event slug already taken, please retry".to_string())
            } else {
                err
            }
        })?;
        let ticket_types = sync_ticket_types(&mut tx, event.id, &valid.ticket_types).await?;
        let payment_methods =
            sync_payment_methods(&mut tx, event.id, &valid.payment_methods).await?;
        tx.commit().await?;

        tracing::info!(
            event_id = %event.id,
            slug = %event.slug,
            organizer_id = %event.organizer_id,
            ticket_types = ticket_types.len(),
            payment_methods = payment_methods.len(),
            "Event created"
        );

        Ok(EventDetails {
            event,
            ticket_types,
            payment_methods,
        })
    }

    pub async fn update_event(
        &self,
        actor: &Actor,
        event_id: Uuid,
        input: EventInput,
    ) -> Result<EventDetails, AppError> {
        let mut tx = self.db.begin().await?;
        let mut event = events::find_event(&mut tx, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;
        actor.ensure_can_manage(&event)?;

        let valid = validate_event(&input, self.utc_offset)?;

        let mut removed_keys = Vec::new();
        if let Some(cover_id) = valid.cover_image_id {
            if event.cover_image_id != Some(cover_id) {
                require_owned_attachment(&mut tx, actor, cover_id, AttachmentUse::CoverImage)
                    .await?;
                if let Some(old_cover) = event.cover_image_id {
                    removed_keys.extend(attachments::delete_attachment(&mut tx, old_cover).await?);
                }
                event.cover_image_id = Some(cover_id);
            }
        }

        event.title = valid.title.clone();
        event.description = valid.description.clone();
        event.location = valid.location.clone();
        event.start_date = valid.schedule.start_date;
        event.start_time = valid.schedule.start_time;
        event.end_date = valid.schedule.end_date;
        event.end_time = valid.schedule.end_time;
        event.start_at = valid.schedule.start_at;
        event.end_at = valid.schedule.end_at;
        event.updated_at = Utc::now();

        events::update_event(&mut tx, &event).await?;
        let ticket_types = sync_ticket_types(&mut tx, event.id, &valid.ticket_types).await?;
        let payment_methods =
            sync_payment_methods(&mut tx, event.id, &valid.payment_methods).await?;
        tx.commit().await?;

        self.media.purge(&removed_keys).await;

        tracing::info!(
            event_id = %event.id,
            slug = %event.slug,
            editor_id = %actor.user_id,
            "Event updated"
        );

        Ok(EventDetails {
            event,
            ticket_types,
            payment_methods,
        })
    }

    /// Deletes the event and everything hanging off it in one transaction.
    /// Blobs are removed only after the rows are gone for good.
    pub async fn cancel_event(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> Result<CancelSummary, AppError> {
        let mut tx = self.db.begin().await?;
        let event = events::find_event(&mut tx, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;
        actor.ensure_can_manage(&event)?;

        let proof_ids = registrations::proof_ids_for_event(&mut tx, event.id).await?;
        let guests_removed = guests::delete_for_event(&mut tx, event.id).await?;
        let registrations_removed = registrations::delete_for_event(&mut tx, event.id).await?;

        let mut removed_keys = Vec::new();
        for proof_id in proof_ids {
            removed_keys.extend(attachments::delete_attachment(&mut tx, proof_id).await?);
        }

        tickets::delete_for_event(&mut tx, event.id).await?;
        if events::delete_event(&mut tx, event.id).await? == 0 {
            return Err(AppError::Conflict(format!(
                "Event {} was removed concurrently",
                event.id
            )));
        }
        if let Some(cover_id) = event.cover_image_id {
            removed_keys.extend(attachments::delete_attachment(&mut tx, cover_id).await?);
        }
        tx.commit().await?;

        self.media.purge(&removed_keys).await;

        tracing::info!(
            event_id = %event.id,
            slug = %event.slug,
            requester_id = %actor.user_id,
            registrations_removed,
            guests_removed,
            attachments_removed = removed_keys.len(),
            "Event cancelled"
        );

        Ok(CancelSummary {
            event_id: event.id,
            slug: event.slug,
            registrations_removed,
            guests_removed,
            attachments_removed: removed_keys.len(),
        })
    }

    pub async fn get_event_by_slug(&self, slug: &str) -> Result<EventDetails, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let event = events::find_event_by_slug(&mut conn, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event '{}'", slug)))?;
        load_details(&mut conn, event).await
    }

    pub async fn get_event(&self, event_id: Uuid) -> Result<EventDetails, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let event = events::find_event(&mut conn, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;
        load_details(&mut conn, event).await
    }

    pub async fn list_organizer_events(
        &self,
        organizer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Timeline<Event>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let events = events::list_by_organizer(&mut conn, organizer_id).await?;
        Ok(Timeline::partition(events, now, |event| event.end_at))
    }

    pub async fn list_upcoming_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>, AppError> {
        let mut conn = self.db.pool().acquire().await?;
        let events = events::list_ending_after(&mut conn, now).await?;
        Ok(events)
    }
}

async fn load_details(conn: &mut SqliteConnection, event: Event) -> Result<EventDetails, AppError> {
    let ticket_types = tickets::list_ticket_types(&mut *conn, event.id).await?;
    let payment_methods = tickets::list_payment_methods(&mut *conn, event.id).await?;
    Ok(EventDetails {
        event,
        ticket_types,
        payment_methods,
    })
}

async fn unique_slug(conn: &mut SqliteConnection) -> Result<String, AppError> {
    for _ in 0..MAX_SLUG_ATTEMPTS {
        let slug = random_slug();
        if !events::slug_exists(&mut *conn, &slug).await? {
            return Ok(slug);
        }
        tracing::debug!(slug = %slug, "Slug collision, retrying");
    }
    Err(AppError::Conflict(
        "Could not allocate a unique event slug".to_string(),
    ))
}

/// Applies the submitted rows: ids update in place, new rows are inserted
/// and rows left out are deleted.
async fn sync_ticket_types(
    conn: &mut SqliteConnection,
    event_id: Uuid,
    rows: &[(Option<Uuid>, String, String, Decimal)],
) -> Result<Vec<TicketType>, AppError> {
    let existing: HashSet<Uuid> = tickets::list_ticket_types(&mut *conn, event_id)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let kept = check_submitted_ids(rows.iter().map(|r| r.0), &existing, "ticket type")?;

    for stale in existing.difference(&kept) {
        if tickets::ticket_type_in_use(&mut *conn, *stale).await? {
            return Err(AppError::Conflict(format!(
                "Ticket type {} has registrations and cannot be removed",
                stale
            )));
        }
        tickets::delete_ticket_type(&mut *conn, *stale).await?;
    }

    let mut saved = Vec::with_capacity(rows.len());
    for (position, (id, name, description, price)) in rows.iter().enumerate() {
        let ticket = TicketType {
            id: id.unwrap_or_else(Uuid::new_v4),
            event_id,
            name: name.clone(),
            description: description.clone(),
            price: *price,
        };
        if id.is_some() {
            tickets::update_ticket_type(&mut *conn, &ticket, position as i64).await?;
        } else {
            tickets::insert_ticket_type(&mut *conn, &ticket, position as i64).await?;
        }
        saved.push(ticket);
    }
    Ok(saved)
}

async fn sync_payment_methods(
    conn: &mut SqliteConnection,
    event_id: Uuid,
    rows: &[(Option<Uuid>, String, String)],
) -> Result<Vec<PaymentMethod>, AppError> {
    let existing: HashSet<Uuid> = tickets::list_payment_methods(&mut *conn, event_id)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    let kept = check_submitted_ids(rows.iter().map(|r| r.0), &existing, "payment method")?;

    for stale in existing.difference(&kept) {
        if tickets::payment_method_in_use(&mut *conn, *stale).await? {
            return Err(AppError::Conflict(format!(
                "Payment method {} has registrations and cannot be removed",
                stale
            )));
        }
        tickets::delete_payment_method(&mut *conn, *stale).await?;
    }

    let mut saved = Vec::with_capacity(rows.len());
    for (position, (id, name, details)) in rows.iter().enumerate() {
        let method = PaymentMethod {
            id: id.unwrap_or_else(Uuid::new_v4),
            event_id,
            name: name.clone(),
            details: details.clone(),
        };
        if id.is_some() {
            tickets::update_payment_method(&mut *conn, &method, position as i64).await?;
        } else {
            tickets::insert_payment_method(&mut *conn, &method, position as i64).await?;
        }
        saved.push(method);
    }
    Ok(saved)
}

/// Every submitted id must already belong to the event, at most once.
fn check_submitted_ids(
    submitted: impl Iterator<Item = Option<Uuid>>,
    existing: &HashSet<Uuid>,
    what: &str,
) -> Result<HashSet<Uuid>, AppError> {
    let mut kept = HashSet::new();
    for id in submitted.flatten() {
        if !existing.contains(&id) {
            return Err(AppError::ValidationError(format!(
                "Unknown {} {} for this event",
                what, id
            )));
        }
        if !kept.insert(id) {
            return Err(AppError::ValidationError(format!(
                "Duplicate {} {}",
                what, id
            )));
        }
    }
    Ok(kept)
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::ValidationError(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    let raw = required(value, field)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        AppError::ValidationError(format!("{} must be a date (YYYY-MM-DD)", field))
    })
}

fn parse_time(value: &str, field: &str) -> Result<NaiveTime, AppError> {
    let raw = required(value, field)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map_err(|_| AppError::ValidationError(format!("{} must be a time (HH:MM)", field)))
}

fn combine(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
    field: &str,
) -> Result<DateTime<Utc>, AppError> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| AppError::ValidationError(format!("{} is not a valid instant", field)))
}

fn parse_schedule(input: &EventInput, offset: FixedOffset) -> Result<Schedule, AppError> {
    let start_date = parse_date(&input.start_date, "start_date")?;
    let start_time = parse_time(&input.start_time, "start_time")?;
    let end_date = parse_date(&input.end_date, "end_date")?;
    let end_time = parse_time(&input.end_time, "end_time")?;

    let start_at = combine(start_date, start_time, offset, "start")?;
    let end_at = combine(end_date, end_time, offset, "end")?;
    if end_at < start_at {
        return Err(AppError::ValidationError(
            "Event cannot end before it starts".to_string(),
        ));
    }

    Ok(Schedule {
        start_date,
        start_time,
        end_date,
        end_time,
        start_at,
        end_at,
    })
}

fn validate_price(price: Option<Decimal>, row: usize) -> Result<Decimal, AppError> {
    let price = price.ok_or_else(|| {
        AppError::ValidationError(format!("ticket_types[{}].price is required", row))
    })?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::ValidationError(format!(
            "ticket_types[{}].price cannot be negative",
            row
        )));
    }
    if price.scale() > MAX_PRICE_SCALE {
        return Err(AppError::ValidationError(format!(
            "ticket_types[{}].price has more than {} decimal places",
            row, MAX_PRICE_SCALE
        )));
    }
    Ok(price.abs())
}

fn validate_event(input: &EventInput, offset: FixedOffset) -> Result<ValidatedEvent, AppError> {
    let title = required(&input.title, "title")?;
    let location = required(&input.location, "location")?;
    let schedule = parse_schedule(input, offset)?;

    let ticket_types = input
        .ticket_types
        .iter()
        .enumerate()
        .map(|(row, t)| {
            Ok((
                t.id,
                required(&t.name, &format!("ticket_types[{}].name", row))?,
                t.description.trim().to_string(),
                validate_price(t.price, row)?,
            ))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let payment_methods = input
        .payment_methods
        .iter()
        .enumerate()
        .map(|(row, m)| {
            Ok((
                m.id,
                required(&m.name, &format!("payment_methods[{}].name", row))?,
                m.details.trim().to_string(),
            ))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(ValidatedEvent {
        title,
        description: input.description.trim().to_string(),
        location,
        schedule,
        cover_image_id: input.cover_image_id,
        ticket_types,
        payment_methods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn input() -> EventInput {
        EventInput {
            title: "ConBook Summit".to_string(),
            location: "Manila".to_string(),
            start_date: "2030-05-01".to_string(),
            start_time: "09:00".to_string(),
            end_date: "2030-05-01".to_string(),
            end_time: "17:30:00".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_schedule_combines_date_and_time() {
        let valid = validate_event(&input(), utc()).unwrap();
        assert_eq!(
            valid.schedule.start_at.to_rfc3339(),
            "2030-05-01T09:00:00+00:00"
        );
        assert_eq!(valid.schedule.end_at.to_rfc3339(), "2030-05-01T17:30:00+00:00");
    }

    #[test]
    fn test_schedule_applies_offset() {
        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        let valid = validate_event(&input(), manila).unwrap();
        assert_eq!(
            valid.schedule.start_at.to_rfc3339(),
            "2030-05-01T01:00:00+00:00"
        );
    }

    #[test]
    fn test_blank_and_invalid_fields_are_rejected() {
        let mut blank_title = input();
        blank_title.title = "   ".to_string();
        assert!(matches!(
            validate_event(&blank_title, utc()),
            Err(AppError::ValidationError(_))
        ));

        let mut bad_date = input();
        bad_date.start_date = "2030-02-30".to_string();
        assert!(matches!(
            validate_event(&bad_date, utc()),
            Err(AppError::ValidationError(_))
        ));

        let mut bad_time = input();
        bad_time.end_time = "25:00".to_string();
        assert!(matches!(
            validate_event(&bad_time, utc()),
            Err(AppError::ValidationError(_))
        ));

        let mut reversed = input();
        reversed.end_date = "2030-04-30".to_string();
        assert!(matches!(
            validate_event(&reversed, utc()),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_ticket_price_rules() {
        let mut event = input();
        event.ticket_types = vec![TicketTypeInput {
            name: "Free".to_string(),
            price: Some(Decimal::ZERO),
            ..Default::default()
        }];
        assert!(validate_event(&event, utc()).is_ok());

        event.ticket_types[0].price = Some(Decimal::new(-100, 2));
        assert!(validate_event(&event, utc()).is_err());

        event.ticket_types[0].price = Some(Decimal::new(1005, 3));
        assert!(validate_event(&event, utc()).is_err());

        event.ticket_types[0].price = None;
        assert!(validate_event(&event, utc()).is_err());
    }

    #[test]
    fn test_submitted_ids_must_exist_once() {
        let known = Uuid::new_v4();
        let existing: HashSet<Uuid> = [known].into_iter().collect();

        let kept = check_submitted_ids([Some(known), None].into_iter(), &existing, "row").unwrap();
        assert!(kept.contains(&known));

        assert!(check_submitted_ids([Some(Uuid::new_v4())].into_iter(), &existing, "row").is_err());
        assert!(check_submitted_ids([Some(known), Some(known)].into_iter(), &existing, "row").is_err());
    }
}
