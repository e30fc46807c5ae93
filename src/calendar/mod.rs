//! Calendars, appointments and the weekly planner built from them.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use log::{error, info};
use uuid::Uuid;

use crate::core::shared::enums::{EventStatus, UserType};
use crate::core::shared::models::{Calendar, Event, EventAttendee, Service, User};
use crate::core::shared::schema::{calendars, event_attendees, events, services, users};

pub mod event_view;
pub mod layout;
pub mod planner;

pub use event_view::{build_event_view, localize, EventRecord, EventView, PLANNER_COLOR_PALETTE};
pub use layout::{compute_block, compute_block_clock, planner_hours, BlockLayout};
pub use planner::{
    build_calendar_events, build_calendar_events_on, planner_week_summary, start_of_week,
    DayGroup,
};

/// Used when the service has no usable duration.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Calendrier introuvable.")]
    CalendarNotFound,
    #[error("Date de début invalide.")]
    InvalidStart,
    #[error("Prestation ou client invalide.")]
    InvalidSelection,
    #[error("Rendez-vous introuvable ou non autorisé.")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
}

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn parse_wall_clock(value: &str) -> Option<NaiveDateTime> {
    let value = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&value) {
        return Some(parsed.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(&value, format) {
            return Some(parsed.naive_local());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&value, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parses an ISO-8601 date or datetime as wall-clock time in `tz`.
///
/// An explicit offset is dropped and the clock value kept, so
/// `09:00+05:00` and `09:00` both mean 09:00 in `tz`. A bare date is
/// midnight.
pub fn parse_iso_datetime(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_wall_clock(value).map(|naive| localize(naive, tz))
}

fn calendar_name_for(user: &User) -> String {
    let first_name = user.first_name.trim();
    let owner = if first_name.is_empty() {
        user.email.as_str()
    } else {
        first_name
    };
    format!("Agenda de {owner}")
}

fn unique_calendar_slug(conn: &mut PgConnection, base: &str) -> QueryResult<String> {
    let mut candidate = base.to_string();
    let mut suffix = 0;
    loop {
        let taken: bool = diesel::select(diesel::dsl::exists(
            calendars::table.filter(calendars::slug.eq(&candidate)),
        ))
        .get_result(conn)?;
        if !taken {
            return Ok(candidate);
        }
        suffix += 1;
        candidate = format!("{base}-{suffix}");
    }
}

/// The user's own calendar, else the first public one, else a new
/// calendar owned by the user.
pub fn ensure_user_calendar(conn: &mut PgConnection, user: &User) -> QueryResult<Calendar> {
    if let Some(calendar) = calendars::table
        .filter(calendars::owner_id.eq(user.id))
        .order((calendars::created_at.asc(), calendars::id.asc()))
        .select(Calendar::as_select())
        .first(conn)
        .optional()?
    {
        return Ok(calendar);
    }

    if let Some(calendar) = calendars::table
        .filter(calendars::is_public.eq(true))
        .order((calendars::created_at.asc(), calendars::id.asc()))
        .select(Calendar::as_select())
        .first(conn)
        .optional()?
    {
        return Ok(calendar);
    }

    let slug = unique_calendar_slug(conn, &format!("agenda-{}", user.id))?;
    let calendar = Calendar {
        id: Uuid::new_v4(),
        owner_id: user.id,
        name: calendar_name_for(user),
        slug,
        is_public: false,
        created_at: Utc::now(),
    };

    diesel::insert_into(calendars::table)
        .values(&calendar)
        .execute(conn)?;
    info!("Created calendar {} for {}", calendar.slug, user.id);
    Ok(calendar)
}

/// Raw appointment fields as submitted from the planner form.
#[derive(Debug, Clone, Copy)]
pub struct EventRequest<'a> {
    pub start_at: &'a str,
    pub end_at: &'a str,
    pub service_id: Uuid,
    pub client_id: Uuid,
}

fn resolve_end(start: DateTime<Utc>, end: Option<DateTime<Utc>>, service: &Service) -> DateTime<Utc> {
    let end = end.unwrap_or(start);
    if end > start {
        return end;
    }
    let minutes = service
        .duration_minutes
        .map(i64::from)
        .filter(|minutes| *minutes > 0)
        .unwrap_or(DEFAULT_EVENT_MINUTES);
    start + Duration::minutes(minutes)
}

/// Books `request.client_id` for one of the requester's services. The event
/// and its attendee are written in one transaction.
pub fn create_event(
    conn: &mut PgConnection,
    requester: &User,
    calendar: Option<&Calendar>,
    request: EventRequest<'_>,
    tz: &Tz,
) -> Result<Event, EventError> {
    let calendar = calendar.ok_or(EventError::CalendarNotFound)?;
    let start = parse_iso_datetime(request.start_at, tz).ok_or(EventError::InvalidStart)?;

    let service = services::table
        .filter(services::id.eq(request.service_id))
        .filter(services::created_by.eq(requester.id))
        .select(Service::as_select())
        .first(conn)
        .optional()?;
    let client = users::table
        .filter(users::id.eq(request.client_id))
        .filter(users::linked_professional_id.eq(requester.id))
        .filter(users::user_type.eq(UserType::Individual))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    let (Some(service), Some(client)) = (service, client) else {
        return Err(EventError::InvalidSelection);
    };

    let end = resolve_end(start, parse_iso_datetime(request.end_at, tz), &service);
    let event = Event {
        id: Uuid::new_v4(),
        calendar_id: calendar.id,
        title: service.name.clone(),
        description: service.description.clone(),
        start_at: start,
        end_at: end,
        status: EventStatus::Planned,
        created_by: Some(requester.id),
        created_at: Utc::now(),
    };
    let attendee = EventAttendee::new(event.id, client.id);

    conn.transaction::<_, DieselError, _>(|conn| {
        diesel::insert_into(events::table)
            .values(&event)
            .execute(conn)?;
        diesel::insert_into(event_attendees::table)
            .values(&attendee)
            .execute(conn)?;
        Ok(())
    })
    .map_err(|e| {
        error!("Failed to create event for {}: {}", requester.id, e);
        EventError::Database(e)
    })?;

    info!(
        "Professional {} booked {} for client {}",
        requester.id, event.title, client.id
    );
    Ok(event)
}

/// Deletes an event from a calendar owned by the requester.
pub fn delete_event(
    conn: &mut PgConnection,
    requester: &User,
    event_id: Uuid,
) -> Result<(), EventError> {
    let event = events::table
        .inner_join(calendars::table)
        .filter(events::id.eq(event_id))
        .filter(calendars::owner_id.eq(requester.id))
        .select(Event::as_select())
        .first(conn)
        .optional()?
        .ok_or(EventError::NotFound)?;

    diesel::delete(events::table.find(event.id)).execute(conn)?;
    info!("Deleted event {} ({})", event.title, event.id);
    Ok(())
}
