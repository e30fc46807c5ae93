//! Display records for planner blocks.

use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::layout::compute_block;
use crate::core::shared::models::{Event, User};

pub const PLANNER_COLOR_PALETTE: [&str; 9] = [
    "#7C8FF8", "#E07B39", "#6BC0A5", "#AF77E5", "#2CB7C6", "#F06FA7", "#4AC07A", "#5272FF",
    "#FFB347",
];

/// One positioned block in the weekly planner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    /// `None` for sample data.
    pub event_id: Option<Uuid>,
    pub label: String,
    pub date: String,
    pub time: String,
    pub title: String,
    pub color: String,
    pub service: String,
    pub category: String,
    pub description: String,
    pub status: String,
    pub created_by: String,
    pub client: String,
    pub start: String,
    pub end: String,
    pub top_pct: f64,
    pub height_pct: f64,
}

/// Service name and category name known for an event title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub category: Option<String>,
}

pub type ServiceLookup = HashMap<String, ServiceInfo>;

/// An event together with the users it references.
#[derive(Debug, Clone, Copy)]
pub struct EventRecord<'a> {
    pub event: &'a Event,
    pub creator: Option<&'a User>,
    pub client: Option<&'a User>,
}

pub fn event_colour(index: usize) -> &'static str {
    PLANNER_COLOR_PALETTE[index % PLANNER_COLOR_PALETTE.len()]
}

pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lun.",
        Weekday::Tue => "Mar.",
        Weekday::Wed => "Mer.",
        Weekday::Thu => "Jeu.",
        Weekday::Fri => "Ven.",
        Weekday::Sat => "Sam.",
        Weekday::Sun => "Dim.",
    }
}

pub fn format_time_range<T: TimeZone>(start: &DateTime<T>, end: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    format!("{} – {}", start.format("%H:%M"), end.format("%H:%M"))
}

pub fn iso_local(value: &DateTime<Tz>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Author name: first and last name, else email, else empty.
pub fn resolve_author(user: Option<&User>) -> String {
    user.map(User::display_name).unwrap_or_default()
}

pub fn display_title(author: &str, service: &str) -> String {
    if author.is_empty() {
        service.to_string()
    } else {
        format!("{author} · {service}")
    }
}

pub fn build_event_view(
    record: EventRecord<'_>,
    index: usize,
    services: &ServiceLookup,
    tz: &Tz,
) -> EventView {
    let event = record.event;
    let start_local = event.start_at.with_timezone(tz);
    let end_local = event.end_at.with_timezone(tz);

    let matched = services.get(&event.title);
    let service = matched
        .map(|info| info.name.clone())
        .unwrap_or_else(|| event.title.clone());
    let category = matched
        .and_then(|info| info.category.clone())
        .unwrap_or_default();

    let author = resolve_author(record.creator);
    let client = record.client.map(User::display_name).unwrap_or_default();
    let layout = compute_block(&start_local, &end_local);

    EventView {
        event_id: Some(event.id),
        label: weekday_label(start_local.weekday()).to_string(),
        date: start_local.format("%d/%m").to_string(),
        time: format_time_range(&start_local, &end_local),
        title: display_title(&author, &service),
        color: event_colour(index).to_string(),
        service,
        category,
        description: event.description.clone(),
        status: event.status.label().to_string(),
        created_by: author,
        client,
        start: iso_local(&start_local),
        end: iso_local(&end_local),
        top_pct: layout.top_pct,
        height_pct: layout.height_pct,
    }
}

/// UTC instant of a local wall-clock value, choosing the earlier instant on
/// ambiguous times and shifting forward over gaps.
pub fn localize(naive: chrono::NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let shifted = naive + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::enums::{EventStatus, UserType};
    use chrono::NaiveDate;

    fn user(first: &str, last: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            phone_number: String::new(),
            user_type: UserType::Professional,
            linked_professional_id: None,
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    fn event(title: &str, start: (u32, u32), end: (u32, u32)) -> Event {
        let tz = chrono_tz::Europe::Paris;
        let day = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        Event {
            id: Uuid::new_v4(),
            calendar_id: Uuid::new_v4(),
            title: title.into(),
            description: "Notes".into(),
            start_at: localize(day.and_hms_opt(start.0, start.1, 0).unwrap(), &tz),
            end_at: localize(day.and_hms_opt(end.0, end.1, 0).unwrap(), &tz),
            status: EventStatus::Confirmed,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_with_known_service() {
        let tz = chrono_tz::Europe::Paris;
        let author = user("Camille", "Thomas", "camille@example.com");
        let client = user("Alice", "", "alice@example.com");
        let event = event("Modelage", (9, 0), (10, 30));
        let mut services = ServiceLookup::new();
        services.insert(
            "Modelage".into(),
            ServiceInfo {
                name: "Modelage".into(),
                category: Some("Bien-être".into()),
            },
        );

        let view = build_event_view(
            EventRecord {
                event: &event,
                creator: Some(&author),
                client: Some(&client),
            },
            1,
            &services,
            &tz,
        );

        assert_eq!(view.event_id, Some(event.id));
        assert_eq!(view.label, "Mar.");
        assert_eq!(view.date, "12/03");
        assert_eq!(view.time, "09:00 – 10:30");
        assert_eq!(view.title, "Camille Thomas · Modelage");
        assert_eq!(view.color, "#E07B39");
        assert_eq!(view.category, "Bien-être");
        assert_eq!(view.status, "Confirmé");
        assert_eq!(view.client, "Alice");
        assert_eq!(view.start, "2024-03-12T09:00:00+01:00");
        assert!((view.top_pct - 60.0 / 720.0 * 100.0).abs() < 1e-9);
        assert!((view.height_pct - 90.0 / 720.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_without_author_or_service() {
        let tz = chrono_tz::Europe::Paris;
        let event = event("Rendez-vous libre", (14, 0), (14, 10));
        let view = build_event_view(
            EventRecord {
                event: &event,
                creator: None,
                client: None,
            },
            10,
            &ServiceLookup::new(),
            &tz,
        );

        assert_eq!(view.title, "Rendez-vous libre");
        assert_eq!(view.service, "Rendez-vous libre");
        assert_eq!(view.category, "");
        assert_eq!(view.created_by, "");
        assert_eq!(view.client, "");
        assert_eq!(view.color, PLANNER_COLOR_PALETTE[1]);
        assert!((view.height_pct - 30.0 / 720.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_author_falls_back_to_email() {
        let nameless = user("", "", "pro@example.com");
        assert_eq!(resolve_author(Some(&nameless)), "pro@example.com");
        assert_eq!(resolve_author(None), "");
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(event_colour(0), "#7C8FF8");
        assert_eq!(event_colour(8), "#FFB347");
        assert_eq!(event_colour(9), "#7C8FF8");
    }

    #[test]
    fn test_localize_dst_gap() {
        let tz = chrono_tz::Europe::Paris;
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let instant = localize(gap, &tz).with_timezone(&tz);
        assert_eq!(instant.format("%H:%M").to_string(), "03:30");
    }
}
