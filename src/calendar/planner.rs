//! Weekly planner assembly: seven day columns, Monday through Sunday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::event_view::{
    build_event_view, display_title, event_colour, iso_local, localize, weekday_label,
    EventRecord, EventView, ServiceInfo, ServiceLookup,
};
use super::layout::compute_block_clock;
use crate::core::shared::enums::EventStatus;
use crate::core::shared::models::{Calendar, Event, EventAttendee, User};
use crate::core::shared::schema::{categories, event_attendees, events, services, users};

pub const DAYS_PER_WEEK: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub label: String,
    pub date: String,
    pub events: Vec<EventView>,
}

impl DayGroup {
    fn empty(day: NaiveDate) -> Self {
        Self {
            label: weekday_label(day.weekday()).to_string(),
            date: day.format("%d/%m").to_string(),
            events: Vec::new(),
        }
    }
}

struct SampleEvent {
    start: &'static str,
    end: &'static str,
    service: &'static str,
    person: &'static str,
    color: Option<&'static str>,
}

const fn sample(
    start: &'static str,
    end: &'static str,
    service: &'static str,
    person: &'static str,
) -> SampleEvent {
    SampleEvent {
        start,
        end,
        service,
        person,
        color: None,
    }
}

const INTERNAL_BLOCK_COLOR: &str = "#9AA5B1";

/// Monday of the illustrative week shown to visitors without a calendar.
pub fn sample_week_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 8).unwrap_or_default()
}

const SAMPLE_WEEK: [&[SampleEvent]; 7] = [
    &[
        sample("09:00", "10:05", "Modelage bien-être", "Camille Thomas"),
        sample("11:30", "12:30", "Soin découverte", "Valérie Dupont"),
        sample("14:00", "15:20", "Soin corps complet", "Valérie Dupont"),
        sample("17:00", "17:55", "Massage relaxant", "Jackie Vernhères"),
    ],
    &[
        sample("09:40", "10:35", "Kobido visage", "Laetitia Martin"),
        sample("12:30", "13:30", "Séance entreprise", "Valérie Dupont"),
        sample("14:00", "14:45", "Massage express", "Prate Michelle"),
    ],
    &[SampleEvent {
        start: "09:00",
        end: "14:00",
        service: "Bloc formation interne",
        person: "Equipe Interne",
        color: Some(INTERNAL_BLOCK_COLOR),
    }],
    &[
        sample("09:15", "09:45", "Mise en beauté", "Manon Leroy"),
        sample("11:15", "12:15", "Soin éclat intense", "Danny Rossi"),
        sample("14:15", "15:20", "Modelage signature", "Sarah Benoit"),
        sample("17:00", "17:45", "Rehaussement de cils", "Isabelle Garnier"),
    ],
    &[
        sample("09:00", "09:35", "Pose vernis", "Séverine Lopez"),
        sample("11:00", "12:00", "Forfait duo", "Sabrina Moreau"),
        sample("18:00", "18:25", "Conseils personnalisés", "Laure Cousin"),
    ],
    &[
        sample("09:00", "10:30", "Coaching maquillage", "Equipe Collectif"),
        SampleEvent {
            start: "14:00",
            end: "15:30",
            service: "Atelier collectif",
            person: "Equipe Collectif",
            color: Some(INTERNAL_BLOCK_COLOR),
        },
    ],
    &[],
];

/// Monday of the week containing `today`, shifted by `week_offset` weeks.
/// An offset that leaves the representable date range keeps the current week.
pub fn start_of_week(today: NaiveDate, week_offset: i64) -> NaiveDate {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    shifted_monday(monday, week_offset).unwrap_or(monday)
}

fn shifted_monday(monday: NaiveDate, week_offset: i64) -> Option<NaiveDate> {
    let shifted = monday.checked_add_signed(Duration::try_weeks(week_offset)?)?;
    // the whole week must stay representable for the bounds and summary
    shifted.checked_add_signed(Duration::days(DAYS_PER_WEEK))?;
    Some(shifted)
}

/// `[Monday 00:00, next Monday 00:00)` in `tz`, as UTC instants.
pub fn week_bounds(monday: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = localize(monday.and_time(NaiveTime::MIN), tz);
    let end = localize(
        (monday + Duration::days(DAYS_PER_WEEK)).and_time(NaiveTime::MIN),
        tz,
    );
    (start, end)
}

/// Header line such as `Semaine 2 · 08/01 → 14/01`.
pub fn planner_week_summary(monday: NaiveDate) -> String {
    let sunday = monday + Duration::days(DAYS_PER_WEEK - 1);
    format!(
        "Semaine {} · {} → {}",
        monday.iso_week().week(),
        monday.format("%d/%m"),
        sunday.format("%d/%m")
    )
}

pub fn empty_week(monday: NaiveDate) -> Vec<DayGroup> {
    (0..DAYS_PER_WEEK)
        .map(|offset| DayGroup::empty(monday + Duration::days(offset)))
        .collect()
}

/// The fixed demonstration week, identical on every call.
pub fn sample_week(tz: &Tz) -> Vec<DayGroup> {
    let monday = sample_week_monday();
    let mut week = empty_week(monday);

    for ((day_index, group), samples) in week.iter_mut().enumerate().zip(SAMPLE_WEEK.iter()) {
        let day = monday + Duration::days(day_index as i64);
        for (index, entry) in samples.iter().enumerate() {
            let Some(layout) = compute_block_clock(entry.start, entry.end) else {
                continue;
            };
            let (Ok(start), Ok(end)) = (
                NaiveTime::parse_from_str(entry.start, "%H:%M"),
                NaiveTime::parse_from_str(entry.end, "%H:%M"),
            ) else {
                continue;
            };
            let start_local = localize(day.and_time(start), tz).with_timezone(tz);
            let end_local = localize(day.and_time(end), tz).with_timezone(tz);

            group.events.push(EventView {
                event_id: None,
                label: group.label.clone(),
                date: group.date.clone(),
                time: format!("{} – {}", entry.start, entry.end),
                title: display_title(entry.person, entry.service),
                color: entry
                    .color
                    .unwrap_or_else(|| event_colour(index))
                    .to_string(),
                service: entry.service.to_string(),
                category: String::new(),
                description: String::new(),
                status: EventStatus::Planned.label().to_string(),
                created_by: entry.person.to_string(),
                client: String::new(),
                start: iso_local(&start_local),
                end: iso_local(&end_local),
                top_pct: layout.top_pct,
                height_pct: layout.height_pct,
            });
        }
    }

    week
}

/// Maps event titles to service names and categories in one query.
/// When several services share a name, the calendar owner's wins.
fn load_service_lookup(
    conn: &mut PgConnection,
    titles: &HashSet<&str>,
    owner_id: Uuid,
) -> QueryResult<ServiceLookup> {
    if titles.is_empty() {
        return Ok(ServiceLookup::new());
    }

    let rows: Vec<(String, Uuid, String)> = services::table
        .inner_join(categories::table)
        .filter(services::name.eq_any(titles.iter().copied().collect::<Vec<_>>()))
        .order((services::name.asc(), services::created_at.asc()))
        .select((services::name, services::created_by, categories::name))
        .load(conn)?;

    let mut lookup = ServiceLookup::new();
    for (name, created_by, category) in rows {
        let owned = created_by == owner_id;
        if owned || !lookup.contains_key(&name) {
            lookup.insert(
                name.clone(),
                ServiceInfo {
                    name,
                    category: Some(category),
                },
            );
        }
    }
    Ok(lookup)
}

/// Buckets events by local day, keeping start order inside each day, and
/// builds their views with a colour index restarting every day.
fn group_events(
    monday: NaiveDate,
    week_events: &[Event],
    people: &HashMap<Uuid, User>,
    clients: &HashMap<Uuid, Uuid>,
    services: &ServiceLookup,
    tz: &Tz,
) -> Vec<DayGroup> {
    let mut week = empty_week(monday);

    for event in week_events {
        let local_day = event.start_at.with_timezone(tz).date_naive();
        let day_index = (local_day - monday).num_days();
        let Some(group) = usize::try_from(day_index)
            .ok()
            .and_then(|index| week.get_mut(index))
        else {
            continue;
        };

        let record = EventRecord {
            event,
            creator: event.created_by.and_then(|id| people.get(&id)),
            client: clients.get(&event.id).and_then(|id| people.get(id)),
        };
        let index = group.events.len();
        group
            .events
            .push(build_event_view(record, index, services, tz));
    }

    week
}

/// Planner data for the week `week_offset` weeks away from today in `tz`.
pub fn build_calendar_events(
    conn: &mut PgConnection,
    calendar: Option<&Calendar>,
    week_offset: i64,
    tz: &Tz,
) -> QueryResult<Vec<DayGroup>> {
    let today = Utc::now().with_timezone(tz).date_naive();
    build_calendar_events_on(conn, calendar, week_offset, tz, today)
}

/// Same as [`build_calendar_events`] with an explicit current date.
pub fn build_calendar_events_on(
    conn: &mut PgConnection,
    calendar: Option<&Calendar>,
    week_offset: i64,
    tz: &Tz,
    today: NaiveDate,
) -> QueryResult<Vec<DayGroup>> {
    let Some(calendar) = calendar else {
        return Ok(sample_week(tz));
    };

    let monday = start_of_week(today, week_offset);
    let (start, end) = week_bounds(monday, tz);

    let week_events: Vec<Event> = events::table
        .filter(events::calendar_id.eq(calendar.id))
        .filter(events::start_at.ge(start))
        .filter(events::start_at.lt(end))
        .order((events::start_at.asc(), events::created_at.asc()))
        .select(Event::as_select())
        .load(conn)?;

    if week_events.is_empty() {
        return Ok(empty_week(monday));
    }

    let event_ids: Vec<Uuid> = week_events.iter().map(|e| e.id).collect();
    let attendees: Vec<EventAttendee> = event_attendees::table
        .filter(event_attendees::event_id.eq_any(&event_ids))
        .order((event_attendees::event_id.asc(), event_attendees::id.asc()))
        .select(EventAttendee::as_select())
        .load(conn)?;

    let creators: HashMap<Uuid, Option<Uuid>> =
        week_events.iter().map(|e| (e.id, e.created_by)).collect();
    let mut clients: HashMap<Uuid, Uuid> = HashMap::new();
    for attendee in &attendees {
        let creator = creators.get(&attendee.event_id).copied().flatten();
        if creator != Some(attendee.user_id) {
            clients.entry(attendee.event_id).or_insert(attendee.user_id);
        }
    }

    let mut user_ids: HashSet<Uuid> = week_events.iter().filter_map(|e| e.created_by).collect();
    user_ids.extend(clients.values().copied());
    let people: HashMap<Uuid, User> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        users::table
            .filter(users::id.eq_any(user_ids.into_iter().collect::<Vec<_>>()))
            .select(User::as_select())
            .load(conn)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    let titles: HashSet<&str> = week_events.iter().map(|e| e.title.as_str()).collect();
    let services = load_service_lookup(conn, &titles, calendar.owner_id)?;

    Ok(group_events(
        monday,
        &week_events,
        &people,
        &clients,
        &services,
        tz,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_week() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            start_of_week(wednesday, 0),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert_eq!(
            start_of_week(wednesday, 1),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            start_of_week(wednesday, -2),
            NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()
        );

        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        assert_eq!(start_of_week(sunday, 0), sample_week_monday());
    }

    #[test]
    fn test_out_of_range_offset_keeps_current_week() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        for offset in [100_000_000, i64::MAX, i64::MIN] {
            assert_eq!(start_of_week(wednesday, offset), sample_week_monday());
        }
        assert_eq!(
            planner_week_summary(start_of_week(wednesday, i64::MAX)),
            "Semaine 2 · 08/01 → 14/01"
        );
    }

    #[test]
    fn test_week_bounds_in_local_zone() {
        let tz = chrono_tz::Europe::Paris;
        let (start, end) = week_bounds(sample_week_monday(), &tz);
        assert_eq!(start.to_rfc3339(), "2024-01-07T23:00:00+00:00");
        assert_eq!(end - start, Duration::days(7));
    }

    #[test]
    fn test_week_summary() {
        assert_eq!(
            planner_week_summary(sample_week_monday()),
            "Semaine 2 · 08/01 → 14/01"
        );
    }

    #[test]
    fn test_empty_week_has_seven_days() {
        let week = empty_week(sample_week_monday());
        let labels: Vec<&str> = week.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Lun.", "Mar.", "Mer.", "Jeu.", "Ven.", "Sam.", "Dim."]
        );
        assert_eq!(week[0].date, "08/01");
        assert_eq!(week[6].date, "14/01");
        assert!(week.iter().all(|d| d.events.is_empty()));
    }

    #[test]
    fn test_sample_week_is_deterministic() {
        let tz = chrono_tz::Europe::Paris;
        let first = sample_week(&tz);
        assert_eq!(first, sample_week(&tz));
        assert_eq!(first.len(), 7);

        let counts: Vec<usize> = first.iter().map(|d| d.events.len()).collect();
        assert_eq!(counts, [4, 3, 1, 4, 3, 2, 0]);

        let monday = &first[0].events[0];
        assert_eq!(monday.event_id, None);
        assert_eq!(monday.title, "Camille Thomas · Modelage bien-être");
        assert_eq!(monday.time, "09:00 – 10:05");
        assert_eq!(monday.start, "2024-01-08T09:00:00+01:00");
        assert_eq!(monday.color, PALETTE_FIRST);
        assert_eq!(first[0].events[1].color, "#E07B39");
    }

    const PALETTE_FIRST: &str = "#7C8FF8";

    #[test]
    fn test_sample_week_colour_overrides() {
        let tz = chrono_tz::Europe::Paris;
        let week = sample_week(&tz);
        assert_eq!(week[2].events[0].color, INTERNAL_BLOCK_COLOR);
        assert_eq!(week[5].events[0].color, PALETTE_FIRST);
        assert_eq!(week[5].events[1].color, INTERNAL_BLOCK_COLOR);
    }

    #[test]
    fn test_group_events_restarts_colours_per_day() {
        let tz = chrono_tz::Europe::Paris;
        let monday = sample_week_monday();
        let at = |day: i64, hour: u32| {
            localize(
                (monday + Duration::days(day)).and_hms_opt(hour, 0, 0).unwrap(),
                &tz,
            )
        };
        let make = |title: &str, start: DateTime<Utc>| Event {
            id: Uuid::new_v4(),
            calendar_id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            start_at: start,
            end_at: start + Duration::hours(1),
            status: EventStatus::Planned,
            created_by: None,
            created_at: Utc::now(),
        };
        let events = vec![
            make("A", at(0, 9)),
            make("B", at(0, 11)),
            make("C", at(3, 10)),
        ];

        let week = group_events(
            monday,
            &events,
            &HashMap::new(),
            &HashMap::new(),
            &ServiceLookup::new(),
            &tz,
        );

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].events.len(), 2);
        assert_eq!(week[0].events[0].color, "#7C8FF8");
        assert_eq!(week[0].events[1].color, "#E07B39");
        assert_eq!(week[3].events[0].color, "#7C8FF8");
        assert_eq!(week[3].events[0].label, "Jeu.");
    }
}
