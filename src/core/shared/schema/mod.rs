pub mod core;
pub use self::core::*;

pub mod catalog;
pub use self::catalog::*;

pub mod calendar;
pub use self::calendar::*;

diesel::allow_tables_to_appear_in_same_query!(
    users,
    categories,
    services,
    workshops,
    workshop_services,
    workshop_professionals,
    calendars,
    events,
    event_attendees,
);
