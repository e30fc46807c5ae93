//! Database enum types.
//!
//! These map to `VARCHAR` columns holding the lowercase code of each
//! variant, so rows stay readable from `psql` while the Rust side keeps
//! exhaustive matching.

use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

macro_rules! text_enum_sql {
    ($name:ident) => {
        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(serialize::IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                value
                    .parse()
                    .map_err(|_| format!("Unknown {}: {}", stringify!($name), value).into())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============================================================================
// USER TYPES
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Professional,
    #[default]
    Individual,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Individual => "individual",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Professional => "Professionnel",
            Self::Individual => "Particulier",
        }
    }
}

impl FromStr for UserType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "professional" => Ok(Self::Professional),
            "individual" => Ok(Self::Individual),
            _ => Err(()),
        }
    }
}

text_enum_sql!(UserType);

// ============================================================================
// EVENT STATUS
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Planned,
    Confirmed,
    Canceled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        }
    }

    /// Human label shown in the planner.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planned => "Planifié",
            Self::Confirmed => "Confirmé",
            Self::Canceled => "Annulé",
        }
    }
}

impl FromStr for EventStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "confirmed" => Ok(Self::Confirmed),
            "canceled" => Ok(Self::Canceled),
            _ => Err(()),
        }
    }
}

text_enum_sql!(EventStatus);

// ============================================================================
// ATTENDEE ROLES
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeRole {
    Owner,
    #[default]
    Required,
    Optional,
}

impl AttendeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Required => "required",
            Self::Optional => "optional",
        }
    }
}

impl FromStr for AttendeeRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "required" => Ok(Self::Required),
            "optional" => Ok(Self::Optional),
            _ => Err(()),
        }
    }
}

text_enum_sql!(AttendeeRole);
