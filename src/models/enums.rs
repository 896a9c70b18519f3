use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Scheduled => "scheduled",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl AppointmentStatus {
    /// Legal lifecycle transitions. Everything else is forbidden:
    /// a confirmation may only land on `pending`, and cancellation or
    /// completion may only land on `scheduled`.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Scheduled)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::Scheduled, Self::Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Scheduled,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(AppointmentStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(AppointmentStatus::from_str("confirmed").is_err());
    }

    #[test]
    fn only_pending_may_become_scheduled() {
        assert!(AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Scheduled));
        assert!(!AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Scheduled));
        assert!(!AppointmentStatus::Cancelled.can_transition_to(AppointmentStatus::Scheduled));
    }

    #[test]
    fn only_scheduled_may_terminate() {
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Cancelled));
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Completed));
        assert!(!AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Completed));
        assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::Cancelled));
    }
}
