// libs/appointment-cell/src/services/catalog.rs
use chrono::{Duration, NaiveTime};

use crate::models::AppointmentType;

/// Fixed slot catalog and service durations. Everything here is a
/// process-wide constant: adding or changing a type touches one table.
pub struct ScheduleCatalog;

struct TypeConfig {
    duration_minutes: i64,
    slots: &'static [(u32, u32)],
    online_bookable: bool,
    brand_restricted: bool,
}

const HOURLY_SLOTS: &[(u32, u32)] = &[
    (7, 0),
    (8, 0),
    (9, 0),
    (10, 0),
    (11, 0),
    (13, 0),
    (14, 0),
    (15, 0),
    (16, 0),
];

const QUICK_SERVICE_SLOTS: &[(u32, u32)] = &[(7, 0), (8, 30), (10, 0), (13, 0), (14, 30)];

const TWO_HOUR_SLOTS: &[(u32, u32)] = &[(7, 0), (9, 0), (13, 0), (15, 0)];

fn config_for(appointment_type: AppointmentType) -> TypeConfig {
    match appointment_type {
        AppointmentType::OilChange => TypeConfig {
            duration_minutes: 60,
            slots: HOURLY_SLOTS,
            online_bookable: true,
            brand_restricted: false,
        },
        AppointmentType::QuickService => TypeConfig {
            duration_minutes: 90,
            slots: QUICK_SERVICE_SLOTS,
            online_bookable: true,
            brand_restricted: false,
        },
        AppointmentType::ManualWarrantyReview => TypeConfig {
            duration_minutes: 60,
            slots: HOURLY_SLOTS,
            online_bookable: true,
            brand_restricted: true,
        },
        AppointmentType::AutecoWarranty => TypeConfig {
            duration_minutes: 120,
            slots: TWO_HOUR_SLOTS,
            online_bookable: true,
            brand_restricted: true,
        },
        AppointmentType::Maintenance => TypeConfig {
            duration_minutes: 120,
            slots: TWO_HOUR_SLOTS,
            online_bookable: true,
            brand_restricted: false,
        },
        AppointmentType::Rework => TypeConfig {
            duration_minutes: 120,
            slots: &[],
            online_bookable: false,
            brand_restricted: false,
        },
        AppointmentType::Unplanned => TypeConfig {
            duration_minutes: 60,
            slots: &[],
            online_bookable: false,
            brand_restricted: false,
        },
    }
}

impl ScheduleCatalog {
    /// Bookable start times for a type, in catalog order. Empty for types
    /// without a fixed catalog (rework, unplanned).
    pub fn slots_for(appointment_type: AppointmentType) -> Vec<NaiveTime> {
        config_for(appointment_type)
            .slots
            .iter()
            .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            .collect()
    }

    pub fn duration_for(appointment_type: AppointmentType) -> Duration {
        Duration::minutes(config_for(appointment_type).duration_minutes)
    }

    pub fn is_online_bookable(appointment_type: AppointmentType) -> bool {
        config_for(appointment_type).online_bookable
    }

    pub fn is_brand_restricted(appointment_type: AppointmentType) -> bool {
        config_for(appointment_type).brand_restricted
    }

    /// Brand required by the brand-restricted warranty types.
    pub fn restricted_brand() -> &'static str {
        "AUTECO"
    }

    pub fn business_hours() -> (NaiveTime, NaiveTime) {
        (
            NaiveTime::from_hms_opt(7, 0, 0).expect("valid opening time"),
            NaiveTime::from_hms_opt(17, 0, 0).expect("valid closing time"),
        )
    }

    pub fn lunch_window() -> (NaiveTime, NaiveTime) {
        (
            NaiveTime::from_hms_opt(12, 0, 0).expect("valid lunch start"),
            NaiveTime::from_hms_opt(13, 0, 0).expect("valid lunch end"),
        )
    }

    /// A start time is workable when it falls inside business hours and
    /// outside the lunch window.
    pub fn is_within_working_hours(start: NaiveTime) -> bool {
        let (open, close) = Self::business_hours();
        let (lunch_start, lunch_end) = Self::lunch_window();

        if start < open || start >= close {
            return false;
        }
        !(start >= lunch_start && start < lunch_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_slots_stay_within_working_hours() {
        for appointment_type in [
            AppointmentType::OilChange,
            AppointmentType::QuickService,
            AppointmentType::ManualWarrantyReview,
            AppointmentType::AutecoWarranty,
            AppointmentType::Maintenance,
        ] {
            for slot in ScheduleCatalog::slots_for(appointment_type) {
                assert!(
                    ScheduleCatalog::is_within_working_hours(slot),
                    "{} slot {} violates working hours",
                    appointment_type,
                    slot
                );
            }
        }
    }

    #[test]
    fn rework_and_unplanned_have_no_catalog() {
        assert!(ScheduleCatalog::slots_for(AppointmentType::Rework).is_empty());
        assert!(ScheduleCatalog::slots_for(AppointmentType::Unplanned).is_empty());
    }

    #[test]
    fn rework_and_unplanned_are_not_online_bookable() {
        assert!(!ScheduleCatalog::is_online_bookable(AppointmentType::Rework));
        assert!(!ScheduleCatalog::is_online_bookable(AppointmentType::Unplanned));
        assert!(ScheduleCatalog::is_online_bookable(AppointmentType::OilChange));
    }

    #[test]
    fn warranty_types_are_brand_restricted() {
        assert!(ScheduleCatalog::is_brand_restricted(AppointmentType::AutecoWarranty));
        assert!(ScheduleCatalog::is_brand_restricted(AppointmentType::ManualWarrantyReview));
        assert!(!ScheduleCatalog::is_brand_restricted(AppointmentType::Maintenance));
    }

    #[test]
    fn lunch_window_start_is_rejected() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let half_past = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        let one_pm = NaiveTime::from_hms_opt(13, 0, 0).unwrap();

        assert!(!ScheduleCatalog::is_within_working_hours(noon));
        assert!(!ScheduleCatalog::is_within_working_hours(half_past));
        assert!(ScheduleCatalog::is_within_working_hours(one_pm));
    }

    #[test]
    fn closing_time_is_not_a_valid_start() {
        let (open, close) = ScheduleCatalog::business_hours();
        assert!(ScheduleCatalog::is_within_working_hours(open));
        assert!(!ScheduleCatalog::is_within_working_hours(close));
    }
}
