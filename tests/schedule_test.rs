use chrono::{NaiveDate, NaiveDateTime};

use writestack_server::domain::schedule::dto::CreateScheduleRequest;
use writestack_server::domain::schedule::service::{cron_for, has_lead_time, is_stale};

fn dt(h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 10)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

#[test]
fn cron_for_matches_one_shot_scheduler_format() {
    let at = NaiveDate::from_ymd_opt(2026, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 0)
        .unwrap();

    assert_eq!(cron_for(at), "cron(59 23 31 12 ? 2026)");
}

#[test]
fn cron_for_has_no_leading_zero_padding() {
    let at = NaiveDate::from_ymd_opt(2026, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 0)
        .unwrap();

    assert_eq!(cron_for(at), "cron(4 3 2 1 ? 2026)");
}

#[test]
fn fire_within_window_is_timely() {
    // Planned 12:00, fired 12:05 with a 20 minute window.
    assert!(!is_stale(dt(12, 0), dt(12, 5), 20));
}

#[test]
fn fire_past_window_is_stale() {
    // Planned 12:00, fired 12:25 with a 20 minute window.
    assert!(is_stale(dt(12, 0), dt(12, 25), 20));
}

#[test]
fn fire_exactly_on_window_boundary_is_timely() {
    assert!(!is_stale(dt(12, 0), dt(12, 20), 20));
}

#[test]
fn early_fire_is_never_stale() {
    assert!(!is_stale(dt(12, 0), dt(11, 50), 20));
}

#[test]
fn lead_time_boundary_is_inclusive() {
    assert!(has_lead_time(dt(12, 15), dt(12, 0), 15));
    assert!(!has_lead_time(dt(12, 14), dt(12, 0), 15));
}

#[test]
fn past_times_never_have_lead_time() {
    assert!(!has_lead_time(dt(11, 0), dt(12, 0), 15));
}

#[test]
fn create_schedule_request_parses_camel_case() {
    let json = r#"{"scheduledAt": "2026-03-10T12:30:00", "deleteIfExists": true}"#;

    let req: CreateScheduleRequest = serde_json::from_str(json).unwrap();

    assert_eq!(req.scheduled_at, dt(12, 30));
    assert!(req.delete_if_exists);
}

#[test]
fn delete_if_exists_defaults_to_false() {
    let json = r#"{"scheduledAt": "2026-03-10T12:30:00"}"#;

    let req: CreateScheduleRequest = serde_json::from_str(json).unwrap();

    assert!(!req.delete_if_exists);
}
