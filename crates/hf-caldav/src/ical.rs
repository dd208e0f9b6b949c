// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal iCalendar rendering: one empty calendar, one event at a time.

use chrono::{DateTime, Utc};
use hf_error::{ErrorKind, HarnessError, Result};
use hf_store::Appointment;

const CRLF: &str = "\r\n";
const PRODID: &str = "-//Events Calendar//iCal4j 1.0//EN";
const END_CALENDAR: &str = "END:VCALENDAR";

fn utc_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value (RFC 5545 §3.3.11).
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// An empty private calendar for `owner`.
pub fn render_calendar(owner: &str) -> String {
    let name = escape_text(&format!("{owner} private"));
    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        format!("PRODID:{PRODID}"),
        "VERSION:2.0".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        format!("NAME:{name}"),
        format!("X-NAME:{name}"),
        format!("DisplayName:{name}"),
        format!("DESCRIPTION:{}", escape_text(&format!("The private calendar of {owner}"))),
        END_CALENDAR.to_string(),
    ];
    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

/// A VEVENT for `appointment`.
pub fn render_event(appointment: &Appointment, uid: &str, stamp: DateTime<Utc>) -> String {
    let lines = [
        "BEGIN:VEVENT".to_string(),
        format!("DTSTAMP:{}", utc_stamp(stamp)),
        format!("DTSTART:{}", utc_stamp(appointment.start_at)),
        format!("DTEND:{}", utc_stamp(appointment.end_at)),
        format!("SUMMARY:{}", escape_text(&appointment.title)),
        format!("UID:{uid}"),
        "END:VEVENT".to_string(),
    ];
    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

/// Insert `event` just before the calendar's closing line.
pub fn insert_event(calendar: &str, event: &str) -> Result<String> {
    let at = calendar.rfind(END_CALENDAR).ok_or_else(|| {
        HarnessError::new(ErrorKind::Parse, "calendar has no END:VCALENDAR line")
            .with_context("length", calendar.len())
    })?;
    let (head, tail) = calendar.split_at(at);
    let mut out = String::with_capacity(calendar.len() + event.len() + 2);
    out.push_str(head);
    if !head.is_empty() && !head.ends_with('\n') {
        out.push_str(CRLF);
    }
    out.push_str(event);
    out.push_str(tail);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn appointment() -> Appointment {
        Appointment {
            title: "Doctor, Dentist; etc".into(),
            start_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            end_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 45, 0).unwrap(),
        }
    }

    #[test]
    fn calendar_names_the_owner() {
        let cal = render_calendar("Ann");
        assert!(cal.starts_with("BEGIN:VCALENDAR\r\nPRODID:-//Events Calendar//iCal4j 1.0//EN\r\n"));
        assert!(cal.contains("\r\nX-NAME:Ann private\r\n"));
        assert!(cal.contains("\r\nDisplayName:Ann private\r\n"));
        assert!(cal.contains("\r\nDESCRIPTION:The private calendar of Ann\r\n"));
        assert!(cal.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn event_uses_utc_stamps_and_escapes_the_summary() {
        let ev = render_event(&appointment(), "uid-1", Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
        assert!(ev.contains("DTSTART:20250601T090000Z\r\n"));
        assert!(ev.contains("DTEND:20250601T094500Z\r\n"));
        assert!(ev.contains("DTSTAMP:20250601T080000Z\r\n"));
        assert!(ev.contains("SUMMARY:Doctor\\, Dentist\\; etc\r\n"));
        assert!(ev.contains("UID:uid-1\r\n"));
    }

    #[test]
    fn events_go_before_the_closing_line() {
        let cal = render_calendar("Ann");
        let ev = render_event(&appointment(), "uid-1", Utc::now());
        let merged = insert_event(&cal, &ev).unwrap();
        let begin = merged.find("BEGIN:VEVENT").unwrap();
        let end = merged.rfind("END:VCALENDAR").unwrap();
        assert!(begin < end);
        assert!(merged.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));

        let twice = insert_event(&merged, &ev).unwrap();
        assert_eq!(twice.matches("BEGIN:VEVENT").count(), 2);
    }

    #[test]
    fn calendars_without_lf_before_the_end_still_merge() {
        let merged = insert_event("BEGIN:VCALENDAR END:VCALENDAR", "BEGIN:VEVENT\r\nEND:VEVENT\r\n").unwrap();
        assert_eq!(merged, "BEGIN:VCALENDAR \r\nBEGIN:VEVENT\r\nEND:VEVENT\r\nEND:VCALENDAR");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = insert_event("<html>", "x").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
