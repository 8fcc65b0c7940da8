//! Text exports handed to an external summarizer through the clipboard.

use crate::model::log::{Category, LogRecord, LogType};
use crate::ops::group::GroupedLog;

/// Marker in front of updates listed under their ticket
pub const CHILD_MARKER: &str = "    ↳ ";

/// Type label of a brief line. A ticket closed on the filter date reads
/// `COMPLETED TODAY`.
fn type_label(log: &LogRecord, filter_date: Option<&str>) -> String {
    let closed_today = log.log_type == LogType::Closed
        && filter_date.is_some()
        && log.closed_date.as_deref() == filter_date;
    if closed_today {
        "COMPLETED TODAY".to_string()
    } else {
        log.log_type.as_str().to_uppercase()
    }
}

fn ref_info(log: &LogRecord) -> Option<String> {
    match (log.custom_id, log.task_ref) {
        (Some(id), _) => Some(format!("[TICKET #{}]", id)),
        (None, Some(r)) if log.log_type == LogType::Done => Some(format!("[REF #{}]", r)),
        _ => None,
    }
}

/// Entry text on one line
fn flatten_entry(entry: &str) -> String {
    entry
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// One brief line: `[date time] [cats] [TYPE] [TICKET #n] subject: entry`
pub fn brief_line(item: &GroupedLog, filter_date: Option<&str>) -> String {
    let log = &item.record;
    let mut line = String::new();
    if item.is_child {
        line.push_str(CHILD_MARKER);
    }
    line.push_str(&format!(
        "[{} {}] [{}] [{}]",
        log.date_string,
        log.time_part(),
        log.display_categories(),
        type_label(log, filter_date)
    ));
    if let Some(info) = ref_info(log) {
        line.push(' ');
        line.push_str(&info);
    }
    if let Some(subject) = &log.subject {
        line.push(' ');
        line.push_str(subject);
    }
    line.push_str(": ");
    line.push_str(&flatten_entry(&log.entry));
    line
}

/// Wrap the visible logs in the summarizer instructions.
///
/// `header` replaces the opening line when set.
pub fn format_brief(items: &[GroupedLog], filter_date: Option<&str>, header: Option<&str>) -> String {
    let opening = match (header, filter_date) {
        (Some(h), _) => h.to_string(),
        (None, Some(date)) => format!("Act as my Executive Officer. Here are my logs for {}.", date),
        (None, None) => "Act as my Executive Officer. Here are my logs.".to_string(),
    };
    let lines: Vec<String> = items.iter().map(|i| brief_line(i, filter_date)).collect();
    let data = if lines.is_empty() {
        "(no logs)".to_string()
    } else {
        lines.join("\n")
    };

    format!(
        "{opening}
Lines marked ↳ are progress updates on the ticket above them.

LOG DATA:
{data}

REQUIREMENTS:
1. After Action Report (AAR): what moved, per ticket, and what was completed.
2. Plan of the Day (POD): the open tickets that need attention next.
"
    )
}

fn report_lines(logs: &[&LogRecord]) -> String {
    logs.iter()
        .map(|l| format!("[{}] [{}] {}", l.time_part(), l.log_type, l.entry))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The two-report daily briefing for `date`, or `None` when that day has
/// no logs. A log tagged with both categories appears in both reports.
pub fn daily_report(date: &str, logs: &[LogRecord], header: Option<&str>) -> Option<String> {
    let day: Vec<&LogRecord> = logs.iter().filter(|l| l.date_string == date).collect();
    if day.is_empty() {
        return None;
    }
    let work: Vec<&LogRecord> = day.iter().copied().filter(|l| l.has_category(Category::Work)).collect();
    let home: Vec<&LogRecord> = day.iter().copied().filter(|l| l.has_category(Category::Home)).collect();

    let opening = header.map(str::to_string).unwrap_or_else(|| {
        format!("Act as my Executive Officer. Here are my logs for {}.", date)
    });
    let rule = "=========================================";
    Some(format!(
        "{opening}
Please generate TWO SEPARATE REPORTS based on the data below.

{rule}
REPORT 1: WORK MISSION
{rule}
LOG DATA:
{work}

REQUIREMENTS:
1. Work After Action Report (AAR).
2. Work Plan of the Day (POD).

{rule}
REPORT 2: HOME FRONT
{rule}
LOG DATA:
{home}

REQUIREMENTS:
1. Home After Action Report (AAR).
2. Home Plan of the Day (POD).
",
        work = report_lines(&work),
        home = report_lines(&home),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::TicketOrder;
    use crate::model::log::test_support::{record, ticket, update};
    use crate::ops::group::group_tickets;
    use insta::assert_snapshot;

    fn sample() -> Vec<LogRecord> {
        let mut opened = ticket("t", 5, "2025-04-01T09:00");
        opened.subject = Some("Roof".into());
        opened.entry = "Call roofer".into();
        opened.categories = vec![Category::Work, Category::Home];

        let mut first = update("u1", 5, "2025-04-02T10:00");
        first.entry = "Left voicemail".into();
        let mut second = update("u2", 5, "2025-04-03T08:30");
        second.entry = "Quote received\nbooked for Friday".into();

        let mut finished = ticket("c", 2, "2025-03-01T09:00");
        finished.log_type = LogType::Closed;
        finished.closed_date = Some("2025-04-03".into());
        finished.entry = "Renew passport".into();

        let mut note = record("n", LogType::Note, "2025-04-03T12:00");
        note.entry = "Lunch with Sam".into();
        note.categories = vec![Category::Home];

        vec![note, second, first, opened, finished]
    }

    #[test]
    fn brief_lists_tickets_with_indented_updates() {
        let grouped = group_tickets(&sample(), TicketOrder::OpenThenClosed);
        let brief = format_brief(&grouped, Some("2025-04-03"), None);
        assert_snapshot!(brief, @r"
        Act as my Executive Officer. Here are my logs for 2025-04-03.
        Lines marked ↳ are progress updates on the ticket above them.

        LOG DATA:
        [2025-04-01 09:00] [Work & Home] [OPEN] [TICKET #5] Roof: Call roofer
            ↳ [2025-04-03 08:30] [Work] [DONE] [REF #5]: Quote received / booked for Friday
            ↳ [2025-04-02 10:00] [Work] [DONE] [REF #5]: Left voicemail
        [2025-03-01 09:00] [Work] [COMPLETED TODAY] [TICKET #2]: Renew passport
        [2025-04-03 12:00] [Home] [NOTE]: Lunch with Sam

        REQUIREMENTS:
        1. After Action Report (AAR): what moved, per ticket, and what was completed.
        2. Plan of the Day (POD): the open tickets that need attention next.
        ");
    }

    #[test]
    fn closed_label_depends_on_filter_date() {
        let mut closed = ticket("c", 2, "2025-03-01T09:00");
        closed.log_type = LogType::Closed;
        closed.closed_date = Some("2025-04-03".into());
        let item = GroupedLog {
            record: closed,
            is_child: false,
        };
        assert!(brief_line(&item, Some("2025-04-03")).contains("[COMPLETED TODAY]"));
        assert!(brief_line(&item, Some("2025-04-04")).contains("[CLOSED]"));
        assert!(brief_line(&item, None).contains("[CLOSED]"));
    }

    #[test]
    fn header_override_and_empty_view() {
        let brief = format_brief(&[], None, Some("Summarize my week."));
        assert!(brief.starts_with("Summarize my week.\n"));
        assert!(brief.contains("LOG DATA:\n(no logs)\n"));
    }

    #[test]
    fn daily_report_splits_by_category() {
        let report = daily_report("2025-04-03", &sample(), None).unwrap();
        assert_snapshot!(report, @r"
        Act as my Executive Officer. Here are my logs for 2025-04-03.
        Please generate TWO SEPARATE REPORTS based on the data below.

        =========================================
        REPORT 1: WORK MISSION
        =========================================
        LOG DATA:
        [08:30] [Done] Quote received
        booked for Friday

        REQUIREMENTS:
        1. Work After Action Report (AAR).
        2. Work Plan of the Day (POD).

        =========================================
        REPORT 2: HOME FRONT
        =========================================
        LOG DATA:
        [12:00] [Note] Lunch with Sam

        REQUIREMENTS:
        1. Home After Action Report (AAR).
        2. Home Plan of the Day (POD).
        ");
    }

    #[test]
    fn daily_report_needs_logs_on_the_day() {
        assert_eq!(daily_report("2030-01-01", &sample(), None), None);
    }
}
