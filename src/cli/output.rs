use serde::Serialize;

use crate::model::log::{Attachment, Link, LogRecord};
use crate::ops::group::{GroupedLog, TicketGroup};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LogJson {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<u64>,
    #[serde(rename = "type")]
    pub log_type: String,
    pub categories: Vec<String>,
    /// Badge text, e.g. "Work & Home"
    pub category_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub entry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<u64>,
    pub date: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

#[derive(Serialize)]
pub struct GroupedLogJson {
    #[serde(flatten)]
    pub log: LogJson,
    pub is_child: bool,
}

#[derive(Serialize)]
pub struct TicketGroupJson {
    #[serde(flatten)]
    pub ticket: LogJson,
    pub child_count: usize,
    pub attachment_count: usize,
    pub children: Vec<LogJson>,
}

#[derive(Serialize)]
pub struct NextIdJson {
    pub next_id: u64,
}

#[derive(Serialize)]
pub struct DeletedJson {
    pub deleted: String,
}

pub fn log_to_json(log: &LogRecord) -> LogJson {
    LogJson {
        id: log.id.clone(),
        custom_id: log.custom_id,
        log_type: log.log_type.to_string(),
        categories: log.categories.iter().map(|c| c.to_string()).collect(),
        category_label: log.display_categories(),
        subject: log.subject.clone(),
        entry: log.entry.clone(),
        task_ref: log.task_ref,
        date: log.date_string.clone(),
        timestamp: log.timestamp.clone(),
        closed_date: log.closed_date.clone(),
        attachments: log.attachments.clone(),
        links: log.links.clone(),
    }
}

pub fn grouped_to_json(item: &GroupedLog) -> GroupedLogJson {
    GroupedLogJson {
        log: log_to_json(&item.record),
        is_child: item.is_child,
    }
}

pub fn group_to_json(group: &TicketGroup) -> TicketGroupJson {
    TicketGroupJson {
        ticket: log_to_json(&group.ticket),
        child_count: group.child_count(),
        attachment_count: group.attachment_count(),
        children: group.children.iter().map(log_to_json).collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// First line of the entry, with a marker when more follows
fn entry_summary(entry: &str) -> String {
    let mut lines = entry.lines();
    let first = lines.next().unwrap_or("");
    if lines.next().is_some() {
        format!("{} …", first)
    } else {
        first.to_string()
    }
}

/// One-line listing: `2025-04-01 09:00  Open    #5  [Work]  Roof: Call roofer  (id)`
pub fn format_log_line(log: &LogRecord) -> String {
    let label = log.id_label();
    let mut line = format!(
        "{} {}  {:<6}  {}{}[{}]  ",
        log.date_string,
        log.time_part(),
        log.log_type.as_str(),
        label,
        if label.is_empty() { "" } else { "  " },
        log.display_categories()
    );
    if let Some(subject) = &log.subject {
        line.push_str(subject);
        line.push_str(": ");
    }
    line.push_str(&entry_summary(&log.entry));
    if !log.attachments.is_empty() {
        line.push_str(&format!("  [{} file(s)]", log.attachments.len()));
    }
    line.push_str(&format!("  ({})", log.id));
    line
}

/// A grouped listing line; updates under a ticket are indented
pub fn format_grouped_line(item: &GroupedLog) -> String {
    if item.is_child {
        format!("    ↳ {}", format_log_line(&item.record))
    } else {
        format_log_line(&item.record)
    }
}

/// Board row: `#5  [Work]  Roof: Call roofer  (2 updates, 1 file)`
pub fn format_board_line(group: &TicketGroup) -> String {
    let ticket = &group.ticket;
    let mut line = format!(
        "#{:<4} [{}]  {}  ",
        group.custom_id(),
        ticket.display_categories(),
        ticket.date_string
    );
    if let Some(subject) = &ticket.subject {
        line.push_str(subject);
        line.push_str(": ");
    }
    line.push_str(&entry_summary(&ticket.entry));
    let updates = match group.child_count() {
        1 => "1 update".to_string(),
        n => format!("{} updates", n),
    };
    if group.attachment_count() > 0 {
        line.push_str(&format!("  ({}, {} file(s))", updates, group.attachment_count()));
    } else {
        line.push_str(&format!("  ({})", updates));
    }
    line
}

pub fn format_log_detail(log: &LogRecord) -> Vec<String> {
    let mut lines = Vec::new();
    let mut header = log.log_type.as_str().to_string();
    let label = log.id_label();
    if !label.is_empty() {
        header.push(' ');
        header.push_str(&label);
    }
    if let Some(subject) = &log.subject {
        header.push_str(" - ");
        header.push_str(subject);
    }
    lines.push(header);
    lines.push(format!("  id:         {}", log.id));
    lines.push(format!("  categories: {}", log.display_categories()));
    lines.push(format!("  when:       {} {}", log.date_string, log.time_part()));
    if let Some(closed) = &log.closed_date {
        lines.push(format!("  closed:     {}", closed));
    }
    if let Some(created) = log.created_at {
        lines.push(format!("  created:    {}", created.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    for attachment in &log.attachments {
        lines.push(format!("  file:       {} <{}>", attachment.name, attachment.url));
    }
    for link in &log.links {
        lines.push(format!("  link:       {} <{}>", link.title, link.url));
    }
    lines.push(String::new());
    for entry_line in log.entry.lines() {
        lines.push(format!("  {}", entry_line));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::log::LogType;
    use crate::model::log::test_support::{record, ticket, update};

    #[test]
    fn log_line_shows_labels_and_subject() {
        let mut log = ticket("abc", 5, "2025-04-01T09:00");
        log.subject = Some("Roof".into());
        log.entry = "Call roofer\nand the insurer".into();
        assert_eq!(
            format_log_line(&log),
            "2025-04-01 09:00  Open    #5  [Work]  Roof: Call roofer …  (abc)"
        );
    }

    #[test]
    fn child_lines_are_indented() {
        let item = GroupedLog {
            record: update("u", 5, "2025-04-02T10:00"),
            is_child: true,
        };
        assert_eq!(
            format_grouped_line(&item),
            "    ↳ 2025-04-02 10:00  Done    (Ref: #5)  [Work]  entry u  (u)"
        );
        let loose = GroupedLog {
            record: record("n", LogType::Note, "2025-04-02T11:00"),
            is_child: false,
        };
        assert_eq!(
            format_grouped_line(&loose),
            "2025-04-02 11:00  Note    [Work]  entry n  (n)"
        );
    }

    #[test]
    fn board_line_counts_updates() {
        let group = TicketGroup {
            ticket: ticket("t", 12, "2025-04-01T09:00"),
            children: vec![update("u", 12, "2025-04-02T10:00")],
        };
        assert_eq!(format_board_line(&group), "#12   [Work]  2025-04-01  entry t  (1 update)");
    }

    #[test]
    fn json_uses_store_field_names() {
        let log = update("u", 5, "2025-04-02T10:00");
        let json = serde_json::to_value(log_to_json(&log)).unwrap();
        assert_eq!(json["type"], "Done");
        assert_eq!(json["task_ref"], 5);
        assert_eq!(json["category_label"], "Work");
        assert!(json.get("custom_id").is_none());
    }
}
