use indexmap::IndexMap;
use serde::Serialize;

use crate::model::config::TicketOrder;
use crate::model::log::{LogRecord, LogType};
use crate::ops::filter::CategoryFilter;

/// A log in display order, marked when it is shown under its ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedLog {
    pub record: LogRecord,
    pub is_child: bool,
}

impl GroupedLog {
    fn top(record: LogRecord) -> Self {
        GroupedLog {
            record,
            is_child: false,
        }
    }

    fn child(record: LogRecord) -> Self {
        GroupedLog {
            record,
            is_child: true,
        }
    }
}

fn is_ticket(log: &LogRecord) -> bool {
    log.log_type.is_ticket() && log.custom_id.is_some()
}

fn is_child_candidate(log: &LogRecord) -> bool {
    log.log_type == LogType::Done && log.task_ref.is_some()
}

/// Newest first. Timestamps are zero-padded so string order is time order.
fn sort_newest_first(children: &mut [LogRecord]) {
    children.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Put tickets in emission order
fn order_tickets(tickets: Vec<LogRecord>, order: TicketOrder) -> Vec<LogRecord> {
    let (mut open, mut closed): (Vec<_>, Vec<_>) = match order {
        TicketOrder::Original => return tickets,
        TicketOrder::OpenThenClosed | TicketOrder::CustomIdAscending => tickets
            .into_iter()
            .partition(|t| t.log_type == LogType::Open),
    };
    if order == TicketOrder::CustomIdAscending {
        open.sort_by_key(|t| t.custom_id);
        closed.sort_by_key(|t| t.custom_id);
    }
    open.extend(closed);
    open
}

/// Rebuild the ticket hierarchy of a flat, filtered list.
///
/// Tickets (Open or Closed with a ticket number) are emitted per `order`,
/// each followed by the Done logs referencing it, newest first. Logs that
/// are neither tickets nor attached updates come last in input order. When
/// two tickets share a number, updates attach to the first one emitted.
pub fn group_tickets(logs: &[LogRecord], order: TicketOrder) -> Vec<GroupedLog> {
    let mut tickets = Vec::new();
    let mut candidates = Vec::new();
    // Input position is kept so unmatched updates rejoin the loose logs in order
    let mut loose: Vec<(usize, &LogRecord)> = Vec::new();
    for (pos, log) in logs.iter().enumerate() {
        if is_ticket(log) {
            tickets.push(log.clone());
        } else if is_child_candidate(log) {
            candidates.push((pos, log));
        } else {
            loose.push((pos, log));
        }
    }

    let tickets = order_tickets(tickets, order);

    let mut buckets: IndexMap<u64, Vec<LogRecord>> = IndexMap::new();
    for ticket in &tickets {
        if let Some(id) = ticket.custom_id {
            buckets.entry(id).or_default();
        }
    }

    for (pos, candidate) in candidates {
        let bucket = match candidate.task_ref {
            Some(r) => buckets.get_mut(&r),
            None => None,
        };
        match bucket {
            Some(bucket) => bucket.push(candidate.clone()),
            None => {
                tracing::debug!(
                    id = %candidate.id,
                    task_ref = ?candidate.task_ref,
                    "update has no visible ticket"
                );
                loose.push((pos, candidate));
            }
        }
    }
    for bucket in buckets.values_mut() {
        sort_newest_first(bucket);
    }
    loose.sort_by_key(|(pos, _)| *pos);

    let mut out = Vec::with_capacity(logs.len());
    for ticket in tickets {
        let children = ticket
            .custom_id
            .and_then(|id| buckets.swap_remove(&id))
            .unwrap_or_default();
        out.push(GroupedLog::top(ticket));
        out.extend(children.into_iter().map(GroupedLog::child));
    }
    out.extend(loose.into_iter().map(|(_, log)| GroupedLog::top(log.clone())));
    out
}

/// An open ticket on the task board with its full update history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketGroup {
    pub ticket: LogRecord,
    /// Newest first
    pub children: Vec<LogRecord>,
}

impl TicketGroup {
    pub fn custom_id(&self) -> u64 {
        self.ticket.custom_id.unwrap_or_default()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Attachments on the ticket itself
    pub fn attachment_count(&self) -> usize {
        self.ticket.attachments.len()
    }
}

/// Build the task board from every log in the store.
///
/// Only `Open` tickets in `category` are listed. Updates are not filtered by
/// category: a ticket shows its whole history.
pub fn task_board(logs: &[LogRecord], category: CategoryFilter, order: TicketOrder) -> Vec<TicketGroup> {
    let mut children: IndexMap<u64, Vec<LogRecord>> = IndexMap::new();
    for log in logs.iter().filter(|l| is_child_candidate(l)) {
        if let Some(r) = log.task_ref {
            children.entry(r).or_default().push(log.clone());
        }
    }
    for bucket in children.values_mut() {
        sort_newest_first(bucket);
    }

    let tickets: Vec<LogRecord> = logs
        .iter()
        .filter(|l| l.log_type == LogType::Open && l.custom_id.is_some())
        .filter(|l| category.matches(l))
        .cloned()
        .collect();

    order_tickets(tickets, order)
        .into_iter()
        .map(|ticket| {
            let children = ticket
                .custom_id
                .and_then(|id| children.get(&id).cloned())
                .unwrap_or_default();
            TicketGroup { ticket, children }
        })
        .collect()
}
