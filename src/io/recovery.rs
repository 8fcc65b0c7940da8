use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use super::lock::try_flock;

/// Size past which the recovery log is trimmed on the next append (1 MB)
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Entries older than this are dropped first when trimming
const PRUNE_AGE_DAYS: i64 = 30;

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- daylog recovery log: append-only
     Logs that could not be written, and logs you deleted, end up here
     as raw JSON. Safe to delete once you no longer need them. -->

---
";

/// Why a document was captured in the recovery log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryReason {
    /// The document file could not be written
    Write,
    /// The log was deleted on request
    Delete,
}

impl fmt::Display for RecoveryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryReason::Write => write!(f, "write"),
            RecoveryReason::Delete => write!(f, "delete"),
        }
    }
}

/// One captured document
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub reason: RecoveryReason,
    pub log_id: String,
    pub detail: Option<String>,
    /// Pretty-printed JSON of the document
    pub body: String,
}

impl RecoveryEntry {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.reason,
            self.log_id,
        );
        if let Some(detail) = &self.detail {
            out.push_str(&format!("Error: {}\n\n", detail));
        }
        out.push_str("```json\n");
        out.push_str(self.body.trim_end());
        out.push_str("\n```\n\n---\n");
        out
    }
}

/// Path of the recovery log inside `daylog/`
pub fn recovery_log_path(dir: &Path) -> PathBuf {
    dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append an entry. Failing to record is logged, never propagated.
pub fn log_recovery(dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(dir, &entry) {
        tracing::warn!(error = %e, log_id = %entry.log_id, "could not write to recovery log");
    }
}

fn append_entry(dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        try_inline_trim(&path);
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Trim the log in place. Skipped when another process holds it.
fn try_inline_trim(path: &Path) {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    if !try_flock(&file) {
        return;
    }

    let mut content = String::new();
    if file.read_to_string(&mut content).is_err() {
        return;
    }
    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = trim_entries(&content, &cutoff, MAX_LOG_SIZE as usize / 2);
    if trimmed.len() >= content.len() {
        return;
    }

    let rewrite = file
        .set_len(0)
        .and_then(|()| file.seek(SeekFrom::Start(0)))
        .and_then(|_| file.write_all(trimmed.as_bytes()));
    match rewrite {
        Ok(()) => tracing::info!(
            before = content.len(),
            after = trimmed.len(),
            "trimmed recovery log"
        ),
        Err(e) => tracing::warn!(error = %e, "could not trim recovery log"),
    }
}

fn entry_timestamp(heading: &str) -> Option<DateTime<Utc>> {
    let stamp = heading.split_whitespace().next()?;
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Drop entries older than `cutoff`, then the oldest remaining ones until the
/// log fits in `max_len`. The file header is always kept.
fn trim_entries(content: &str, cutoff: &DateTime<Utc>, max_len: usize) -> String {
    let mut header = String::new();
    let mut entries: Vec<(Option<DateTime<Utc>>, String)> = Vec::new();
    let mut in_header = true;

    for line in content.lines() {
        if in_header {
            header.push_str(line);
            header.push('\n');
            if line == "---" {
                in_header = false;
            }
            continue;
        }
        if let Some(heading) = line.strip_prefix("## ") {
            entries.push((entry_timestamp(heading), String::new()));
        }
        match entries.last_mut() {
            Some((_, body)) => {
                body.push_str(line);
                body.push('\n');
            }
            None => {
                header.push_str(line);
                header.push('\n');
            }
        }
    }

    let kept: Vec<String> = entries
        .into_iter()
        .filter(|(ts, _)| matches!(ts, Some(t) if t >= cutoff))
        .map(|(_, body)| body)
        .collect();

    let mut len = header.len() + kept.iter().map(String::len).sum::<usize>();
    let mut skip = 0;
    while len > max_len && skip < kept.len() {
        len -= kept[skip].len();
        skip += 1;
    }

    let mut out = header;
    for body in &kept[skip..] {
        out.push_str(body);
    }
    out
}
