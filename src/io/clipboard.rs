use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Error type for clipboard writes
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard tool found (tried {tried})")]
    NoTool { tried: String },
    #[error("{tool} failed: {source}")]
    Io { tool: String, source: io::Error },
    #[error("{tool} exited with {status}")]
    Failed { tool: String, status: std::process::ExitStatus },
}

/// Clipboard commands to try, in order
fn candidates() -> Vec<(&'static str, Vec<&'static str>)> {
    if cfg!(target_os = "macos") {
        vec![("pbcopy", vec![])]
    } else if cfg!(target_os = "windows") {
        vec![("clip", vec![])]
    } else {
        vec![
            ("wl-copy", vec![]),
            ("xclip", vec!["-selection", "clipboard"]),
            ("xsel", vec!["--clipboard", "--input"]),
        ]
    }
}

fn pipe_to(tool: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let io_err = |source| ClipboardError::Io {
        tool: tool.to_string(),
        source,
    };
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(io_err)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).map_err(io_err)?;
    }
    let status = child.wait().map_err(io_err)?;
    if !status.success() {
        return Err(ClipboardError::Failed {
            tool: tool.to_string(),
            status,
        });
    }
    Ok(())
}

/// Write `text` to the system clipboard through the first available tool.
pub fn copy_text(text: &str) -> Result<(), ClipboardError> {
    let tools = candidates();
    for (tool, args) in &tools {
        match pipe_to(tool, args, text) {
            Ok(()) => {
                tracing::debug!(tool, bytes = text.len(), "copied to clipboard");
                return Ok(());
            }
            Err(ClipboardError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Err(ClipboardError::NoTool {
        tried: tools.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(", "),
    })
}
