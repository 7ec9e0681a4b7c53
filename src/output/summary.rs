//! Human-readable progress output

use crate::crawler::{Snapshot, SnapshotStream};
use crate::output::OutputResult;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Renders a snapshot as a short multi-line report
pub fn render_summary(snapshot: &Snapshot) -> String {
    let counts = &snapshot.counts;
    let status = match (&snapshot.error, snapshot.processed) {
        (Some(error), _) => format!("failed: {}", error),
        (None, true) => "complete".to_string(),
        (None, false) => "in progress".to_string(),
    };

    let mut out = format!("=== Open issues for {} ({}) ===\n", snapshot.url, status);
    out.push_str(&format!("  Total open:           {}\n", counts.total_open));
    out.push_str(&format!(
        "  Opened < 24h ago:     {}{}\n",
        counts.open_under_24h,
        percentage(counts.open_under_24h, counts.total_open)
    ));
    out.push_str(&format!(
        "  Opened 24h - 7d ago:  {}{}\n",
        counts.open_24h_to_7d,
        percentage(counts.open_24h_to_7d, counts.total_open)
    ));
    out.push_str(&format!(
        "  Opened > 7d ago:      {}{}\n",
        counts.open_over_7d,
        percentage(counts.open_over_7d, counts.total_open)
    ));
    out
}

fn percentage(part: u64, total: u64) -> String {
    if total == 0 {
        String::new()
    } else {
        format!(" ({:.1}%)", part as f64 / total as f64 * 100.0)
    }
}

/// Writes a one-line progress note per page and the full summary at the end
pub async fn write_summary_stream<W>(
    mut stream: SnapshotStream,
    writer: &mut W,
) -> OutputResult<Option<Snapshot>>
where
    W: AsyncWrite + Unpin,
{
    let mut last: Option<Snapshot> = None;

    while let Some(snapshot) = stream.next().await {
        let text = if snapshot.is_final() {
            render_summary(&snapshot)
        } else {
            format!("... {} open issues counted so far\n", snapshot.counts.total_open)
        };
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;
        last = Some(snapshot);
    }

    stream.close().await;
    Ok(last)
}
