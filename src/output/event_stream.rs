//! Push-stream event framing
//!
//! Each snapshot becomes one UTF-8 event of the form `data: <json>\n\n`. After the final
//! snapshot a separate `complete` event tells the consumer the stream is over.

use crate::crawler::{Snapshot, SnapshotStream};
use crate::output::OutputResult;
use crate::state::SessionState;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Sentinel event written after the final snapshot
pub const STREAM_COMPLETE_FRAME: &str = "event: complete\ndata: done\n\n";

/// Frames one snapshot as a `data:` event
///
/// `serde_json` never emits raw newlines, so the payload always fits on one `data:` line.
pub fn event_frame(snapshot: &Snapshot) -> OutputResult<String> {
    let json = serde_json::to_string(snapshot)?;
    Ok(format!("data: {}\n\n", json))
}

/// Writes every snapshot of `stream` to `writer`, flushing after each event
///
/// The completion sentinel is written only if the stream ended with a final snapshot.
/// A write failure (for example a disconnected client) closes the stream, which cancels
/// the session, and is then returned.
///
/// # Returns
///
/// * `Ok(Some(snapshot))` - The last snapshot written
/// * `Ok(None)` - The session ended without emitting anything
/// * `Err(OutputError)` - Writing failed
pub async fn write_event_stream<W>(
    mut stream: SnapshotStream,
    writer: &mut W,
) -> OutputResult<Option<Snapshot>>
where
    W: AsyncWrite + Unpin,
{
    let mut last = None;

    while let Some(snapshot) = stream.next().await {
        if let Err(e) = write_frame(writer, &event_frame(&snapshot)?).await {
            let state = stream.close().await;
            tracing::debug!("Event stream writer failed, session ended as {}", state);
            return Err(e.into());
        }
        last = Some(snapshot);
    }

    if last.as_ref().is_some_and(Snapshot::is_final) {
        write_frame(writer, STREAM_COMPLETE_FRAME).await?;
    }

    let state: SessionState = stream.close().await;
    tracing::debug!("Event stream finished, session ended as {}", state);

    Ok(last)
}

async fn write_frame<W>(writer: &mut W, frame: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}
