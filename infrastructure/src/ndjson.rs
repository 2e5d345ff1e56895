//! NDJSON event writer
//!
//! Drains an event stream into any `AsyncWrite`, one JSON object per line,
//! flushing after every line so consumers see chunks as they happen. Any
//! transport that carries ordered lines (stdout, an HTTP chunked body) can
//! reuse this framing.

use council_domain::CouncilEvent;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Write every event as one JSON line, flushing per line.
///
/// Returns when the stream ends (the driver task dropped its sink) or the
/// writer fails; a failed writer drops the stream, which cancels the turn
/// upstream.
pub async fn write_events<S, W>(mut events: S, writer: &mut W) -> std::io::Result<()>
where
    S: Stream<Item = CouncilEvent> + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.next().await {
        let line = serde_json::to_vec(&event).map_err(std::io::Error::other)?;
        writer.write_all(&line).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{CouncilEvent, Stage};
    use tokio_stream::wrappers::ReceiverStream;

    #[tokio::test]
    async fn test_one_json_object_per_line() {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tx.send(CouncilEvent::stage_update(Stage::FirstOpinions))
            .await
            .unwrap();
        tx.send(CouncilEvent::model_chunk("m1", "4")).await.unwrap();
        tx.send(CouncilEvent::Complete).await.unwrap();
        drop(tx);

        let mut out: Vec<u8> = Vec::new();
        write_events(ReceiverStream::new(rx), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "stage_update");
        assert_eq!(first["stage"], "first_opinions");
        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["type"], "complete");
    }

    #[tokio::test]
    async fn test_empty_stream_writes_nothing() {
        let (tx, rx) = tokio::sync::mpsc::channel::<CouncilEvent>(1);
        drop(tx);

        let mut out: Vec<u8> = Vec::new();
        write_events(ReceiverStream::new(rx), &mut out).await.unwrap();
        assert!(out.is_empty());
    }
}
