use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tracing::debug;

use crate::domain::{DomainError, StreamChunk};

/// Only lines carrying this prefix are significant; everything else
/// (heartbeat comments, blank lines) is ignored.
const DATA_PREFIX: &str = "data: ";
/// Terminal payload ending the stream without emitting a record.
const DONE_SENTINEL: &str = "[DONE]";

enum Frame {
    Chunk(StreamChunk),
    Done,
    Skip,
}

/// Classify one line of the event stream.
///
/// Frames whose payload fails to parse as JSON are skipped rather than
/// aborting the stream: partial or malformed chunks from the transport are a
/// tolerated condition, not a fatal one.
fn parse_frame(line: &str) -> Frame {
    let line = line.trim_end();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Skip;
    };
    if payload == DONE_SENTINEL {
        return Frame::Done;
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => Frame::Chunk(chunk),
        Err(e) => {
            debug!("Skipping undecodable stream frame: {e}");
            Frame::Skip
        }
    }
}

/// Adapts a raw byte stream of newline-delimited `data: ` frames into a lazy,
/// forward-only sequence of [`StreamChunk`]s.
///
/// Bytes are buffered until a full line is available, so frames split across
/// transport reads are reassembled transparently. The stream ends at the
/// `[DONE]` sentinel or when the underlying connection closes; it cannot be
/// restarted. Dropping it early is valid and releases the connection.
pub struct EventStream<S> {
    inner: S,
    buf: Vec<u8>,
    done: bool,
}

impl<S> EventStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Pop one complete line (without its newline) off the buffer.
    fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).take(pos).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl<S, B, E> Stream for EventStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = Result<StreamChunk, DomainError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.done {
                return Poll::Ready(None);
            }

            while let Some(line) = this.next_line() {
                match parse_frame(&line) {
                    Frame::Chunk(chunk) => return Poll::Ready(Some(Ok(chunk))),
                    Frame::Done => {
                        this.done = true;
                        return Poll::Ready(None);
                    }
                    Frame::Skip => {}
                }
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buf.extend_from_slice(bytes.as_ref()),
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(DomainError::transport(format!(
                        "stream interrupted: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    // A final frame without a trailing newline is still a frame.
                    if !this.buf.is_empty() {
                        let line = String::from_utf8_lossy(&this.buf).into_owned();
                        this.buf.clear();
                        if let Frame::Chunk(chunk) = parse_frame(&line) {
                            return Poll::Ready(Some(Ok(chunk)));
                        }
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::convert::Infallible;

    fn chunks(parts: Vec<&'static str>) -> impl Stream<Item = Result<&'static [u8], Infallible>> {
        futures_util::stream::iter(parts.into_iter().map(|p| Ok(p.as_bytes())))
    }

    async fn collect_contents<S>(stream: EventStream<S>) -> Vec<String>
    where
        S: Stream<Item = Result<&'static [u8], Infallible>> + Unpin,
    {
        stream
            .map(|r| r.expect("chunk"))
            .filter_map(|c| async move { c.into_content() })
            .collect()
            .await
    }

    #[tokio::test]
    async fn yields_chunks_in_order_and_stops_at_done() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n",
        );
        let contents = collect_contents(EventStream::new(chunks(vec![body]))).await;
        assert_eq!(contents, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn reassembles_frames_split_across_reads() {
        let parts = vec![
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"Hello\"}}]}\nda",
            "ta: [DONE]\n",
        ];
        let contents = collect_contents(EventStream::new(chunks(parts))).await;
        assert_eq!(contents, vec!["Hello"]);
    }

    #[tokio::test]
    async fn ignores_lines_without_data_prefix() {
        let body = concat!(
            ": keep-alive comment\n",
            "\n",
            "event: ping\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n",
            "data: [DONE]\n",
        );
        let contents = collect_contents(EventStream::new(chunks(vec![body]))).await;
        assert_eq!(contents, vec!["x"]);
    }

    #[tokio::test]
    async fn skips_undecodable_frames_without_aborting() {
        let body = concat!(
            "data: {truncated json\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
            "data: [DONE]\n",
        );
        let contents = collect_contents(EventStream::new(chunks(vec![body]))).await;
        assert_eq!(contents, vec!["ok"]);
    }

    #[tokio::test]
    async fn heartbeat_chunks_carry_no_content() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: [DONE]\n",
        );
        let stream = EventStream::new(chunks(vec![body]));
        let all: Vec<_> = stream.map(|r| r.expect("chunk")).collect().await;
        assert_eq!(all.len(), 2);
        assert!(all[0].content().is_none());
        assert_eq!(all[1].content(), Some("a"));
    }

    #[tokio::test]
    async fn emits_final_frame_without_trailing_newline() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}";
        let contents = collect_contents(EventStream::new(chunks(vec![body]))).await;
        assert_eq!(contents, vec!["end"]);
    }

    #[tokio::test]
    async fn tolerates_carriage_returns() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"crlf\"}}]}\r\n",
            "data: [DONE]\r\n",
        );
        let contents = collect_contents(EventStream::new(chunks(vec![body]))).await;
        assert_eq!(contents, vec!["crlf"]);
    }
}
