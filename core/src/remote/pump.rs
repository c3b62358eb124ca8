use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ClusterError;
use crate::util::ByteRing;

pub const LINE_CHANNEL_CAPACITY: usize = 256;

/// Pump a session's stdout into a line channel: read in chunks, split on
/// newlines, trim terminators, preserve arrival order. Lines are delivered
/// lazily; a full channel applies backpressure to the read loop.
pub fn pump_lines<R>(
    mut rd: R,
    line_tx: mpsc::Sender<String>,
) -> JoinHandle<Result<u64, ClusterError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| ClusterError::StreamIo {
                stream: "stdout",
                source: e,
            })?;
            if n == 0 {
                break;
            }
            total += n as u64;

            line_buf.extend_from_slice(&buf[..n]);
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
                trim_newline(&mut one);
                let line = String::from_utf8_lossy(&one).to_string();
                if line_tx.send(line).await.is_err() {
                    // Receiver gone: the follower was closed mid-stream.
                    return Ok(total);
                }
            }
        }

        // EOF flush: deliver the last partial line if it doesn't end with '\n'.
        if !line_buf.is_empty() {
            trim_newline(&mut line_buf);
            if !line_buf.is_empty() {
                let line = String::from_utf8_lossy(&line_buf).to_string();
                let _ = line_tx.send(line).await;
            }
        }

        Ok(total)
    })
}

/// Drain a session's stderr into a bounded ring so its tail is available for
/// error messages after the session ends.
pub fn drain_stderr<R>(mut rd: R, ring: Arc<ByteRing>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4 * 1024];
        loop {
            match rd.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => ring.push(&buf[..n]),
            }
        }
    })
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn flushes_last_line_without_newline_on_eof() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel::<String>(8);

        let task = pump_lines(rd, tx);

        wr.write_all(b"hello").await.unwrap();
        drop(wr);

        let line = rx.recv().await.expect("expected one line");
        assert_eq!(line, "hello");

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn splits_lines_and_trims_terminators() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel::<String>(8);

        let task = pump_lines(rd, tx);

        wr.write_all(b"one\r\ntwo\nthree\n").await.unwrap();
        drop(wr);

        assert_eq!(rx.recv().await.unwrap(), "one");
        assert_eq!(rx.recv().await.unwrap(), "two");
        assert_eq!(rx.recv().await.unwrap(), "three");
        assert!(rx.recv().await.is_none());

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_cleanly_when_the_receiver_goes_away() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, rx) = mpsc::channel::<String>(1);

        let task = pump_lines(rd, tx);
        drop(rx);

        wr.write_all(b"a\nb\n").await.unwrap();
        drop(wr);

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stderr_tail_is_captured_in_the_ring() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let ring = ByteRing::new(16);

        let task = drain_stderr(rd, ring.clone());

        wr.write_all(b"Connection refused").await.unwrap();
        drop(wr);
        task.await.unwrap();

        assert_eq!(ring.to_string_lossy(), "nnection refused");
    }
}
