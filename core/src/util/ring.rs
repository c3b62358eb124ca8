use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded byte buffer that keeps only the most recent `cap` bytes.
///
/// Shared between a drain task and the owner of the stream, so the tail of a
/// session's stderr is available for error messages after the session ends.
pub struct ByteRing {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
}

impl ByteRing {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        })
    }

    pub fn push(&self, data: &[u8]) {
        let mut g = self.inner.lock().unwrap();
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn to_string_lossy(&self) -> String {
        let g = self.inner.lock().unwrap();
        let bytes: Vec<u8> = g.iter().copied().collect();
        String::from_utf8_lossy(&bytes).to_string()
    }
}
