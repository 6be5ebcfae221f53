//! Output buffer with a size-threshold flush hook. Assemblers append
//! whole packed areas, so a flushed buffer always holds complete items.

pub const DEFAULT_FLUSH_THRESHOLD: usize = 1024 * 1024;

pub struct CallbackBuffer {
    buffer: Vec<u8>,
    threshold: usize,
    callback: Option<Box<dyn FnMut(Vec<u8>) + Send>>,
}

impl CallbackBuffer {
    pub fn new() -> CallbackBuffer {
        CallbackBuffer::with_threshold(DEFAULT_FLUSH_THRESHOLD)
    }

    pub fn with_threshold(threshold: usize) -> CallbackBuffer {
        CallbackBuffer {
            buffer: Vec::new(),
            threshold,
            callback: None,
        }
    }

    /// Install the sink taking ownership of each full buffer. Without a
    /// callback the buffer is pulled through [read].
    pub fn set_callback(&mut self, callback: Box<dyn FnMut(Vec<u8>) + Send>) {
        self.callback = Some(callback);
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn set_threshold(&mut self, threshold: usize) {
        self.threshold = threshold;
    }

    pub fn buffer(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Hand the buffer to the callback if it has grown past the
    /// threshold, replacing it with a fresh one.
    pub fn possibly_flush(&mut self) {
        if self.buffer.len() >= self.threshold {
            self.flush();
        }
    }

    /// Hand off whatever is buffered, regardless of size.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        match &mut self.callback {
            Some(cb) => {
                let full = std::mem::take(&mut self.buffer);
                cb(full);
            }
            None => {}
        }
    }

    /// Pull the current buffer in pull mode.
    pub fn read(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_possibly_flush_below_threshold() {
        let mut cb = CallbackBuffer::with_threshold(16);
        let sink = Arc::new(Mutex::new(Vec::new()));
        let s = sink.clone();
        cb.set_callback(Box::new(move |b| s.lock().unwrap().push(b)));

        cb.buffer().extend(b"abcde");
        cb.possibly_flush();
        assert!(sink.lock().unwrap().is_empty());
        assert_eq!(cb.len(), 5);
    }

    #[test]
    fn test_possibly_flush_over_threshold() {
        let mut cb = CallbackBuffer::with_threshold(4);
        let sink = Arc::new(Mutex::new(Vec::new()));
        let s = sink.clone();
        cb.set_callback(Box::new(move |b| s.lock().unwrap().push(b)));

        cb.buffer().extend(b"abcde");
        cb.possibly_flush();
        let got = sink.lock().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0], b"abcde");
        assert_eq!(cb.len(), 0);
    }

    #[test]
    fn test_flush_forces_handoff() {
        let mut cb = CallbackBuffer::with_threshold(1024);
        let sink = Arc::new(Mutex::new(Vec::new()));
        let s = sink.clone();
        cb.set_callback(Box::new(move |b| s.lock().unwrap().push(b)));

        cb.flush();
        assert!(sink.lock().unwrap().is_empty());

        cb.buffer().extend(b"xy");
        cb.flush();
        assert_eq!(sink.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_read_pull_mode() {
        let mut cb = CallbackBuffer::new();
        cb.buffer().extend(b"stuff");
        assert_eq!(cb.read(), b"stuff");
        assert_eq!(cb.len(), 0);
    }

    #[test]
    fn test_clear_callback_returns_to_pull_mode() {
        let mut cb = CallbackBuffer::with_threshold(4);
        let sink = Arc::new(Mutex::new(Vec::new()));
        let s = sink.clone();
        cb.set_callback(Box::new(move |b| s.lock().unwrap().push(b)));
        cb.clear_callback();

        cb.buffer().extend(b"abcde");
        cb.possibly_flush();
        cb.flush();
        assert!(sink.lock().unwrap().is_empty());
        assert_eq!(cb.read(), b"abcde");
    }
}
