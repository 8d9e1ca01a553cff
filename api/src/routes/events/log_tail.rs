//! Incremental tail of a JSON-Lines log file.
//!
//! The broker only ever reads these files; reviewers and the broker's own
//! logging write them elsewhere. Rotation shows up as the file shrinking
//! below the last-known offset, which resets the cursor to the top.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

pub struct LogTail {
    path: PathBuf,
    offset: u64,
    primed: bool,
}

impl LogTail {
    /// Binds a tail to `log_dir/name`. Rejects anything that could escape
    /// the log directory; the name must be a bare file name.
    pub fn open(log_dir: &Path, name: &str) -> Option<Self> {
        if name.is_empty()
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
        {
            return None;
        }
        Some(Self {
            path: log_dir.join(name),
            offset: 0,
            primed: false,
        })
    }

    /// Complete lines appended since the last poll. The first poll only
    /// positions the cursor at the current end (tail semantics). A missing
    /// file is not an error, the tail just stays quiet until it appears.
    pub async fn poll(&mut self) -> std::io::Result<Vec<String>> {
        let meta = match fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(_) => return Ok(Vec::new()),
        };
        let len = meta.len();

        if !self.primed {
            self.primed = true;
            self.offset = len;
            return Ok(Vec::new());
        }
        if len < self.offset {
            // Rotated underneath us.
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.take(len - self.offset).read_to_end(&mut buf).await?;

        // Only complete lines advance the cursor; a partially written line
        // is picked up whole on the next poll.
        let Some(last_nl) = buf.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &buf[..=last_nl];
        self.offset += (last_nl + 1) as u64;

        let text = String::from_utf8_lossy(complete);
        Ok(text
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal() {
        let dir = Path::new("/tmp/logs");
        assert!(LogTail::open(dir, "../etc/passwd").is_none());
        assert!(LogTail::open(dir, "a/b.jsonl").is_none());
        assert!(LogTail::open(dir, "").is_none());
        assert!(LogTail::open(dir, "broker.jsonl").is_some());
    }

    #[tokio::test]
    async fn emits_only_new_complete_lines_and_handles_rotation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.jsonl");
        std::fs::write(&path, "{\"n\":1}\n").unwrap();

        let mut tail = LogTail::open(dir.path(), "events.jsonl").unwrap();
        // First poll primes the cursor at end-of-file.
        assert!(tail.poll().await.unwrap().is_empty());

        std::fs::write(&path, "{\"n\":1}\n{\"n\":2}\n{\"n\":3").unwrap();
        assert_eq!(tail.poll().await.unwrap(), vec!["{\"n\":2}".to_string()]);

        // Rotation: file replaced with something shorter.
        std::fs::write(&path, "{\"n\":9}\n").unwrap();
        assert_eq!(tail.poll().await.unwrap(), vec!["{\"n\":9}".to_string()]);
    }
}
