//! Background read-ahead cache over a positioned byte stream.
//!
//! Mirrors a chunk-ring preload strategy built for storage that is slow and
//! block-oriented (eMMC/SD behind a DMA controller): a background worker
//! keeps a ring of fixed-size chunks warm ahead of the consumer's read
//! cursor, and the consumer either copies out of the ring ("hit") or falls
//! back to a direct synchronous read ("miss"). Preload can be toggled off
//! entirely, in which case every read/seek is a plain passthrough against
//! the file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Size of one ring chunk.
pub const CHUNK_SIZE: usize = 128 * 1024;
/// Number of chunk slots in the ring. At most `CHUNK_COUNT - 1` are ever
/// occupied at once; the spare slot is what lets the worker always have
/// somewhere to preload into without racing a consumer read.
pub const CHUNK_COUNT: usize = 32;

const EVENT_ACTIVE: u8 = 1 << 0;
const EVENT_STOP: u8 = 1 << 1;

/// A tiny two-bit event flag set, standing in for the FreeRTOS event group
/// the original preload task was built on: threads can wait for any of a
/// mask of bits to become set without the heavier machinery of a full
/// channel.
struct EventFlags {
    bits: Mutex<u8>,
    condvar: Condvar,
}

impl EventFlags {
    fn new() -> Self {
        Self {
            bits: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    fn set(&self, bits: u8) {
        let mut guard = self.bits.lock();
        *guard |= bits;
        self.condvar.notify_all();
    }

    fn clear(&self, bits: u8) {
        *self.bits.lock() &= !bits;
    }

    /// Blocks for up to `timeout`, then returns the flags observed. `STOP`
    /// is one-shot and edge-triggered: if it's already set, return at once
    /// so shutdown is never delayed by the timeout. `ACTIVE` is
    /// level-triggered instead -- it stays set for the whole cached-mode
    /// session -- so its mere presence must not skip the wait, or the
    /// worker would busy-spin solid instead of ticking once per `timeout`.
    /// `set()` notifies waiters immediately, so enabling preload (or
    /// signaling stop) wakes a parked worker well before `timeout` elapses.
    fn wait(&self, timeout: Duration) -> u8 {
        let mut guard = self.bits.lock();
        if *guard & EVENT_STOP == 0 {
            self.condvar.wait_for(&mut guard, timeout);
        }
        *guard
    }
}

/// The ring of prefetched chunks plus the consumer's logical read cursor.
/// Both worker and consumer touch this under one lock.
struct RingState {
    current_offset: u64,
    first_chunk_offset: u64,
    chunk_head: usize,
    chunk_len: usize,
    buffers: Vec<Box<[u8]>>,
}

impl RingState {
    fn new() -> Self {
        Self {
            current_offset: 0,
            first_chunk_offset: 0,
            chunk_head: 0,
            chunk_len: 0,
            buffers: (0..CHUNK_COUNT)
                .map(|_| vec![0u8; CHUNK_SIZE].into_boxed_slice())
                .collect(),
        }
    }

    fn slot(&self, i: usize) -> usize {
        (self.chunk_head + i) % CHUNK_COUNT
    }
}

struct Shared {
    worker_file: Mutex<File>,
    file_size: u64,
    ring: Mutex<RingState>,
    flags: EventFlags,
}

/// A background read-ahead cache implementing [`Read`] + [`Seek`].
///
/// Opens the underlying path twice: one [`File`] handle drives passthrough
/// mode directly, a second lives behind the ring's mutex for the worker and
/// for miss-path reads. Two independent file descriptors have independent
/// OS cursors, so the two code paths never need to coordinate a shared
/// position.
pub struct BufferedReader {
    passthrough: File,
    shared: Arc<Shared>,
    preload_enabled: bool,
    worker: Option<JoinHandle<()>>,
}

impl BufferedReader {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let passthrough = File::open(path)?;
        let worker_file = File::open(path)?;
        let file_size = worker_file.metadata()?.len();

        let shared = Arc::new(Shared {
            worker_file: Mutex::new(worker_file),
            file_size,
            ring: Mutex::new(RingState::new()),
            flags: EventFlags::new(),
        });

        let worker = {
            let shared = shared.clone();
            std::thread::Builder::new()
                .name("avi-preload".into())
                .spawn(move || preload_worker(shared))
                .expect("failed to spawn preload worker thread")
        };

        Ok(Self {
            passthrough,
            shared,
            preload_enabled: false,
            worker: Some(worker),
        })
    }

    pub fn is_preload_enabled(&self) -> bool {
        self.preload_enabled
    }

    /// Signals the worker to stop, joins it, and drops both file handles.
    /// Equivalent to letting the reader fall out of scope; spelled out as a
    /// consuming method for callers that want an explicit close point.
    pub fn close(self) {}

    /// Enables or disables background read-ahead. Enabling synchronizes the
    /// ring's notion of the current offset with the passthrough file's
    /// cursor and gives the worker a brief head start before returning, so
    /// callers that immediately issue a read are likely to hit.
    pub fn set_preload_enabled(&mut self, enable: bool) {
        if enable == self.preload_enabled {
            return;
        }
        if enable {
            let offset = self
                .passthrough
                .stream_position()
                .unwrap_or(self.shared.ring.lock().current_offset);
            {
                let mut ring = self.shared.ring.lock();
                ring.current_offset = offset;
            }
            self.shared.flags.set(EVENT_ACTIVE);
            self.preload_enabled = true;
            tracing::debug!(offset, "preload enabled");
            std::thread::sleep(Duration::from_millis(100));
        } else {
            let offset = self.shared.ring.lock().current_offset;
            if let Err(e) = self.passthrough.seek(SeekFrom::Start(offset)) {
                tracing::warn!(error = %e, "failed to resync passthrough cursor on preload disable");
            }
            self.shared.flags.clear(EVENT_ACTIVE);
            self.preload_enabled = false;
            tracing::debug!(offset, "preload disabled");
        }
    }
}

impl Drop for BufferedReader {
    fn drop(&mut self) {
        self.shared.flags.set(EVENT_STOP);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.preload_enabled {
            let n = self.passthrough.read(buf)?;
            return Ok(n);
        }

        let mut ring = self.shared.ring.lock();
        let current_offset = ring.current_offset;
        let mut size = buf.len() as u64;
        if current_offset + size > self.shared.file_size {
            size = self.shared.file_size.saturating_sub(current_offset);
        }
        let last_offset = current_offset + size;
        let first_chunk_offset = ring.first_chunk_offset;
        let last_chunk_offset = first_chunk_offset + CHUNK_SIZE as u64 * ring.chunk_len as u64;

        if current_offset < first_chunk_offset || last_chunk_offset < last_offset {
            // Miss: fall back to a direct read against the shared file.
            let mut file = self.shared.worker_file.lock();
            file.seek(SeekFrom::Start(current_offset))?;
            let n = file.read(&mut buf[..size as usize])?;
            ring.current_offset += n as u64;
            tracing::warn!(
                offset = current_offset,
                requested = size,
                got = n,
                "preload miss"
            );
            return Ok(n);
        }

        let mut written = 0usize;
        let mut cursor = current_offset;
        let mut remaining = size as usize;
        for i in 0..ring.chunk_len {
            let chunk_start = first_chunk_offset + i as u64 * CHUNK_SIZE as u64;
            let chunk_end = chunk_start + CHUNK_SIZE as u64;
            if cursor >= chunk_end {
                continue;
            }
            if cursor + remaining as u64 <= chunk_start {
                break;
            }
            let slot = ring.slot(i);
            let chunk_offset = if cursor > chunk_start {
                (cursor - chunk_start) as usize
            } else {
                0
            };
            let bytes_to_copy = (CHUNK_SIZE - chunk_offset).min(remaining);
            buf[written..written + bytes_to_copy]
                .copy_from_slice(&ring.buffers[slot][chunk_offset..chunk_offset + bytes_to_copy]);
            written += bytes_to_copy;
            cursor += bytes_to_copy as u64;
            remaining -= bytes_to_copy;
        }
        ring.current_offset = cursor;
        Ok(size as usize)
    }
}

impl Seek for BufferedReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.preload_enabled {
            let n = self.passthrough.seek(pos)?;
            return Ok(n);
        }
        let mut ring = self.shared.ring.lock();
        let new_offset = match pos {
            SeekFrom::Start(o) => o,
            SeekFrom::Current(d) => (ring.current_offset as i64 + d) as u64,
            SeekFrom::End(d) => (self.shared.file_size as i64 + d) as u64,
        };
        ring.current_offset = new_offset;
        Ok(new_offset)
    }
}

/// One step of the background worker: reset the ring if the consumer
/// jumped behind it, evict chunks the consumer has moved past, or else
/// preload one more chunk if there's room. Checked and applied in that
/// priority order, matching the original preload task's branch order.
fn worker_step(shared: &Shared) {
    let mut ring = shared.ring.lock();
    let current_offset = ring.current_offset;

    if current_offset < ring.first_chunk_offset {
        ring.chunk_head = 0;
        ring.chunk_len = 0;
        ring.first_chunk_offset = 0;
        return;
    }

    if ring.chunk_len > 0 && ring.first_chunk_offset + CHUNK_SIZE as u64 <= current_offset {
        while ring.chunk_len > 0 && ring.first_chunk_offset + CHUNK_SIZE as u64 <= current_offset {
            ring.first_chunk_offset += CHUNK_SIZE as u64;
            ring.chunk_head = (ring.chunk_head + 1) % CHUNK_COUNT;
            ring.chunk_len -= 1;
        }
        return;
    }

    if ring.chunk_len < CHUNK_COUNT - 1 {
        let (slot, file_offset) = if ring.chunk_len > 0 && ring.first_chunk_offset <= current_offset
        {
            let slot = ring.slot(ring.chunk_len);
            let file_offset = ring.first_chunk_offset + ring.chunk_len as u64 * CHUNK_SIZE as u64;
            (slot, file_offset)
        } else {
            let file_offset = current_offset & !(CHUNK_SIZE as u64 - 1);
            ring.chunk_head = 0;
            ring.first_chunk_offset = file_offset;
            (0, file_offset)
        };

        let read_size = if file_offset + CHUNK_SIZE as u64 <= shared.file_size {
            CHUNK_SIZE
        } else {
            (shared.file_size - file_offset) as usize
        };

        let mut file = shared.worker_file.lock();
        if file.seek(SeekFrom::Start(file_offset)).is_ok() {
            if let Ok(n) = file.read(&mut ring.buffers[slot][..read_size]) {
                if n == read_size {
                    ring.chunk_len += 1;
                    tracing::debug!(file_offset, read_size, "preloaded chunk");
                }
            }
        }
    }
}

fn preload_worker(shared: Arc<Shared>) {
    tracing::info!("preload worker started");
    loop {
        let event = shared.flags.wait(Duration::from_millis(200));
        if event & EVENT_STOP != 0 {
            break;
        }
        if event & EVENT_ACTIVE == 0 {
            continue;
        }
        worker_step(&shared);
    }
    tracing::info!("preload worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(len: usize) -> (tempfile::NamedTempFile, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&data).unwrap();
        f.flush().unwrap();
        (f, data)
    }

    #[test]
    fn passthrough_read_matches_file() {
        let (f, data) = fixture(CHUNK_SIZE * 2 + 37);
        let mut reader = BufferedReader::open(f.path()).unwrap();
        let mut out = vec![0u8; data.len()];
        reader.read_exact(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn passthrough_seek_then_read() {
        let (f, data) = fixture(4096);
        let mut reader = BufferedReader::open(f.path()).unwrap();
        reader.seek(SeekFrom::Start(100)).unwrap();
        let mut out = vec![0u8; 50];
        reader.read_exact(&mut out).unwrap();
        assert_eq!(out, data[100..150]);
    }

    #[test]
    fn cached_round_trip_matches_passthrough() {
        let (f, data) = fixture(CHUNK_SIZE * 3 + 512);
        let mut reader = BufferedReader::open(f.path()).unwrap();
        reader.set_preload_enabled(true);

        let mut out = vec![0u8; data.len()];
        let mut read_total = 0;
        while read_total < out.len() {
            let n = reader.read(&mut out[read_total..]).unwrap();
            if n == 0 {
                break;
            }
            read_total += n;
            // Give the worker a chance to stay ahead of us.
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(read_total, data.len());
        assert_eq!(out, data);

        reader.set_preload_enabled(false);
        reader.seek(SeekFrom::Start(0)).unwrap();
        let mut out2 = vec![0u8; data.len()];
        reader.read_exact(&mut out2).unwrap();
        assert_eq!(out2, data);
    }

    #[test]
    fn ring_never_exceeds_one_free_slot() {
        let shared = Arc::new(Shared {
            worker_file: Mutex::new(File::open(std::env::current_exe().unwrap()).unwrap()),
            file_size: u64::MAX,
            ring: Mutex::new(RingState::new()),
            flags: EventFlags::new(),
        });
        for _ in 0..(CHUNK_COUNT * 2) {
            worker_step(&shared);
        }
        let ring = shared.ring.lock();
        assert!(ring.chunk_len <= CHUNK_COUNT - 1);
    }

    #[test]
    fn set_preload_enabled_is_idempotent() {
        let (f, _data) = fixture(1024);
        let mut reader = BufferedReader::open(f.path()).unwrap();
        reader.set_preload_enabled(true);
        reader.set_preload_enabled(true);
        assert!(reader.is_preload_enabled());
        reader.set_preload_enabled(false);
        reader.set_preload_enabled(false);
        assert!(!reader.is_preload_enabled());
    }

    #[test]
    fn close_during_active_preload_returns_promptly() {
        let (f, _data) = fixture(CHUNK_SIZE * 4);
        let mut reader = BufferedReader::open(f.path()).unwrap();
        reader.set_preload_enabled(true);
        // Give the worker a chance to actually be mid-fill before we signal
        // stop, so this exercises the join rather than a worker that never
        // started its loop body.
        std::thread::sleep(Duration::from_millis(10));
        let start = std::time::Instant::now();
        reader.close();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn seek_ahead_of_ring_reads_correctly_via_miss_path() {
        let (f, data) = fixture(CHUNK_SIZE * 4);
        let mut reader = BufferedReader::open(f.path()).unwrap();
        reader.set_preload_enabled(true);
        // Seek immediately, before the worker has had any chance to catch
        // up: current_offset lands far past first_chunk_offset (still 0),
        // so the coverage check misses and the read falls back to a direct
        // read against the shared file, regardless of what the worker has
        // or hasn't preloaded by the time the lock is taken.
        reader
            .seek(SeekFrom::Start((CHUNK_SIZE * 3) as u64))
            .unwrap();
        let mut out = vec![0u8; 64];
        reader.read_exact(&mut out).unwrap();
        assert_eq!(out, data[CHUNK_SIZE * 3..CHUNK_SIZE * 3 + 64]);
    }
}
