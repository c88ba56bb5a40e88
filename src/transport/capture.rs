//! PCAP capture of raw datagram payloads for offline inspection.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Thread-safe PCAP writer storing one UDP payload per record.
#[derive(Clone)]
pub struct PcapRecorder {
    inner: Arc<Mutex<PcapWriter>>,
}

impl PcapRecorder {
    /// Create a recorder that writes to the provided path, truncating any existing file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let writer = PcapWriter::new(File::create(path)?)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(writer)),
        })
    }

    /// Record a payload with the current system timestamp.
    pub fn record(&self, payload: &[u8]) -> io::Result<()> {
        self.record_at(SystemTime::now(), payload)
    }

    fn record_at(&self, timestamp: SystemTime, payload: &[u8]) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("pcap recorder poisoned"))?;
        guard.write_record(timestamp, payload)
    }
}

impl std::fmt::Debug for PcapRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcapRecorder").finish_non_exhaustive()
    }
}

struct PcapWriter {
    out: BufWriter<File>,
}

impl PcapWriter {
    fn new(file: File) -> io::Result<Self> {
        let mut out = BufWriter::new(file);
        out.write_all(&global_header())?;
        out.flush()?;
        Ok(Self { out })
    }

    fn write_record(&mut self, timestamp: SystemTime, data: &[u8]) -> io::Result<()> {
        let length = data.len().min(PCAP_SNAPLEN as usize);
        self.out.write_all(&record_header(timestamp, length))?;
        self.out.write_all(&data[..length])?;
        self.out.flush()
    }
}

const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
const PCAP_VERSION_MAJOR: u16 = 2;
const PCAP_VERSION_MINOR: u16 = 4;
const PCAP_SNAPLEN: u32 = 65_535;
const PCAP_NETWORK: u32 = 147; // LINKTYPE_USER0: bare payload, no IP/UDP framing

fn global_header() -> [u8; 24] {
    let mut header = [0u8; 24];
    header[0..4].copy_from_slice(&PCAP_MAGIC.to_le_bytes());
    header[4..6].copy_from_slice(&PCAP_VERSION_MAJOR.to_le_bytes());
    header[6..8].copy_from_slice(&PCAP_VERSION_MINOR.to_le_bytes());
    // thiszone and sigfigs stay zero
    header[16..20].copy_from_slice(&PCAP_SNAPLEN.to_le_bytes());
    header[20..24].copy_from_slice(&PCAP_NETWORK.to_le_bytes());
    header
}

fn record_header(timestamp: SystemTime, length: usize) -> [u8; 16] {
    let duration = timestamp.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
    let micros = duration.subsec_micros();
    let length = u32::try_from(length).unwrap_or(PCAP_SNAPLEN);

    let mut header = [0u8; 16];
    header[0..4].copy_from_slice(&secs.to_le_bytes());
    header[4..8].copy_from_slice(&micros.to_le_bytes());
    header[8..12].copy_from_slice(&length.to_le_bytes());
    header[12..16].copy_from_slice(&length.to_le_bytes());
    header
}
