//! Sequential movement-command test driver.
//!
//! Each case runs encode, send, settle, receive, decode in that order and
//! records what happened in a [`CaseReport`]. Failures never abort the run.
//! Progress is emitted as `tracing` events; rendering is left to the caller.

use std::net::{Ipv4Addr, SocketAddr};
#[cfg(feature = "debug-tools")]
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::protocol::{self, CommandConfig, HK_TLM_MID, MovementCommand, Position, TelemetryPacket};
#[cfg(feature = "debug-tools")]
use crate::transport::PcapRecorder;
use crate::transport::{DEFAULT_MAX_DATAGRAM, TransportError, receive_datagram, send_datagram};

/// Default flight-software command port
pub const DEFAULT_COMMAND_PORT: u16 = 1234;

/// Default local telemetry port
pub const DEFAULT_TELEMETRY_PORT: u16 = 1235;

/// Coordinates exercised by a default run
pub const DEFAULT_VECTORS: [Position; 3] = [
    Position::new(1.5, 2.7, 3.9),
    Position::new(-10.123, 25.456, 0.0),
    Position::new(100.0, -50.0, 75.25),
];

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Where movement commands are sent.
    pub command_addr: SocketAddr,
    /// Local address bound while waiting for telemetry.
    pub telemetry_bind: SocketAddr,
    /// Pause between sending a command and listening for telemetry.
    pub settle_delay: Duration,
    /// How long to wait for a telemetry datagram.
    pub receive_timeout: Duration,
    /// Receive buffer size.
    pub max_datagram: usize,
    /// Command header settings.
    pub command: CommandConfig,
    /// Optional PCAP capture path for sent commands (debug builds only).
    #[cfg(feature = "debug-tools")]
    pub capture_commands: Option<PathBuf>,
    /// Optional PCAP capture path for received telemetry (debug builds only).
    #[cfg(feature = "debug-tools")]
    pub capture_telemetry: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            command_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_COMMAND_PORT)),
            telemetry_bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_TELEMETRY_PORT)),
            settle_delay: Duration::from_secs(1),
            receive_timeout: Duration::from_secs(5),
            max_datagram: DEFAULT_MAX_DATAGRAM,
            command: CommandConfig::default(),
            #[cfg(feature = "debug-tools")]
            capture_commands: None,
            #[cfg(feature = "debug-tools")]
            capture_telemetry: None,
        }
    }
}

/// Why no telemetry was obtained for a case.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveFailure {
    /// Nothing arrived, or the socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A datagram arrived but could not be decoded.
    #[error("undecodable telemetry from {source_addr}: {error}")]
    Decode {
        /// Sender of the datagram.
        source_addr: SocketAddr,
        /// Decoder failure.
        #[source]
        error: protocol::Error,
    },
}

/// Telemetry obtained for a case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reception {
    /// Sender of the telemetry.
    pub source: SocketAddr,
    /// Decoded packet.
    pub packet: TelemetryPacket,
}

/// Outcome of a single test case.
#[derive(Debug)]
pub struct CaseReport {
    /// 1-based case number.
    pub case: usize,
    /// Commanded coordinate.
    pub position: Position,
    /// Encoded command size.
    pub command_len: usize,
    /// Bytes sent, or why sending failed.
    pub send: Result<usize, TransportError>,
    /// Decoded telemetry, or why none was obtained.
    pub telemetry: Result<Reception, ReceiveFailure>,
}

impl CaseReport {
    /// A case passes when telemetry was received and decoded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.telemetry.is_ok()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    cases: Vec<CaseReport>,
}

impl RunReport {
    /// Per-case reports in execution order.
    #[must_use]
    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    /// Number of passing cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|case| case.passed()).count()
    }

    /// Number of failing cases.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    /// Whether every case passed. False for an empty run.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.cases.is_empty() && self.failed() == 0
    }
}

/// Movement-command test driver.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    vectors: Vec<Position>,
    #[cfg(feature = "debug-tools")]
    capture_commands: Option<PcapRecorder>,
    #[cfg(feature = "debug-tools")]
    capture_telemetry: Option<PcapRecorder>,
}

impl Harness {
    /// Create a driver running [`DEFAULT_VECTORS`].
    ///
    /// Fails only when a configured capture file cannot be created.
    pub fn new(config: HarnessConfig) -> Result<Self, TransportError> {
        Self::with_vectors(config, DEFAULT_VECTORS)
    }

    /// Create a driver running the given coordinates in order.
    pub fn with_vectors(
        config: HarnessConfig,
        vectors: impl Into<Vec<Position>>,
    ) -> Result<Self, TransportError> {
        #[cfg(feature = "debug-tools")]
        let capture_commands = match &config.capture_commands {
            Some(path) => Some(PcapRecorder::create(path)?),
            None => None,
        };
        #[cfg(feature = "debug-tools")]
        let capture_telemetry = match &config.capture_telemetry {
            Some(path) => Some(PcapRecorder::create(path)?),
            None => None,
        };

        Ok(Self {
            config,
            vectors: vectors.into(),
            #[cfg(feature = "debug-tools")]
            capture_commands,
            #[cfg(feature = "debug-tools")]
            capture_telemetry,
        })
    }

    /// Driver configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run every case sequentially.
    #[instrument(level = "info", skip(self), fields(cases = self.vectors.len()))]
    pub fn run(&self) -> RunReport {
        let cases = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, position)| self.run_case(index + 1, *position))
            .collect();
        let report = RunReport { cases };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            "movement command run finished"
        );
        report
    }

    /// Run a single case.
    #[instrument(level = "info", skip(self, position), fields(position = %position))]
    pub fn run_case(&self, case: usize, position: Position) -> CaseReport {
        let command = MovementCommand::now(&self.config.command, position);
        let bytes = command.encode();
        info!(
            target_addr = %self.config.command_addr,
            size = bytes.len(),
            function_code = command.header().function_code(),
            payload = %position.payload_hex(),
            "sending movement command"
        );

        let send = send_datagram(&bytes, self.config.command_addr);
        match &send {
            Ok(_) => {
                info!("command sent");
                #[cfg(feature = "debug-tools")]
                if let Some(recorder) = &self.capture_commands {
                    if let Err(err) = recorder.record(&bytes) {
                        tracing::debug!(error = ?err, "failed to record outbound command");
                    }
                }
            }
            Err(err) => warn!(error = %err, "failed to send command"),
        }

        if !self.config.settle_delay.is_zero() {
            thread::sleep(self.config.settle_delay);
        }

        let telemetry = self.await_telemetry();
        match &telemetry {
            Ok(reception) => {
                let packet = &reception.packet;
                if packet.stream_id() != HK_TLM_MID {
                    warn!(
                        stream_id = packet.stream_id(),
                        expected = HK_TLM_MID,
                        "telemetry carries unexpected stream id"
                    );
                }
                info!(
                    source = %reception.source,
                    command_counter = packet.command_counter(),
                    error_counter = packet.error_counter(),
                    current = %packet.position(),
                    "case passed"
                );
            }
            Err(err) => warn!(error = %err, "no telemetry received"),
        }

        CaseReport {
            case,
            position,
            command_len: bytes.len(),
            send,
            telemetry,
        }
    }

    fn await_telemetry(&self) -> Result<Reception, ReceiveFailure> {
        let datagram = receive_datagram(
            self.config.telemetry_bind,
            self.config.receive_timeout,
            self.config.max_datagram,
        )?;
        #[cfg(feature = "debug-tools")]
        if let Some(recorder) = &self.capture_telemetry {
            if let Err(err) = recorder.record(datagram.payload()) {
                tracing::debug!(error = ?err, "failed to record inbound telemetry");
            }
        }

        let (payload, source) = datagram.into_parts();
        let packet = protocol::decode_telemetry(&payload).map_err(|error| ReceiveFailure::Decode {
            source_addr: source,
            error,
        })?;
        Ok(Reception { source, packet })
    }
}
