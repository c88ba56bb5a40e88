//! Loopback stand-in for the flight-software sample app.
//!
//! Accepts movement commands on a UDP port and answers every datagram with a
//! housekeeping packet, so the driver can be exercised without a running
//! flight-software core.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::harness::DEFAULT_TELEMETRY_PORT;
use crate::protocol::{HK_TLM_MID, MovementCommand, Position, TelemetryPacket};
use crate::transport::{
    DEFAULT_MAX_DATAGRAM, SocketBinding, SocketError, TransportError, send_datagram,
};

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Address commands are accepted on; port 0 picks a free port.
    pub command_bind: SocketAddr,
    /// Where housekeeping telemetry is sent.
    pub telemetry_destination: SocketAddr,
    /// Delay between receiving a datagram and answering it.
    pub reply_delay: Duration,
    /// How often the receive loop checks for shutdown.
    pub poll_interval: Duration,
    /// Stream ID written into housekeeping packets.
    pub telemetry_stream_id: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            command_bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            telemetry_destination: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_TELEMETRY_PORT)),
            reply_delay: Duration::from_millis(200),
            poll_interval: Duration::from_millis(50),
            telemetry_stream_id: HK_TLM_MID,
        }
    }
}

/// Counters and position as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimState {
    /// Accepted movement commands (wrapping).
    pub command_counter: u8,
    /// Rejected datagrams (wrapping).
    pub error_counter: u8,
    /// Last commanded coordinate.
    pub position: Position,
    sequence: u16,
}

impl SimState {
    /// Apply one received datagram.
    fn apply(&mut self, datagram: &[u8]) {
        match MovementCommand::decode(datagram) {
            Ok(command) => {
                self.command_counter = self.command_counter.wrapping_add(1);
                self.position = command.position();
                info!(position = %self.position, "movement command received");
            }
            Err(err) => {
                self.error_counter = self.error_counter.wrapping_add(1);
                warn!(error = %err, len = datagram.len(), "rejected command datagram");
            }
        }
    }

    /// Build the next housekeeping packet.
    fn housekeeping(&mut self, stream_id: u16) -> TelemetryPacket {
        // CCSDS sequence count is 14 bits; 0xC000 marks an unsegmented packet.
        let sequence = 0xC000 | (self.sequence & 0x3FFF);
        self.sequence = self.sequence.wrapping_add(1);
        TelemetryPacket::new(
            stream_id,
            sequence,
            self.command_counter,
            self.error_counter,
            self.position,
        )
    }
}

/// Entry point for the simulator thread.
#[derive(Debug)]
pub struct Simulator;

impl Simulator {
    /// Bind the command socket and start answering on a background thread.
    pub fn spawn(config: SimConfig) -> Result<SimHandle, TransportError> {
        let socket = SocketBinding::bind(config.command_bind)?;
        socket.set_read_timeout(Some(config.poll_interval))?;
        let command_addr = socket.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("fsw-sim".into())
                .spawn(move || serve(&socket, &config, &stop))?
        };
        info!(%command_addr, "simulator listening");

        Ok(SimHandle {
            command_addr,
            stop,
            thread: Some(thread),
        })
    }
}

fn serve(socket: &SocketBinding, config: &SimConfig, stop: &AtomicBool) -> SimState {
    let mut state = SimState::default();
    let mut buffer = vec![0u8; DEFAULT_MAX_DATAGRAM];

    while !stop.load(Ordering::Acquire) {
        let len = match socket.recv_from(&mut buffer) {
            Ok((len, from)) => {
                debug!(len, %from, "command datagram");
                len
            }
            Err(err) => {
                if let Some(pause) = receive_backoff(&err, config.poll_interval) {
                    warn!(error = %err, "simulator receive failed");
                    thread::sleep(pause);
                }
                continue;
            }
        };

        state.apply(&buffer[..len]);
        if !config.reply_delay.is_zero() {
            thread::sleep(config.reply_delay);
        }

        let packet = state.housekeeping(config.telemetry_stream_id);
        if let Err(err) = send_datagram(&packet.encode(), config.telemetry_destination) {
            warn!(error = %err, "failed to send housekeeping telemetry");
        }
    }

    state
}

/// Pause before the next receive after `err`; `None` for an expired poll.
fn receive_backoff(err: &SocketError, poll_interval: Duration) -> Option<Duration> {
    if err.is_timeout() {
        None
    } else {
        Some(poll_interval)
    }
}

/// Running simulator; stops when dropped.
#[derive(Debug)]
pub struct SimHandle {
    command_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<SimState>>,
}

impl SimHandle {
    /// Address the simulator accepts commands on.
    #[must_use]
    pub const fn command_addr(&self) -> SocketAddr {
        self.command_addr
    }

    /// Stop the simulator and return its final state.
    ///
    /// Returns `None` if the simulator thread panicked.
    pub fn shutdown(mut self) -> Option<SimState> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Option<SimState> {
        self.stop.store(true, Ordering::Release);
        self.thread.take().and_then(|thread| thread.join().ok())
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
