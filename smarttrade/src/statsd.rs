//! A thin UDP statsd client, grounded on the original's `statsd.go` (a
//! wrapper around `go-statsd-client` with the same fire-and-forget, log-once
//! failure style). No statsd client crate is used anywhere in the teacher or
//! pack examples, so this hand-rolls the wire protocol directly over
//! `std::net::UdpSocket` rather than introducing an unrelated dependency for
//! a handful of `name:value|c` lines.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};

use smarttrade_core::port::StatsdPort;
use tracing::{info, warn};

const PREFIX: &str = "smarttrade";

/// `None` when the socket couldn't be created or connected; every send is
/// then a silent no-op, matching the original's nil-client guard.
pub struct UdpStatsdPort {
    socket: Option<UdpSocket>,
    warned: AtomicBool,
}

impl UdpStatsdPort {
    pub fn connect(host: &str, port: u16) -> Self {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .and_then(|socket| {
                socket.connect((host, port))?;
                Ok(socket)
            })
            .map_err(|err| warn!(host, port, %err, "statsd connect failed, disabling stats"))
            .ok();

        if socket.is_some() {
            info!(host, port, "statsd init successful");
        }

        Self {
            socket,
            warned: AtomicBool::new(false),
        }
    }

    fn send(&self, line: &str) {
        let Some(socket) = &self.socket else {
            return;
        };
        if let Err(err) = socket.send(line.as_bytes()) {
            if !self.warned.swap(true, Ordering::Relaxed) {
                warn!(%err, "statsd send failed, further errors suppressed");
            }
        }
    }
}

impl StatsdPort for UdpStatsdPort {
    fn incr(&self, metric: &str) {
        self.send(&format!("{PREFIX}.{metric}:1|c"));
    }

    fn gauge(&self, metric: &str, value: f64) {
        self.send(&format!("{PREFIX}.{metric}:{value}|g"));
    }
}
