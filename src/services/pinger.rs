use crate::core::prober::{PingError, Pinger};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::Command;

/// Which transport the prober uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    /// ICMP echo through the platform `ping` utility
    System,
    /// TCP handshake against a fixed port
    Tcp,
}

/// ICMP echo via the platform `ping` binary
///
/// Needs no raw-socket privileges. The child process is killed if the probe
/// is abandoned before it exits.
#[derive(Debug, Clone)]
pub struct SystemPinger {
    program: String,
}

impl SystemPinger {
    pub fn new() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new()
    }
}

impl Pinger for SystemPinger {
    async fn ping(&self, address: IpAddr, timeout: Duration) -> Result<Duration, PingError> {
        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(ping_args(address, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PingError::Unreachable(format!("{} not found", self.program)),
                _ => PingError::Io(e),
            })?;
        let elapsed = started.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout);

        if output.status.success() {
            return Ok(parse_rtt(&stdout).unwrap_or(elapsed));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);

        // An ICMP error reply exits with the same code as silence on most platforms
        if let Some(line) = unreachable_line(&stdout).or_else(|| unreachable_line(&stderr)) {
            return Err(PingError::Unreachable(line.to_string()));
        }

        if is_no_reply(output.status.code()) {
            return Err(PingError::TimedOut);
        }

        Err(PingError::Unreachable(stderr.trim().to_string()))
    }
}

/// Arguments for a single echo request with a reply wait
pub fn ping_args(address: IpAddr, timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1);

    if cfg!(target_os = "windows") {
        vec!["-n".into(), "1".into(), "-w".into(), millis.to_string(), address.to_string()]
    } else if cfg!(target_os = "macos") {
        // BSD ping takes -W in milliseconds
        vec!["-c".into(), "1".into(), "-W".into(), millis.to_string(), address.to_string()]
    } else {
        // iputils takes whole seconds for -W
        let secs = millis.div_ceil(1000);
        let mut args = vec!["-n".into(), "-c".into(), "1".into(), "-W".into(), secs.to_string()];
        if address.is_ipv6() {
            args.insert(0, "-6".into());
        }
        args.push(address.to_string());
        args
    }
}

/// Exit codes meaning "sent fine, nobody answered"
fn is_no_reply(code: Option<i32>) -> bool {
    if cfg!(target_os = "macos") {
        code == Some(2)
    } else {
        code == Some(1)
    }
}

/// First output line reporting an ICMP "unreachable" reply, if any
fn unreachable_line(output: &str) -> Option<&str> {
    output
        .lines()
        .find(|line| line.to_ascii_lowercase().contains("unreachable"))
        .map(str::trim)
}

/// Extract the round-trip time from `ping` output (`time=12.3 ms`, `time<1ms`)
pub fn parse_rtt(output: &str) -> Option<Duration> {
    let start = output.find("time=").or_else(|| output.find("time<"))? + "time=".len();
    let digits: String = output[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let millis: f64 = digits.parse().ok()?;

    (millis.is_finite() && millis >= 0.0).then(|| Duration::from_nanos((millis * 1_000_000.0).round() as u64))
}

/// Times a TCP handshake to `port`
///
/// A refused connection still proves a full round trip to the host, so it
/// counts as a measurement.
#[derive(Debug, Clone, Copy)]
pub struct TcpPinger {
    port: u16,
}

impl TcpPinger {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Pinger for TcpPinger {
    async fn ping(&self, address: IpAddr, _timeout: Duration) -> Result<Duration, PingError> {
        let target = SocketAddr::new(address, self.port);
        let started = Instant::now();

        match TcpStream::connect(target).await {
            Ok(_stream) => Ok(started.elapsed()),
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => Ok(started.elapsed()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(PingError::TimedOut),
            Err(e) => Err(PingError::Unreachable(e.to_string())),
        }
    }
}

/// Pinger chosen at runtime from configuration
#[derive(Debug, Clone)]
pub enum ConfiguredPinger {
    System(SystemPinger),
    Tcp(TcpPinger),
}

impl ConfiguredPinger {
    pub fn from_method(method: ProbeMethod, tcp_port: u16) -> Self {
        match method {
            ProbeMethod::System => ConfiguredPinger::System(SystemPinger::new()),
            ProbeMethod::Tcp => ConfiguredPinger::Tcp(TcpPinger::new(tcp_port)),
        }
    }
}

impl Pinger for ConfiguredPinger {
    async fn ping(&self, address: IpAddr, timeout: Duration) -> Result<Duration, PingError> {
        match self {
            ConfiguredPinger::System(pinger) => pinger.ping(address, timeout).await,
            ConfiguredPinger::Tcp(pinger) => pinger.ping(address, timeout).await,
        }
    }
}
