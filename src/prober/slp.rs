//! Minecraft Server List Ping over TCP.
//!
//! Frames are `VarInt length | VarInt packet id | payload`. The exchange is a
//! handshake into the status state, a status request answered with a JSON
//! document, then a ping/pong used to measure latency.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use super::{ProbeError, ServerStatus, StatusProbe};
use crate::resolver::HostPort;

/// Status queries conventionally announce protocol -1.
const HANDSHAKE_PROTOCOL: i32 = -1;
const NEXT_STATE_STATUS: i32 = 1;
const MAX_FRAME: usize = 2 * 1024 * 1024;

const PACKET_HANDSHAKE: i32 = 0x00;
const PACKET_STATUS: i32 = 0x00;
const PACKET_PING: i32 = 0x01;

pub struct SlpProbe {
    timeout: Duration,
}

impl SlpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl StatusProbe for SlpProbe {
    /// Connect and status share the deadline. A pong that does not arrive
    /// before it only costs the latency figure, not the status.
    async fn probe(&self, target: &HostPort) -> Result<ServerStatus, ProbeError> {
        let deadline = Instant::now() + self.timeout;
        let (mut stream, json, status_rtt) = timeout_at(deadline, request_status(target))
            .await
            .map_err(|_| ProbeError::Timeout)??;

        let ping = match timeout_at(deadline, ping(&mut stream)).await {
            Ok(Ok(rtt)) => rtt,
            Ok(Err(e)) => {
                // Some proxies hang up after the status response.
                debug!("ping to {} failed, using status round-trip: {}", target, e);
                status_rtt
            }
            Err(_) => {
                debug!("no pong from {} before deadline, using status round-trip", target);
                status_rtt
            }
        };

        ServerStatus::from_json(&json, ping.as_millis() as u64)
    }
}

async fn request_status(target: &HostPort) -> Result<(TcpStream, String, Duration), ProbeError> {
    let mut stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
    stream.set_nodelay(true)?;

    let mut handshake = Vec::new();
    write_varint(&mut handshake, HANDSHAKE_PROTOCOL);
    write_string(&mut handshake, &target.host);
    handshake.extend_from_slice(&target.port.to_be_bytes());
    write_varint(&mut handshake, NEXT_STATE_STATUS);
    write_packet(&mut stream, PACKET_HANDSHAKE, &handshake).await?;

    let start = Instant::now();
    write_packet(&mut stream, PACKET_STATUS, &[]).await?;
    let (id, body) = read_packet(&mut stream).await?;
    let status_rtt = start.elapsed();
    if id != PACKET_STATUS {
        return Err(ProbeError::Protocol(format!(
            "expected status response, got packet {:#04x}",
            id
        )));
    }
    let json = read_string(&mut body.as_slice())?;
    Ok((stream, json, status_rtt))
}

async fn ping(stream: &mut TcpStream) -> Result<Duration, ProbeError> {
    let token = (std::process::id() as i64).to_be_bytes();
    let start = Instant::now();
    write_packet(stream, PACKET_PING, &token).await?;
    let (id, body) = read_packet(stream).await?;
    let elapsed = start.elapsed();
    if id != PACKET_PING || body != token {
        return Err(ProbeError::Protocol("pong does not match ping".into()));
    }
    Ok(elapsed)
}

pub(crate) fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    loop {
        if v & !0x7f == 0 {
            buf.push(v as u8);
            return;
        }
        buf.push((v & 0x7f) as u8 | 0x80);
        v >>= 7;
    }
}

pub(crate) fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

fn decode_varint(cursor: &mut &[u8]) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| ProbeError::Protocol("truncated varint".into()))?;
        *cursor = rest;
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("varint longer than 5 bytes".into()))
}

async fn read_varint<R: AsyncRead + Unpin>(r: &mut R) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = r.read_u8().await?;
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("varint longer than 5 bytes".into()))
}

pub(crate) fn read_string(cursor: &mut &[u8]) -> Result<String, ProbeError> {
    let len = decode_varint(cursor)?;
    let len = usize::try_from(len)
        .ok()
        .filter(|&n| n <= cursor.len())
        .ok_or_else(|| ProbeError::Protocol(format!("bad string length {}", len)))?;
    let (bytes, rest) = cursor.split_at(len);
    *cursor = rest;
    String::from_utf8(bytes.to_vec()).map_err(|e| ProbeError::Protocol(e.to_string()))
}

pub(crate) async fn write_packet<W: AsyncWrite + Unpin>(
    w: &mut W,
    id: i32,
    payload: &[u8],
) -> Result<(), ProbeError> {
    let mut body = Vec::with_capacity(payload.len() + 5);
    write_varint(&mut body, id);
    body.extend_from_slice(payload);
    let mut frame = Vec::with_capacity(body.len() + 5);
    write_varint(&mut frame, body.len() as i32);
    frame.extend_from_slice(&body);
    w.write_all(&frame).await?;
    w.flush().await?;
    Ok(())
}

pub(crate) async fn read_packet<R: AsyncRead + Unpin>(r: &mut R) -> Result<(i32, Vec<u8>), ProbeError> {
    let len = read_varint(r).await?;
    let len = usize::try_from(len)
        .ok()
        .filter(|&n| n > 0 && n <= MAX_FRAME)
        .ok_or_else(|| ProbeError::Protocol(format!("bad frame length {}", len)))?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    let mut cursor = buf.as_slice();
    let id = decode_varint(&mut cursor)?;
    Ok((id, cursor.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const STATUS_JSON: &str = r#"{"version":{"name":"Paper 1.21.1","protocol":767},"players":{"max":20,"online":2},"description":{"text":"§aHello"}}"#;

    fn varint(value: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, value);
        buf
    }

    #[test]
    fn varint_encoding() {
        assert_eq!(varint(0), [0x00]);
        assert_eq!(varint(127), [0x7f]);
        assert_eq!(varint(128), [0x80, 0x01]);
        assert_eq!(varint(25565), [0xdd, 0xc7, 0x01]);
        assert_eq!(varint(-1), [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn varint_decoding() {
        assert_eq!(decode_varint(&mut &[0xdd, 0xc7, 0x01][..]).unwrap(), 25565);
        assert_eq!(decode_varint(&mut &[0xff, 0xff, 0xff, 0xff, 0x0f][..]).unwrap(), -1);
        assert!(decode_varint(&mut &[0x80][..]).is_err());
        assert!(decode_varint(&mut &[0xff; 6][..]).is_err());
    }

    #[test]
    fn string_length_is_checked() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 10);
        buf.extend_from_slice(b"abc");
        assert!(read_string(&mut buf.as_slice()).is_err());
    }

    #[derive(Clone, Copy)]
    enum Pong {
        Answer,
        HangUp,
        Stall,
    }

    /// Plays the server side of one status exchange.
    async fn fake_server(listener: TcpListener, pong: Pong) {
        let (mut sock, _) = listener.accept().await.unwrap();

        let (id, body) = read_packet(&mut sock).await.unwrap();
        assert_eq!(id, PACKET_HANDSHAKE);
        let mut cursor = body.as_slice();
        assert_eq!(decode_varint(&mut cursor).unwrap(), HANDSHAKE_PROTOCOL);
        assert_eq!(read_string(&mut cursor).unwrap(), "127.0.0.1");

        let (id, body) = read_packet(&mut sock).await.unwrap();
        assert_eq!(id, PACKET_STATUS);
        assert!(body.is_empty());

        let mut payload = Vec::new();
        write_string(&mut payload, STATUS_JSON);
        write_packet(&mut sock, PACKET_STATUS, &payload).await.unwrap();

        match pong {
            Pong::Answer => {
                let (id, body) = read_packet(&mut sock).await.unwrap();
                assert_eq!(id, PACKET_PING);
                write_packet(&mut sock, PACKET_PING, &body).await.unwrap();
            }
            Pong::HangUp => {}
            Pong::Stall => {
                let (id, _) = read_packet(&mut sock).await.unwrap();
                assert_eq!(id, PACKET_PING);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    #[tokio::test]
    async fn full_exchange_against_fake_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(fake_server(listener, Pong::Answer));

        let probe = SlpProbe::new(Duration::from_secs(5));
        let status = probe.probe(&HostPort::new("127.0.0.1", port)).await.unwrap();
        assert_eq!(status.version, "Paper 1.21.1");
        assert_eq!(status.protocol, 767);
        assert_eq!(status.players_online, 2);
        assert_eq!(status.max_players, 20);
        assert_eq!(status.motd["text"], "§aHello");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_pong_still_reports_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(fake_server(listener, Pong::HangUp));

        let probe = SlpProbe::new(Duration::from_secs(5));
        let status = probe.probe(&HostPort::new("127.0.0.1", port)).await.unwrap();
        assert_eq!(status.version, "Paper 1.21.1");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stalled_pong_still_reports_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(fake_server(listener, Pong::Stall));

        let probe = SlpProbe::new(Duration::from_millis(500));
        let status = probe.probe(&HostPort::new("127.0.0.1", port)).await.unwrap();
        assert_eq!(status.version, "Paper 1.21.1");
        assert_eq!(status.players_online, 2);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let probe = SlpProbe::new(Duration::from_millis(200));
        let err = probe.probe(&HostPort::new("127.0.0.1", port)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout));
        assert!(err.is_offline());
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = SlpProbe::new(Duration::from_secs(5));
        let err = probe.probe(&HostPort::new("127.0.0.1", port)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Unreachable(_)));
    }
}
