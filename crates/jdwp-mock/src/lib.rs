//! A tiny scripted JDWP endpoint for tests.
//!
//! [MockVm] binds a loopback listener, speaks the handshake and the packet framing, records
//! every command it receives, and answers through a handler closure the test provides. Composite
//! events can be injected at any time, which is how breakpoint and lifecycle flows are exercised
//! without an Android device anywhere near the test suite.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use jdwp_client::codec::{JdwpCodec, JdwpEncodable, JdwpEncoder};
use jdwp_client::raw::codec::RawCodec;
use jdwp_client::raw::packet::{
    AnyRawPacket, CommandData, ErrorCode, RawCommandPacket, RawReplyPacket,
};
use jdwp_types::SuspendPolicy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace, warn};

pub mod replies;

const HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// What the scripted handler wants done with a command
pub enum MockAnswer {
    /// Reply with error code 0 and this body
    Reply(Bytes),
    /// Reply with a non-zero error code and an empty body
    Error(u16),
    /// Write no reply at all (fire-and-forget commands)
    Ignore,
}

/// Shared state the handler can use while answering
pub struct MockCtx {
    next_request_id: AtomicI32,
}

impl MockCtx {
    /// Allocates the next EventRequest.Set request id
    pub fn next_request_id(&self) -> i32 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

type Handler = dyn Fn(CommandData, &Bytes, &MockCtx) -> MockAnswer + Send + Sync;

/// How the mock behaves during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeBehavior {
    /// Echo the 14-byte literal back, like a real VM
    #[default]
    Echo,
    /// Answer with garbage, to exercise the failure path
    Garble,
}

/// A scripted JDWP endpoint listening on loopback
pub struct MockVm {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<(CommandData, Bytes)>>>,
    outbound: UnboundedSender<AnyRawPacket>,
    next_packet_id: AtomicU32,
    task: JoinHandle<()>,
}

impl MockVm {
    /// Spawns a mock that answers every command through `handler`
    pub async fn spawn<F>(handler: F) -> std::io::Result<MockVm>
    where
        F: Fn(CommandData, &Bytes, &MockCtx) -> MockAnswer + Send + Sync + 'static,
    {
        Self::spawn_with(HandshakeBehavior::Echo, handler).await
    }

    /// Spawns a mock with explicit handshake behavior
    pub async fn spawn_with<F>(
        handshake: HandshakeBehavior,
        handler: F,
    ) -> std::io::Result<MockVm>
    where
        F: Fn(CommandData, &Bytes, &MockCtx) -> MockAnswer + Send + Sync + 'static,
    {
        let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let commands = Arc::new(Mutex::new(Vec::new()));
        let (outbound_tx, outbound_rx) = unbounded_channel::<AnyRawPacket>();

        let task = tokio::spawn(run(
            listener,
            handshake,
            Arc::new(handler) as Arc<Handler>,
            commands.clone(),
            outbound_rx,
        ));

        Ok(MockVm {
            addr,
            commands,
            outbound: outbound_tx,
            next_packet_id: AtomicU32::new(0x4000_0000),
            task,
        })
    }

    /// Where the mock is listening
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every command received so far, in arrival order
    pub fn commands(&self) -> Vec<(CommandData, Bytes)> {
        self.commands.lock().expect("command log poisoned").clone()
    }

    /// The received commands matching a (set, command) pair
    pub fn commands_matching(&self, command_set: u8, command: u8) -> Vec<Bytes> {
        self.commands()
            .into_iter()
            .filter(|(data, _)| {
                data.command_set() == command_set && data.command() == command
            })
            .map(|(_, body)| body)
            .collect()
    }

    /// Injects an Event.Composite carrying the given pre-encoded events
    pub fn send_composite(&self, suspend_policy: SuspendPolicy, events: &[Bytes]) {
        let body = encode_with(|encoder| {
            encoder.put(&suspend_policy);
            encoder.put(&(events.len() as i32));
            for event in events {
                encoder.data.extend_from_slice(event);
            }
        });
        let id = self.next_packet_id.fetch_add(1, Ordering::SeqCst);
        let packet = RawCommandPacket::new_command(id, CommandData::new(64, 100), body);
        let _ = self.outbound.send(AnyRawPacket::Command(packet));
    }
}

impl Drop for MockVm {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Encodes a body with the default (8-byte id) codec
pub fn encode_with(f: impl FnOnce(&mut JdwpEncoder)) -> Bytes {
    let codec = JdwpCodec::default();
    let mut encoder = JdwpEncoder::new(&codec);
    f(&mut encoder);
    encoder.data.freeze()
}

/// Encodes a single encodable value with the default codec
pub fn encode_one(value: &impl JdwpEncodable) -> Bytes {
    encode_with(|encoder| encoder.put(value))
}

async fn run(
    listener: TcpListener,
    handshake: HandshakeBehavior,
    handler: Arc<Handler>,
    commands: Arc<Mutex<Vec<(CommandData, Bytes)>>>,
    mut outbound: tokio::sync::mpsc::UnboundedReceiver<AnyRawPacket>,
) {
    let Ok((stream, peer)) = listener.accept().await else {
        return;
    };
    debug!("mock vm accepted {peer}");
    if do_handshake(&stream, handshake).await.is_err() {
        return;
    }

    let ctx = MockCtx {
        next_request_id: AtomicI32::new(0),
    };
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedRead::new(read_half, RawCodec);
    let mut writer = FramedWrite::new(write_half, RawCodec);

    loop {
        tokio::select! {
            inbound = reader.next() => {
                let packet = match inbound {
                    Some(Ok(packet)) => packet,
                    Some(Err(e)) => {
                        warn!("mock vm read error: {e}");
                        break;
                    }
                    None => break,
                };
                let AnyRawPacket::Command(command) = packet else {
                    continue;
                };
                let data = command.header().command();
                let body = command.data().clone();
                trace!(
                    "mock vm got command {}/{}",
                    data.command_set(),
                    data.command()
                );
                commands
                    .lock()
                    .expect("command log poisoned")
                    .push((data, body.clone()));
                let answer = handler(data, &body, &ctx);
                let reply = match answer {
                    MockAnswer::Reply(reply_body) => RawReplyPacket::new_reply(
                        command.header().id(),
                        ErrorCode::new(0),
                        reply_body,
                    ),
                    MockAnswer::Error(code) => RawReplyPacket::new_reply(
                        command.header().id(),
                        ErrorCode::new(code),
                        Bytes::new(),
                    ),
                    MockAnswer::Ignore => continue,
                };
                if writer.send(reply).await.is_err() {
                    break;
                }
            }
            injected = outbound.recv() => {
                let Some(packet) = injected else { break };
                let result = match packet {
                    AnyRawPacket::Command(command) => writer.send(command).await.map(|_| ()),
                    AnyRawPacket::Reply(_) => Ok(()),
                };
                if result.is_err() {
                    break;
                }
            }
        }
    }
    debug!("mock vm session over");
}

async fn do_handshake(stream: &TcpStream, behavior: HandshakeBehavior) -> std::io::Result<()> {
    let mut received = [0u8; 14];
    let mut read = 0;
    while read < received.len() {
        stream.readable().await?;
        match stream.try_read(&mut received[read..]) {
            Ok(0) => return Err(std::io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    let answer: [u8; 14] = match behavior {
        HandshakeBehavior::Echo => *HANDSHAKE,
        HandshakeBehavior::Garble => *b"NOT-A-JDWP-VM!",
    };
    let mut written = 0;
    while written < answer.len() {
        stream.writable().await?;
        match stream.try_write(&answer[written..]) {
            Ok(0) => return Err(std::io::ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
