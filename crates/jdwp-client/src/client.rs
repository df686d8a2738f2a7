use crate::codec::{JdwpCodec, JdwpDecoder, JdwpEncoder};
use crate::commands::virtual_machine;
use crate::error::{JdwpError, ProtocolError};
use crate::events::{to_composite, Composite, DecodeCompositeError, EventDispatcher};
use crate::id_sizes::IdSizes;
use crate::packet::JdwpCommand;
use crate::raw::codec::RawCodec;
use crate::raw::packet::{AnyRawPacket, RawCommandPacket, RawReplyPacket};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, error_span, instrument, trace, warn, Instrument, Span};

static JDWP_HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

type PendingMap = Arc<Mutex<HashMap<u32, oneshot::Sender<RawReplyPacket>>>>;

/// A multiplexing jdwp client.
///
/// One task owns the socket reader and correlates replies to pending requests by packet id;
/// another drains decoded composite events and runs the registered handlers; any number of caller
/// tasks may issue commands concurrently. Writes are serialized through one framed sink.
///
/// Dropping the client aborts both tasks and closes the socket; awaiters still in flight complete
/// with [JdwpError::Disconnected].
pub struct JdwpClient {
    raw_sink: tokio::sync::Mutex<FramedWrite<OwnedWriteHalf, RawCodec>>,
    next_id: AtomicU32,
    codec: Arc<RwLock<JdwpCodec>>,
    pending: PendingMap,
    dispatcher: Arc<EventDispatcher>,
    #[allow(dead_code)]
    tasks: JoinSet<()>,
}

impl JdwpClient {
    /// Connects to a listening JDWP endpoint, canonically `127.0.0.1:8700` behind an adb port
    /// forward, and performs the handshake
    pub async fn attach<A: ToSocketAddrs>(addr: A) -> Result<JdwpClient, JdwpError> {
        let stream = TcpStream::connect(addr).await?;
        Self::create(stream).await
    }

    /// Creates a new jdwp client over an already-connected tcp stream
    pub async fn create(stream: TcpStream) -> Result<JdwpClient, JdwpError> {
        let _ = stream.set_nodelay(true);
        let (mut input, mut output) = stream.into_split();
        handshake(&mut input, &mut output).await?;

        let codec = Arc::new(RwLock::new(JdwpCodec::default()));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let dispatcher = Arc::new(EventDispatcher::new());
        let (event_tx, event_rx) = unbounded_channel::<Composite>();

        let mut tasks = JoinSet::new();
        tasks.spawn(
            reader_loop(input, codec.clone(), pending.clone(), event_tx)
                .instrument(error_span!("packet-recv-loop")),
        );
        tasks.spawn(
            dispatch_loop(event_rx, dispatcher.clone()).instrument(error_span!("event-dispatch")),
        );

        Ok(JdwpClient {
            raw_sink: tokio::sync::Mutex::new(FramedWrite::new(output, RawCodec)),
            next_id: AtomicU32::new(1),
            codec,
            pending,
            dispatcher,
            tasks,
        })
    }

    /// The per-request-id event handler registry
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// The id widths currently in effect
    pub fn id_sizes(&self) -> IdSizes {
        self.codec.read().expect("codec poisoned").id_sizes()
    }

    /// Issues `VirtualMachine.IDSizes` and switches the codec over to the negotiated widths.
    ///
    /// Until this runs every width defaults to 8; issue it before any command whose body carries
    /// an id.
    pub async fn negotiate_id_sizes(
        &self,
    ) -> Result<virtual_machine::IdSizesReply, JdwpError> {
        let reply = self.send(virtual_machine::IdSizes).await?;
        let negotiated = IdSizes::new(
            reply.field_id_size as usize,
            reply.method_id_size as usize,
            reply.object_id_size as usize,
            reply.reference_type_id_size as usize,
            reply.frame_id_size as usize,
        );
        debug!("negotiated id sizes: {negotiated:?}");
        *self
            .codec
            .write()
            .expect("codec poisoned")
            .id_sizes_mut() = negotiated;
        Ok(reply)
    }

    /// Send a command to the VM and await its typed reply.
    ///
    /// A non-zero error code in the reply header surfaces as [JdwpError::Protocol]; commands
    /// whose [JdwpCommand::EXPECTS_REPLY] is false return as soon as the packet is written.
    #[instrument(skip_all, fields(id, command = T::NAME))]
    pub async fn send<T: JdwpCommand>(&self, command: T) -> Result<T::Reply, JdwpError> {
        let encoded = {
            let codec = self.codec.read().expect("codec poisoned");
            let mut encoder = JdwpEncoder::new(&codec);
            command.encode(&mut encoder);
            encoder.data.freeze()
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Span::current().record("id", id);
        let raw = RawCommandPacket::new_command(id, T::command_data(), encoded);

        if !T::EXPECTS_REPLY {
            trace!("sending fire-and-forget command");
            self.raw_sink.lock().await.send(raw).await?;
            let codec = self.codec.read().expect("codec poisoned");
            let mut decoder = JdwpDecoder::new(&codec, Bytes::new());
            return Ok(decoder.get::<T::Reply>()?);
        }

        let (tx, rx) = oneshot::channel::<RawReplyPacket>();
        self.pending
            .lock()
            .expect("pending map poisoned")
            .insert(id, tx);
        trace!("pending reply registered, writing packet");
        if let Err(e) = self.raw_sink.lock().await.send(raw).await {
            self.pending
                .lock()
                .expect("pending map poisoned")
                .remove(&id);
            return Err(e.into());
        }

        let reply = rx.await.map_err(|_| JdwpError::Disconnected)?;
        let error_code = reply.header().error_code();
        if !error_code.is_ok() {
            return Err(JdwpError::Protocol {
                command: T::NAME,
                error: ProtocolError::new(error_code.code()),
            });
        }

        let codec = self.codec.read().expect("codec poisoned");
        let mut decoder = JdwpDecoder::new(&codec, reply.data().clone());
        let decoded = decoder.get::<T::Reply>()?;
        trace!("decoded reply for {id}");
        Ok(decoded)
    }

    /// Tells the VM to drop this debugger connection, then tears the client down
    #[instrument(skip_all)]
    pub async fn dispose(self) -> Result<(), JdwpError> {
        self.send(virtual_machine::Dispose).await?;
        trace!("client disposed");
        Ok(())
    }
}

impl std::fmt::Debug for JdwpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JdwpClient")
            .field("id_sizes", &self.id_sizes())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Reads frames forever: replies complete their pending request, composite events go to the
/// dispatch loop. Ends on socket error, on a fatally unexpected inbound command, or when the
/// client is dropped.
async fn reader_loop(
    input: OwnedReadHalf,
    codec: Arc<RwLock<JdwpCodec>>,
    pending: PendingMap,
    event_tx: UnboundedSender<Composite>,
) {
    let mut raw_stream = FramedRead::new(input, RawCodec);
    while let Some(next) = raw_stream.next().await {
        let packet = match next {
            Ok(packet) => packet,
            Err(e) => {
                error!("transport failed: {e}");
                break;
            }
        };
        match packet {
            AnyRawPacket::Reply(reply) => {
                let id = reply.header().id();
                let waiter = pending.lock().expect("pending map poisoned").remove(&id);
                match waiter {
                    Some(sender) => {
                        // The awaiter may have been cancelled; nothing to do then.
                        let _ = sender.send(reply);
                    }
                    None => {
                        trace!("dropping reply to {id}, nobody is waiting for it");
                    }
                }
            }
            AnyRawPacket::Command(command) => {
                let composite = {
                    let codec = codec.read().expect("codec poisoned");
                    to_composite(command, &codec)
                };
                match composite {
                    Ok(composite) => {
                        trace!(
                            "got composite of {} event(s), policy {:?}",
                            composite.events.len(),
                            composite.suspend_policy
                        );
                        if event_tx.send(composite).is_err() {
                            break;
                        }
                    }
                    Err(e @ DecodeCompositeError::NotAnEvent { .. }) => {
                        error!("{e}, terminating session");
                        break;
                    }
                    Err(DecodeCompositeError::Decode(e)) => {
                        warn!("dropping undecodable composite event: {e}");
                    }
                }
            }
        }
    }
    // Anyone still waiting learns the connection is gone.
    pending.lock().expect("pending map poisoned").clear();
}

/// Delivers each event of each composite to its registered handler, in protocol order, one at a
/// time. Handlers run inline so a later event is never delivered before an earlier handler
/// finished.
async fn dispatch_loop(mut event_rx: UnboundedReceiver<Composite>, dispatcher: Arc<EventDispatcher>) {
    while let Some(composite) = event_rx.recv().await {
        let composite = Arc::new(composite);
        for event in composite.events.iter().cloned() {
            let Some(request_id) = event.request_id() else {
                trace!("event {event:?} carries no request id, skipping");
                continue;
            };
            match dispatcher.get(request_id) {
                Some(hook) => hook.handle(event, composite.clone()).await,
                None => trace!("no handler registered for request {request_id}"),
            }
        }
    }
}

#[instrument(skip_all, err)]
async fn handshake<I, O>(input: &mut I, output: &mut O) -> Result<(), JdwpError>
where
    I: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    trace!("writing handshake");
    output.write_all(JDWP_HANDSHAKE).await?;
    let mut buf = [0u8; 14];
    input.read_exact(&mut buf).await?;
    if &buf == JDWP_HANDSHAKE {
        trace!("handshake matched");
        Ok(())
    } else {
        warn!("handshake did not match");
        Err(JdwpError::HandshakeMismatch)
    }
}
