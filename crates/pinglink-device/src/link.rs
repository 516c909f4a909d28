use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pinglink_frame::{ids, FrameReader, FrameWriter};
use pinglink_schema::{DecodedMessage, SchemaTable, Value};
use pinglink_transport::ByteStream;

use crate::command::CommandBuilder;
use crate::config::LinkConfig;
use crate::dispatch::Dispatcher;
use crate::error::{DeviceError, Result};
use crate::events::{EventQueue, LinkEvent};
use crate::profile::{ProfileReport, ProfileSlot};

/// A running connection to one ping device.
///
/// A background worker reads, synchronizes and dispatches frames until
/// [`stop`](Self::stop) is called or the stream closes. Commands are written
/// from the caller's thread on a second handle of the same stream.
pub struct Link<S: ByteStream> {
    writer: Mutex<FrameWriter<S>>,
    commands: CommandBuilder,
    dispatcher: Arc<Dispatcher>,
    events: Arc<EventQueue>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<S: ByteStream> Link<S> {
    /// Start the receive worker on a clone of `stream`.
    pub fn open(stream: S, table: Arc<SchemaTable>, config: LinkConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        let reader_stream = stream.try_clone()?;

        let profile = Arc::new(ProfileSlot::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&table), profile));
        let events = Arc::new(EventQueue::new(config.event_capacity));
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let reader = FrameReader::with_config(reader_stream, config.frame.clone());
            let dispatcher = Arc::clone(&dispatcher);
            let events = Arc::clone(&events);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(config.worker_name.clone())
                .spawn(move || run_worker(reader, &dispatcher, &events, &stop))
                .map_err(DeviceError::Spawn)?
        };

        Ok(Self {
            writer: Mutex::new(FrameWriter::new(stream)),
            commands: CommandBuilder::new(table),
            dispatcher,
            events,
            stop,
            worker: Some(worker),
        })
    }

    /// Command builder over the link's schema table.
    pub fn commands(&self) -> &CommandBuilder {
        &self.commands
    }

    /// Build and send a command.
    pub fn send(&self, message_id: u16, values: &[Value]) -> Result<()> {
        let packet = self.commands.build(message_id, values)?;
        self.send_packet(&packet)
    }

    /// Send an already built packet.
    pub fn send_packet(&self, packet: &[u8]) -> Result<()> {
        if self.stop.load(Ordering::Acquire) {
            return Err(DeviceError::Stopped);
        }
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_packet(packet)
            .map_err(Into::into)
    }

    /// Slot holding the latest profile report.
    pub fn profile_slot(&self) -> &Arc<ProfileSlot> {
        self.dispatcher.profile_slot()
    }

    /// The latest profile report if one arrived since the last read.
    pub fn take_profile(&self) -> Option<ProfileReport> {
        self.profile_slot().take_fresh()
    }

    /// Most recent decoded value for a message id.
    pub fn latest(&self, message_id: u16) -> Option<DecodedMessage> {
        self.dispatcher.latest(message_id)
    }

    /// Drain queued events without blocking.
    pub fn take_events(&self) -> Vec<LinkEvent> {
        self.events.drain()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_event(&self, timeout: Duration) -> Option<LinkEvent> {
        self.events.pop_timeout(timeout)
    }

    /// Whether the receive worker is still running.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stop the worker, close the stream and wait for the worker to exit.
    ///
    /// Calling it again is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        self.stop.store(true, Ordering::Release);
        let closed = self
            .writer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut()
            .close();

        worker.join().map_err(|_| DeviceError::WorkerPanicked)?;
        tracing::debug!("link stopped");
        closed.map_err(Into::into)
    }
}

impl<S: ByteStream> Drop for Link<S> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "error stopping link");
        }
    }
}

fn run_worker<S: ByteStream>(
    mut reader: FrameReader<S>,
    dispatcher: &Dispatcher,
    events: &EventQueue,
    stop: &AtomicBool,
) {
    tracing::info!("link worker started");
    let mut dispatched = 0u64;
    let mut dropped = 0u64;

    while !stop.load(Ordering::Acquire) {
        match reader.poll_frame() {
            Ok(Some(frame)) => match dispatcher.dispatch(&frame) {
                Ok(outcome) => {
                    dispatched += 1;
                    events.push(LinkEvent::Dispatched {
                        message_id: outcome.message_id(),
                    });
                }
                Err(err) => {
                    dropped += 1;
                    tracing::warn!(
                        message_id = frame.message_id(),
                        message = ids::message_name(frame.message_id()),
                        error = %err,
                        "dropping frame"
                    );
                    events.push(LinkEvent::from_dispatch_error(&err));
                }
            },
            Ok(None) => {}
            Err(err) => match LinkEvent::from_frame_error(&err) {
                Some(event) => {
                    dropped += 1;
                    tracing::warn!(error = %err, "dropping frame");
                    events.push(event);
                }
                None => {
                    if !stop.load(Ordering::Acquire) {
                        tracing::warn!(error = %err, "link closed");
                    }
                    break;
                }
            },
        }
    }

    events.push(LinkEvent::Closed);
    tracing::info!(
        dispatched,
        dropped,
        evicted_events = events.evicted(),
        discarded_bytes = reader.discarded_bytes(),
        "link worker stopped"
    );
}
