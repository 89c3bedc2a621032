//! Background reader: pulls pulse lines off the serial link and queues
//! scaled samples for the tick loop.
//!
//! The reader owns its connection and its reconnect policy. The tick loop
//! never blocks on serial IO; it only drains the hand-off queue.

use crate::core::Sample;
use crate::device::link::{DeviceLink, LineLink, LinkError, READ_TIMEOUT};
use crate::device::wire::{decode_pulse_line, BAUD_RATE};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Capacity of the hand-off queue between reader and tick loop.
///
/// Overflow drops the oldest queued sample; a stalled consumer costs data,
/// never memory.
pub const QUEUE_CAPACITY: usize = 256;

/// Fixed wait between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Background reader for the pulse device.
///
/// The loop moves between disconnected and reading. Any IO error drops
/// the link and falls back to disconnected, which retries after
/// [`RECONNECT_DELAY`]. Runs until `stop()`.
pub struct PulseReader {
    receiver: Receiver<Sample>,
    running: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl PulseReader {
    /// Spawn a reader against the given serial port.
    pub fn start(port: String) -> Self {
        Self::start_with(move || DeviceLink::open(&port, BAUD_RATE))
    }

    /// Spawn a reader with a custom link factory. Tests script this to
    /// drive the loop without hardware.
    fn start_with<L, F>(connect: F) -> Self
    where
        L: LineLink + 'static,
        F: Fn() -> Result<L, LinkError> + Send + 'static,
    {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(QUEUE_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let connected = Arc::new(AtomicBool::new(false));

        let thread_receiver = receiver.clone();
        let thread_running = running.clone();
        let thread_connected = connected.clone();

        let handle = thread::spawn(move || {
            run_read_loop(
                connect,
                sender,
                thread_receiver,
                &thread_running,
                &thread_connected,
            );
            thread_connected.store(false, Ordering::SeqCst);
            thread_running.store(false, Ordering::SeqCst);
        });

        Self {
            receiver,
            running,
            connected,
            thread_handle: Some(handle),
        }
    }

    /// The hand-off queue's consuming end.
    pub fn samples(&self) -> &Receiver<Sample> {
        &self.receiver
    }

    /// Whether the reader currently holds an open link.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the reader thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the loop to exit and join the thread.
    ///
    /// The loop checks the flag at the top of every iteration, so stop
    /// latency is bounded by the read timeout or the reconnect poll.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PulseReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The reader's connection state.
enum LinkState<L> {
    Disconnected,
    Reading(L),
}

fn run_read_loop<L, F>(
    connect: F,
    sender: Sender<Sample>,
    receiver: Receiver<Sample>,
    running: &AtomicBool,
    connected: &AtomicBool,
) where
    L: LineLink,
    F: Fn() -> Result<L, LinkError>,
{
    let mut state: LinkState<L> = LinkState::Disconnected;

    while running.load(Ordering::SeqCst) {
        state = match state {
            LinkState::Disconnected => match connect() {
                Ok(link) => {
                    connected.store(true, Ordering::SeqCst);
                    tracing::info!("Pulse device connected");
                    LinkState::Reading(link)
                }
                Err(e) => {
                    tracing::debug!("Connect attempt failed: {}", e);
                    wait_for_retry(running);
                    LinkState::Disconnected
                }
            },
            LinkState::Reading(mut link) => match link.read_line(READ_TIMEOUT) {
                Ok(Some(line)) => {
                    if let Some(sample) = decode_pulse_line(&line) {
                        publish(&sender, &receiver, sample);
                    }
                    LinkState::Reading(link)
                }
                Ok(None) => LinkState::Reading(link),
                Err(e) => {
                    // Dropping the link here closes the handle.
                    tracing::warn!("Read failed, reconnecting: {}", e);
                    connected.store(false, Ordering::SeqCst);
                    wait_for_retry(running);
                    LinkState::Disconnected
                }
            },
        };
    }
}

/// Queue a sample, dropping the oldest queued value when full.
fn publish(sender: &Sender<Sample>, receiver: &Receiver<Sample>, sample: Sample) {
    match sender.try_send(sample) {
        Ok(()) => {}
        Err(TrySendError::Full(sample)) => {
            let _ = receiver.try_recv();
            let _ = sender.try_send(sample);
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

/// Sleep out the reconnect delay, polling the stop flag.
fn wait_for_retry(running: &AtomicBool) {
    let deadline = Instant::now() + RECONNECT_DELAY;
    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted link: pops one read result per call, then acts like a
    /// quiet device.
    struct FakeLink {
        reads: VecDeque<Result<Option<String>, LinkError>>,
    }

    impl FakeLink {
        fn new(reads: Vec<Result<Option<String>, LinkError>>) -> Self {
            Self {
                reads: reads.into(),
            }
        }
    }

    impl LineLink for FakeLink {
        fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>, LinkError> {
            match self.reads.pop_front() {
                Some(result) => result,
                None => {
                    thread::sleep(Duration::from_millis(10));
                    Ok(None)
                }
            }
        }

        fn write_line(&mut self, _line: &str) -> Result<(), LinkError> {
            Ok(())
        }
    }

    /// Reader over a queue of scripted links, recording connect attempts.
    fn scripted_reader(links: Vec<FakeLink>) -> (PulseReader, Arc<Mutex<Vec<Instant>>>) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(VecDeque::from(links)));

        let attempts_clone = attempts.clone();
        let reader = PulseReader::start_with(move || {
            attempts_clone.lock().unwrap().push(Instant::now());
            match queue.lock().unwrap().pop_front() {
                Some(link) => Ok(link),
                None => Err(LinkError::Connect("no device".to_string())),
            }
        });

        (reader, attempts)
    }

    fn pulse(line: &str) -> Result<Option<String>, LinkError> {
        Ok(Some(line.to_string()))
    }

    #[test]
    fn test_reader_decodes_and_queues_pulse_lines() {
        let link = FakeLink::new(vec![pulse("PULSE_RAW:512"), pulse("PULSE_RAW:1023")]);
        let (mut reader, _) = scripted_reader(vec![link]);

        let first = reader
            .samples()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        let second = reader
            .samples()
            .recv_timeout(Duration::from_secs(1))
            .unwrap();
        assert_eq!(first, 50);
        assert_eq!(second, 100);

        reader.stop();
    }

    #[test]
    fn test_garbage_lines_are_dropped_without_reconnect() {
        let link = FakeLink::new(vec![
            pulse("garbage"),
            pulse("PULSE_RAW:abc"),
            pulse("PULSE_RAW:2000"),
        ]);
        let (mut reader, attempts) = scripted_reader(vec![link]);

        // Nothing decodable ever reaches the queue.
        assert!(reader
            .samples()
            .recv_timeout(Duration::from_millis(300))
            .is_err());
        assert!(reader.is_connected());
        assert_eq!(attempts.lock().unwrap().len(), 1);

        reader.stop();
    }

    #[test]
    fn test_read_error_triggers_reconnect_after_backoff() {
        let broken = FakeLink::new(vec![Err(LinkError::Io("device unplugged".to_string()))]);
        let healthy = FakeLink::new(vec![pulse("PULSE_RAW:512")]);
        let (mut reader, attempts) = scripted_reader(vec![broken, healthy]);

        // The second link only delivers after the error and the backoff.
        let sample = reader
            .samples()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(sample, 50);

        {
            let attempts = attempts.lock().unwrap();
            assert!(attempts.len() >= 2);
            assert!(attempts[1] - attempts[0] >= RECONNECT_DELAY);
        }

        reader.stop();
    }

    #[test]
    fn test_stop_joins_even_while_disconnected() {
        let (mut reader, attempts) = scripted_reader(vec![]);

        // Let it fail at least once, then stop during the retry wait.
        thread::sleep(Duration::from_millis(100));
        reader.stop();

        assert!(!reader.is_running());
        assert!(!reader.is_connected());
        assert!(!attempts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_publish_drops_oldest_on_overflow() {
        let (sender, receiver) = bounded(4);

        for sample in [1u16, 2, 3, 4, 5, 6] {
            publish(&sender, &receiver, sample);
        }

        let queued: Vec<Sample> = receiver.try_iter().collect();
        assert_eq!(queued, vec![3, 4, 5, 6]);
    }
}
