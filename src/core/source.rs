//! Signal sources: the demo generator and the live device feed.
//!
//! Both produce one sample per tick through [`SignalSource`]. The device
//! source drains the reader's hand-off queue and degrades to synthesized
//! samples when the queue is empty, so a quiet device never stalls a tick.

use crate::core::engine::Sample;
use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::time::Instant;

/// Default spread of the demo generator around its center.
const DEFAULT_SPREAD: f64 = 5.0;

/// Anything that can produce the next pulse sample for a tick.
pub trait SignalSource {
    fn next_sample(&mut self) -> Sample;
}

/// Synthesized pulse signal centered at 60.
///
/// The generator drifts through a 30-second cycle: a calm third with low
/// variation, a restless third, and a spiky third where larger excursions
/// appear about 30% of the time. Output is clamped to [0,100].
pub struct DemoSource {
    rng: StdRng,
    epoch: Instant,
    spread: f64,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::with_spread(DEFAULT_SPREAD)
    }

    /// Generator with a custom base spread.
    pub fn with_spread(spread: f64) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            epoch: Instant::now(),
            spread,
        }
    }

    /// Seeded generator. The draw sequence is reproducible for a fixed
    /// seed, up to the time-based phase.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            epoch: Instant::now(),
            spread: DEFAULT_SPREAD,
        }
    }

    fn gauss(&mut self, mean: f64, sd: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + sd * z
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for DemoSource {
    fn next_sample(&mut self) -> Sample {
        let base = self.gauss(60.0, self.spread);

        let phase = self.epoch.elapsed().as_secs_f64() % 30.0;
        let variation = if phase < 10.0 {
            self.gauss(0.0, 3.0)
        } else if phase < 20.0 {
            self.gauss(0.0, 8.0)
        } else if self.rng.random::<f64>() < 0.3 {
            self.gauss(0.0, 15.0)
        } else {
            self.gauss(0.0, 5.0)
        };

        (base + variation).clamp(0.0, 100.0) as Sample
    }
}

/// Live feed from the reader's hand-off queue.
///
/// When the queue is empty at tick time the source synthesizes a demo
/// sample for that tick only, keeping the pipeline producing output while
/// the device is quiet or reconnecting.
pub struct DeviceSource {
    receiver: Receiver<Sample>,
    fallback: DemoSource,
}

impl DeviceSource {
    pub fn new(receiver: Receiver<Sample>) -> Self {
        Self {
            receiver,
            fallback: DemoSource::new(),
        }
    }
}

impl SignalSource for DeviceSource {
    fn next_sample(&mut self) -> Sample {
        match self.receiver.try_recv() {
            Ok(sample) => sample,
            Err(_) => self.fallback.next_sample(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_demo_samples_stay_in_range() {
        let mut source = DemoSource::seeded(42);
        for _ in 0..1000 {
            let sample = source.next_sample();
            assert!(sample <= 100);
        }
    }

    #[test]
    fn test_demo_samples_vary() {
        let mut source = DemoSource::seeded(7);
        let first = source.next_sample();
        let varied = (0..50).any(|_| source.next_sample() != first);
        assert!(varied);
    }

    #[test]
    fn test_device_source_prefers_queued_samples() {
        let (sender, receiver) = bounded(8);
        let mut source = DeviceSource::new(receiver);

        sender.send(11).unwrap();
        sender.send(22).unwrap();
        assert_eq!(source.next_sample(), 11);
        assert_eq!(source.next_sample(), 22);
    }

    #[test]
    fn test_device_source_falls_back_when_queue_empty() {
        let (_sender, receiver) = bounded::<Sample>(8);
        let mut source = DeviceSource::new(receiver);

        // No queued data; the tick must still get a sample.
        let sample = source.next_sample();
        assert!(sample <= 100);
    }

    #[test]
    fn test_device_source_survives_disconnected_queue() {
        let (sender, receiver) = bounded::<Sample>(8);
        drop(sender);
        let mut source = DeviceSource::new(receiver);
        let sample = source.next_sample();
        assert!(sample <= 100);
    }
}
