// IMC (Integrated Memory Controller) DRAM traffic monitoring
// Opens one CAS_COUNT counter per iMC box and direction, then measures
// bounded windows with reset/enable ... read/disable

use crate::config::DramConfig;
use crate::counters::imc::backend::{CounterBackend, CounterHandle, KernelBackend};
use crate::counters::imc::discovery::discover_imc_devices;
use crate::counters::imc::events::{resolve_event, Direction, EventSource};
use crate::error::Result;
use crate::markers;
use crate::metrics::imc::{bytes_for, DramTraffic};

/// One opened hardware counter
///
/// Scale and unit are fixed when the counter is opened.
pub struct Counter<H> {
    handle: H,
    value: u64,
    scale: f64,
    unit: String,
    source: EventSource,
}

impl<H: CounterHandle> Counter<H> {
    /// Raw count captured by the last successful read
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    pub fn bytes(&self) -> f64 {
        bytes_for(self.value, self.scale, &self.unit)
    }

    fn begin(&mut self) {
        if let Err(e) = self.handle.reset() {
            tracing::warn!("Failed to reset iMC counter: {}", e);
        }
        if let Err(e) = self.handle.enable() {
            tracing::warn!("Failed to enable iMC counter: {}", e);
        }
    }

    fn finish(&mut self) {
        match self.handle.read_count() {
            Ok(Some(value)) => self.value = value,
            Ok(None) => tracing::debug!("Short counter read, keeping value {}", self.value),
            Err(e) => tracing::warn!("Failed to read iMC counter, keeping value {}: {}", self.value, e),
        }
        if let Err(e) = self.handle.disable() {
            tracing::warn!("Failed to disable iMC counter: {}", e);
        }
    }
}

pub struct DramCounter<B: CounterBackend = KernelBackend> {
    config: DramConfig,
    backend: B,
    reads: Vec<Counter<B::Handle>>,
    writes: Vec<Counter<B::Handle>>,
    initialised: bool,
    measuring: bool,
}

impl DramCounter<KernelBackend> {
    pub fn new(config: DramConfig) -> Result<Self> {
        Self::with_backend(config, KernelBackend)
    }
}

impl<B: CounterBackend> DramCounter<B> {
    pub fn with_backend(config: DramConfig, backend: B) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            backend,
            reads: Vec::new(),
            writes: Vec::new(),
            initialised: false,
            measuring: false,
        })
    }

    /// Discover iMC boxes and open their CAS_COUNT counters
    ///
    /// Returns `true` once at least one counter is open. Later calls return
    /// `true` without touching the hardware again.
    pub fn init(&mut self) -> bool {
        if self.initialised {
            return true;
        }

        let devices = discover_imc_devices(&self.config.sysfs_root);
        if devices.is_empty() {
            tracing::warn!(
                "No uncore_imc devices under {}",
                self.config.sysfs_root.display()
            );
            return false;
        }

        for dev in &devices {
            if let Some(counter) = self.open_counter(dev, Direction::Read) {
                self.reads.push(counter);
            }
            if let Some(counter) = self.open_counter(dev, Direction::Write) {
                self.writes.push(counter);
            }
        }

        self.initialised = !(self.reads.is_empty() && self.writes.is_empty());

        if self.initialised {
            tracing::info!(
                "Opened {} read and {} write iMC counters across {} devices",
                self.reads.len(),
                self.writes.len(),
                devices.len()
            );
        } else {
            tracing::warn!(
                "Found {} iMC devices but could not open any counter",
                devices.len()
            );
        }

        self.initialised
    }

    fn open_counter(&self, dev: &str, direction: Direction) -> Option<Counter<B::Handle>> {
        let event = resolve_event(&self.config.sysfs_root, dev, direction)?;

        // Uncore boxes are only reachable from some CPUs; the first one that
        // accepts the event owns the counter.
        for cpu in 0..self.config.max_cpu {
            let Ok(cpu) = i32::try_from(cpu) else {
                break;
            };
            match self.backend.open(event.pmu_type, event.config, cpu) {
                Ok(handle) => {
                    tracing::info!(
                        "Opened {} {} counter on CPU {} (type {}, config 0x{:x})",
                        dev,
                        direction.label(),
                        cpu,
                        event.pmu_type,
                        event.config
                    );
                    return Some(Counter {
                        handle,
                        value: 0,
                        scale: event.scale,
                        unit: event.unit,
                        source: event.source,
                    });
                }
                Err(e) => tracing::trace!("{}: CPU {} rejected: {}", dev, cpu, e),
            }
        }

        tracing::debug!(
            "{}: no CPU below {} accepted the {} counter",
            dev,
            self.config.max_cpu,
            direction.label()
        );
        None
    }

    /// Reset and enable every counter
    pub fn start(&mut self) {
        if !self.initialised {
            return;
        }

        for counter in self.reads.iter_mut().chain(self.writes.iter_mut()) {
            counter.begin();
        }
        self.measuring = true;
    }

    /// Read and disable every counter
    pub fn stop(&mut self) {
        if !self.measuring {
            return;
        }

        for counter in self.reads.iter_mut().chain(self.writes.iter_mut()) {
            counter.finish();
        }
        self.measuring = false;
    }

    /// Run `f` inside a measurement window bracketed by the region markers
    pub fn measure<R>(&mut self, f: impl FnOnce() -> R) -> R {
        markers::PIN_MARKER_START();
        self.start();
        let result = f();
        self.stop();
        markers::PIN_MARKER_END();
        result
    }

    /// Byte totals of the last completed window
    pub fn traffic(&self) -> DramTraffic {
        let read: f64 = self.reads.iter().map(Counter::bytes).sum();
        let write: f64 = self.writes.iter().map(Counter::bytes).sum();
        DramTraffic::new(read as u64, write as u64)
    }

    /// Whether any open counter relies on the built-in CAS_COUNT encoding
    pub fn uses_fallback(&self) -> bool {
        self.reads
            .iter()
            .chain(self.writes.iter())
            .any(|counter| counter.source.is_fallback())
    }

    pub fn reads(&self) -> &[Counter<B::Handle>] {
        &self.reads
    }

    pub fn writes(&self) -> &[Counter<B::Handle>] {
        &self.writes
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn config(&self) -> &DramConfig {
        &self.config
    }
}

impl<B: CounterBackend> Drop for DramCounter<B> {
    fn drop(&mut self) {
        // Handles close themselves; just stop anything still counting
        if self.measuring {
            for counter in self.reads.iter().chain(self.writes.iter()) {
                let _ = counter.handle.disable();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::FakeSysfs;
    use crate::counters::imc::backend::mock::MockBackend;

    const READ: u64 = 0x0304;
    const WRITE: u64 = 0x0c04;

    fn config_for(sysfs: &FakeSysfs, max_cpu: u32) -> DramConfig {
        DramConfig {
            sysfs_root: sysfs.root().to_path_buf(),
            max_cpu,
            ..DramConfig::default()
        }
    }

    #[test]
    fn test_no_devices() {
        let sysfs = FakeSysfs::new();
        sysfs.mkdir("cpu");
        let backend = MockBackend::default();
        let mut counter = DramCounter::with_backend(config_for(&sysfs, 8), &backend).unwrap();

        assert!(!counter.init());
        counter.start();
        assert!(!counter.is_measuring());
        counter.stop();

        assert_eq!(counter.traffic(), DramTraffic::default());
        assert!(backend.attempts.borrow().is_empty());
    }

    #[test]
    fn test_init_idempotent() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        sysfs.add_imc("uncore_imc_1", 14);
        let backend = MockBackend::default();
        for pmu in [13, 14] {
            backend.allow(pmu, READ, 2);
            backend.allow(pmu, WRITE, 2);
        }

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 8), &backend).unwrap();
        assert!(counter.init());
        let attempts = backend.attempts.borrow().len();

        assert!(counter.init());
        assert_eq!(counter.reads().len(), 2);
        assert_eq!(counter.writes().len(), 2);
        assert_eq!(backend.attempts.borrow().len(), attempts);
    }

    #[test]
    fn test_first_cpu_wins() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, READ, 1);
        backend.allow(13, READ, 3);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 8), &backend).unwrap();
        assert!(counter.init());

        let read_cpus: Vec<i32> = backend
            .attempts
            .borrow()
            .iter()
            .filter(|(_, config, _)| *config == READ)
            .map(|(_, _, cpu)| *cpu)
            .collect();
        assert_eq!(read_cpus, vec![0, 1]);

        let write_attempts = backend
            .attempts
            .borrow()
            .iter()
            .filter(|(_, config, _)| *config == WRITE)
            .count();
        assert_eq!(write_attempts, 8);
    }

    #[test]
    fn test_probe_range_is_bounded() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, READ, 5);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(!counter.init());
        assert!(!counter.is_initialised());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, READ, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        let state = backend.state(13, READ);

        counter.stop();
        assert!(state.ops.borrow().is_empty());
        assert!(!counter.is_measuring());

        counter.start();
        state.tick(100);
        counter.stop();
        assert_eq!(counter.reads()[0].value(), 100);
        let ops = state.ops.borrow().len();

        // A second stop must neither read nor clear the stored value
        state.count.set(7);
        counter.stop();
        assert_eq!(counter.reads()[0].value(), 100);
        assert!(!counter.is_measuring());
        assert_eq!(state.ops.borrow().len(), ops);
    }

    #[test]
    fn test_start_resets_each_window() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, READ, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        let state = backend.state(13, READ);

        counter.start();
        assert!(counter.is_measuring());
        state.tick(100);
        counter.stop();
        assert_eq!(counter.reads()[0].value(), 100);

        // No activity while idle or during the second window
        state.tick(50);
        counter.start();
        counter.stop();
        assert_eq!(counter.reads()[0].value(), 0);

        assert_eq!(
            *state.ops.borrow(),
            vec!["reset", "enable", "read", "disable", "reset", "enable", "read", "disable"]
        );
    }

    #[test]
    fn test_short_read_keeps_previous_value() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, WRITE, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        let state = backend.state(13, WRITE);

        counter.start();
        state.tick(10);
        counter.stop();

        counter.start();
        state.tick(5);
        state.short_read.set(true);
        counter.stop();

        assert_eq!(counter.writes()[0].value(), 10);
        assert!(!state.enabled.get());
        assert!(!counter.is_measuring());
    }

    #[test]
    fn test_read_only_device() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, READ, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        assert!(counter.writes().is_empty());

        let state = backend.state(13, READ);
        counter.measure(|| state.tick(1 << 14));

        // 2^14 lines * 6.103515625e-5 MiB * 2^20 = 1 MiB
        let traffic = counter.traffic();
        assert_eq!(traffic.read_bytes, 1 << 20);
        assert_eq!(traffic.write_bytes, 0);
        assert_eq!(traffic.total_bytes(), 1 << 20);
    }

    #[test]
    fn test_invalid_pmu_type_contributes_nothing() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        sysfs.add_imc("uncore_imc_1", -1);
        let backend = MockBackend::default();
        backend.allow(13, READ, 0);
        backend.allow(13, WRITE, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        assert_eq!(counter.reads().len(), 1);
        assert_eq!(counter.writes().len(), 1);
        assert!(!counter.uses_fallback());
    }

    #[test]
    fn test_fallback_is_tracked() {
        let sysfs = FakeSysfs::new();
        sysfs.write("uncore_imc_0/type", "13\n");
        let backend = MockBackend::default();
        backend.allow(13, READ, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        assert!(counter.uses_fallback());
        assert_eq!(counter.reads()[0].scale(), 1.0);
        assert_eq!(counter.reads()[0].unit(), "");
    }

    #[test]
    fn test_handles_released_on_drop() {
        let sysfs = FakeSysfs::new();
        sysfs.add_imc("uncore_imc_0", 13);
        let backend = MockBackend::default();
        backend.allow(13, READ, 0);

        let mut counter = DramCounter::with_backend(config_for(&sysfs, 4), &backend).unwrap();
        assert!(counter.init());
        counter.start();

        let state = backend.state(13, READ);
        assert!(!state.closed.get());
        drop(counter);
        assert!(state.closed.get());
        assert!(!state.enabled.get());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sysfs = FakeSysfs::new();
        let backend = MockBackend::default();
        assert!(DramCounter::with_backend(config_for(&sysfs, 0), &backend).is_err());
    }
}
