// Counter backends
//
// The lifecycle code only talks to these traits. `KernelBackend` drives real
// perf_event descriptors; tests substitute a scripted backend.

use std::os::fd::{AsFd, OwnedFd};

use dramflow_raw::perf;

use crate::error::Result;

/// A single opened counting handle
///
/// Implementations release the underlying resource on drop.
pub trait CounterHandle {
    fn reset(&self) -> Result<()>;

    fn enable(&self) -> Result<()>;

    fn disable(&self) -> Result<()>;

    /// Read the accumulated value; `Ok(None)` signals a short read
    fn read_count(&self) -> Result<Option<u64>>;
}

/// Opens counters for a PMU type / config word on a logical CPU
pub trait CounterBackend {
    type Handle: CounterHandle;

    fn open(&self, pmu_type: u32, config: u64, cpu: i32) -> Result<Self::Handle>;
}

/// perf_event-backed counter; the descriptor is closed when this is dropped
#[derive(Debug)]
pub struct KernelCounter {
    fd: OwnedFd,
}

impl CounterHandle for KernelCounter {
    fn reset(&self) -> Result<()> {
        Ok(perf::reset(self.fd.as_fd())?)
    }

    fn enable(&self) -> Result<()> {
        Ok(perf::enable(self.fd.as_fd())?)
    }

    fn disable(&self) -> Result<()> {
        Ok(perf::disable(self.fd.as_fd())?)
    }

    fn read_count(&self) -> Result<Option<u64>> {
        Ok(perf::read_count(self.fd.as_fd())?)
    }
}

impl<B: CounterBackend> CounterBackend for &B {
    type Handle = B::Handle;

    fn open(&self, pmu_type: u32, config: u64, cpu: i32) -> Result<B::Handle> {
        (**self).open(pmu_type, config, cpu)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KernelBackend;

impl CounterBackend for KernelBackend {
    type Handle = KernelCounter;

    fn open(&self, pmu_type: u32, config: u64, cpu: i32) -> Result<KernelCounter> {
        let fd = perf::open_counter(pmu_type, config, cpu)?;
        Ok(KernelCounter { fd })
    }
}
