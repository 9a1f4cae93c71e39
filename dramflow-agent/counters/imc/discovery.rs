// iMC PMU discovery
// Scans the perf event-source registry for uncore memory-controller boxes

use std::path::Path;

use dramflow_raw::current_arch::imc::IMC_DEVICE_PREFIX;

use crate::common::sysfs;

/// Return the `uncore_imc*` devices registered under `root`, sorted by name
///
/// An empty result means measurement is unavailable on this machine; it is
/// not an error.
pub fn discover_imc_devices(root: &Path) -> Vec<String> {
    let mut devices: Vec<String> = sysfs::list_entries(root)
        .into_iter()
        .filter(|name| name.starts_with(IMC_DEVICE_PREFIX))
        .collect();
    devices.sort_unstable();

    tracing::info!(
        "Discovered {} iMC PMU devices under {}",
        devices.len(),
        root.display()
    );
    for dev in &devices {
        tracing::debug!("Found iMC PMU {}", dev);
    }

    devices
}
