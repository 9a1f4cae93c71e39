// IMC (Integrated Memory Controller) DRAM traffic metrics

use dramflow_raw::current_arch::imc::CACHE_LINE_SIZE;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

crate::metric_enum! {
    /// Keys of the persisted record, in file order
    pub enum TrafficMetric {
        ReadBytes => "DRAM_READ_BYTES",
        WriteBytes => "DRAM_WRITE_BYTES",
        TotalBytes => "DRAM_TOTAL_BYTES",
    }
}

/// Convert a raw count to bytes using the kernel's scale and unit
///
/// `MiB` and `KiB` units are honoured; anything else is treated as a count
/// of 64-byte cache lines.
pub fn bytes_for(raw: u64, scale: f64, unit: &str) -> f64 {
    let scaled = raw as f64 * scale;
    if unit.contains("MiB") {
        scaled * MIB
    } else if unit.contains("KiB") {
        scaled * KIB
    } else {
        scaled * CACHE_LINE_SIZE as f64
    }
}

/// Human-readable size: GB/MB with two decimals, whole bytes below 1 MiB
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value >= GIB {
        format!("{:.2} GB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MB", value / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DramTraffic {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl DramTraffic {
    pub fn new(read_bytes: u64, write_bytes: u64) -> Self {
        Self {
            read_bytes,
            write_bytes,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }

    pub fn get(&self, metric: TrafficMetric) -> u64 {
        match metric {
            TrafficMetric::ReadBytes => self.read_bytes,
            TrafficMetric::WriteBytes => self.write_bytes,
            TrafficMetric::TotalBytes => self.total_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_for_units() {
        assert_eq!(bytes_for(10, 1.0, "MiB"), (10u64 << 20) as f64);
        assert_eq!(bytes_for(10, 1.0, "KiB"), (10u64 << 10) as f64);
        assert_eq!(bytes_for(10, 1.0, ""), 640.0);
        assert_eq!(bytes_for(10, 1.0, "lines"), 640.0);
    }

    #[test]
    fn test_bytes_for_kernel_scale() {
        // uncore_imc reports CAS counts scaled to MiB (1 / 16384 per line)
        assert_eq!(bytes_for(16384, 6.103515625e-5, "MiB"), MIB);
        assert_eq!(bytes_for(1, 6.103515625e-5, "MiB"), 64.0);
    }

    #[test]
    fn test_format_thresholds() {
        assert_eq!(format_bytes(1 << 30), "1.00 GB");
        assert_eq!(format_bytes((1 << 30) - 1), "1024.00 MB");
        assert_eq!(format_bytes(1 << 20), "1.00 MB");
        assert_eq!(format_bytes((1 << 20) - 1), "1048575 bytes");
        assert_eq!(format_bytes(0), "0 bytes");
    }

    #[test]
    fn test_traffic_metrics() {
        let traffic = DramTraffic::new(3, 4);
        assert_eq!(traffic.total_bytes(), 7);

        let names: Vec<&str> = TrafficMetric::all().iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec!["DRAM_READ_BYTES", "DRAM_WRITE_BYTES", "DRAM_TOTAL_BYTES"]
        );
        assert_eq!(traffic.get(TrafficMetric::TotalBytes), 7);
    }
}
