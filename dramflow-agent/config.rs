use std::path::PathBuf;

use crate::error::{DramflowError, Result};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/bus/event_source/devices";
pub const DEFAULT_MAX_CPU: u32 = 128;
pub const DEFAULT_OUTPUT_DIR: &str = "logs";
pub const DEFAULT_OUTPUT_FILE: &str = "dram_counts.out";

#[derive(Debug, Clone, PartialEq)]
pub struct DramConfig {
    /// Registry of perf event sources scanned for iMC devices
    pub sysfs_root: PathBuf,
    /// CPU indices `0..max_cpu` are probed when opening a counter
    pub max_cpu: u32,
    pub output_dir: PathBuf,
    pub output_file: String,
}

impl Default for DramConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            max_cpu: DEFAULT_MAX_CPU,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl DramConfig {
    /// Size the CPU probe range from the kernel's possible-CPU mask
    pub fn auto_detect() -> Self {
        let max_cpu = Self::detect_possible_cpus()
            .and_then(|cpus| cpus.into_iter().max())
            .map(|highest| highest + 1)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Failed to detect possible CPUs, probing 0-{}",
                    DEFAULT_MAX_CPU - 1
                );
                DEFAULT_MAX_CPU
            });

        tracing::info!("Probing up to {} CPUs for iMC counters", max_cpu);

        Self {
            max_cpu,
            ..Self::default()
        }
    }

    /// Detect possible CPUs from /sys/devices/system/cpu/possible
    pub fn detect_possible_cpus() -> Option<Vec<u32>> {
        std::fs::read_to_string("/sys/devices/system/cpu/possible")
            .ok()
            .and_then(|s| Self::parse_cpu_list(&s))
    }

    /// Parse CPU list like "0-3,8-11" into Vec<u32>
    pub fn parse_cpu_list(s: &str) -> Option<Vec<u32>> {
        let mut cpus = Vec::new();
        for part in s.trim().split(',') {
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.parse().ok()?;
                let end: u32 = end.parse().ok()?;
                cpus.extend(start..=end);
            } else {
                cpus.push(part.parse().ok()?);
            }
        }
        Some(cpus)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cpu == 0 {
            return Err(DramflowError::InvalidConfiguration(
                "max_cpu must be at least 1".to_string(),
            ));
        }

        // CPU ids reach perf_event_open as a signed int
        if i32::try_from(self.max_cpu).is_err() {
            return Err(DramflowError::InvalidConfiguration(format!(
                "max_cpu {} exceeds {}",
                self.max_cpu,
                i32::MAX
            )));
        }

        if self.output_file.trim().is_empty() {
            return Err(DramflowError::InvalidConfiguration(
                "output file name is empty".to_string(),
            ));
        }

        Ok(())
    }
}
