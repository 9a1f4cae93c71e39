// iMC event resolution (architecture-aware)
//
// Turns a device + direction into the PMU type, packed config word and
// scale/unit metadata needed to open and interpret a CAS_COUNT counter.

use std::collections::BTreeMap;
use std::path::Path;

use dramflow_raw::current_arch::imc;

use crate::common::sysfs;

crate::enum_with_data! {
    /// Traffic direction; `name()` is the sysfs event name
    pub enum Direction: u64 {
        Read => (imc::sysfs::CAS_COUNT_READ, imc::CAS_COUNT_READ),
        Write => (imc::sysfs::CAS_COUNT_WRITE, imc::CAS_COUNT_WRITE),
    }
    impl fallback_config -> u64
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Read => "read",
            Direction::Write => "write",
        }
    }
}

/// Where a config word came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Parsed from the kernel's event description
    Sysfs,
    /// Built-in CAS_COUNT encoding; may not match the running microarchitecture
    Fallback,
}

impl EventSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, EventSource::Fallback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub pmu_type: u32,
    pub config: u64,
    pub source: EventSource,
    pub scale: f64,
    pub unit: String,
}

/// Read the dynamic PMU type of a device; negative or malformed values are rejected
pub fn read_pmu_type(dev_dir: &Path) -> Option<u32> {
    let path = dev_dir.join("type");
    let value = sysfs::read_i64(&path)?;
    match u32::try_from(value) {
        Ok(pmu_type) => Some(pmu_type),
        Err(_) => {
            tracing::debug!("Invalid PMU type {} in {}", value, path.display());
            None
        }
    }
}

fn parse_hex(value: &str) -> Option<u64> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).ok()
}

/// Tokenize an event description like "event=0x04,umask=0x03"
///
/// Only `key=hex` terms are recognised. Bare terms (e.g. "edge") and
/// malformed values are skipped; the remaining terms still apply.
pub fn parse_event_terms(line: &str) -> BTreeMap<String, u64> {
    let mut terms = BTreeMap::new();

    for token in line.trim().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let parsed = token
            .split_once('=')
            .map(|(key, value)| (key.trim(), parse_hex(value)));

        match parsed {
            Some((key, Some(value))) if !key.is_empty() => {
                terms.insert(key.to_string(), value);
            }
            _ => tracing::debug!("Skipping malformed event term {:?}", token),
        }
    }

    terms
}

/// Pack parsed terms into a config word; unknown keys are ignored
///
/// Field values are used as given, so an oversized `event` still yields a
/// non-zero word rather than being dropped.
pub fn pack_terms(terms: &BTreeMap<String, u64>) -> u64 {
    let field = |key: &str| terms.get(key).copied().unwrap_or(0);

    imc::pack_fields(
        field("event"),
        field("umask"),
        field("edge"),
        field("inv"),
        field("cmask"),
    )
}

/// Resolve the config word from an event description file
///
/// Falls back to the direction's CAS_COUNT encoding when the file is
/// unreadable or yields 0.
pub fn resolve_config(path: &Path, direction: Direction) -> (u64, EventSource) {
    let config = sysfs::read_first_line(path)
        .map(|line| pack_terms(&parse_event_terms(&line)))
        .unwrap_or(0);

    if config == 0 {
        (direction.fallback_config(), EventSource::Fallback)
    } else {
        (config, EventSource::Sysfs)
    }
}

/// Resolve everything needed to open a counter for `dev` in `direction`
///
/// Returns `None` only when the device has no usable PMU type.
pub fn resolve_event(root: &Path, dev: &str, direction: Direction) -> Option<ResolvedEvent> {
    let dev_dir = root.join(dev);
    let pmu_type = read_pmu_type(&dev_dir)?;

    let events_dir = dev_dir.join("events");
    let (config, source) = resolve_config(&events_dir.join(direction.name()), direction);

    if source.is_fallback() {
        tracing::warn!(
            "{}: no usable {} description, using built-in CAS_COUNT encoding 0x{:04x} \
             (lower confidence outside Skylake-SP/Cascade Lake-SP)",
            dev,
            direction.name(),
            config
        );
    }

    let scale = sysfs::read_f64(&events_dir.join(format!("{}.scale", direction.name())))
        .unwrap_or(1.0);
    let unit = sysfs::read_token(&events_dir.join(format!("{}.unit", direction.name())))
        .unwrap_or_default();

    Some(ResolvedEvent {
        pmu_type,
        config,
        source,
        scale,
        unit,
    })
}
