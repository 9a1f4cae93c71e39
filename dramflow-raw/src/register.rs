//! Generic layout abstraction for packed perf event-configuration words

/// Trait for event layouts that can be converted to/from the raw `config`
/// word of a `perf_event_attr`
///
/// # Example
///
/// ```ignore
/// use dramflow_raw::register::EventLayout;
///
/// #[derive(Debug, Default)]
/// struct MyEvent {
///     event: u8,
///     umask: u8,
/// }
///
/// impl EventLayout for MyEvent {
///     fn to_config(&self) -> u64 {
///         self.event as u64 | ((self.umask as u64) << 8)
///     }
///
///     fn from_config(value: u64) -> Self {
///         Self {
///             event: (value & 0xFF) as u8,
///             umask: ((value >> 8) & 0xFF) as u8,
///         }
///     }
/// }
/// ```
pub trait EventLayout: Sized {
    /// Pack this layout into a raw `config` word
    fn to_config(&self) -> u64;

    /// Unpack a raw `config` word into this layout
    fn from_config(value: u64) -> Self;

    /// Validate that the fields are within acceptable ranges
    ///
    /// Returns `Ok(())` if valid, or an error message if invalid.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}
