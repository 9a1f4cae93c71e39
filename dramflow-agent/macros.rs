//! Declarative macros to reduce boilerplate across the dramflow codebase

/// Define a metric enum with automatic `name()` and `all()` implementations
///
/// # Example
/// ```
/// use dramflow::metric_enum;
///
/// metric_enum! {
///     pub enum TrafficMetric {
///         Read => "READ",
///         Write => "WRITE",
///     }
/// }
///
/// let metric = TrafficMetric::Read;
/// assert_eq!(metric.name(), "READ");
/// assert_eq!(TrafficMetric::all().len(), 2);
/// ```
///
/// Expands to:
/// - An enum with Debug, Clone, Copy, PartialEq, Eq, Hash derives
/// - A `name(&self) -> &'static str` method
/// - An `all() -> Vec<Self>` method, in declaration order
#[macro_export]
macro_rules! metric_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }
        }
    };
}

/// Define an enum with name() and all() methods, plus custom data per variant
///
/// # Example
/// ```
/// use dramflow::enum_with_data;
///
/// enum_with_data! {
///     pub enum Channel: u32 {
///         A => ("a", 0x40),
///         B => ("b", 0x20),
///     }
///     impl value -> u32
/// }
///
/// let channel = Channel::A;
/// assert_eq!(channel.name(), "a");
/// assert_eq!(channel.value(), 0x40);
/// ```
#[macro_export]
macro_rules! enum_with_data {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $data_type:ty {
            $($variant:ident => ($str:expr, $data:expr)),* $(,)?
        }
        impl $method:ident -> $return_type:ty
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn $method(&self) -> $return_type {
                match self {
                    $($name::$variant => $data,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }
        }
    };
}
