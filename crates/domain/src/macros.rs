//! Macro for implementing Display and FromStr for label enums
//!
//! This macro eliminates boilerplate for label enum conversions by providing
//! a single implementation for both Display and FromStr traits. It handles
//! case-insensitive parsing and consistent string representation.
//!
//! # Example
//!
//! ```rust
//! use studiolink_domain::impl_domain_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ProbeOutcome {
//!     Reachable,
//!     Unreachable,
//! }
//!
//! impl_domain_label_conversions!(ProbeOutcome {
//!     Reachable => "reachable",
//!     Unreachable => "unreachable",
//! });
//!
//! assert_eq!(ProbeOutcome::Reachable.to_string(), "reachable");
//! assert_eq!("UNREACHABLE".parse::<ProbeOutcome>(), Ok(ProbeOutcome::Unreachable));
//! ```

/// Implements Display and FromStr traits for label enums
///
/// This macro generates:
/// - Display trait: converts enum variants to lowercase strings
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations
///
/// # Features
///
/// - Case-insensitive parsing (e.g., "ONLINE", "online", "Online" all work)
/// - Consistent lowercase string output
/// - Descriptive error messages with enum name
#[macro_export]
macro_rules! impl_domain_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
