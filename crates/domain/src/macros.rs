//! Macro for implementing Display and FromStr for string-valued enums
//!
//! Settings enums (log format) and report enums (health) are written to and
//! read from configuration files and environment variables as lowercase
//! strings. This macro provides both conversions from one mapping.
//!
//! # Example
//!
//! ```rust
//! use sumoguard_domain::impl_str_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Health {
//!     Healthy,
//!     Degraded,
//!     Unhealthy,
//! }
//!
//! impl_str_conversions!(Health {
//!     Healthy => "healthy",
//!     Degraded => "degraded",
//!     Unhealthy => "unhealthy",
//! });
//!
//! assert_eq!("DEGRADED".parse::<Health>().unwrap(), Health::Degraded);
//! ```

/// Implements Display and FromStr for an enum from a variant/string mapping
///
/// Parsing is case-insensitive and ignores surrounding whitespace; output is
/// the mapped string verbatim.
#[macro_export]
macro_rules! impl_str_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Verbosity {
        Quiet,
        Loud,
    }

    impl_str_conversions!(Verbosity {
        Quiet => "quiet",
        Loud => "loud",
    });

    #[test]
    fn test_round_trip_and_case_insensitivity() {
        assert_eq!(Verbosity::Loud.to_string(), "loud");
        assert_eq!(Verbosity::from_str(" Quiet ").unwrap(), Verbosity::Quiet);
        assert_eq!(Verbosity::from_str("LOUD").unwrap(), Verbosity::Loud);
    }

    #[test]
    fn test_invalid_value_names_enum() {
        let err = Verbosity::from_str("whisper").unwrap_err();
        assert_eq!(err, "Invalid Verbosity: whisper");
    }
}
