//! Macro for implementing Display and FromStr for status-like enums
//!
//! Status columns and outcome tags are stored and logged as lowercase
//! strings. The macro keeps the enum/string mapping in one place.
//!
//! # Example
//!
//! ```rust
//! use aura_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReminderState {
//!     Pending,
//!     Sent,
//! }
//!
//! impl_domain_status_conversions!(ReminderState {
//!     Pending => "pending",
//!     Sent => "sent",
//! });
//!
//! assert_eq!(ReminderState::Sent.to_string(), "sent");
//! assert_eq!("PENDING".parse::<ReminderState>(), Ok(ReminderState::Pending));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - `Display` writes the mapped string.
/// - `FromStr` parses case-insensitively (after trimming) and reports the
///   enum name on failure.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Stable string form used in storage and logs.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
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
    enum Visibility {
        Public,
        Private,
        Busy,
    }

    impl_domain_status_conversions!(Visibility {
        Public => "public",
        Private => "private",
        Busy => "busy",
    });

    #[test]
    fn display_uses_mapped_string() {
        assert_eq!(Visibility::Public.to_string(), "public");
        assert_eq!(Visibility::Busy.as_str(), "busy");
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(Visibility::from_str("PRIVATE").unwrap(), Visibility::Private);
        assert_eq!(Visibility::from_str("  Busy ").unwrap(), Visibility::Busy);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = Visibility::from_str("tentative").unwrap_err();
        assert!(err.contains("Invalid Visibility: tentative"));
        assert!(Visibility::from_str("").is_err());
    }

    mod with_result_alias {
        #[allow(unused_imports)]
        use crate::errors::Result;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Rsvp {
            Accepted,
            Declined,
        }

        impl_domain_status_conversions!(Rsvp {
            Accepted => "accepted",
            Declined => "declined",
        });

        #[test]
        fn expands_where_a_single_parameter_result_is_in_scope() {
            assert_eq!("declined".parse::<Rsvp>(), Ok(Rsvp::Declined));
            assert_eq!(Rsvp::Accepted.to_string(), "accepted");
        }
    }
}
