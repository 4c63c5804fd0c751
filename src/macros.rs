//! Macros to reduce boilerplate in the codebase

/// Macro to generate wire-name, Display and FromStr implementations for
/// filter value enums.
///
/// Parsing is ASCII case-insensitive. A failed parse reports the filter
/// field name so the caller can tell which option was wrong.
///
/// # Usage
///
/// ```rust,ignore
/// filter_enum!(
///     ContactSource,
///     "source",
///     {
///         Website => "website",
///         Social => "social",
///     }
/// );
/// ```
#[macro_export]
macro_rules! filter_enum {
    (
        $enum_name:ident,
        $field:expr,
        { $($variant:ident => $str:expr),+ $(,)? }
    ) => {
        impl $enum_name {
            /// Every value in declaration order.
            pub const ALL: &'static [$enum_name] = &[$($enum_name::$variant),+];

            /// The value as sent on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($enum_name::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::MailboardError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok($enum_name::$variant);
                    }
                )+
                Err($crate::error::MailboardError::InvalidFilterValue {
                    field: $field.to_string(),
                    value: s.to_string(),
                })
            }
        }
    };
}

#[cfg(test)]
mod test {
    // Callers import the crate's one-parameter alias; expansion must not
    // pick it up.
    use crate::error::Result;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Channel {
        Web,
        TikTok,
    }

    filter_enum!(Channel, "channel", {
        Web => "web",
        TikTok => "TikTok",
    });

    #[test]
    fn test_display_uses_wire_name() {
        assert_eq!(Channel::Web.to_string(), "web");
        assert_eq!(Channel::TikTok.to_string(), "TikTok");
    }

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!("tiktok".parse::<Channel>().unwrap(), Channel::TikTok);
        assert_eq!("WEB".parse::<Channel>().unwrap(), Channel::Web);
    }

    #[test]
    fn test_parse_error_names_field() {
        let err = "fax".parse::<Channel>().unwrap_err();
        assert_eq!(err.to_string(), "invalid value 'fax' for filter 'channel'");
    }

    #[test]
    fn test_all_lists_every_variant() {
        assert_eq!(Channel::ALL, &[Channel::Web, Channel::TikTok]);
    }

    #[test]
    fn test_from_str_beside_crate_result_alias() {
        let parsed: Result<Channel> = "web".parse();
        assert_eq!(parsed.unwrap(), Channel::Web);
    }
}
