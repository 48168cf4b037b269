/// Helper macro that gives a fieldless enum a string form.
///
/// Generates `as_str`, [`Display`](std::fmt::Display) and [`FromStr`](std::str::FromStr)
/// from a `Variant => "text"` list. The texts must match the enum's `serde` names, since the
/// same strings are stored in the database. Parsing ignores surrounding whitespace and ASCII case.
#[macro_export]
macro_rules! enum_display_str {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::UnknownVariant;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::UnknownVariant(s.to_string()))
            }
        }
    };
}
