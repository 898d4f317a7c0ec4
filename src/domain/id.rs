//! Integer row identifiers

/// Declares a copyable integer identifier for one table
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Parse a path segment, reporting a miss as not found
            pub fn parse(raw: &str) -> Result<Self, $crate::domain::DomainError> {
                raw.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| {
                        $crate::domain::DomainError::not_found(format!(
                            "{} '{}' not found",
                            $label, raw
                        ))
                    })
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use row_id;
