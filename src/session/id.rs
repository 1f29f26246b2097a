//! Remote identifier types.

use std::fmt;
use std::str::FromStr;

use crate::error::WinrmError;

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier assigned by the remote side.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as sent on the wire.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty (never assigned or cleared).
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = WinrmError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    Err(WinrmError::Parse(concat!("empty ", $what).into()))
                } else {
                    Ok(Self(s.to_string()))
                }
            }
        }
    };
}

remote_id!(
    /// Identifier of a remote shell, assigned by the server on open.
    ShellId,
    "shell id"
);

remote_id!(
    /// Identifier of a command inside a shell, assigned by the server on execute.
    CommandId,
    "command id"
);
