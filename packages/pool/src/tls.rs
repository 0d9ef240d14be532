//! TLS configuration vocabulary.
//!
//! Protocol-version parsing and weak cipher-suite filtering for callers
//! assembling socket configuration. No negotiation happens here; the secure
//! transport itself belongs to the wrapped stack.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use strum::{AsRefStr, EnumString};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid TLS protocol version: {0}")]
    Protocol(String),
    #[error("Invalid TLS major version: {0}")]
    Major(String),
    #[error("Invalid TLS minor version: {0}")]
    Minor(String),
}

/// A parsed `TLS` protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    #[must_use]
    pub const fn greater_equals(self, other: Self) -> bool {
        self.major > other.major || (self.major == other.major && self.minor >= other.minor)
    }

    #[must_use]
    pub const fn less_equals(self, other: Self) -> bool {
        other.greater_equals(self)
    }

    /// Parses a `TLSv<major>[.<minor>]` identifier.
    ///
    /// # Errors
    ///
    /// * `ParseError::Protocol` - if the `TLSv` prefix is missing
    /// * `ParseError::Major` / `ParseError::Minor` - if the version numbers
    ///   are not valid integers
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let value = value.trim();
        let rest = value
            .strip_prefix("TLSv")
            .ok_or_else(|| ParseError::Protocol(value.to_string()))?;
        if rest.is_empty() {
            return Err(ParseError::Protocol(value.to_string()));
        }
        match rest.split_once('.') {
            None => {
                let major = rest
                    .parse()
                    .map_err(|_| ParseError::Major(rest.to_string()))?;
                Ok(Self::new(major, 0))
            }
            Some((major, minor)) => Ok(Self::new(
                major
                    .parse()
                    .map_err(|_| ParseError::Major(major.to_string()))?,
                minor
                    .parse()
                    .map_err(|_| ParseError::Minor(minor.to_string()))?,
            )),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.minor == 0 && self.major == 1 {
            f.write_str("TLSv1")
        } else {
            write!(f, "TLSv{}.{}", self.major, self.minor)
        }
    }
}

/// Supported `TLS` protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, AsRefStr)]
pub enum TlsVersion {
    #[strum(serialize = "TLSv1")]
    V1_0,
    #[strum(serialize = "TLSv1.1")]
    V1_1,
    #[strum(serialize = "TLSv1.2")]
    V1_2,
    #[strum(serialize = "TLSv1.3")]
    V1_3,
}

impl TlsVersion {
    #[must_use]
    pub const fn ident(self) -> &'static str {
        match self {
            Self::V1_0 => "TLSv1",
            Self::V1_1 => "TLSv1.1",
            Self::V1_2 => "TLSv1.2",
            Self::V1_3 => "TLSv1.3",
        }
    }

    #[must_use]
    pub const fn version(self) -> ProtocolVersion {
        match self {
            Self::V1_0 => ProtocolVersion::new(1, 0),
            Self::V1_1 => ProtocolVersion::new(1, 1),
            Self::V1_2 => ProtocolVersion::new(1, 2),
            Self::V1_3 => ProtocolVersion::new(1, 3),
        }
    }

    #[must_use]
    pub const fn is_same(self, version: ProtocolVersion) -> bool {
        let own = self.version();
        own.major == version.major && own.minor == version.minor
    }

    /// Parses a version identifier the way [`ProtocolVersion::parse`] does,
    /// accepting versions with no [`TlsVersion`] counterpart.
    ///
    /// # Errors
    ///
    /// * If `value` is not a valid `TLSv<major>[.<minor>]` identifier
    pub fn parse(value: &str) -> Result<ProtocolVersion, ParseError> {
        ProtocolVersion::parse(value)
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ident())
    }
}

/// Drops `SSL*`, `TLSv1` and `TLSv1.1` from an enabled-protocol list,
/// falling back to `TLSv1.2` when nothing acceptable remains.
#[must_use]
pub fn exclude_weak_protocols<'a>(protocols: &[&'a str]) -> Vec<&'a str> {
    let enabled: Vec<&str> = protocols
        .iter()
        .copied()
        .filter(|protocol| {
            !protocol.starts_with("SSL")
                && *protocol != TlsVersion::V1_0.ident()
                && *protocol != TlsVersion::V1_1.ident()
        })
        .collect();
    if enabled.is_empty() {
        vec![TlsVersion::V1_2.ident()]
    } else {
        enabled
    }
}

static WEAK_CIPHER_SUITE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(
            "(?i)^(TLS|SSL)_(NULL|ECDH_anon|DH_anon|DH_anon_EXPORT|DHE_RSA_EXPORT|DHE_DSS_EXPORT|\
             DSS_EXPORT|DH_DSS_EXPORT|DH_RSA_EXPORT|RSA_EXPORT|KRB5_EXPORT)_(.*)$",
        )
        .expect("weak key-exchange pattern"),
        Regex::new(
            "(?i)^(TLS|SSL)_(.*)_WITH_(NULL|DES_CBC|DES40_CBC|DES_CBC_40|3DES_EDE_CBC|RC4_128|\
             RC4_40|RC2_CBC_40)_(.*)$",
        )
        .expect("weak cipher pattern"),
    ]
});

#[must_use]
pub fn is_weak_cipher(cipher_suite: &str) -> bool {
    WEAK_CIPHER_SUITE_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(cipher_suite))
}

/// Drops weak suites from an enabled-cipher list. An all-weak input is
/// returned unchanged rather than left empty.
#[must_use]
pub fn exclude_weak_ciphers<'a>(ciphers: &[&'a str]) -> Vec<&'a str> {
    let enabled: Vec<&str> = ciphers
        .iter()
        .copied()
        .filter(|cipher| !is_weak_cipher(cipher))
        .collect();
    if enabled.is_empty() {
        ciphers.to_vec()
    } else {
        enabled
    }
}
