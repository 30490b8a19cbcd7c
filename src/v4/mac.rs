use std::fmt;

/// An Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const LEN: usize = 6;

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Builds an address from a slice that must be exactly six bytes long.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Parses the colon-separated hex form used by sysfs (`0a:1b:2c:3d:4e:5f`).
    ///
    /// Returns the raw octets so callers can tell a malformed string apart
    /// from a well-formed address of the wrong length.
    pub fn parse_octets(text: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
        text.trim()
            .split(':')
            .filter(|part| !part.is_empty())
            .map(|part| u8::from_str_radix(part, 16))
            .collect()
    }

    /// An address that could belong to a real NIC: not all-zero, not broadcast.
    pub fn is_plausible(&self) -> bool {
        self.0 != [0; 6] && self.0 != [0xff; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl std::str::FromStr for MacAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets = Self::parse_octets(s).map_err(|e| format!("{s}: {e}"))?;
        Self::from_slice(&octets)
            .ok_or_else(|| format!("{s}: expected 6 octets, found {}", octets.len()))
    }
}
