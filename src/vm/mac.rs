use std::{fmt, str::FromStr};

use anyhow::{Result, bail};

/// Hardware address of a vm's network device.
///
/// Persisted as twelve lowercase hex digits, displayed colon separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Random locally administered unicast address.
    pub fn generate() -> Self {
        let mut bytes: [u8; 6] = rand::random();
        // clear the multicast bit, set the locally administered bit
        bytes[0] = (bytes[0] & 0xfe) | 0x02;
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_unicast(&self) -> bool {
        self.0[0] & 0x01 == 0
    }

    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 == 0x02
    }

    pub fn to_plain_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let octets = self
            .0
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>();
        write!(f, "{}", octets.join(":"))
    }
}

impl FromStr for MacAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let plain = s.trim().replace([':', '-'], "");
        if plain.len() != 12 {
            bail!("invalid mac address: {}", s.trim());
        }

        let decoded = hex::decode(&plain)?;
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&decoded);

        Ok(Self(bytes))
    }
}
