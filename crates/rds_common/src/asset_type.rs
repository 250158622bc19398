use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// Four character tag identifying a resource format (`MLVL`, `TXTR`, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetType([u8; 4]);

impl AssetType {
    pub const AGSC: AssetType = AssetType(*b"AGSC");
    pub const ANCS: AssetType = AssetType(*b"ANCS");
    pub const ATBL: AssetType = AssetType(*b"ATBL");
    pub const CMDL: AssetType = AssetType(*b"CMDL");
    pub const CRSC: AssetType = AssetType(*b"CRSC");
    pub const DGRP: AssetType = AssetType(*b"DGRP");
    pub const DPSC: AssetType = AssetType(*b"DPSC");
    pub const ELSC: AssetType = AssetType(*b"ELSC");
    pub const MLVL: AssetType = AssetType(*b"MLVL");
    pub const MREA: AssetType = AssetType(*b"MREA");
    pub const PART: AssetType = AssetType(*b"PART");
    pub const SPSC: AssetType = AssetType(*b"SPSC");
    pub const STRG: AssetType = AssetType(*b"STRG");
    pub const SWHC: AssetType = AssetType(*b"SWHC");
    pub const TXTR: AssetType = AssetType(*b"TXTR");
    pub const WPSC: AssetType = AssetType(*b"WPSC");

    pub const fn new(tag: [u8; 4]) -> Self {
        AssetType(tag)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn to_u32_be(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn from_u32_be(value: u32) -> Self {
        AssetType(value.to_be_bytes())
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetType({})", self)
    }
}

impl FromStr for AssetType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ParseError::InvalidAssetType(s.to_string()))?;
        if !bytes.iter().all(|b| b.is_ascii_graphic()) {
            return Err(ParseError::InvalidAssetType(s.to_string()));
        }
        Ok(AssetType(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let ty: AssetType = "MLVL".parse().unwrap();
        assert_eq!(ty, AssetType::MLVL);
        assert_eq!(ty.to_string(), "MLVL");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("MLV".parse::<AssetType>().is_err());
        assert!("MLVLX".parse::<AssetType>().is_err());
        assert!("ML V".parse::<AssetType>().is_err());
    }

    #[test]
    fn test_u32_round_trip() {
        let value = AssetType::TXTR.to_u32_be();
        assert_eq!(value, u32::from_be_bytes(*b"TXTR"));
        assert_eq!(AssetType::from_u32_be(value), AssetType::TXTR);
    }
}
