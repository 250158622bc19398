use rds_common::{AssetId, AssetKey};

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Read an asset argument: an id (`0x`-hex, decimal or GUID) or an asset name.
pub fn parse_asset_key(value: &str) -> Result<AssetKey, std::convert::Infallible> {
    Ok(match value.parse::<AssetId>() {
        Ok(id) => AssetKey::Id(id),
        Err(_) => AssetKey::Name(value.to_string()),
    })
}
