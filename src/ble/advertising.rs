//! Device identity used while advertising

use crate::config::ble::{ADDRESS_SUFFIX, DEVICE_NAME_PREFIX};

/// Length of the name buffer: prefix plus six hex digits
pub const DEVICE_NAME_LEN: usize = DEVICE_NAME_PREFIX.len() + 6;

/// Format device ID bytes as uppercase hex into a buffer
/// Returns the formatted string slice
pub fn format_device_name<'a>(buf: &'a mut [u8; DEVICE_NAME_LEN], device_id: &[u8; 3]) -> &'a str {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
    let prefix = DEVICE_NAME_PREFIX.as_bytes();

    buf[..prefix.len()].copy_from_slice(prefix);

    let mut pos = prefix.len();
    for &byte in device_id {
        buf[pos] = HEX_CHARS[(byte >> 4) as usize];
        buf[pos + 1] = HEX_CHARS[(byte & 0x0F) as usize];
        pos += 2;
    }

    // All bytes are ASCII, so this will always succeed
    core::str::from_utf8(&buf[..pos]).unwrap_or(DEVICE_NAME_PREFIX)
}

/// Random static address bytes for this device
pub fn device_address(device_id: &[u8; 3]) -> [u8; 6] {
    [
        device_id[0],
        device_id[1],
        device_id[2],
        ADDRESS_SUFFIX[0],
        ADDRESS_SUFFIX[1],
        ADDRESS_SUFFIX[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_name() {
        let mut buf = [0u8; DEVICE_NAME_LEN];
        let name = format_device_name(&mut buf, &[0x0A, 0xBC, 0x01]);
        assert_eq!(name, "SerialBridge-0ABC01");
    }

    #[test]
    fn test_device_address() {
        assert_eq!(
            device_address(&[1, 2, 3]),
            [1, 2, 3, 0x1E, 0x83, 0xE7]
        );
    }
}
