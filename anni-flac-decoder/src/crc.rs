//! CRC-8 and CRC-16 as used by frame headers and frame footers.

/// x^8 + x^2 + x^1 + x^0
const CRC8_POLY: u8 = 0x07;
/// x^16 + x^15 + x^2 + x^0
const CRC16_POLY: u16 = 0x8005;

const CRC8_TABLE: [u8; 256] = crc8_table();
const CRC16_TABLE: [u16; 256] = crc16_table();

const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

#[inline]
pub fn crc8_update(crc: u8, byte: u8) -> u8 {
    CRC8_TABLE[(crc ^ byte) as usize]
}

#[inline]
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    (crc << 8) ^ CRC16_TABLE[((crc >> 8) as u8 ^ byte) as usize]
}

/// CRC-8 of `data`, initialized with 0.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0, |crc, &b| crc8_update(crc, b))
}

/// CRC-16 of `data`, initialized with 0.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &b| crc16_update(crc, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_values() {
        // CRC-8/SMBUS and CRC-16/UMTS share polynomial and init with the frame checksums.
        assert_eq!(crc8(b"123456789"), 0xf4);
        assert_eq!(crc16(b"123456789"), 0xfee8);
    }

    #[test]
    fn zeros() {
        assert_eq!(crc8(&[0; 4]), 0);
        assert_eq!(crc16(&[0; 4]), 0);
    }

    #[test]
    fn incremental_matches_whole() {
        let data = [0xff, 0xf8, 0x69, 0x18, 0x00, 0x00];
        let mut crc = 0;
        for &b in data.iter() {
            crc = crc8_update(crc, b);
        }
        assert_eq!(crc, crc8(&data));
    }
}
