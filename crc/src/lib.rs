//! CRC-16/X-25 as used by the session unit's frame trailer.
//!
//! Reflected polynomial 0x1021 (0x8408 bit-reversed), initial value 0xFFFF,
//! final XOR 0xFFFF. The result is transmitted low byte first.

const POLY: u16 = 0x8408;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub fn crc16(data: &[u8]) -> u16 {
    let crc = data.iter().fold(0xffffu16, |crc, &b| {
        (crc >> 8) ^ TABLE[((crc ^ b as u16) & 0xff) as usize]
    });
    crc ^ 0xffff
}
