const KEY_SALT: &[u8; 49] = b"!kAiNsYuu4NkAn3594NnAnbo9tyouzUi105DaisOugEnmIn4N";

const EXPANSION_TABLE: [u16; 32] = [
    0xb7e1, 0x5618, 0xf44f, 0x9286, 0x30bd, 0xcef4, 0x6d2b, 0x0b62, //
    0xa999, 0x47d0, 0xe607, 0x843e, 0x2275, 0xc0ac, 0x5ee3, 0xfd1a, //
    0x9b51, 0x3988, 0xd7bf, 0x75f6, 0x142d, 0xb264, 0x509b, 0xeed2, //
    0x8d09, 0x2b40, 0xc977, 0x67ae, 0x05e5, 0xa41c, 0x4253, 0xe08a,
];

/// Derives the per-file key from the raw file name bytes. Directories and everything from the
/// first `.` on are ignored, ASCII case is folded.
pub fn generate_file_key(filename: &[u8]) -> [u16; 8] {
    let name = filename
        .rsplit(|&b| b == b'/' || b == b'\\')
        .next()
        .unwrap_or(filename);
    let stem = name.split(|&b| b == b'.').next().unwrap_or(name);

    let mut salted = *KEY_SALT;
    for (i, &c) in stem.iter().enumerate() {
        if let Some(slot) = salted.get_mut(stem.len() + i) {
            *slot = c.to_ascii_lowercase();
        }
    }

    let digest = md5::compute(salted);
    let mut key = [0u16; 8];
    for (word, bytes) in key.iter_mut().zip(digest.0.chunks_exact(2)) {
        *word = u16::from_be_bytes([bytes[0], bytes[1]]);
    }
    key
}

#[derive(Clone)]
pub struct AudioDecrypter {
    expanded_key: [u16; 32],
    counter: u8,
}

impl AudioDecrypter {
    pub fn new(filename: &[u8]) -> Self {
        Self::with_key(generate_file_key(filename))
    }

    pub fn with_key(mut key: [u16; 8]) -> Self {
        let mut expanded_key = EXPANSION_TABLE;
        let mut t0: u16 = 0;
        let mut t1: u16 = 0;
        let mut sum: u8 = 0;

        for (x, slot) in expanded_key.iter_mut().enumerate() {
            let mut a2 = *slot;
            let mut a0 = key[x % key.len()];

            for _ in 0..3 {
                a2 = a2.wrapping_add(t1).wrapping_add(t0).rotate_right(3);
                t1 = a2;

                a0 = a0.wrapping_add(t1).wrapping_add(t0);
                a0 = a0.rotate_left((a0 & 0x0f) as u32);
                t0 = a0;
            }

            *slot = t1;
            key[x % key.len()] = t0;
            sum = sum.wrapping_add(t1 as u8);
        }

        let high = ((sum as u64 * 0x5ac0_56b1) >> 32) as u8;
        let quotient = high.wrapping_add(sum.wrapping_sub(high) >> 1) >> 7;
        let counter = sum
            .wrapping_sub(quotient.wrapping_mul(0xbd))
            .wrapping_add(0x43);

        Self {
            expanded_key,
            counter,
        }
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    fn slot(&self, offset: u8) -> usize {
        self.counter.wrapping_add(offset) as usize % self.expanded_key.len()
    }

    pub fn decrypt_word(&mut self, word: u16) -> u16 {
        let (s0, s1, s2, s3) = (self.slot(0), self.slot(1), self.slot(2), self.slot(3));
        let t0 = self.expanded_key[s3];
        let t1 = self.expanded_key[s2];
        let shift = ((t1.wrapping_add(t0) & 7) + 4) as u32;

        let plain = (word.wrapping_sub(t0).rotate_right(shift) ^ t1)
            .wrapping_sub(self.expanded_key[s0] ^ self.expanded_key[s1]);

        self.expanded_key[s0] = self.expanded_key[s0].wrapping_add(self.expanded_key[s1]);
        self.counter = self.counter.wrapping_add(1);
        plain
    }

    /// Decrypts big-endian 16-bit words. A trailing odd byte is dropped.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = Vec::with_capacity(data.len() & !1);
        for chunk in data.chunks_exact(2) {
            let word = self.decrypt_word(u16::from_be_bytes([chunk[0], chunk[1]]));
            output.extend_from_slice(&word.to_be_bytes());
        }
        output
    }
}

pub fn decrypt_audio(filename: &[u8], data: &[u8]) -> Vec<u8> {
    AudioDecrypter::new(filename).decrypt(data)
}
