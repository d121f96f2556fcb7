//! Word-oriented stream cipher used by profile saves.
//!
//! The keystream depends on the plaintext, so a `CipherState` has to be
//! carried through every block of one file in order. Trailing bytes that do
//! not form a whole word are left as they are.

pub const SEED_KEY1: u32 = 0x2310_1976;
pub const SEED_KEY2: u32 = 0x1007_2002;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherState {
    pub key1: u32,
    pub key2: u32,
}

impl Default for CipherState {
    fn default() -> Self {
        Self::seeded()
    }
}

impl CipherState {
    pub fn seeded() -> Self {
        Self {
            key1: SEED_KEY1,
            key2: SEED_KEY2,
        }
    }

    pub fn decrypt_word(&mut self, cipher: u32) -> u32 {
        let plain = self.key1 ^ cipher;
        self.key2 = self.key2.wrapping_add(plain);
        self.key1 = self.key1.wrapping_add(self.key2);
        plain
    }

    pub fn encrypt_word(&mut self, plain: u32) -> u32 {
        self.key2 = self.key2.wrapping_add(plain);
        let cipher = plain ^ self.key1;
        self.key1 = self.key1.wrapping_add(self.key2);
        cipher
    }
}

pub fn decrypt_in_place(bytes: &mut [u8], state: &mut CipherState) {
    for chunk in bytes.chunks_exact_mut(4) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&state.decrypt_word(word).to_le_bytes());
    }
}

pub fn encrypt_in_place(bytes: &mut [u8], state: &mut CipherState) {
    for chunk in bytes.chunks_exact_mut(4) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&state.encrypt_word(word).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{CipherState, decrypt_in_place, encrypt_in_place};

    #[test]
    fn first_word_of_zero_block_is_the_seed_key() {
        let mut bytes = [0u8; 8];
        let mut state = CipherState::seeded();
        encrypt_in_place(&mut bytes, &mut state);
        assert_eq!(&bytes[..4], &0x2310_1976u32.to_le_bytes());
        // key2 unchanged by a zero word, key1 advanced by key2
        let key1 = 0x2310_1976u32.wrapping_add(0x1007_2002);
        assert_eq!(&bytes[4..], &key1.to_le_bytes());
    }

    #[test]
    fn trailing_partial_word_is_untouched() {
        let mut bytes = vec![0u8, 0, 0, 0, 0xAA, 0xBB, 0xCC];
        let mut state = CipherState::seeded();
        encrypt_in_place(&mut bytes, &mut state);
        assert_eq!(&bytes[4..], &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn state_continues_across_calls() {
        let plain: Vec<u8> = (0u8..32).collect();

        let mut whole = plain.clone();
        encrypt_in_place(&mut whole, &mut CipherState::seeded());

        let mut split = plain.clone();
        let mut state = CipherState::seeded();
        let (a, b) = split.split_at_mut(12);
        encrypt_in_place(a, &mut state);
        encrypt_in_place(b, &mut state);

        assert_eq!(whole, split);
    }

    proptest! {
        #[test]
        fn decrypt_inverts_encrypt(words in proptest::collection::vec(any::<u32>(), 0..256)) {
            let plain: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
            let mut buf = plain.clone();
            encrypt_in_place(&mut buf, &mut CipherState::seeded());
            decrypt_in_place(&mut buf, &mut CipherState::seeded());
            prop_assert_eq!(buf, plain);
        }
    }
}
