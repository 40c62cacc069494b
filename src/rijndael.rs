//! Rijndael with a 256-bit block and a 256-bit key
//!
//! AES standardised Rijndael with a fixed 128-bit block; the envelope format
//! uses the original 256-bit block variant (Nb = 8, Nk = 8, 14 rounds), which
//! no published RustCrypto crate provides. This module implements that block
//! primitive behind the `cipher` traits so the `cbc` crate can run the
//! chaining mode and PKCS#7 padding on top of it.
//!
//! The implementation is a straightforward byte-oriented one using S-box
//! lookups. It is not hardened against cache-timing side channels.

use cipher::consts::{U1, U32};
use cipher::inout::InOut;
use cipher::{
    AlgorithmName, Block, BlockBackend, BlockCipher, BlockClosure, BlockDecrypt, BlockEncrypt,
    BlockSizeUser, Key, KeyInit, KeySizeUser, ParBlocksSizeUser,
};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::params::{BLOCK_LEN, KEY_LEN};

/// Number of 32-bit columns in the state.
const NB: usize = BLOCK_LEN / 4;

/// Number of 32-bit words in the key.
const NK: usize = KEY_LEN / 4;

/// max(Nb, Nk) + 6
const ROUNDS: usize = 14;

/// Left rotation applied to state rows 0..4 by ShiftRows when Nb = 8.
const ROW_SHIFTS: [usize; 4] = [0, 1, 3, 4];

type State = [u8; BLOCK_LEN];

#[rustfmt::skip]
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

#[rustfmt::skip]
const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

/// Rijndael-256/256 block cipher holding an expanded key schedule.
///
/// The round keys are wiped when the value is dropped.
#[derive(Clone)]
pub struct Rijndael256 {
    round_keys: [State; ROUNDS + 1],
}

impl Rijndael256 {
    fn encrypt_state(&self, state: &mut State) {
        add_round_key(state, &self.round_keys[0]);
        for round in 1..ROUNDS {
            sub_bytes(state, &SBOX);
            shift_rows(state);
            mix_columns(state);
            add_round_key(state, &self.round_keys[round]);
        }
        sub_bytes(state, &SBOX);
        shift_rows(state);
        add_round_key(state, &self.round_keys[ROUNDS]);
    }

    fn decrypt_state(&self, state: &mut State) {
        add_round_key(state, &self.round_keys[ROUNDS]);
        inv_shift_rows(state);
        sub_bytes(state, &INV_SBOX);
        for round in (1..ROUNDS).rev() {
            add_round_key(state, &self.round_keys[round]);
            inv_mix_columns(state);
            inv_shift_rows(state);
            sub_bytes(state, &INV_SBOX);
        }
        add_round_key(state, &self.round_keys[0]);
    }
}

impl KeySizeUser for Rijndael256 {
    type KeySize = U32;
}

impl BlockSizeUser for Rijndael256 {
    type BlockSize = U32;
}

impl BlockCipher for Rijndael256 {}

impl KeyInit for Rijndael256 {
    fn new(key: &Key<Self>) -> Self {
        let mut words = [[0u8; 4]; NB * (ROUNDS + 1)];
        for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
            word.copy_from_slice(chunk);
        }

        let mut rcon = 1u8;
        for i in NK..words.len() {
            let mut temp = words[i - 1];
            if i % NK == 0 {
                temp.rotate_left(1);
                sub_word(&mut temp);
                temp[0] ^= rcon;
                rcon = xtime(rcon);
            } else if i % NK == 4 {
                sub_word(&mut temp);
            }
            for j in 0..4 {
                words[i][j] = words[i - NK][j] ^ temp[j];
            }
        }

        let mut round_keys = [[0u8; BLOCK_LEN]; ROUNDS + 1];
        for (round, round_key) in round_keys.iter_mut().enumerate() {
            for col in 0..NB {
                round_key[4 * col..4 * col + 4].copy_from_slice(&words[round * NB + col]);
            }
        }
        words.zeroize();

        Self { round_keys }
    }
}

impl BlockEncrypt for Rijndael256 {
    fn encrypt_with_backend(&self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        f.call(&mut EncryptBackend(self))
    }
}

impl BlockDecrypt for Rijndael256 {
    fn decrypt_with_backend(&self, f: impl BlockClosure<BlockSize = Self::BlockSize>) {
        f.call(&mut DecryptBackend(self))
    }
}

impl AlgorithmName for Rijndael256 {
    fn write_alg_name(f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rijndael256")
    }
}

impl fmt::Debug for Rijndael256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rijndael256 { .. }")
    }
}

impl Drop for Rijndael256 {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}

impl ZeroizeOnDrop for Rijndael256 {}

struct EncryptBackend<'a>(&'a Rijndael256);

impl BlockSizeUser for EncryptBackend<'_> {
    type BlockSize = U32;
}

impl ParBlocksSizeUser for EncryptBackend<'_> {
    type ParBlocksSize = U1;
}

impl BlockBackend for EncryptBackend<'_> {
    fn proc_block(&mut self, mut block: InOut<'_, '_, Block<Self>>) {
        let mut state = load(block.get_in());
        self.0.encrypt_state(&mut state);
        block.get_out().copy_from_slice(&state);
        state.zeroize();
    }
}

struct DecryptBackend<'a>(&'a Rijndael256);

impl BlockSizeUser for DecryptBackend<'_> {
    type BlockSize = U32;
}

impl ParBlocksSizeUser for DecryptBackend<'_> {
    type ParBlocksSize = U1;
}

impl BlockBackend for DecryptBackend<'_> {
    fn proc_block(&mut self, mut block: InOut<'_, '_, Block<Self>>) {
        let mut state = load(block.get_in());
        self.0.decrypt_state(&mut state);
        block.get_out().copy_from_slice(&state);
        state.zeroize();
    }
}

fn load(block: &[u8]) -> State {
    let mut state = [0u8; BLOCK_LEN];
    state.copy_from_slice(block);
    state
}

fn xtime(b: u8) -> u8 {
    (b << 1) ^ if b & 0x80 != 0 { 0x1b } else { 0x00 }
}

/// Multiplication in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

fn sub_word(word: &mut [u8; 4]) {
    for b in word.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

fn add_round_key(state: &mut State, round_key: &State) {
    for (b, k) in state.iter_mut().zip(round_key) {
        *b ^= k;
    }
}

fn sub_bytes(state: &mut State, table: &[u8; 256]) {
    for b in state.iter_mut() {
        *b = table[*b as usize];
    }
}

// The state is column-major: byte (row, col) lives at index row + 4 * col.
fn shift_rows(state: &mut State) {
    let old = *state;
    for row in 1..4 {
        for col in 0..NB {
            state[row + 4 * col] = old[row + 4 * ((col + ROW_SHIFTS[row]) % NB)];
        }
    }
}

fn inv_shift_rows(state: &mut State) {
    let old = *state;
    for row in 1..4 {
        for col in 0..NB {
            state[row + 4 * ((col + ROW_SHIFTS[row]) % NB)] = old[row + 4 * col];
        }
    }
}

fn mix_columns(state: &mut State) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        column[0] = gmul(a0, 2) ^ gmul(a1, 3) ^ a2 ^ a3;
        column[1] = a0 ^ gmul(a1, 2) ^ gmul(a2, 3) ^ a3;
        column[2] = a0 ^ a1 ^ gmul(a2, 2) ^ gmul(a3, 3);
        column[3] = gmul(a0, 3) ^ a1 ^ a2 ^ gmul(a3, 2);
    }
}

fn inv_mix_columns(state: &mut State) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        column[0] = gmul(a0, 14) ^ gmul(a1, 11) ^ gmul(a2, 13) ^ gmul(a3, 9);
        column[1] = gmul(a0, 9) ^ gmul(a1, 14) ^ gmul(a2, 11) ^ gmul(a3, 13);
        column[2] = gmul(a0, 13) ^ gmul(a1, 9) ^ gmul(a2, 14) ^ gmul(a3, 11);
        column[3] = gmul(a0, 11) ^ gmul(a1, 13) ^ gmul(a2, 9) ^ gmul(a3, 14);
    }
}
