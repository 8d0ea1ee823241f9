//! IdentityAssigner: process-unique keys for generated examples
//!
//! Identities are 36 characters drawn independently from `[A-Za-z0-9]`.
//! Every issued identity is remembered so none is handed out twice.

use std::collections::HashSet;

use super::entropy::{Entropy, SystemEntropy};

pub type Identity = String;

pub const IDENTITY_LEN: usize = 36;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte; bytes at or above it are redrawn
const REJECT_FROM: u8 = 248;

pub struct IdentityAssigner {
    entropy: Box<dyn Entropy>,
    issued: HashSet<Identity>,
}

impl Default for IdentityAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityAssigner {
    pub fn new() -> Self {
        Self::with_entropy(Box::new(SystemEntropy::new()))
    }

    pub fn with_entropy(entropy: Box<dyn Entropy>) -> Self {
        Self {
            entropy,
            issued: HashSet::new(),
        }
    }

    /// Issue a fresh identity
    pub fn assign(&mut self) -> Identity {
        loop {
            let candidate = self.draw();
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
            crate::console_warn!("[IdentityAssigner] collision on {}, redrawing", candidate);
        }
    }

    pub fn entropy_degraded(&self) -> bool {
        self.entropy.is_degraded()
    }

    /// Number of identities issued so far
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    fn draw(&mut self) -> Identity {
        let mut id = String::with_capacity(IDENTITY_LEN);
        while id.len() < IDENTITY_LEN {
            let mut word = self.entropy.next_u64();
            for _ in 0..8 {
                let byte = (word & 0xff) as u8;
                word >>= 8;
                if byte < REJECT_FROM {
                    id.push(ALPHABET[(byte % 62) as usize] as char);
                    if id.len() == IDENTITY_LEN {
                        break;
                    }
                }
            }
        }
        id
    }
}
