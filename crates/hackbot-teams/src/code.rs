//! Join code generation.

use hackbot_core::config::TeamConfig;
use rand::Rng;

/// Draws random join codes from a fixed alphabet.
///
/// Uniqueness is not checked here: the registry rejects a drawn code that
/// is already taken and draws again.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    min_len: usize,
    max_len: usize,
}

impl CodeGenerator {
    /// An empty alphabet falls back to the default one.
    pub fn new(alphabet: &str, min_len: usize, max_len: usize) -> Self {
        let mut chars: Vec<char> = alphabet.chars().collect();
        if chars.is_empty() {
            chars = TeamConfig::default().code_alphabet.chars().collect();
        }
        Self {
            alphabet: chars,
            min_len: min_len.max(1),
            max_len: max_len.max(min_len.max(1)),
        }
    }

    pub fn from_config(config: &TeamConfig) -> Self {
        Self::new(&config.code_alphabet, config.code_min_len, config.code_max_len)
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let len = rng.gen_range(self.min_len..=self.max_len);
        (0..len)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect()
    }

    /// Canonical form of a code typed by a participant.
    pub fn normalize(input: &str) -> String {
        input.trim().to_uppercase()
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::from_config(&TeamConfig::default())
    }
}
