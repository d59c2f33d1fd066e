use commons_core::*;
use rand::Rng;
use serde::Serialize;

/// Short human-typable session code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Draws a code from the unambiguous alphabet.
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng,
    {
        Self(
            (0..CODE_LENGTH)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect(),
        )
    }
    /// Draws codes until one is not `taken`.
    pub fn unique<R, F>(rng: &mut R, taken: F) -> Self
    where
        R: Rng,
        F: Fn(&Self) -> bool,
    {
        loop {
            let code = Self::random(rng);
            if !taken(&code) {
                return code;
            }
        }
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Codes typed by people arrive with stray whitespace and lowercase letters.
impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Self(s.trim().to_uppercase())
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
