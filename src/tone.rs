//! Reply tones and their system instructions
//!
//! The tone set is closed. Each tone selects a register for the system
//! instruction; all four share the same structural guidelines.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ReplyError;

/// Guidelines appended to every tone's instruction
const STRUCTURE_GUIDELINES: &str = "Guidelines:\n\
- Keep the reply concise and to the point\n\
- Start with an appropriate greeting and end with an appropriate closing\n\
- Address the main points raised in the original email\n\
- Do not include a subject line";

/// Tone of the generated reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Friendly,
    Formal,
    Casual,
}

impl Tone {
    /// Every tone, in display order
    pub const ALL: [Tone; 4] = [Tone::Professional, Tone::Friendly, Tone::Formal, Tone::Casual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Formal => "formal",
            Tone::Casual => "casual",
        }
    }

    /// Register-specific opening of the system instruction
    fn register(&self) -> &'static str {
        match self {
            Tone::Professional => {
                "You are an assistant that writes professional email replies. \
                 Use clear, courteous business language and a confident, helpful tone."
            }
            Tone::Friendly => {
                "You are an assistant that writes friendly email replies. \
                 Use warm, approachable language while staying polite and helpful."
            }
            Tone::Formal => {
                "You are an assistant that writes formal email replies. \
                 Use respectful, precise language with traditional business etiquette \
                 and avoid contractions or colloquialisms."
            }
            Tone::Casual => {
                "You are an assistant that writes casual email replies. \
                 Use relaxed, conversational language as you would with a colleague you know well."
            }
        }
    }

    /// Full system instruction sent with every completion request
    pub fn system_prompt(&self) -> String {
        format!("{}\n\n{}", self.register(), STRUCTURE_GUIDELINES)
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ReplyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "friendly" => Ok(Tone::Friendly),
            "formal" => Ok(Tone::Formal),
            "casual" => Ok(Tone::Casual),
            _ => Err(ReplyError::UnsupportedTone(s.to_string())),
        }
    }
}

/// Which tones the product currently offers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMode {
    /// All four tones
    #[default]
    Full,
    /// Formal and casual only
    Restricted,
}

impl ToneMode {
    pub fn allows(&self, tone: Tone) -> bool {
        match self {
            ToneMode::Full => true,
            ToneMode::Restricted => matches!(tone, Tone::Formal | Tone::Casual),
        }
    }

    /// Tones available in this mode
    pub fn tones(&self) -> Vec<Tone> {
        Tone::ALL.into_iter().filter(|t| self.allows(*t)).collect()
    }

    /// Reject tones outside this mode
    pub fn check(&self, tone: Tone) -> Result<Tone, ReplyError> {
        if self.allows(tone) {
            Ok(tone)
        } else {
            Err(ReplyError::UnsupportedTone(tone.to_string()))
        }
    }
}

impl FromStr for ToneMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ToneMode::Full),
            "restricted" => Ok(ToneMode::Restricted),
            _ => Err(format!("Invalid tone mode: {}", s)),
        }
    }
}
