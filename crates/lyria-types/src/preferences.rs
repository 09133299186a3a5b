//! Voice and persona catalogs.

use std::collections::BTreeMap;

use serde::Serialize;

/// Persona used when nothing else is selected.
pub const DEFAULT_PERSONA: &str = "professor";

/// Persona key to description, as served by `GET /personas`.
pub type PersonaCatalog = BTreeMap<String, String>;

/// A speech synthesis voice the user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    /// Voice name understood by the speech service.
    pub value: &'static str,
    /// Name shown to the user.
    pub label: &'static str,
}

/// The available voices. The first entry is the default.
pub const VOICES: &[VoiceOption] = &[
    VoiceOption { value: "pt-BR-FranciscaNeural", label: "LyrIA" },
    VoiceOption { value: "pt-BR-BrendaNeural", label: "Brenda" },
    VoiceOption { value: "pt-BR-GiovanaNeural", label: "Giovana" },
    VoiceOption { value: "pt-BR-LeticiaNeural", label: "Leticia" },
    VoiceOption { value: "pt-BR-AntonioNeural", label: "Antonio" },
    VoiceOption { value: "pt-BR-DonatoNeural", label: "Leonardo" },
];

pub fn default_voice() -> VoiceOption {
    VOICES[0]
}

/// Find a voice by its service name.
pub fn find_voice(value: &str) -> Option<VoiceOption> {
    VOICES.iter().copied().find(|v| v.value == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice_is_lyria() {
        assert_eq!(default_voice().label, "LyrIA");
    }

    #[test]
    fn test_find_voice() {
        assert_eq!(find_voice("pt-BR-DonatoNeural").unwrap().label, "Leonardo");
        assert!(find_voice("en-US-JennyNeural").is_none());
    }
}
