//! Known voices of the generation endpoint.

use crate::config::NarrationSettings;
use crate::error::NarratorError;

pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
}

pub const VOICES: &[Voice] = &[
    Voice { id: "en_us_001", name: "English US - Female (Int. 1)" },
    Voice { id: "en_us_002", name: "English US - Female (Int. 2)" },
    Voice { id: "en_us_006", name: "English US - Male 1" },
    Voice { id: "en_us_007", name: "English US - Male 2" },
    Voice { id: "en_us_009", name: "English US - Male 3" },
    Voice { id: "en_us_010", name: "English US - Male 4" },
    Voice { id: "en_uk_001", name: "English UK - Male 1" },
    Voice { id: "en_uk_003", name: "English UK - Male 2" },
    Voice { id: "en_au_001", name: "English AU - Female" },
    Voice { id: "en_au_002", name: "English AU - Male" },
    Voice { id: "en_male_narration", name: "Story Teller" },
    Voice { id: "en_female_emotional", name: "Peaceful" },
    Voice { id: "en_us_ghostface", name: "Ghost Face" },
    Voice { id: "en_us_c3po", name: "C3PO" },
    Voice { id: "en_us_stitch", name: "Stitch" },
    Voice { id: "en_us_stormtrooper", name: "Stormtrooper" },
    Voice { id: "en_us_rocket", name: "Rocket" },
];

pub fn find(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.id == id)
}

/// The voice id to send: `custom_voice_id` wins when set, otherwise the
/// selected catalog voice.
pub fn resolve_voice(settings: &NarrationSettings) -> Result<&str, NarratorError> {
    let custom = settings.custom_voice_id.trim();
    if !custom.is_empty() {
        return Ok(custom);
    }

    let selected = settings.voice.trim();
    if selected.is_empty() {
        return Err(NarratorError::Config("no voice selected".into()));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_voice_overrides_selection() {
        let settings = NarrationSettings {
            custom_voice_id: " jp_001 ".into(),
            ..Default::default()
        };
        assert_eq!(resolve_voice(&settings).unwrap(), "jp_001");
    }

    #[test]
    fn falls_back_to_selected_voice() {
        let settings = NarrationSettings::default();
        assert_eq!(resolve_voice(&settings).unwrap(), "en_us_001");
        assert!(find("en_us_001").is_some());
    }

    #[test]
    fn no_voice_is_a_config_error() {
        let settings = NarrationSettings {
            voice: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(resolve_voice(&settings), Err(NarratorError::Config(_))));
    }
}
