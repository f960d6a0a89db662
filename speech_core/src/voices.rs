use serde::{Deserialize, Serialize};

/// Curated narration voices. A closed set: unknown keys fall back to
/// [`VoiceKey::default`] instead of propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceKey {
    GbWavenetD,
    GbWavenetC,
    UsWavenetD,
    UsWavenetF,
}

impl Default for VoiceKey {
    fn default() -> Self {
        VoiceKey::GbWavenetD
    }
}

impl VoiceKey {
    pub const ALL: [VoiceKey; 4] = [
        VoiceKey::GbWavenetD,
        VoiceKey::GbWavenetC,
        VoiceKey::UsWavenetD,
        VoiceKey::UsWavenetF,
    ];

    /// Parse a client-supplied key, falling back to the default voice
    /// for anything unrecognized.
    pub fn normalize(raw: Option<&str>) -> VoiceKey {
        match raw.map(str::trim) {
            Some("gb_wavenet_d") => VoiceKey::GbWavenetD,
            Some("gb_wavenet_c") => VoiceKey::GbWavenetC,
            Some("us_wavenet_d") => VoiceKey::UsWavenetD,
            Some("us_wavenet_f") => VoiceKey::UsWavenetF,
            _ => VoiceKey::default(),
        }
    }

    /// Strict parse used where a caller-supplied key must be echoed
    /// back unchanged (resolving a stored default, for instance).
    pub fn parse(raw: &str) -> Option<VoiceKey> {
        match raw.trim() {
            "gb_wavenet_d" => Some(VoiceKey::GbWavenetD),
            "gb_wavenet_c" => Some(VoiceKey::GbWavenetC),
            "us_wavenet_d" => Some(VoiceKey::UsWavenetD),
            "us_wavenet_f" => Some(VoiceKey::UsWavenetF),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoiceKey::GbWavenetD => "gb_wavenet_d",
            VoiceKey::GbWavenetC => "gb_wavenet_c",
            VoiceKey::UsWavenetD => "us_wavenet_d",
            VoiceKey::UsWavenetF => "us_wavenet_f",
        }
    }

    pub fn profile(self) -> &'static VoiceProfile {
        match self {
            VoiceKey::GbWavenetD => &VoiceProfile {
                display_name: "London Night",
                accent: "British",
                language_code: "en-GB",
                voice_name: "en-GB-Wavenet-D",
                gender: "male",
                speaking_rate: 0.90,
                pitch: 0.0,
            },
            VoiceKey::GbWavenetC => &VoiceProfile {
                display_name: "Soft British",
                accent: "British",
                language_code: "en-GB",
                voice_name: "en-GB-Wavenet-C",
                gender: "female",
                speaking_rate: 0.92,
                pitch: 0.0,
            },
            VoiceKey::UsWavenetD => &VoiceProfile {
                display_name: "American Reader",
                accent: "American",
                language_code: "en-US",
                voice_name: "en-US-Wavenet-D",
                gender: "male",
                speaking_rate: 0.92,
                pitch: 0.0,
            },
            VoiceKey::UsWavenetF => &VoiceProfile {
                display_name: "Warm Narrator",
                accent: "American",
                language_code: "en-US",
                voice_name: "en-US-Wavenet-F",
                gender: "female",
                speaking_rate: 0.94,
                pitch: 0.0,
            },
        }
    }
}

/// Synthesis tuning for one catalog voice. Pitch stays at 0: pitch
/// shifting commonly sounds synthetic.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceProfile {
    pub display_name: &'static str,
    pub accent: &'static str,
    pub language_code: &'static str,
    pub voice_name: &'static str,
    pub gender: &'static str,
    pub speaking_rate: f32,
    pub pitch: f32,
}
