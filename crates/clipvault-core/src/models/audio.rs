use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Audio container/encoding of a submission or of the archival target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Flac,
    Aac,
    M4a,
    Webm,
    /// Audio of a type we cannot name; always transcoded.
    Unknown,
}

/// Strip MIME parameters and lowercase ("Audio/MPEG; rate=44100" -> "audio/mpeg").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

impl AudioFormat {
    /// Canonical MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Aac => "audio/aac",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Unknown => "application/octet-stream",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::Aac => "aac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Webm => "webm",
            AudioFormat::Unknown => "bin",
        }
    }

    pub fn from_mime(content_type: &str) -> Option<Self> {
        let format = match normalize_mime_type(content_type).as_str() {
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" | "audio/x-mpeg-3" => AudioFormat::Mp3,
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => AudioFormat::Wav,
            "audio/ogg" | "audio/opus" | "application/ogg" => AudioFormat::Ogg,
            "audio/flac" | "audio/x-flac" => AudioFormat::Flac,
            "audio/aac" | "audio/x-aac" => AudioFormat::Aac,
            "audio/mp4" | "audio/x-m4a" | "audio/m4a" => AudioFormat::M4a,
            "audio/webm" => AudioFormat::Webm,
            _ => return None,
        };
        Some(format)
    }

    pub fn from_extension(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        let format = match extension.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "wav" | "wave" => AudioFormat::Wav,
            "ogg" | "oga" | "opus" => AudioFormat::Ogg,
            "flac" => AudioFormat::Flac,
            "aac" => AudioFormat::Aac,
            "m4a" | "mp4" => AudioFormat::M4a,
            "webm" | "weba" => AudioFormat::Webm,
            _ => return None,
        };
        Some(format)
    }

    /// Identify the format from the leading bytes of a file.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.len() < 4 {
            return None;
        }
        if header.starts_with(b"ID3") {
            return Some(AudioFormat::Mp3);
        }
        if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if header.starts_with(b"OggS") {
            return Some(AudioFormat::Ogg);
        }
        if header.starts_with(b"fLaC") {
            return Some(AudioFormat::Flac);
        }
        if header.len() >= 8 && &header[4..8] == b"ftyp" {
            return Some(AudioFormat::M4a);
        }
        if header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(AudioFormat::Webm);
        }
        if header[0] == 0xFF && header[1] & 0xE0 == 0xE0 {
            // ADTS (AAC) has layer bits 00; MPEG audio layers are non-zero.
            return if header[1] & 0x06 == 0 {
                Some(AudioFormat::Aac)
            } else {
                Some(AudioFormat::Mp3)
            };
        }
        None
    }

    /// Detect the real encoding: content first, then declared mime, then filename.
    pub fn detect(header: &[u8], declared_mime: &str, original_name: &str) -> Self {
        Self::sniff(header)
            .or_else(|| Self::from_mime(declared_mime))
            .or_else(|| Self::from_extension(original_name))
            .unwrap_or(AudioFormat::Unknown)
    }
}

impl FromStr for AudioFormat {
    type Err = anyhow::Error;

    /// Accepts an extension ("mp3") or a MIME type ("audio/mpeg").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let format = if s.contains('/') {
            Self::from_mime(s)
        } else {
            Self::from_extension(&format!("x.{}", s))
        };
        format.ok_or_else(|| anyhow::anyhow!("Unsupported audio format: {}", s))
    }
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.extension())
    }
}
