//! Voice guidance audio: raw PCM from the speech model, re-encoded as WAV.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::time::Duration;
use thiserror::Error;

/// Sample rate of Gemini TTS output.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(String),
    #[error("PCM payload has odd length {0}; expected 16-bit samples")]
    OddLength(usize),
    #[error("audio payload is empty")]
    Empty,
}

/// Mono signed 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl VoiceClip {
    /// Decode base64 little-endian s16 PCM as returned in `inlineData`.
    pub fn from_base64_pcm(data: &str, sample_rate: u32) -> Result<Self, AudioError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| AudioError::Base64(e.to_string()))?;
        Self::from_pcm_bytes(&bytes, sample_rate)
    }

    pub fn from_pcm_bytes(bytes: &[u8], sample_rate: u32) -> Result<Self, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::Empty);
        }
        if bytes.len() % 2 != 0 {
            return Err(AudioError::OddLength(bytes.len()));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Samples scaled to [-1.0, 1.0).
    #[cfg(test)]
    pub fn to_f32_samples(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| f32::from(s) / 32768.0).collect()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Canonical 44-byte-header RIFF/WAVE encoding.
    pub fn to_wav(&self) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS_PER_SAMPLE: u16 = 16;
        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
        let byte_rate = self.sample_rate * u32::from(block_align);
        let data_len = (self.samples.len() * 2) as u32;

        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&CHANNELS.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_pcm() {
        // 0x0001 = 1, 0xFF7F = 32767, 0x0080 = -32768
        let encoded = STANDARD.encode([0x01, 0x00, 0xFF, 0x7F, 0x00, 0x80]);
        let clip = VoiceClip::from_base64_pcm(&encoded, SPEECH_SAMPLE_RATE).unwrap();
        assert_eq!(clip.samples, vec![1, 32767, -32768]);

        let scaled = clip.to_f32_samples();
        assert_eq!(scaled[2], -1.0);
        assert!(scaled[1] < 1.0);
    }

    #[test]
    fn test_rejects_odd_and_empty_payloads() {
        let odd = STANDARD.encode([0x01, 0x02, 0x03]);
        assert_eq!(
            VoiceClip::from_base64_pcm(&odd, SPEECH_SAMPLE_RATE),
            Err(AudioError::OddLength(3))
        );
        assert_eq!(
            VoiceClip::from_pcm_bytes(&[], SPEECH_SAMPLE_RATE),
            Err(AudioError::Empty)
        );
        assert!(matches!(
            VoiceClip::from_base64_pcm("not base64!!", SPEECH_SAMPLE_RATE),
            Err(AudioError::Base64(_))
        ));
    }

    #[test]
    fn test_duration() {
        let clip = VoiceClip {
            samples: vec![0; 12_000],
            sample_rate: SPEECH_SAMPLE_RATE,
        };
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_wav_header_layout() {
        let clip = VoiceClip {
            samples: vec![0, 1, -1],
            sample_rate: SPEECH_SAMPLE_RATE,
        };
        let wav = clip.to_wav();
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 42);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24_000);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48_000);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        assert_eq!(&wav[44..], &[0, 0, 1, 0, 0xFF, 0xFF]);
    }
}
