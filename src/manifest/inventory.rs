//! Enumerate-mode manifest scan
//!
//! Reports which audio categories a manifest offers and the best quality of
//! each. Used by inspect mode and by the Atmos pre-scan.

use super::audio::{alac_params, atmos_kbps, is_atmos};
use super::Manifest;
use std::fmt;

/// Bit depth and sample rate of an ALAC rendition
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AlacQuality {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample
    pub bit_depth: u32,
}

impl fmt::Display for AlacQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit/{} kHz", self.bit_depth, self.sample_rate / 1000)
    }
}

/// Best quality per audio category; `None` means not offered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Highest stereo AAC bitrate in kbps
    pub aac: Option<u32>,
    /// Best ALAC at or below 48 kHz
    pub lossless: Option<AlacQuality>,
    /// Best ALAC above 48 kHz
    pub hires: Option<AlacQuality>,
    /// Highest Atmos bitrate in kbps
    pub atmos: Option<u32>,
    /// Highest Dolby Audio (AC-3) bitrate in kbps
    pub dolby_audio: Option<u32>,
}

impl Inventory {
    /// Scan every variant of a manifest
    pub fn scan(manifest: &Manifest) -> Self {
        let mut inv = Inventory::default();
        for v in &manifest.variants {
            match v.codec.as_str() {
                "mp4a.40.2" => {
                    let kbps = v
                        .audio_group
                        .split('-')
                        .nth(2)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    inv.aac = Some(inv.aac.map_or(kbps, |cur| cur.max(kbps)));
                }
                "ec-3" if is_atmos(v) => {
                    let kbps = atmos_display_kbps(&v.audio_group);
                    inv.atmos = Some(inv.atmos.map_or(kbps, |cur| cur.max(kbps)));
                }
                "alac" => {
                    if let Some((bit_depth, sample_rate)) = alac_params(&v.audio_group) {
                        let q = AlacQuality {
                            sample_rate,
                            bit_depth,
                        };
                        let slot = if sample_rate > 48_000 {
                            &mut inv.hires
                        } else {
                            &mut inv.lossless
                        };
                        *slot = Some(slot.map_or(q, |cur| cur.max(q)));
                    }
                }
                "ac-3" => {
                    let kbps = atmos_kbps(&v.audio_group).unwrap_or(0);
                    inv.dolby_audio = Some(inv.dolby_audio.map_or(kbps, |cur| cur.max(kbps)));
                }
                _ => {}
            }
        }
        inv
    }
}

/// Atmos kbps for display; four-digit labels starting with "2" drop that digit
fn atmos_display_kbps(label: &str) -> u32 {
    let last = label.rsplit('-').next().unwrap_or_default();
    let trimmed = match last.strip_prefix('2') {
        Some(rest) if last.len() == 4 => rest,
        _ => last,
    };
    trimmed.parse().unwrap_or(0)
}

/// Whether any variant is an Atmos rendition
pub fn has_atmos(manifest: &Manifest) -> bool {
    manifest.variants.iter().any(is_atmos)
}

fn availability<T: fmt::Display>(value: Option<T>, render: impl Fn(T) -> String) -> String {
    value.map(render).unwrap_or_else(|| "Not Available".to_string())
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "AAC             : {}",
            availability(self.aac, |k| format!("AAC | 2 Channel | {k} kbps"))
        )?;
        writeln!(
            f,
            "Lossless        : {}",
            availability(self.lossless, |q| format!("ALAC | 2 Channel | {q}"))
        )?;
        writeln!(
            f,
            "Hi-Res Lossless : {}",
            availability(self.hires, |q| format!("ALAC | 2 Channel | {q}"))
        )?;
        writeln!(
            f,
            "Dolby Atmos     : {}",
            availability(self.atmos, |k| format!("E-AC-3 | 16 Channel | {k} kbps"))
        )?;
        write!(
            f,
            "Dolby Audio     : {}",
            availability(self.dolby_audio, |k| format!("AC-3 | 16 Channel | {k} kbps"))
        )
    }
}
