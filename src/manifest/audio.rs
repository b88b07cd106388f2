//! Audio variant selection under a quality policy

use super::{Manifest, SelectedVariant, Variant, numeric_segments};
use crate::error::{Error, Result};
use crate::types::{AudioMode, QualityPolicy};
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static STEREO_BITRATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"audio-stereo-(\d+)").expect("static regex is valid"));

/// Pick the variant that satisfies `policy`
///
/// Variants are walked in descending bandwidth order and the first match wins.
///
/// # Errors
/// Returns [`Error::NoMatchingVariant`] when nothing satisfies the policy.
pub fn select_audio(manifest: &Manifest, policy: &QualityPolicy) -> Result<SelectedVariant> {
    let sorted = manifest.by_bandwidth();
    let picked = match policy.mode {
        AudioMode::Atmos => pick_atmos(&sorted, policy.atmos_max),
        AudioMode::Aac => pick_aac(&sorted, policy.aac_subtype.label()),
        AudioMode::Alac => pick_alac(&sorted, policy.alac_max),
    };

    let (variant, quality) = picked.ok_or_else(|| {
        Error::NoMatchingVariant(match policy.mode {
            AudioMode::Atmos => format!("no atmos variant <= {} kbps and no dolby audio", policy.atmos_max),
            AudioMode::Aac => format!("no {} variant", policy.aac_subtype),
            AudioMode::Alac => format!("no alac variant <= {} Hz", policy.alac_max),
        })
    })?;

    Ok(SelectedVariant {
        url: manifest.resolve(&variant.uri)?,
        quality,
        label: variant.audio_group.clone(),
    })
}

/// Atmos bitrate in kbps from the trailing label segment
pub(crate) fn atmos_kbps(label: &str) -> Option<u32> {
    label.rsplit('-').next()?.parse().ok()
}

/// Whether a variant is an Atmos (E-AC-3 JOC) rendition
pub(crate) fn is_atmos(variant: &Variant) -> bool {
    variant.codec == "ec-3" && variant.audio_group.contains("atmos")
}

fn pick_atmos<'a>(sorted: &[&'a Variant], ceiling: u32) -> Option<(&'a Variant, String)> {
    let atmos = sorted.iter().find_map(|v| {
        if !is_atmos(v) {
            return None;
        }
        let kbps = atmos_kbps(&v.audio_group)?;
        (kbps <= ceiling).then(|| (*v, format!("{kbps} kbps")))
    });
    atmos.or_else(|| {
        sorted.iter().find(|v| v.codec == "ac-3").map(|v| {
            let kbps = v.audio_group.rsplit('-').next().unwrap_or_default();
            (*v, format!("{kbps} kbps"))
        })
    })
}

/// Normalize `audio-stereo-<n>` to "aac" so labels compare against the subtype
fn normalize_aac_label(label: &str) -> String {
    STEREO_BITRATE.replace_all(label, "aac").into_owned()
}

fn pick_aac<'a>(sorted: &[&'a Variant], subtype: &str) -> Option<(&'a Variant, String)> {
    sorted
        .iter()
        .find(|v| v.codec == "mp4a.40.2" && normalize_aac_label(&v.audio_group) == subtype)
        .map(|v| {
            let bitrate = STEREO_BITRATE
                .captures(&v.audio_group)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| (v.bandwidth / 1000).to_string());
            (*v, format!("{bitrate} kbps"))
        })
}

/// (bit depth, sample rate) from the two trailing numeric label segments
///
/// The larger of the two is the sample rate, so both orders parse.
pub(crate) fn alac_params(label: &str) -> Option<(u32, u32)> {
    let nums = numeric_segments(label);
    let [.., a, b] = nums.as_slice() else {
        return None;
    };
    Some(if a >= b { (*b, *a) } else { (*a, *b) })
}

/// Quality label such as "24B-48.0kHz"
pub(crate) fn alac_quality(bit_depth: u32, sample_rate: u32) -> String {
    format!("{}B-{:.1}kHz", bit_depth, f64::from(sample_rate) / 1000.0)
}

fn pick_alac<'a>(sorted: &[&'a Variant], ceiling: u32) -> Option<(&'a Variant, String)> {
    sorted.iter().find_map(|v| {
        if v.codec != "alac" {
            return None;
        }
        let (bit_depth, sample_rate) = alac_params(&v.audio_group)?;
        (sample_rate <= ceiling).then(|| (*v, alac_quality(bit_depth, sample_rate)))
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::super::fixtures::{AUDIO_MASTER, MASTER_URL};
    use super::*;
    use crate::types::AacType;

    fn policy(mode: AudioMode) -> QualityPolicy {
        QualityPolicy {
            mode,
            aac_subtype: AacType::Aac,
            alac_max: 192_000,
            atmos_max: 2768,
        }
    }

    fn manifest() -> Manifest {
        Manifest::parse(AUDIO_MASTER, MASTER_URL).unwrap()
    }

    #[test]
    fn alac_picks_highest_variant_under_ceiling() {
        let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1000000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-24-48000\"
alac/24-48000.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,CODECS=\"alac\",AUDIO=\"audio-alac-stereo-16-44100\"
alac/16-44100.m3u8
";
        let m = Manifest::parse(text, MASTER_URL).unwrap();
        let mut p = policy(AudioMode::Alac);
        p.alac_max = 48_000;
        let sel = select_audio(&m, &p).unwrap();
        assert_eq!(sel.url, "https://aod.example.com/itunes/song/1/alac/24-48000.m3u8");
        assert_eq!(sel.quality, "24B-48.0kHz");
        assert_eq!(sel.label, "audio-alac-stereo-24-48000");
    }

    #[test]
    fn alac_respects_ceiling() {
        let m = manifest();
        for (ceiling, expected) in [
            (192_000, "24B-192.0kHz"),
            (96_000, "24B-96.0kHz"),
            (48_000, "24B-48.0kHz"),
            (44_100, "16B-44.1kHz"),
        ] {
            let mut p = policy(AudioMode::Alac);
            p.alac_max = ceiling;
            let sel = select_audio(&m, &p).unwrap();
            assert_eq!(sel.quality, expected);
            let (_, rate) = alac_params(&sel.label).unwrap();
            assert!(rate <= ceiling);
        }

        let mut p = policy(AudioMode::Alac);
        p.alac_max = 22_050;
        assert!(matches!(select_audio(&m, &p), Err(Error::NoMatchingVariant(_))));
    }

    #[test]
    fn alac_label_order_does_not_matter() {
        assert_eq!(alac_params("audio-alac-stereo-48000-24"), Some((24, 48_000)));
        assert_eq!(alac_params("audio-alac-stereo-24-48000"), Some((24, 48_000)));
        assert_eq!(alac_params("audio-alac-stereo"), None);
    }

    #[test]
    fn atmos_takes_first_under_ceiling() {
        let m = manifest();
        let sel = select_audio(&m, &policy(AudioMode::Atmos)).unwrap();
        assert_eq!(sel.quality, "2768 kbps");
        assert!(sel.url.ends_with("atmos/2768.m3u8"));

        let mut p = policy(AudioMode::Atmos);
        p.atmos_max = 1000;
        let sel = select_audio(&m, &p).unwrap();
        assert_eq!(sel.quality, "768 kbps");
    }

    #[test]
    fn atmos_falls_back_to_dolby_audio_without_ceiling() {
        let m = manifest();
        let mut p = policy(AudioMode::Atmos);
        p.atmos_max = 100;
        let sel = select_audio(&m, &p).unwrap();
        assert_eq!(sel.label, "audio-ac3-640");
        assert_eq!(sel.quality, "640 kbps");
    }

    #[test]
    fn atmos_label_without_number_never_qualifies() {
        let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=900,CODECS=\"ec-3\",AUDIO=\"audio-atmos\"
atmos.m3u8
";
        let m = Manifest::parse(text, MASTER_URL).unwrap();
        assert!(matches!(
            select_audio(&m, &policy(AudioMode::Atmos)),
            Err(Error::NoMatchingVariant(_))
        ));
    }

    #[test]
    fn aac_subtypes_match_normalized_labels() {
        let m = manifest();
        let sel = select_audio(&m, &policy(AudioMode::Aac)).unwrap();
        assert_eq!(sel.label, "audio-stereo-256");
        assert_eq!(sel.quality, "256 kbps");

        let mut p = policy(AudioMode::Aac);
        p.aac_subtype = AacType::AacBinaural;
        assert_eq!(select_audio(&m, &p).unwrap().label, "audio-stereo-256-binaural");

        p.aac_subtype = AacType::AacDownmix;
        assert_eq!(select_audio(&m, &p).unwrap().label, "audio-stereo-256-downmix");
    }

    #[test]
    fn selection_is_deterministic() {
        let m = manifest();
        for mode in [AudioMode::Alac, AudioMode::Aac, AudioMode::Atmos] {
            let first = select_audio(&m, &policy(mode)).unwrap();
            for _ in 0..5 {
                let again = Manifest::parse(AUDIO_MASTER, MASTER_URL).unwrap();
                assert_eq!(select_audio(&again, &policy(mode)).unwrap(), first);
            }
        }
    }
}
