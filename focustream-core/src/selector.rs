//! Audio rendition selection
//!
//! Pure quality-policy logic: given the raw rendition list an extractor
//! returned, pick the audio-only rendition the policy considers best.
//! No side effects; deterministic given inputs.

use focustream_providers::Rendition;
use serde::{Deserialize, Serialize};

/// How to rank audio renditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityPolicy {
    /// Preferred container extension; `None` means any extension is fine.
    pub preferred_ext: Option<String>,

    /// In strict mode a preferred extension is a requirement, not a hint:
    /// if no rendition matches it, selection fails rather than silently
    /// degrading to the best available container.
    pub strict: bool,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            preferred_ext: None,
            strict: true,
        }
    }
}

impl QualityPolicy {
    /// Policy preferring a specific container extension.
    #[must_use]
    pub fn prefer(ext: impl Into<String>, strict: bool) -> Self {
        Self {
            preferred_ext: Some(ext.into()),
            strict,
        }
    }

    fn enforces_extension(&self) -> bool {
        self.strict && self.preferred_ext.is_some()
    }
}

/// Select the best audio-only rendition under the policy.
///
/// Ranking: with a strict preferred extension, an extension match dominates
/// and bitrate breaks ties among matches; otherwise bitrate dominates and
/// an extension match breaks bitrate ties. Ties on the full key go to the
/// first-encountered rendition, so selection stays deterministic for a
/// given input order.
///
/// Returns `None` when no audio-only rendition exists, or when a strict
/// preferred extension has no matching rendition at all.
#[must_use]
pub fn best_audio<'a>(renditions: &'a [Rendition], policy: &QualityPolicy) -> Option<&'a Rendition> {
    let preferred = policy.preferred_ext.as_deref();

    let mut best: Option<(&Rendition, (u64, u64))> = None;
    for candidate in renditions.iter().filter(|r| r.is_audio_only()) {
        let key = rank_key(candidate, preferred, policy.enforces_extension());
        // Strictly-greater comparison keeps the first encountered on ties.
        if best.as_ref().is_none_or(|(_, best_key)| key > *best_key) {
            best = Some((candidate, key));
        }
    }

    let (picked, _) = best?;
    if policy.enforces_extension() && preferred != Some(picked.ext.as_str()) {
        return None;
    }
    Some(picked)
}

fn rank_key(rendition: &Rendition, preferred: Option<&str>, strict: bool) -> (u64, u64) {
    let ext_match = u64::from(preferred == Some(rendition.ext.as_str()));
    if strict {
        (ext_match, rendition.bitrate_bps)
    } else {
        (rendition.bitrate_bps, ext_match)
    }
}
