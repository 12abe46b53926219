//! "Did you mean" suggestion engine
//!
//! Candidates are the union of canonical names and the current language's
//! translated names, scoped to where the typo happened. Distances are plain
//! Levenshtein with per-kind thresholds; a distance-1 match shadows
//! everything farther away.

use strsim::levenshtein;

/// One name the engine may suggest. `display` is what the user would type
/// (canonical or translated); `canonical` identifies the declaration it
/// belongs to, so a canonical name and its own translation can be folded
/// into one suggestion.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub display: String,
    pub canonical: String,
}

impl Candidate {
    pub fn canonical_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { display: name.clone(), canonical: name }
    }

    pub fn translated(display: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self { display: display.into(), canonical: canonical.into() }
    }
}

/// Compute the suggestion list for `input`.
///
/// Emission rule: if any candidate sits at distance 1, only distance-1
/// candidates are shown; otherwise every candidate within `threshold` is.
/// When the surviving set contains both a canonical name and that same
/// declaration's translation, the pair renders as `canonical / translated`.
pub fn suggestions(input: &str, candidates: &[Candidate], threshold: usize) -> Vec<String> {
    let mut scored: Vec<(usize, &Candidate)> = candidates
        .iter()
        .map(|c| (levenshtein(input, &c.display), c))
        .filter(|(d, _)| *d <= threshold && *d > 0)
        .collect();
    if scored.is_empty() {
        return Vec::new();
    }
    scored.sort_by_key(|(d, _)| *d);
    let min_distance = scored[0].0;
    if min_distance == 1 {
        scored.retain(|(d, _)| *d == 1);
    }

    let mut out: Vec<String> = Vec::new();
    let mut seen_display: Vec<String> = Vec::new();
    let mut folded: Vec<String> = Vec::new();
    for (_, candidate) in &scored {
        if seen_display.contains(&candidate.display) || folded.contains(&candidate.canonical) {
            continue;
        }
        let is_canonical = candidate.display == candidate.canonical;
        // a canonical name and its own translation fold into one entry
        let partner = scored.iter().find(|(_, other)| {
            other.canonical == candidate.canonical && other.display != candidate.display
        });
        if let Some((_, other)) = partner {
            let (canonical, translated) =
                if is_canonical { (&candidate.display, &other.display) } else { (&other.display, &candidate.display) };
            out.push(format!("{canonical} / {translated}"));
            folded.push(candidate.canonical.clone());
        } else {
            out.push(candidate.display.clone());
            seen_display.push(candidate.display.clone());
        }
    }
    out
}
