//! Insider label resolution.
//!
//! A session is labeled only when at least one member event is on the
//! user's malicious list. The label is then the user's scenario id, carried
//! by every member regardless of the insider window.

use super::SessionEvent;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelResolution {
    /// 0 for a benign session, otherwise a scenario id
    pub label: u32,
    /// Distinct non-zero scenarios among the members, in order of first
    /// appearance
    pub candidates: Vec<u32>,
}

impl LabelResolution {
    /// More than one scenario competed for this session.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Resolve the label from `(malicious, scenario)` pairs in chronological
/// order.
pub fn resolve_label<I>(members: I) -> LabelResolution
where
    I: IntoIterator<Item = (bool, u32)>,
{
    let mut any_malicious = false;
    let mut candidates: Vec<u32> = Vec::new();
    for (malicious, scenario) in members {
        any_malicious |= malicious;
        if scenario != 0 && !candidates.contains(&scenario) {
            candidates.push(scenario);
        }
    }

    if !any_malicious {
        return LabelResolution::default();
    }
    LabelResolution {
        label: candidates.first().copied().unwrap_or(0),
        candidates,
    }
}

/// [`resolve_label`] over session members.
pub fn resolve_session_label(members: &[&SessionEvent]) -> LabelResolution {
    resolve_label(members.iter().map(|m| (m.malicious, m.scenario)))
}
