//! Archetype assignment.
//!
//! Archetypes are declarative: a weight per dimension plus optional hard
//! thresholds. Fit is the weight-normalized mean of the available dimension
//! scores; any unmet threshold forces a fit of zero. The best fit becomes
//! the primary archetype, and a close runner-up the secondary one.

use crate::profile::types::{
    ArchetypeAssignment, ArchetypeResult, DimensionId, DimensionResult,
};

/// Minimum number of scored dimensions before classifying.
pub const MIN_VALID_DIMENSIONS: usize = 3;

/// Minimum mean confidence (over scored dimensions) before classifying.
pub const MIN_AVERAGE_CONFIDENCE: f64 = 55.0;

/// Minimum fit for an archetype to be assigned at all.
pub const MIN_ARCHETYPE_FIT: f64 = 40.0;

/// The secondary archetype must be strictly within this many points of
/// the primary.
pub const SECONDARY_MAX_GAP: f64 = 15.0;

/// Static definition of an archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub weights: &'static [(DimensionId, f64)],
    /// Minimum score per dimension; unmet thresholds disqualify.
    pub thresholds: &'static [(DimensionId, u8)],
}

impl ArchetypeDefinition {
    /// Materialize a result with the given fit.
    pub fn to_result(&self, fit: f64) -> ArchetypeResult {
        ArchetypeResult {
            id: self.id.to_string(),
            name: self.name.to_string(),
            tagline: self.tagline.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            confidence: fit.round().clamp(0.0, 100.0) as u8,
        }
    }
}

/// The archetype catalogue. Order is significant: equal fits rank in
/// catalogue order.
pub static ARCHETYPES: &[ArchetypeDefinition] = &[
    ArchetypeDefinition {
        id: "navigator",
        name: "The Navigator",
        tagline: "Charting the dreamscape",
        description: "You approach dreams with intention and awareness. When you realize \
            you're dreaming, you seize the opportunity to explore, experiment, and discover. \
            Your dreams are a practice space for consciousness itself.",
        icon: "🧭",
        weights: &[
            (DimensionId::Lucidity, 0.45),
            (DimensionId::Engagement, 0.30),
            (DimensionId::Meaning, 0.15),
            (DimensionId::Boundary, 0.10),
        ],
        thresholds: &[(DimensionId::Lucidity, 55)],
    },
    ArchetypeDefinition {
        id: "oracle",
        name: "The Oracle",
        tagline: "Reading the signs",
        description: "You find personal meaning in dream imagery and treat dreams as \
            messages from your unconscious. Symbols speak to you, and you actively work with \
            your dreams to understand yourself and your life more deeply.",
        icon: "🔮",
        weights: &[
            (DimensionId::Meaning, 0.40),
            (DimensionId::Engagement, 0.30),
            (DimensionId::Boundary, 0.20),
            (DimensionId::Emotion, 0.10),
        ],
        thresholds: &[(DimensionId::Meaning, 50), (DimensionId::Engagement, 45)],
    },
    ArchetypeDefinition {
        id: "witness",
        name: "The Witness",
        tagline: "Immersed in feeling",
        description: "You experience vivid emotional journeys in your dreams. As a \
            surrendered observer, you feel deeply without trying to control or interpret. \
            Your dreams are rich with atmosphere and intense with feeling.",
        icon: "👁️",
        weights: &[
            (DimensionId::Emotion, 0.45),
            (DimensionId::Boundary, 0.25),
            (DimensionId::Engagement, 0.20),
            (DimensionId::Lucidity, 0.10),
        ],
        thresholds: &[(DimensionId::Emotion, 50)],
    },
    ArchetypeDefinition {
        id: "explorer",
        name: "The Explorer",
        tagline: "Wandering strange lands",
        description: "You live in rich, immersive dreamscapes where reality blurs and \
            impossible things feel natural. With fluid boundaries between worlds, you wander \
            through surreal landscapes without needing to control or decode them.",
        icon: "🌀",
        weights: &[
            (DimensionId::Boundary, 0.45),
            (DimensionId::Emotion, 0.25),
            (DimensionId::Meaning, 0.15),
            (DimensionId::Lucidity, 0.15),
        ],
        thresholds: &[(DimensionId::Boundary, 55)],
    },
];

/// Find a catalogue entry by id.
pub fn find_archetype(id: &str) -> Option<&'static ArchetypeDefinition> {
    ARCHETYPES.iter().find(|a| a.id == id)
}

fn score_of(dimensions: &[DimensionResult], id: DimensionId) -> Option<u8> {
    dimensions
        .iter()
        .find(|d| d.dimension == id)
        .and_then(|d| d.score)
}

/// Fit of one archetype against a dimension vector, 0-100.
///
/// Null dimensions are left out of the weighted mean rather than counted
/// as zero.
pub fn archetype_fit(archetype: &ArchetypeDefinition, dimensions: &[DimensionResult]) -> f64 {
    for &(dim, threshold) in archetype.thresholds {
        match score_of(dimensions, dim) {
            Some(score) if score >= threshold => {}
            _ => return 0.0,
        }
    }

    let (total, weight_used) = archetype
        .weights
        .iter()
        .filter_map(|&(dim, weight)| score_of(dimensions, dim).map(|s| (f64::from(s), weight)))
        .fold((0.0, 0.0), |(total, used), (score, weight)| {
            (total + score * weight, used + weight)
        });

    if weight_used > 0.0 {
        total / weight_used
    } else {
        0.0
    }
}

/// Assign primary and secondary archetypes from the built-in catalogue.
pub fn assign_archetype(dimensions: &[DimensionResult]) -> ArchetypeAssignment {
    assign_archetype_from(ARCHETYPES, dimensions)
}

/// Assign primary and secondary archetypes from `catalogue`.
///
/// Returns an empty assignment when fewer than [`MIN_VALID_DIMENSIONS`]
/// dimensions are scored or their mean confidence is below
/// [`MIN_AVERAGE_CONFIDENCE`].
pub fn assign_archetype_from(
    catalogue: &[ArchetypeDefinition],
    dimensions: &[DimensionResult],
) -> ArchetypeAssignment {
    let valid: Vec<&DimensionResult> = dimensions.iter().filter(|d| d.score.is_some()).collect();
    if valid.len() < MIN_VALID_DIMENSIONS {
        return ArchetypeAssignment::default();
    }
    let avg_confidence =
        valid.iter().map(|d| f64::from(d.confidence)).sum::<f64>() / valid.len() as f64;
    if avg_confidence < MIN_AVERAGE_CONFIDENCE {
        return ArchetypeAssignment::default();
    }

    let mut fits: Vec<(&ArchetypeDefinition, f64)> = catalogue
        .iter()
        .map(|a| (a, archetype_fit(a, dimensions)))
        .collect();
    // Stable sort keeps catalogue order between equal fits.
    fits.sort_by(|a, b| b.1.total_cmp(&a.1));

    let Some(&(top, top_fit)) = fits.first() else {
        return ArchetypeAssignment::default();
    };
    if top_fit < MIN_ARCHETYPE_FIT {
        return ArchetypeAssignment::default();
    }

    let secondary = fits.get(1).and_then(|&(runner_up, fit)| {
        (fit >= MIN_ARCHETYPE_FIT && top_fit - fit < SECONDARY_MAX_GAP)
            .then(|| runner_up.to_result(fit))
    });

    ArchetypeAssignment {
        primary: Some(top.to_result(top_fit)),
        secondary,
    }
}
