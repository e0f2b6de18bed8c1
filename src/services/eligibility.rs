//! Eligibility rule deciding whether a trial may train a pseudo.
//!
//! The progression state is the highest level present in the report. It is
//! recomputed from the report on every call so that a merge committed by a
//! previous trial in the same run is always seen.

use crate::domain::models::{
    Accuracy, AccuracyGating, DojoReport, Eligibility, RejectionReason, TrialKind, TrialRegistry,
};

/// Highest registered trial level recorded in `report`, or `None` when the
/// report holds no registered trial.
///
/// Keys unknown to the registry do not count towards progression.
pub fn current_level(report: &DojoReport, registry: &TrialRegistry) -> Option<u32> {
    report
        .keys()
        .filter_map(|key| {
            let level = registry.level_of_key(key);
            if level.is_none() {
                tracing::warn!(key, "Ignoring unknown trial key in dojo report");
            }
            level
        })
        .max()
}

/// Apply the base progression rule for `kind` at `accuracy`.
///
/// - untested pseudo: only level 0 is accepted;
/// - same level: accepted only for an accuracy not recorded yet;
/// - otherwise: accepted only one level above the current one, and under
///   [`AccuracyGating::MatchingTier`] only if the level below holds the same
///   accuracy.
///
/// Trial-specific gates are applied on top by the caller.
pub fn assess(
    report: &DojoReport,
    registry: &TrialRegistry,
    kind: TrialKind,
    accuracy: Accuracy,
    gating: AccuracyGating,
) -> Eligibility {
    let level = kind.level();

    let Some(current) = current_level(report, registry) else {
        return if level == 0 {
            Eligibility::Accepted
        } else {
            Eligibility::Rejected(RejectionReason::Untested { level })
        };
    };

    if current == level {
        return if report.has_accuracy(kind.key(), accuracy.as_str()) {
            Eligibility::Rejected(RejectionReason::AlreadyRecorded {
                key: kind.key().to_string(),
                accuracy: accuracy.to_string(),
            })
        } else {
            Eligibility::Accepted
        };
    }

    if level.checked_sub(1) != Some(current) {
        return Eligibility::Rejected(RejectionReason::LevelMismatch {
            current,
            requested: level,
        });
    }

    if gating == AccuracyGating::MatchingTier {
        if let Ok(prior) = registry.kind_for_level(current) {
            if !report.has_accuracy(prior.key(), accuracy.as_str()) {
                return Eligibility::Rejected(RejectionReason::MissingPriorTier {
                    key: prior.key().to_string(),
                    accuracy: accuracy.to_string(),
                });
            }
        }
    }

    Eligibility::Accepted
}
