//! Pipeline phase classification for Vorhaben records.
//!
//! Maps raw Dataverse OptionSet codes and Business Process Flow stage ids
//! onto the four coarse pipeline phases used for grouping and filtering.
//! Classification is pure and total: unknown or absent input falls back to
//! `Phase::Initialisierung` so that unrecognized upstream statuses never
//! break a list view.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// The four coarse pipeline phases a Vorhaben progresses through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialisierung,
    AnalyseBewertung,
    Planung,
    Umsetzung,
}

impl Phase {
    /// Numeric key as exposed on the API (1-indexed, matches the front-end).
    pub fn code(&self) -> u8 {
        match self {
            Phase::Initialisierung => 1,
            Phase::AnalyseBewertung => 2,
            Phase::Planung => 3,
            Phase::Umsetzung => 4,
        }
    }

    /// Display name for a phase. Total, the enumeration is closed.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initialisierung => "Initialisierung",
            Phase::AnalyseBewertung => "Analyse & Bewertung",
            Phase::Planung => "Planung",
            Phase::Umsetzung => "Umsetzung",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "1" | "initialisierung" => Ok(Phase::Initialisierung),
            "2" | "analyse" | "analyse_bewertung" => Ok(Phase::AnalyseBewertung),
            "3" | "planung" => Ok(Phase::Planung),
            "4" | "umsetzung" => Ok(Phase::Umsetzung),
            _ => Err(format!("Invalid phase: {}", input)),
        }
    }
}

/// Business Process Flow stage ids and the phase each stage belongs to.
///
/// The ids come from the process-flow definition in Dataverse and are stable
/// per environment. Lookup is case-insensitive since Dataverse returns stage
/// ids in varying casing depending on the endpoint.
const STAGE_PHASES: [(&str, Phase); 4] = [
    ("0FB45E3A-7C8C-43B2-A1E2-05A4C5C8A31F", Phase::Initialisierung),
    ("6D2B8E11-94D0-4B5E-8C57-3F7A2E9B60D4", Phase::AnalyseBewertung),
    ("4A97C0DE-2F61-4E0B-B7A8-91D35C6E7F22", Phase::Planung),
    ("B8209429-FEA3-4FDE-9440-2BC168BF14B3", Phase::Umsetzung),
];

/// Inclusive lifecycle-status code ranges per phase.
///
/// The upstream schema has shipped with diverging range tables in different
/// front-end variants, so the boundaries are treated as configuration data:
/// they can be overridden via `PHASE_RANGES` and are validated for
/// disjointness at startup instead of being hard-coded in the classifier.
#[derive(Debug, Clone)]
pub struct PhaseRanges {
    pub initialisierung: RangeInclusive<i64>,
    pub analyse_bewertung: RangeInclusive<i64>,
    pub planung: RangeInclusive<i64>,
    pub umsetzung: RangeInclusive<i64>,
}

impl Default for PhaseRanges {
    fn default() -> Self {
        PhaseRanges {
            initialisierung: 562520000..=562520002,
            analyse_bewertung: 562520003..=562520005,
            planung: 562520006..=562520008,
            umsetzung: 562520009..=562520011,
        }
    }
}

impl PhaseRanges {
    /// Parses four comma-separated `lo-hi` pairs in phase order, e.g.
    /// `562520000-562520002,562520003-562520005,...`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let pairs: Vec<&str> = input.split(',').map(|p| p.trim()).collect();
        if pairs.len() != 4 {
            return Err(format!(
                "Expected 4 phase ranges, got {}: '{}'",
                pairs.len(),
                input
            ));
        }

        let mut ranges = Vec::with_capacity(4);
        for pair in pairs {
            let (lo, hi) = pair
                .split_once('-')
                .ok_or_else(|| format!("Invalid range '{}', expected 'lo-hi'", pair))?;
            let lo = lo
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("Invalid range bound '{}': {}", lo, e))?;
            let hi = hi
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("Invalid range bound '{}': {}", hi, e))?;
            ranges.push(lo..=hi);
        }

        let parsed = PhaseRanges {
            initialisierung: ranges[0].clone(),
            analyse_bewertung: ranges[1].clone(),
            planung: ranges[2].clone(),
            umsetzung: ranges[3].clone(),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Validates that the ranges are well-formed and pairwise disjoint.
    ///
    /// Overlapping tables have appeared upstream; they are rejected here so
    /// a misconfiguration fails at startup instead of classifying records
    /// differently depending on evaluation order.
    pub fn validate(&self) -> Result<(), String> {
        let named = self.named();

        for (phase, range) in &named {
            if range.start() > range.end() {
                return Err(format!(
                    "Phase range for {} is inverted: {}-{}",
                    phase,
                    range.start(),
                    range.end()
                ));
            }
        }

        for (i, (phase_a, a)) in named.iter().enumerate() {
            for (phase_b, b) in named.iter().skip(i + 1) {
                if a.start() <= b.end() && b.start() <= a.end() {
                    return Err(format!(
                        "Phase ranges for {} and {} overlap: {}-{} vs {}-{}",
                        phase_a,
                        phase_b,
                        a.start(),
                        a.end(),
                        b.start(),
                        b.end()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Classifies a lifecycle-status OptionSet code.
    ///
    /// Codes outside all ranges, and absent codes, map to the default phase
    /// rather than an error. New statuses added upstream must not break
    /// existing views; this fallback is a product rule, not error handling.
    pub fn classify_status(&self, code: Option<i64>) -> Phase {
        let Some(code) = code else {
            return Phase::Initialisierung;
        };

        for (phase, range) in self.named() {
            if range.contains(&code) {
                return phase;
            }
        }

        Phase::Initialisierung
    }

    fn named(&self) -> [(Phase, RangeInclusive<i64>); 4] {
        [
            (Phase::Initialisierung, self.initialisierung.clone()),
            (Phase::AnalyseBewertung, self.analyse_bewertung.clone()),
            (Phase::Planung, self.planung.clone()),
            (Phase::Umsetzung, self.umsetzung.clone()),
        ]
    }
}

/// Classifies a Business Process Flow stage id, case-insensitively.
///
/// Unmatched or absent ids fall back to `Phase::Initialisierung`, same as
/// the status-code path.
pub fn classify_stage(stage_id: Option<&str>) -> Phase {
    let Some(stage_id) = stage_id else {
        return Phase::Initialisierung;
    };

    STAGE_PHASES
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(stage_id))
        .map(|(_, phase)| *phase)
        .unwrap_or(Phase::Initialisierung)
}

/// Classifies a record from both available sources.
///
/// The stage-based classification wins when a process-flow record exists;
/// the lifecycle-status code is the fallback. Neither source is
/// authoritative upstream, so the caller passes whichever it has.
pub fn classify(ranges: &PhaseRanges, stage_id: Option<&str>, status: Option<i64>) -> Phase {
    match stage_id {
        Some(id) => classify_stage(Some(id)),
        None => ranges.classify_status(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification_boundaries() {
        let ranges = PhaseRanges::default();
        assert_eq!(
            ranges.classify_status(Some(562520000)),
            Phase::Initialisierung
        );
        assert_eq!(
            ranges.classify_status(Some(562520003)),
            Phase::AnalyseBewertung
        );
        assert_eq!(
            ranges.classify_status(Some(562520005)),
            Phase::AnalyseBewertung
        );
        assert_eq!(ranges.classify_status(Some(562520007)), Phase::Planung);
        assert_eq!(ranges.classify_status(Some(562520009)), Phase::Umsetzung);
        assert_eq!(ranges.classify_status(Some(562520010)), Phase::Umsetzung);
        assert_eq!(ranges.classify_status(Some(562520011)), Phase::Umsetzung);
    }

    #[test]
    fn test_status_classification_is_total() {
        let ranges = PhaseRanges::default();

        // Out-of-range and absent codes fall back instead of failing.
        assert_eq!(ranges.classify_status(Some(999)), Phase::Initialisierung);
        assert_eq!(ranges.classify_status(Some(0)), Phase::Initialisierung);
        assert_eq!(ranges.classify_status(Some(-1)), Phase::Initialisierung);
        assert_eq!(
            ranges.classify_status(Some(562520012)),
            Phase::Initialisierung
        );
        assert_eq!(ranges.classify_status(None), Phase::Initialisierung);
    }

    #[test]
    fn test_stage_classification_is_case_insensitive() {
        assert_eq!(
            classify_stage(Some("B8209429-FEA3-4FDE-9440-2BC168BF14B3")),
            Phase::Umsetzung
        );
        assert_eq!(
            classify_stage(Some("b8209429-fea3-4fde-9440-2bc168bf14b3")),
            Phase::Umsetzung
        );
        assert_eq!(
            classify_stage(Some("4a97c0de-2f61-4e0b-b7a8-91d35c6e7f22")),
            Phase::Planung
        );
    }

    #[test]
    fn test_stage_classification_fallback() {
        assert_eq!(classify_stage(None), Phase::Initialisierung);
        assert_eq!(
            classify_stage(Some("00000000-0000-0000-0000-000000000000")),
            Phase::Initialisierung
        );
        assert_eq!(classify_stage(Some("")), Phase::Initialisierung);
    }

    #[test]
    fn test_stage_wins_over_status() {
        let ranges = PhaseRanges::default();
        let phase = classify(
            &ranges,
            Some("b8209429-fea3-4fde-9440-2bc168bf14b3"),
            Some(562520000),
        );
        assert_eq!(phase, Phase::Umsetzung);

        let phase = classify(&ranges, None, Some(562520007));
        assert_eq!(phase, Phase::Planung);
    }

    #[test]
    fn test_labels_and_codes() {
        assert_eq!(Phase::Initialisierung.label(), "Initialisierung");
        assert_eq!(Phase::AnalyseBewertung.label(), "Analyse & Bewertung");
        assert_eq!(Phase::Planung.label(), "Planung");
        assert_eq!(Phase::Umsetzung.label(), "Umsetzung");
        assert_eq!(Phase::Initialisierung.code(), 1);
        assert_eq!(Phase::Umsetzung.code(), 4);
    }

    #[test]
    fn test_parse_ranges() {
        let ranges =
            PhaseRanges::parse("100-199, 200-299, 300-399, 400-499").expect("valid ranges");
        assert_eq!(ranges.classify_status(Some(250)), Phase::AnalyseBewertung);
        assert_eq!(ranges.classify_status(Some(400)), Phase::Umsetzung);

        assert!(PhaseRanges::parse("100-199,200-299").is_err());
        assert!(PhaseRanges::parse("100-199,200-299,300-399,oops").is_err());
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let err = PhaseRanges::parse("100-250, 200-299, 300-399, 400-499").unwrap_err();
        assert!(err.contains("overlap"), "unexpected error: {}", err);

        let err = PhaseRanges::parse("199-100, 200-299, 300-399, 400-499").unwrap_err();
        assert!(err.contains("inverted"), "unexpected error: {}", err);
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!(Phase::from_str("planung"), Ok(Phase::Planung));
        assert_eq!(Phase::from_str("Umsetzung"), Ok(Phase::Umsetzung));
        assert_eq!(Phase::from_str("2"), Ok(Phase::AnalyseBewertung));
        assert!(Phase::from_str("rollout").is_err());
    }
}
