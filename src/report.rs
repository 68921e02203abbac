//! # Textual run report
//!
//! A run emits a human-readable report; the experiment harness reads the numeric
//! fields back from it. The format is versioned and line-oriented: each field is
//! a fixed label followed by a number, at the start of its own line.
//!
//! ```text
//! bfoalign-report v1
//! Fitness: 12.5
//! BlosumScore 10
//! Interaction: 2.5
//! NFE: 120
//! --- 0.42 seconds ---
//! ```
//!
//! A label that is absent yields `None`, never zero: a run without a valid
//! solution prints no `Fitness:` line at all.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

pub const REPORT_VERSION: u32 = 1;
pub const REPORT_HEADER: &str = "bfoalign-report";
pub const NO_SOLUTION: &str = "No valid solution found";

const NUMBER: &str = r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)";

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("report pattern is valid")
}

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(?m)^{}\s+v(\d+)\s*$", REPORT_HEADER)));
static FITNESS_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(?m)^Fitness:\s+{}", NUMBER)));
static BLOSUM_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(?m)^BlosumScore\s+{}", NUMBER)));
static INTERACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(?m)^Interaction:\s+{}", NUMBER)));
static NFE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?m)^NFE:\s+(\d+)"));
static ELAPSED_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(&format!(r"(?m)^---\s+{}\s+seconds", NUMBER)));

/// Values a run reports about itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFields {
    pub fitness: Option<f64>,
    pub blosum_score: Option<f64>,
    pub interaction: Option<f64>,
    pub nfe: Option<u64>,
    pub elapsed_seconds: Option<f64>,
}

/// Fields recovered from a report, plus the format version if a header was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReport {
    pub version: Option<u32>,
    pub fields: ReportFields,
}

/// Writes the labelled fields, with free-form `body` lines between the scores and
/// the cost lines.
pub fn render(fields: &ReportFields, body: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} v{}", REPORT_HEADER, REPORT_VERSION);
    match (fields.fitness, fields.blosum_score, fields.interaction) {
        (Some(fitness), blosum, interaction) => {
            let _ = writeln!(out, "Fitness: {}", fitness);
            if let Some(blosum) = blosum {
                let _ = writeln!(out, "BlosumScore {}", blosum);
            }
            if let Some(interaction) = interaction {
                let _ = writeln!(out, "Interaction: {}", interaction);
            }
        }
        (None, _, _) => {
            let _ = writeln!(out, "{}", NO_SOLUTION);
        }
    }
    for line in body {
        let _ = writeln!(out, "{}", line);
    }
    if let Some(nfe) = fields.nfe {
        let _ = writeln!(out, "NFE: {}", nfe);
    }
    if let Some(elapsed) = fields.elapsed_seconds {
        let _ = writeln!(out, "--- {} seconds ---", elapsed);
    }
    out
}

fn capture<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts the labelled fields. The first occurrence of each label wins.
pub fn parse(text: &str) -> ParsedReport {
    ParsedReport {
        version: capture(&VERSION_RE, text),
        fields: ReportFields {
            fitness: capture(&FITNESS_RE, text),
            blosum_score: capture(&BLOSUM_RE, text),
            interaction: capture(&INTERACTION_RE, text),
            nfe: capture(&NFE_RE, text),
            elapsed_seconds: capture(&ELAPSED_RE, text),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_report() {
        let text = "bfoalign-report v1\nFitness: -12.5\nBlosumScore 10\nInteraction: -2.25e-1\n\
                    seq1  MK-\nNFE: 120\n--- 0.42 seconds ---\n";
        let parsed = parse(text);
        assert_eq!(parsed.version, Some(1));
        assert_eq!(parsed.fields.fitness, Some(-12.5));
        assert_eq!(parsed.fields.blosum_score, Some(10.0));
        assert_eq!(parsed.fields.interaction, Some(-0.225));
        assert_eq!(parsed.fields.nfe, Some(120));
        assert_eq!(parsed.fields.elapsed_seconds, Some(0.42));
    }

    #[test]
    fn test_missing_labels_stay_missing() {
        let parsed = parse("bfoalign-report v1\nNo valid solution found\nNFE: 0\n");
        assert_eq!(parsed.fields.fitness, None);
        assert_eq!(parsed.fields.blosum_score, None);
        assert_eq!(parsed.fields.nfe, Some(0));
        assert_eq!(parsed.fields.elapsed_seconds, None);
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let parsed = parse("Traceback (most recent call last):\n  Fitness: oops");
        assert_eq!(parsed, ParsedReport::default());
    }

    #[test]
    fn test_render_then_parse() {
        let fields = ReportFields {
            fitness: Some(3.5),
            blosum_score: Some(3.0),
            interaction: Some(0.5),
            nfe: Some(42),
            elapsed_seconds: Some(1.25),
        };
        let text = render(&fields, &["a  MK".to_string()]);
        assert!(text.starts_with("bfoalign-report v1\n"));
        assert_eq!(parse(&text).fields, fields);
    }

    #[test]
    fn test_render_without_solution() {
        let fields = ReportFields {
            nfe: Some(7),
            elapsed_seconds: Some(0.5),
            ..ReportFields::default()
        };
        let text = render(&fields, &[]);
        assert!(text.contains(NO_SOLUTION));
        assert!(!text.contains("Fitness:"));
    }
}
