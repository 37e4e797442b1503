//! Lexical intent classification.
//!
//! Maps request text to a coarse intent (code, reasoning, general) using a
//! static table of weighted keyword patterns. Classification is pure,
//! deterministic, and adds no latency beyond substring scanning; semantic
//! (embedding-based) classification is deliberately out of scope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse request category used to pick a primary endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Code,
    Reasoning,
    General,
}

impl Intent {
    /// Stable string label, also used as the key in the routing intent map.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Code => "code",
            Intent::Reasoning => "reasoning",
            Intent::General => "general",
        }
    }

    /// Fixed tie-break priority: code > reasoning > general.
    ///
    /// Applied when two intents score exactly equal so the winner never
    /// depends on map iteration order.
    fn priority(&self) -> u8 {
        match self {
            Intent::Code => 3,
            Intent::Reasoning => 2,
            Intent::General => 1,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence band for a classification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    Unclassified,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.7 {
            ConfidenceBand::High
        } else if confidence >= 0.4 {
            ConfidenceBand::Medium
        } else if confidence >= 0.2 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::Unclassified
        }
    }
}

/// Result of classifying one request. Produced fresh per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f32,
}

impl Classification {
    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }
}

/// Static pattern table: (lowercase substring, weight, intent).
///
/// Loaded once at compile time; weights express how strongly a pattern
/// signals its intent relative to the others.
const PATTERNS: &[(&str, f32, Intent)] = &[
    // Code
    ("write a function", 1.0, Intent::Code),
    ("write a program", 1.0, Intent::Code),
    ("implement", 0.8, Intent::Code),
    ("refactor", 0.9, Intent::Code),
    ("debug", 0.9, Intent::Code),
    ("compile", 0.8, Intent::Code),
    ("unit test", 0.8, Intent::Code),
    ("stack trace", 0.8, Intent::Code),
    ("linked list", 0.9, Intent::Code),
    ("algorithm", 0.7, Intent::Code),
    ("regex", 0.9, Intent::Code),
    ("function", 0.6, Intent::Code),
    ("code", 0.6, Intent::Code),
    ("python", 0.8, Intent::Code),
    ("javascript", 0.8, Intent::Code),
    ("typescript", 0.8, Intent::Code),
    (" sql", 0.8, Intent::Code),
    ("snippet", 0.7, Intent::Code),
    ("syntax error", 0.9, Intent::Code),
    // Reasoning
    ("prove", 1.0, Intent::Reasoning),
    ("theorem", 0.9, Intent::Reasoning),
    ("deduce", 0.9, Intent::Reasoning),
    ("derive", 0.8, Intent::Reasoning),
    ("step by step", 0.7, Intent::Reasoning),
    ("explain why", 0.8, Intent::Reasoning),
    ("why does", 0.7, Intent::Reasoning),
    ("logic puzzle", 0.9, Intent::Reasoning),
    ("paradox", 0.8, Intent::Reasoning),
    ("hypothesis", 0.8, Intent::Reasoning),
    ("compare and contrast", 0.8, Intent::Reasoning),
    ("analyze", 0.6, Intent::Reasoning),
    ("reasoning", 0.7, Intent::Reasoning),
    ("square root", 0.5, Intent::Reasoning),
    ("irrational", 0.6, Intent::Reasoning),
    // General
    ("weather", 0.6, Intent::General),
    ("recommend", 0.5, Intent::General),
    ("summarize", 0.5, Intent::General),
    ("translate", 0.6, Intent::General),
    ("tell me about", 0.5, Intent::General),
    ("write a poem", 0.7, Intent::General),
    ("write a story", 0.7, Intent::General),
    ("joke", 0.6, Intent::General),
    ("hello", 0.5, Intent::General),
    ("recipe", 0.6, Intent::General),
];

/// Classify request text into an intent with a confidence in [0, 1].
///
/// Score per intent is the sum of matched pattern weights; confidence is the
/// winner's share of all matched weight, clamped to [0, 1]. Results below
/// the low band (0.2) are treated as unclassified and demoted to
/// [`Intent::General`]. Empty or whitespace-only input always yields
/// (general, 0.0) and never errors.
pub fn classify(text: &str) -> Classification {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return Classification {
            intent: Intent::General,
            confidence: 0.0,
        };
    }

    let mut scores: [(Intent, f32); 3] = [
        (Intent::Code, 0.0),
        (Intent::Reasoning, 0.0),
        (Intent::General, 0.0),
    ];

    for (pattern, weight, intent) in PATTERNS {
        if normalized.contains(pattern) {
            for (candidate, score) in scores.iter_mut() {
                if candidate == intent {
                    *score += weight;
                }
            }
        }
    }

    let total: f32 = scores.iter().map(|(_, s)| s).sum();
    if total <= 0.0 {
        return Classification {
            intent: Intent::General,
            confidence: 0.0,
        };
    }

    // Winner by score, then by fixed priority on an exact tie.
    let (winner, raw) = scores
        .iter()
        .copied()
        .max_by(|(a, sa), (b, sb)| {
            sa.partial_cmp(sb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.priority().cmp(&b.priority()))
        })
        .unwrap_or((Intent::General, 0.0));

    let confidence = (raw / total).clamp(0.0, 1.0);

    if ConfidenceBand::from_confidence(confidence) == ConfidenceBand::Unclassified {
        return Classification {
            intent: Intent::General,
            confidence,
        };
    }

    Classification {
        intent: winner,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_code_request() {
        let result = classify("Write a function to reverse a linked list");
        assert_eq!(result.intent, Intent::Code);
        assert!(result.confidence >= 0.4, "confidence {}", result.confidence);
    }

    #[test]
    fn classifies_reasoning_request() {
        let result = classify("Prove that the square root of 2 is irrational");
        assert_eq!(result.intent, Intent::Reasoning);
        assert!(result.confidence >= 0.4);
    }

    #[test]
    fn classifies_general_request() {
        let result = classify("What's the weather like today?");
        assert_eq!(result.intent, Intent::General);
    }

    #[test]
    fn empty_input_defaults_to_general_with_zero_confidence() {
        for input in ["", "   ", "\n\t "] {
            let result = classify(input);
            assert_eq!(result.intent, Intent::General);
            assert_eq!(result.confidence, 0.0);
        }
    }

    #[test]
    fn unmatched_input_defaults_to_general() {
        let result = classify("qwertyuiop zxcvbnm");
        assert_eq!(result.intent, Intent::General);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn equal_scores_break_ties_by_declared_priority() {
        // "function" (code, 0.6) ties "weather" (general, 0.6).
        let result = classify("function weather");
        assert_eq!(result.intent, Intent::Code);
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reasoning_beats_general_on_equal_score() {
        // "translate" (general, 0.6) vs "irrational" (reasoning, 0.6).
        let result = classify("translate irrational");
        assert_eq!(result.intent, Intent::Reasoning);
    }

    #[test]
    fn single_intent_match_yields_full_confidence() {
        let result = classify("please debug this for me");
        assert_eq!(result.intent, Intent::Code);
        assert!((result.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceBand::from_confidence(0.9), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.7), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.5), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.25), ConfidenceBand::Low);
        assert_eq!(
            ConfidenceBand::from_confidence(0.1),
            ConfidenceBand::Unclassified
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let a = classify("implement a regex parser in python");
        let b = classify("implement a regex parser in python");
        assert_eq!(a, b);
    }

    #[test]
    fn intent_serde_labels() {
        assert_eq!(serde_json::to_string(&Intent::Code).unwrap(), "\"code\"");
        assert_eq!(
            serde_json::to_string(&Intent::Reasoning).unwrap(),
            "\"reasoning\""
        );
        assert_eq!(
            serde_json::to_string(&Intent::General).unwrap(),
            "\"general\""
        );
    }
}
