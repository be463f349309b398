//! The two per-item scoring methods.
//!
//! `compound_score` sums word valences and squashes the total into [-1, 1],
//! so several mildly positive words add up. `polarity_score` averages the
//! valences it finds, so it measures tone rather than volume. Both run on
//! cleaned text.

use super::lexicon::Lexicon;

/// Normalization constant for the compound squash `s / sqrt(s^2 + alpha)`
const COMPOUND_ALPHA: f64 = 15.0;
/// Negated valence multiplier for the compound method
const COMPOUND_NEGATION: f64 = -0.74;
/// Negated valence multiplier for the polarity method
const POLARITY_NEGATION: f64 = -0.5;
/// How many tokens back a negation still applies
const NEGATION_WINDOW: usize = 3;

/// Strip URLs, drop everything except ASCII letters and whitespace, lowercase
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        // A URL runs from "http" to the end of its token
        .map(|token| token.find("http").map_or(token, |at| &token[..at]))
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_ascii_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Valences of the sentiment words in `text`, after intensifiers and negation
fn weighted_valences(lexicon: &Lexicon, text: &str, negation_factor: f64) -> Vec<f64> {
    let cleaned = clean_text(text);
    let tokens: Vec<&str> = cleaned.split(' ').filter(|t| !t.is_empty()).collect();
    let mut valences = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let Some(mut valence) = lexicon.valence(token) else {
            continue;
        };

        if i > 0 {
            if let Some(multiplier) = lexicon.intensifier(tokens[i - 1]) {
                valence *= multiplier;
            }
        }

        let window_start = i.saturating_sub(NEGATION_WINDOW);
        if tokens[window_start..i].iter().any(|t| lexicon.is_negation(t)) {
            valence *= negation_factor;
        }

        valences.push(valence);
    }

    valences
}

/// Lexicon compound score in [-1, 1]
pub fn compound_score(lexicon: &Lexicon, text: &str) -> f64 {
    let sum: f64 = weighted_valences(lexicon, text, COMPOUND_NEGATION)
        .iter()
        .sum();

    if sum == 0.0 {
        return 0.0;
    }

    (sum / (sum * sum + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Mean word polarity in [-1, 1]
pub fn polarity_score(lexicon: &Lexicon, text: &str) -> f64 {
    let valences = weighted_valences(lexicon, text, POLARITY_NEGATION);

    if valences.is_empty() {
        return 0.0;
    }

    let mean = valences.iter().sum::<f64>() / valences.len() as f64;
    mean.clamp(-1.0, 1.0)
}

/// Average of both methods, the score of one feed item
pub fn item_score(lexicon: &Lexicon, text: &str) -> f64 {
    ((compound_score(lexicon, text) + polarity_score(lexicon, text)) / 2.0).clamp(-1.0, 1.0)
}
