use std::collections::{HashMap, HashSet};

/// Word valences shared by both scorers
///
/// Valences are on a [-1, 1] scale. Entries lean toward crypto and market
/// vocabulary since that is what the feeds carry.
#[derive(Debug, Clone)]
pub struct Lexicon {
    words: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
    intensifiers: HashMap<&'static str, f64>,
}

const POSITIVE: &[(&str, f64)] = &[
    ("bullish", 0.8),
    ("bull", 0.6),
    ("moon", 0.7),
    ("mooning", 0.8),
    ("surge", 0.7),
    ("surges", 0.7),
    ("surging", 0.7),
    ("rally", 0.7),
    ("rallies", 0.7),
    ("soar", 0.8),
    ("soars", 0.8),
    ("gain", 0.5),
    ("gains", 0.5),
    ("profit", 0.6),
    ("profits", 0.6),
    ("growth", 0.6),
    ("rise", 0.5),
    ("rises", 0.5),
    ("rising", 0.5),
    ("up", 0.2),
    ("high", 0.3),
    ("higher", 0.4),
    ("record", 0.5),
    ("breakout", 0.6),
    ("adoption", 0.5),
    ("approval", 0.6),
    ("approved", 0.6),
    ("upgrade", 0.5),
    ("strong", 0.5),
    ("positive", 0.5),
    ("optimistic", 0.6),
    ("confident", 0.5),
    ("good", 0.5),
    ("great", 0.7),
    ("excellent", 0.8),
    ("win", 0.6),
    ("winning", 0.6),
    ("recovery", 0.5),
    ("rebound", 0.5),
    ("accumulate", 0.4),
    ("buy", 0.4),
    ("support", 0.3),
    ("success", 0.6),
    ("successful", 0.6),
    ("boost", 0.5),
    ("love", 0.6),
    ("hodl", 0.4),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bearish", -0.8),
    ("bear", -0.6),
    ("crash", -0.9),
    ("crashes", -0.9),
    ("crashing", -0.9),
    ("plunge", -0.8),
    ("plunges", -0.8),
    ("dump", -0.7),
    ("dumping", -0.7),
    ("drop", -0.6),
    ("drops", -0.6),
    ("fall", -0.5),
    ("falls", -0.5),
    ("falling", -0.5),
    ("down", -0.2),
    ("low", -0.3),
    ("lower", -0.4),
    ("decline", -0.6),
    ("declines", -0.6),
    ("loss", -0.6),
    ("losses", -0.6),
    ("weak", -0.5),
    ("negative", -0.5),
    ("pessimistic", -0.6),
    ("fear", -0.6),
    ("panic", -0.8),
    ("risk", -0.3),
    ("risky", -0.4),
    ("volatile", -0.3),
    ("uncertainty", -0.5),
    ("concern", -0.4),
    ("concerns", -0.4),
    ("worry", -0.5),
    ("selloff", -0.7),
    ("sell", -0.4),
    ("liquidation", -0.6),
    ("liquidated", -0.6),
    ("hack", -0.9),
    ("hacked", -0.9),
    ("exploit", -0.8),
    ("scam", -0.9),
    ("fraud", -0.9),
    ("ban", -0.7),
    ("banned", -0.7),
    ("lawsuit", -0.6),
    ("crackdown", -0.7),
    ("bad", -0.5),
    ("terrible", -0.8),
    ("fail", -0.7),
    ("failure", -0.7),
    ("collapse", -0.9),
    ("bankrupt", -0.9),
    ("bankruptcy", -0.9),
    ("warning", -0.5),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "none", "nothing", "cannot", "cant", "dont",
    "doesnt", "didnt", "wont", "wouldnt", "shouldnt", "couldnt", "isnt", "arent", "wasnt",
    "werent", "hardly", "barely", "without",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("extremely", 1.5),
    ("highly", 1.3),
    ("massive", 1.4),
    ("massively", 1.4),
    ("huge", 1.3),
    ("hugely", 1.3),
    ("really", 1.2),
    ("super", 1.3),
    ("incredibly", 1.5),
    ("slightly", 0.6),
    ("somewhat", 0.7),
    ("barely", 0.5),
    ("marginally", 0.6),
];

impl Lexicon {
    pub fn new() -> Self {
        Self {
            words: POSITIVE.iter().chain(NEGATIVE.iter()).copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    /// Valence of a lowercase word, if it carries sentiment
    pub fn valence(&self, word: &str) -> Option<f64> {
        self.words.get(word).copied()
    }

    pub fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(word)
    }

    /// Multiplier applied to the next sentiment word
    pub fn intensifier(&self, word: &str) -> Option<f64> {
        self.intensifiers.get(word).copied()
    }

    /// Add or override a word valence
    pub fn with_word(mut self, word: &'static str, valence: f64) -> Self {
        self.words.insert(word, valence.clamp(-1.0, 1.0));
        self
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}
