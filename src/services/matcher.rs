//! Fuzzy matching between certificate rows and the files in the Drive folder.
//!
//! Each candidate file is scored by a chain of strategies evaluated in a
//! fixed priority order; a weaker strategy only runs while the score so far
//! stays under its gate:
//!
//! 1. normalized reference vs. file name (exact or containment)
//! 2. title similarity (word overlap), gated by `title_gate`
//! 3. technology keyword families, gated by `keyword_gate`
//! 4. reference rules and topic patterns, gated by `pattern_gate`
//!
//! The best candidate across the folder wins, ties keep the earlier file.
//! All constants and dictionaries live in [`MatcherConfig`] so they can be
//! recalibrated without touching the engine.

use crate::models::drive_file::DriveFile;
use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Extensions stripped from file names before comparison.
const ASSET_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "pdf"];

/// A set of spellings that all refer to the same technology.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeywordFamily {
    pub name: String,
    pub variants: Vec<String>,
}

/// Fires when both the reference and the file name contain `needle`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReferenceRule {
    pub needle: String,
    pub score: f64,
}

/// Fires when the title or reference mentions one of `keywords` and the
/// file name contains one of `file_patterns`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicPattern {
    pub keywords: Vec<String>,
    pub file_patterns: Vec<String>,
    pub score: f64,
}

/// Scores, gates and dictionaries used by [`Matcher`].
///
/// `Default` carries the values the portfolio has been running with. They
/// were tuned by hand against one certificates folder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum score for a match to be attached to a certificate.
    pub acceptance_threshold: f64,
    pub exact_score: f64,
    pub containment_score: f64,
    /// Title similarity only runs while the score is below this gate.
    pub title_gate: f64,
    pub title_weight: f64,
    pub keyword_gate: f64,
    pub keyword_score: f64,
    pub pattern_gate: f64,
    pub technologies: Vec<KeywordFamily>,
    pub reference_rules: Vec<ReferenceRule>,
    pub topics: Vec<TopicPattern>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn family(name: &str, variants: &[&str]) -> KeywordFamily {
    KeywordFamily {
        name: name.to_string(),
        variants: strings(variants),
    }
}

fn topic(keywords: &[&str], file_patterns: &[&str], score: f64) -> TopicPattern {
    TopicPattern {
        keywords: strings(keywords),
        file_patterns: strings(file_patterns),
        score,
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.3,
            exact_score: 1.0,
            containment_score: 0.9,
            title_gate: 0.6,
            title_weight: 0.8,
            keyword_gate: 0.5,
            keyword_score: 0.8,
            pattern_gate: 0.3,
            technologies: vec![
                family("cypress", &["cypress", "cy"]),
                family("robot", &["robot", "framework"]),
                family("docker", &["docker", "container"]),
                family("postman", &["postman", "api"]),
                family("selenium", &["selenium", "webdriver"]),
                family("java", &["java", "jdk"]),
                family("python", &["python", "py"]),
                family("javascript", &["javascript", "js", "node"]),
                family("react", &["react", "reactjs"]),
                family("angular", &["angular", "ng"]),
            ],
            reference_rules: vec![
                ReferenceRule {
                    needle: "teste001".into(),
                    score: 0.95,
                },
                ReferenceRule {
                    needle: "qa".into(),
                    score: 0.9,
                },
            ],
            topics: vec![
                topic(&["marketing", "digital"], &["marketing", "digital", "mkt"], 0.7),
                topic(
                    &["workshop", "ia", "inteligencia", "artificial"],
                    &["ia", "ai", "workshop"],
                    0.7,
                ),
                topic(
                    &["proficiencia", "idioma", "ingles", "cambridge"],
                    &["lang", "english", "cambridge"],
                    0.7,
                ),
                topic(&["design", "grafico", "visual"], &["design", "grafico", "visual"], 0.7),
                topic(&["qa", "quality", "teste", "testing"], &["qa", "test", "quality"], 0.8),
            ],
        }
    }
}

/// Which strategy produced a candidate's score.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    None,
    Exact,
    Containment,
    TitleSimilarity,
    TechKeywords,
    Pattern,
}

/// Best candidate for one certificate. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    pub file: Option<&'a DriveFile>,
    pub score: f64,
    pub strategy: MatchStrategy,
}

impl<'a> MatchResult<'a> {
    /// The matched file, only when the score reaches `threshold`.
    pub fn accepted(&self, threshold: f64) -> Option<&'a DriveFile> {
        self.file.filter(|_| self.score >= threshold)
    }
}

/// Lowercase and strip diacritics, keeping everything else.
pub fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Fold, then keep only ASCII letters and digits.
pub fn normalize(value: &str) -> String {
    fold(value)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Folded words longer than two characters.
fn significant_words(value: &str) -> Vec<String> {
    fold(value)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| word.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Drop a trailing image/PDF extension from a file name.
pub fn strip_asset_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if ASSET_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name,
    }
}

/// Similarity in [0, 1] between two free-text strings.
///
/// Identical normalized forms score 1, containment scores the length ratio,
/// otherwise the share of common significant words.
pub fn similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    if norm_a == norm_b {
        return 1.0;
    }
    if norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        let (shorter, longer) = if norm_a.len() < norm_b.len() {
            (norm_a.len(), norm_b.len())
        } else {
            (norm_b.len(), norm_a.len())
        };
        return shorter as f64 / longer as f64;
    }

    let words_a = significant_words(a);
    let words_b = significant_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let common = words_a.iter().filter(|word| words_b.contains(word)).count();
    common as f64 / words_a.len().max(words_b.len()) as f64
}

#[derive(Clone, Debug, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn threshold(&self) -> f64 {
        self.config.acceptance_threshold
    }

    /// Pick the highest scoring file for a certificate.
    ///
    /// Deterministic for a given input: files are visited in slice order and
    /// only a strictly higher score replaces the current best.
    pub fn find_best_match<'a>(
        &self,
        certificate_ref: &str,
        title: &str,
        files: &'a [DriveFile],
    ) -> MatchResult<'a> {
        let mut best = MatchResult {
            file: None,
            score: 0.0,
            strategy: MatchStrategy::None,
        };

        for file in files {
            let (score, strategy) = self.score_candidate(certificate_ref, title, &file.name);
            tracing::trace!("  {} => {:.3} ({:?})", file.name, score, strategy);

            if score > best.score {
                best = MatchResult {
                    file: Some(file),
                    score,
                    strategy,
                };
            }
        }

        best
    }

    /// Score one file name against a certificate reference and title.
    pub fn score_candidate(
        &self,
        certificate_ref: &str,
        title: &str,
        file_name: &str,
    ) -> (f64, MatchStrategy) {
        let cfg = &self.config;
        let stem = strip_asset_extension(file_name);
        let mut score = 0.0;
        let mut strategy = MatchStrategy::None;

        let ref_norm = normalize(certificate_ref);
        let stem_norm = normalize(stem);
        if !ref_norm.is_empty() && !stem_norm.is_empty() {
            if ref_norm == stem_norm {
                score = cfg.exact_score;
                strategy = MatchStrategy::Exact;
            } else if ref_norm.contains(&stem_norm) || stem_norm.contains(&ref_norm) {
                score = cfg.containment_score;
                strategy = MatchStrategy::Containment;
            }
        }

        if score < cfg.title_gate && !title.trim().is_empty() {
            let weighted = similarity(title, stem) * cfg.title_weight;
            if weighted > score {
                score = weighted;
                strategy = MatchStrategy::TitleSimilarity;
            }
        }

        if score < cfg.keyword_gate {
            let keyword = self.keyword_score(&format!("{} {}", title, certificate_ref), stem);
            if keyword > score {
                score = keyword;
                strategy = MatchStrategy::TechKeywords;
            }
        }

        if score < cfg.pattern_gate {
            let pattern = self.pattern_score(certificate_ref, title, stem);
            if pattern > score {
                score = pattern;
                strategy = MatchStrategy::Pattern;
            }
        }

        (score, strategy)
    }

    fn keyword_score(&self, text: &str, stem: &str) -> f64 {
        let text_norm = normalize(text);
        let stem_norm = normalize(stem);

        let shared = self.config.technologies.iter().any(|family| {
            let in_text = family.variants.iter().any(|v| text_norm.contains(v.as_str()));
            let in_stem = family.variants.iter().any(|v| stem_norm.contains(v.as_str()));
            in_text && in_stem
        });

        if shared { self.config.keyword_score } else { 0.0 }
    }

    fn pattern_score(&self, certificate_ref: &str, title: &str, stem: &str) -> f64 {
        let ref_folded = fold(certificate_ref);
        let title_folded = fold(title);
        let stem_folded = fold(stem);

        if !ref_folded.is_empty() {
            for rule in &self.config.reference_rules {
                if ref_folded.contains(&rule.needle) && stem_folded.contains(&rule.needle) {
                    return rule.score;
                }
            }
        }

        for pattern in &self.config.topics {
            let mentions_topic = pattern
                .keywords
                .iter()
                .any(|k| title_folded.contains(k.as_str()) || ref_folded.contains(k.as_str()));
            let file_matches = pattern
                .file_patterns
                .iter()
                .any(|p| stem_folded.contains(p.as_str()));

            if mentions_topic && file_matches {
                return pattern.score;
            }
        }

        0.0
    }
}
