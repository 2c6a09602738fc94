/*!
 * Profanity dictionary loading.
 *
 * A dictionary is a line-oriented text resource:
 *
 * ```text
 * # comment
 * heck
 * heck => darn
 * oh my god => gosh
 * !Dick => Richard
 * legacy|mapped
 * ```
 *
 * A leading `!` makes the rule case-sensitive. Lines without `=>` may use `|`
 * as the delimiter. Malformed lines are skipped and reported through
 * `RuleSet::skipped_lines`, never as an error.
 */

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::errors::CleanError;
use crate::subtitle_processor::decode_subtitle_bytes;

/// Marker starting a comment line
pub const COMMENT_MARKER: char = '#';

/// Delimiter between phrase and replacement
pub const REPLACEMENT_DELIMITER: &str = "=>";

/// Delimiter accepted when `=>` is absent
pub const LEGACY_DELIMITER: char = '|';

/// Prefix marking a case-sensitive phrase
pub const CASE_SENSITIVE_MARKER: char = '!';

/// A single matching rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Phrase as written in the dictionary (trimmed)
    pub phrase: String,
    /// Explicit replacement text, if any
    pub replacement: Option<String>,
    /// Whether matching respects case
    pub case_sensitive: bool,
    /// 1-based line of origin (0 for rules built in code)
    pub line_number: usize,
}

impl Rule {
    /// Create a case-insensitive rule
    pub fn new(phrase: impl Into<String>, replacement: Option<&str>) -> Self {
        Self {
            phrase: phrase.into().trim().to_string(),
            replacement: replacement.map(|r| r.to_string()),
            case_sensitive: false,
            line_number: 0,
        }
    }

    /// Set case sensitivity
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Whitespace-separated tokens of the phrase
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.phrase.split_whitespace()
    }

    /// Number of tokens in the phrase
    pub fn token_count(&self) -> usize {
        self.tokens().count()
    }
}

/// Ordered rules loaded from one dictionary source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    skipped_lines: Vec<usize>,
}

impl RuleSet {
    /// Build a rule set from rules already in memory
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let (rules, skipped): (Vec<Rule>, Vec<Rule>) =
            rules.into_iter().partition(|r| !r.phrase.trim().is_empty());
        Self {
            rules,
            skipped_lines: skipped.into_iter().map(|r| r.line_number).collect(),
        }
    }

    /// Rules in load order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// 1-based line numbers of malformed lines that were skipped
    pub fn skipped_lines(&self) -> &[usize] {
        &self.skipped_lines
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Effective replacement for a phrase after last-wins resolution.
    ///
    /// Returns `None` when no rule has this phrase, `Some(None)` when the
    /// winning rule masks.
    pub fn effective_replacement(&self, phrase: &str) -> Option<Option<&str>> {
        let exact: Vec<&str> = phrase.split_whitespace().collect();
        let folded: Vec<String> = exact.iter().map(|t| t.to_lowercase()).collect();
        self.rules
            .iter()
            .rev()
            .find(|rule| {
                if rule.case_sensitive {
                    rule.tokens().eq(exact.iter().copied())
                } else {
                    rule.tokens().map(str::to_lowercase).eq(folded.iter().cloned())
                }
            })
            .map(|rule| rule.replacement.as_deref())
    }
}

/// Load a dictionary file.
///
/// Fails with `CleanError::Config` when the file cannot be read.
pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<RuleSet, CleanError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        CleanError::config(format!("Failed to read profanity list {}: {}", path.display(), e))
    })?;

    let rule_set = parse_rules(&decode_subtitle_bytes(&bytes));
    info!(
        "Loaded {} profanity rules from {} ({} lines skipped)",
        rule_set.len(),
        path.display(),
        rule_set.skipped_lines.len()
    );
    Ok(rule_set)
}

/// Parse dictionary content. Never fails; malformed lines are skipped.
pub fn parse_rules(content: &str) -> RuleSet {
    let mut rules = Vec::new();
    let mut skipped_lines = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        match parse_line(line, line_number) {
            Some(rule) => rules.push(rule),
            None => {
                warn!("Skipping malformed profanity rule at line {}: {:?}", line_number, raw_line);
                skipped_lines.push(line_number);
            }
        }
    }

    debug!("Parsed {} rules, skipped {} lines", rules.len(), skipped_lines.len());
    RuleSet { rules, skipped_lines }
}

fn parse_line(line: &str, line_number: usize) -> Option<Rule> {
    let (phrase_part, replacement_part) = match line.split_once(REPLACEMENT_DELIMITER) {
        Some((phrase, replacement)) => (phrase, Some(replacement)),
        None => match line.split_once(LEGACY_DELIMITER) {
            Some((phrase, replacement)) => (phrase, Some(replacement)),
            None => (line, None),
        },
    };

    let mut phrase = phrase_part.trim();
    let case_sensitive = phrase.starts_with(CASE_SENSITIVE_MARKER);
    if case_sensitive {
        phrase = phrase[CASE_SENSITIVE_MARKER.len_utf8()..].trim_start();
    }

    if phrase.is_empty() {
        return None;
    }

    let replacement = replacement_part
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    Some(Rule {
        phrase: phrase.to_string(),
        replacement,
        case_sensitive,
        line_number,
    })
}
