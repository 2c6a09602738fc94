/*!
 * Phrase matching over a single subtitle entry.
 *
 * Matching works on whitespace-separated tokens. A dictionary token matches a
 * text token when it equals the whole token or the token with its leading and
 * trailing punctuation trimmed, so `heck!` matches `heck` but `ashamed` never
 * matches `ash`. The scan is a single greedy left-to-right pass preferring the
 * longest phrase, and among phrases of equal length the rule loaded last.
 */

use std::ops::Range;

use log::{debug, trace};

use crate::dictionary::{Rule, RuleSet};
use crate::subtitle_processor::SubtitleEntry;

/// Default character used to mask matches without an explicit replacement
pub const DEFAULT_MASK_CHAR: char = '*';

/// One located match inside an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    /// Position of the entry in the input sequence
    pub entry_index: usize,
    /// Byte offset of the match start in the entry text
    pub start: usize,
    /// Byte offset one past the match end in the entry text
    pub end: usize,
    /// Index of the winning rule in the rule set
    pub rule_index: usize,
    /// Text substituted for the match
    pub replacement: String,
}

impl MatchSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// An entry together with its matches and scrubbed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedEntry {
    /// Position of the entry in the input sequence
    pub index: usize,
    /// The original entry, untouched
    pub entry: SubtitleEntry,
    /// Matches ordered by start, never overlapping
    pub spans: Vec<MatchSpan>,
    /// Entry text with every span replaced
    pub replacement_text: String,
}

impl MatchedEntry {
    /// Whether any rule matched this entry
    pub fn is_matched(&self) -> bool {
        !self.spans.is_empty()
    }

    pub fn original_text(&self) -> &str {
        &self.entry.text
    }

    /// Text covered by a span
    pub fn matched_text(&self, span: &MatchSpan) -> &str {
        &self.entry.text[span.range()]
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    index: usize,
    tokens: Vec<String>,
    case_sensitive: bool,
    replacement: Option<String>,
}

impl CompiledRule {
    fn compile(index: usize, rule: &Rule) -> Self {
        let tokens = rule
            .tokens()
            .map(|t| if rule.case_sensitive { t.to_string() } else { t.to_lowercase() })
            .collect();
        Self {
            index,
            tokens,
            case_sensitive: rule.case_sensitive,
            replacement: rule.replacement.clone(),
        }
    }
}

/// A whitespace-delimited token of entry text
#[derive(Debug)]
struct Token {
    full: Range<usize>,
    core: Option<Range<usize>>,
    full_lower: String,
    core_lower: Option<String>,
}

impl Token {
    fn new(text: &str, full: Range<usize>) -> Self {
        let slice = &text[full.clone()];
        let lead = slice.len() - slice.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
        let trimmed_end = slice.trim_end_matches(|c: char| !c.is_alphanumeric()).len();
        let core = (lead < trimmed_end).then(|| full.start + lead..full.start + trimmed_end);
        let core_lower = core.as_ref().map(|r| text[r.clone()].to_lowercase());

        Self {
            full_lower: slice.to_lowercase(),
            full,
            core,
            core_lower,
        }
    }

    /// Range of the form of this token matching `wanted`, if any
    fn matches(&self, text: &str, wanted: &str, case_sensitive: bool) -> Option<Range<usize>> {
        let (full, core) = if case_sensitive {
            (&text[self.full.clone()], self.core.as_ref().map(|r| &text[r.clone()]))
        } else {
            (self.full_lower.as_str(), self.core_lower.as_deref())
        };

        if full == wanted {
            Some(self.full.clone())
        } else if core == Some(wanted) {
            self.core.clone()
        } else {
            None
        }
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token::new(text, s..idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token::new(text, s..text.len()));
    }

    tokens
}

/// Matches entries against a loaded rule set.
///
/// A matcher is immutable and can be reused across any number of entries and
/// subtitle tracks.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Rules grouped by token count, each group ordered latest rule first
    by_length: Vec<Vec<CompiledRule>>,
    mask_char: char,
}

impl Matcher {
    pub fn new(rules: &RuleSet, mask_char: char) -> Self {
        let max_len = rules.rules().iter().map(Rule::token_count).max().unwrap_or(0);
        let mut by_length: Vec<Vec<CompiledRule>> = vec![Vec::new(); max_len + 1];

        for (index, rule) in rules.rules().iter().enumerate().rev() {
            let compiled = CompiledRule::compile(index, rule);
            if !compiled.tokens.is_empty() {
                by_length[compiled.tokens.len()].push(compiled);
            }
        }

        Self { by_length, mask_char }
    }

    /// Longest phrase length in tokens
    pub fn max_phrase_tokens(&self) -> usize {
        self.by_length.len().saturating_sub(1)
    }

    pub fn mask_char(&self) -> char {
        self.mask_char
    }

    /// Match every entry of a track
    pub fn match_entries(&self, entries: &[SubtitleEntry]) -> Vec<MatchedEntry> {
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.match_entry(index, entry))
            .collect()
    }

    /// Match one entry
    pub fn match_entry(&self, index: usize, entry: &SubtitleEntry) -> MatchedEntry {
        let text = entry.text.as_str();
        let tokens = tokenize(text);
        let mut spans = Vec::new();

        let mut pos = 0;
        while pos < tokens.len() {
            match self.longest_match_at(text, &tokens[pos..]) {
                Some((rule, token_ranges)) => {
                    let replacement = match &rule.replacement {
                        Some(explicit) => explicit.clone(),
                        None => self.mask(text, &token_ranges),
                    };
                    let span = MatchSpan {
                        entry_index: index,
                        start: token_ranges[0].start,
                        end: token_ranges[token_ranges.len() - 1].end,
                        rule_index: rule.index,
                        replacement,
                    };
                    trace!("Entry {} matched rule {} at {:?}", entry.seq_num, rule.index, span.range());
                    pos += token_ranges.len();
                    spans.push(span);
                }
                None => pos += 1,
            }
        }

        let replacement_text = apply_spans(text, &spans);
        if !spans.is_empty() {
            debug!("Entry {}: {:?} -> {:?}", entry.seq_num, text, replacement_text);
        }

        MatchedEntry {
            index,
            entry: entry.clone(),
            spans,
            replacement_text,
        }
    }

    fn longest_match_at<'a>(
        &'a self,
        text: &str,
        tokens: &[Token],
    ) -> Option<(&'a CompiledRule, Vec<Range<usize>>)> {
        let longest = self.max_phrase_tokens().min(tokens.len());

        for len in (1..=longest).rev() {
            for rule in &self.by_length[len] {
                let ranges: Option<Vec<Range<usize>>> = rule
                    .tokens
                    .iter()
                    .zip(&tokens[..len])
                    .map(|(wanted, token)| token.matches(text, wanted, rule.case_sensitive))
                    .collect();
                if let Some(ranges) = ranges {
                    return Some((rule, ranges));
                }
            }
        }

        None
    }

    fn mask(&self, text: &str, token_ranges: &[Range<usize>]) -> String {
        token_ranges
            .iter()
            .map(|range| {
                let width = text[range.clone()].chars().filter(|c| !c.is_whitespace()).count();
                std::iter::repeat_n(self.mask_char, width).collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Replace every span of `text`; spans must be ordered and disjoint
fn apply_spans(text: &str, spans: &[MatchSpan]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&text[last..span.start]);
        out.push_str(&span.replacement);
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}
