/*!
 * Tests for rule file loading
 */

use anyhow::Result;
use cleansubs::dictionary::{load_rules, parse_rules, Rule, RuleSet};
use crate::common;

#[test]
fn test_loadRules_withBomPrefixedFile_shouldParseFirstRule() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("swears.txt");
    std::fs::write(&path, b"\xEF\xBB\xBFheck\nshoot => shucks\n")?;

    let rules = load_rules(&path)?;

    assert_eq!(rules.len(), 2);
    assert_eq!(rules.rules()[0].phrase, "heck");
    assert_eq!(rules.effective_replacement("shoot"), Some(Some("shucks")));
    Ok(())
}

#[test]
fn test_parseRules_withMalformedLines_shouldReportLineNumbers() {
    let rules = parse_rules("heck\n=> orphan\n|\ndarn\n");

    assert_eq!(rules.len(), 2);
    assert_eq!(rules.skipped_lines(), &[2, 3]);
}

#[test]
fn test_ruleSet_fromRules_withBlankPhrase_shouldDropIt() {
    let rules = RuleSet::from_rules(vec![
        Rule::new("heck", None),
        Rule::new("   ", Some("x")),
        Rule::new("Dick", Some("Richard")).with_case_sensitive(true),
    ]);

    assert_eq!(rules.len(), 2);
    assert_eq!(rules.rules()[1].token_count(), 1);
    assert!(rules.rules()[1].case_sensitive);
}

#[test]
fn test_parseRules_withMultiTokenPhrase_shouldCountTokens() {
    let rules = parse_rules("oh   my  god => gosh\n");
    assert_eq!(rules.rules()[0].token_count(), 3);
    assert_eq!(rules.effective_replacement("oh my god"), Some(Some("gosh")));
}

#[test]
fn test_effectiveReplacement_withCaseSensitiveRule_shouldMatchExactCaseOnly() {
    let rules = parse_rules("!Dick => Richard\nheck => darn\n");

    assert_eq!(rules.effective_replacement("Dick"), Some(Some("Richard")));
    assert_eq!(rules.effective_replacement("dick"), None);
    assert_eq!(rules.effective_replacement("HECK"), Some(Some("darn")));
}

#[test]
fn test_effectiveReplacement_shouldAgreeWithMatcher() {
    use cleansubs::matcher::{Matcher, DEFAULT_MASK_CHAR};
    use cleansubs::subtitle_processor::SubtitleEntry;

    let rules = parse_rules("!Dick => Richard\n");
    let matcher = Matcher::new(&rules, DEFAULT_MASK_CHAR);
    let matched = matcher.match_entry(0, &SubtitleEntry::new(1, 0, 1000, "Dick".to_string()));

    assert_eq!(matched.replacement_text, "Richard");
    assert_eq!(rules.effective_replacement("Dick"), Some(Some("Richard")));
}
