/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use cleansubs::app_config::{Config, LogLevel};
use crate::common;

#[test]
fn test_default_config_shouldBeValid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.cleaning.mask_char, '*');
    assert_eq!(config.media.subtitle_language, "eng");
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{"cleaning": {"pad_secs": 0.5}, "outputs": {"edl": true}, "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.cleaning.pad_secs, 0.5);
    assert_eq!(config.pad_ms(), 500);
    assert!(config.outputs.edl);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.cleaning.mask_char, '*');
    assert_eq!(config.media.ffmpeg_timeout_secs, 4 * 60 * 60);
    Ok(())
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.cleaning.pad_secs = -1.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.cleaning.mask_char = ' ';
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.media.subtitle_language = "zz".into();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.media.subtitle_language = "fre".into();
    assert!(config.validate().is_ok());
}
