/*!
 * Tests for error types and their messages
 */

use cleansubs::errors::{AppError, CleanError, MediaError};

#[test]
fn test_cleanError_config_shouldCarryMessage() {
    let err = CleanError::config("bad file");
    assert_eq!(err.to_string(), "Configuration error: bad file");
    assert_eq!(err, CleanError::Config { message: "bad file".to_string() });
}

#[test]
fn test_cleanError_ordering_shouldNameEntryAndTimes() {
    let err = CleanError::Ordering { index: 3, start_ms: 1000, previous_start_ms: 2000 };
    let message = err.to_string();
    assert!(message.contains("entry 3"));
    assert!(message.contains("1000ms"));
    assert!(message.contains("2000ms"));
}

#[test]
fn test_appError_fromCleanError_shouldBeTransparent() {
    let clean = CleanError::validation("content_id", "missing");
    let app: AppError = clean.clone().into();
    assert_eq!(app.to_string(), clean.to_string());
    assert!(matches!(app, AppError::Clean(_)));
}

#[test]
fn test_appError_fromMediaAndIo_shouldWrap() {
    let app: AppError = MediaError::Timeout { tool: "ffmpeg", secs: 5 }.into();
    assert!(app.to_string().contains("ffmpeg timed out after 5 seconds"));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let app: AppError = io.into();
    assert!(matches!(app, AppError::File(_)));
}
