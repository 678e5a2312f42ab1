// Wake and end phrase matcher tests

use voice_session::matcher::{DEFAULT_END_PATTERNS, DEFAULT_WAKE_PATTERNS};
use voice_session::{EndPhraseMatcher, WakePhraseMatcher};

#[test]
fn test_wake_phrase_splits_command() {
    let matcher = WakePhraseMatcher::with_defaults().unwrap();

    let m = matcher.detect("비비야 오늘 날씨 어때").unwrap();
    assert_eq!(m.command, "오늘 날씨 어때");
}

#[test]
fn test_bare_wake_phrase_has_empty_command() {
    let matcher = WakePhraseMatcher::with_defaults().unwrap();

    let m = matcher.detect("비비야").unwrap();
    assert_eq!(m.command, "");
}

#[test]
fn test_recognizer_variants_match() {
    let matcher = WakePhraseMatcher::with_defaults().unwrap();

    for text in ["베비야 불 켜", "BB야 불 켜", "비비 야 불 켜", "피피야 불 켜"] {
        let m = matcher
            .detect(text)
            .unwrap_or_else(|| panic!("no match for {}", text));
        assert_eq!(m.command, "불 켜", "wrong command for {}", text);
    }
}

#[test]
fn test_no_wake_phrase() {
    let matcher = WakePhraseMatcher::with_defaults().unwrap();

    assert!(matcher.detect("오늘 날씨 어때").is_none());
    assert!(matcher.detect("").is_none());
    assert!(matcher.detect("   ").is_none());
}

#[test]
fn test_first_pattern_in_priority_order_wins() {
    // "삐삐야" appears earlier in the text, but "비비야" has higher priority
    let matcher = WakePhraseMatcher::with_defaults().unwrap();

    let m = matcher.detect("삐삐야 비비야 불 켜").unwrap();
    assert_eq!(m.pattern_index, 0);
    assert_eq!(m.command, "불 켜");

    let reversed = WakePhraseMatcher::new(&["삐삐야", "비비야"]).unwrap();
    let m = reversed.detect("삐삐야 비비야 불 켜").unwrap();
    assert_eq!(m.pattern_index, 0);
    assert_eq!(m.command, "비비야 불 켜");
}

#[test]
fn test_matching_is_deterministic() {
    let matcher = WakePhraseMatcher::with_defaults().unwrap();

    let first = matcher.detect("음 비비야 노래 틀어줘");
    for _ in 0..10 {
        assert_eq!(matcher.detect("음 비비야 노래 틀어줘"), first);
    }
}

#[test]
fn test_custom_wake_patterns() {
    let matcher = WakePhraseMatcher::new(&["(?i)hey orin"]).unwrap();

    let m = matcher.detect("Hey Orin, turn on the lights").unwrap();
    assert_eq!(m.command, ", turn on the lights");
    assert!(matcher.detect("비비야").is_none());
}

#[test]
fn test_invalid_pattern_is_rejected() {
    assert!(WakePhraseMatcher::new(&["비비(야"]).is_err());
    assert!(EndPhraseMatcher::new(&["[안녕"]).is_err());
}

#[test]
fn test_default_pattern_lists() {
    assert_eq!(WakePhraseMatcher::with_defaults().unwrap().len(), DEFAULT_WAKE_PATTERNS.len());
    assert!(EndPhraseMatcher::new(DEFAULT_END_PATTERNS).is_ok());
}

#[test]
fn test_end_phrases() {
    let matcher = EndPhraseMatcher::with_defaults().unwrap();

    for text in ["안녕", "안녕!", "잘 자", "이제 그만 하자", "그만", "다음에 봐", "바이바이", "Goodbye"] {
        assert!(matcher.is_end_phrase(text), "expected end phrase: {}", text);
    }
}

#[test]
fn test_not_end_phrases() {
    let matcher = EndPhraseMatcher::with_defaults().unwrap();

    for text in ["안녕하세요", "오늘 날씨 어때", "그림 그려줘", "", "   "] {
        assert!(!matcher.is_end_phrase(text), "unexpected end phrase: {}", text);
    }
}
