use uuid::Uuid;

use notewell_core::models::section::{ADDITIONAL_INFO_HEADER, MappedSectionContent};

fn section(raw: &str, processed: Option<&str>) -> MappedSectionContent {
    MappedSectionContent {
        id: Uuid::new_v4(),
        session_id: Uuid::new_v4(),
        section_key: "objective".to_string(),
        section_name: "Objective".to_string(),
        raw_content: raw.to_string(),
        processed_content: processed.map(str::to_string),
        user_provided_content: None,
        final_content: None,
        confidence: 70.0,
        needs_review: true,
        display_order: 2,
    }
}

#[test]
fn scored_content_prefers_processed_text() {
    assert_eq!(section("raw words", Some("Processed words")).scored_content(), "Processed words");
    assert_eq!(section("raw words", Some("   ")).scored_content(), "raw words");
    assert_eq!(section("raw words", None).scored_content(), "raw words");
    assert!(section("", Some(" ")).is_empty());
}

#[test]
fn response_is_appended_as_delimited_block() {
    let mut s = section("raw", Some("Affect flat."));
    let update = s.apply_user_response("  Oriented x3. ");

    assert_eq!(
        s.final_content.as_deref(),
        Some("Affect flat.\n\n[Additional Information]\nOriented x3.")
    );
    assert_eq!(s.user_provided_content.as_deref(), Some("Oriented x3."));
    assert_eq!(s.processed_content.as_deref(), Some("Affect flat."));
    assert_eq!(s.raw_content, "raw");
    assert!(!s.needs_review);
    assert_eq!(update.final_content, s.final_content);
    assert!(!update.needs_review);
}

#[test]
fn empty_section_gets_block_only() {
    let mut s = section("", None);
    s.apply_user_response("Client reports improved mood");
    assert_eq!(
        s.final_content.as_deref(),
        Some("[Additional Information]\nClient reports improved mood")
    );
}

#[test]
fn later_responses_stack_on_earlier_ones() {
    let mut s = section("", Some("Affect flat."));
    s.apply_user_response("Oriented x3.");
    s.apply_user_response("Speech normal rate.");

    assert_eq!(
        s.user_provided_content.as_deref(),
        Some("Oriented x3.\nSpeech normal rate.")
    );
    let final_content = s.final_content.unwrap();
    assert!(final_content.starts_with("Affect flat.\n\n"));
    assert!(final_content.ends_with(&format!("{ADDITIONAL_INFO_HEADER}\nSpeech normal rate.")));
    assert_eq!(final_content.matches(ADDITIONAL_INFO_HEADER).count(), 2);
}

#[test]
fn best_content_prefers_final_then_processed() {
    let mut s = section("raw", Some("processed"));
    assert_eq!(s.best_content(), "processed");
    s.final_content = Some("final".to_string());
    assert_eq!(s.best_content(), "final");
    s.final_content = Some(" ".to_string());
    s.processed_content = None;
    assert_eq!(s.best_content(), "raw");
}

#[test]
fn update_applies_to_a_stored_copy() {
    let mut working = section("raw", Some("text"));
    let mut stored = working.clone();
    let update = working.apply_user_response("more");
    update.apply_to(&mut stored);

    assert_eq!(stored.final_content, working.final_content);
    assert_eq!(stored.user_provided_content, working.user_provided_content);
    assert!(!stored.needs_review);
}

#[test]
fn latest_user_response_is_recognized() {
    let mut s = section("", Some("Affect flat."));
    assert!(!s.has_user_response("Oriented x3."));

    s.apply_user_response("Oriented x3.");
    assert!(s.has_user_response(" Oriented x3. "));

    s.apply_user_response("Speech normal rate.");
    assert!(s.has_user_response("Speech normal rate."));
    assert!(!s.has_user_response("rate."));
    assert!(!s.has_user_response("   "));
}
