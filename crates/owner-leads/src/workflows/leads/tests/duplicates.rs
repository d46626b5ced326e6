use super::common::*;

use crate::workflows::leads::domain::{LeadId, LeadPhase};
use crate::workflows::leads::duplicates::{detect_duplicates, normalize_email, normalize_phone};

#[test]
fn normalizes_email_and_phone_keys() {
    assert_eq!(
        normalize_email("  Owner@Example.COM "),
        Some("owner@example.com".to_string())
    );
    assert_eq!(normalize_email("not-an-email"), None);
    assert_eq!(normalize_email(""), None);
    assert_eq!(
        normalize_phone("(515) 555-0100"),
        Some("5155550100".to_string())
    );
    assert_eq!(normalize_phone("n/a"), None);
}

#[test]
fn later_lead_sharing_email_is_flagged_against_first() {
    let leads = vec![
        lead("lead-000001", "owner@example.com", "515-555-0100"),
        lead("lead-000002", " OWNER@example.com", "515-555-0199"),
    ];

    let annotated = detect_duplicates(&leads);

    assert!(!annotated[0].is_duplicate);
    assert_eq!(annotated[0].duplicate_of, None);
    assert!(annotated[1].is_duplicate);
    assert_eq!(
        annotated[1].duplicate_of,
        Some(LeadId("lead-000001".to_string()))
    );
    assert!(!leads[1].is_duplicate, "input is not mutated");
}

#[test]
fn phone_match_ignores_formatting() {
    let leads = vec![
        lead("lead-000001", "first@example.com", "(515) 555-0100"),
        lead("lead-000002", "second@example.com", "515.555.0100"),
    ];

    let annotated = detect_duplicates(&leads);

    assert!(annotated[1].is_duplicate);
    assert_eq!(
        annotated[1].duplicate_of,
        Some(LeadId("lead-000001".to_string()))
    );
}

#[test]
fn email_match_takes_precedence_over_phone_match() {
    let leads = vec![
        lead("lead-000001", "shared@example.com", "111-111-1111"),
        lead("lead-000002", "other@example.com", "222-222-2222"),
        lead("lead-000003", "shared@example.com", "222-222-2222"),
    ];

    let annotated = detect_duplicates(&leads);

    assert_eq!(
        annotated[2].duplicate_of,
        Some(LeadId("lead-000001".to_string()))
    );
}

#[test]
fn stale_flags_are_cleared_when_the_match_disappears() {
    let mut flagged = lead("lead-000002", "solo@example.com", "999-999-9999");
    flagged.is_duplicate = true;
    flagged.duplicate_of = Some(LeadId("lead-000001".to_string()));

    let annotated = detect_duplicates(&[flagged]);

    assert!(!annotated[0].is_duplicate);
    assert_eq!(annotated[0].duplicate_of, None);
}

#[test]
fn archived_leads_neither_register_keys_nor_change() {
    let mut archived = lead("lead-000001", "owner@example.com", "515-555-0100");
    archived.phase = LeadPhase::Archived {
        previous: Box::new(LeadPhase::Partial),
    };
    archived.is_duplicate = true;
    let live = lead("lead-000002", "owner@example.com", "515-555-0100");

    let annotated = detect_duplicates(&[archived.clone(), live.clone()]);

    assert_eq!(annotated[0], archived);
    assert!(!annotated[1].is_duplicate);
    assert_eq!(detect_duplicates(&[live])[0].is_duplicate, annotated[1].is_duplicate);
}

#[test]
fn detection_is_idempotent() {
    let leads = vec![
        lead("lead-000001", "a@example.com", "515-555-0100"),
        lead("lead-000002", "a@example.com", "515-555-0101"),
        lead("lead-000003", "c@example.com", "515-555-0101"),
    ];

    let once = detect_duplicates(&leads);
    let twice = detect_duplicates(&once);

    assert_eq!(once, twice);
}

#[test]
fn dotless_domains_still_count_as_email_keys() {
    assert_eq!(
        normalize_email("Owner@LocalHost"),
        Some("owner@localhost".to_string())
    );
    assert_eq!(normalize_email("@localhost"), None);
    assert_eq!(normalize_email("owner@ "), None);

    let leads = vec![
        lead("lead-000001", "owner@localhost", "515-555-0100"),
        lead("lead-000002", "OWNER@localhost", "515-555-0199"),
    ];
    let annotated = detect_duplicates(&leads);

    assert!(annotated[1].is_duplicate);
    assert_eq!(
        annotated[1].duplicate_of,
        Some(LeadId("lead-000001".to_string()))
    );
}
