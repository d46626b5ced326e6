use super::common::*;

use chrono::{TimeZone, Utc};

use crate::workflows::leads::domain::{DenialReason, LeadPhase, MarketingChannel};
use crate::workflows::leads::export::write_leads_csv;
use crate::workflows::leads::report::ChannelReport;

#[test]
fn channel_report_counts_funnel_stages() {
    let mut website_new = lead("lead-000001", "a@example.com", "515-555-0101");
    website_new.source = MarketingChannel::Website;

    let mut website_dup = lead("lead-000002", "a@example.com", "515-555-0102");
    website_dup.is_duplicate = true;

    let mut referral_done = qualified_lead("lead-000003");
    referral_done.source = MarketingChannel::Referral;
    referral_done.phase = LeadPhase::Completed;

    let mut referral_archived = qualified_lead("lead-000004");
    referral_archived.source = MarketingChannel::Referral;
    referral_archived.phase = LeadPhase::Archived {
        previous: Box::new(LeadPhase::Onboarding { completion: 50 }),
    };
    referral_archived.created_at = Utc
        .with_ymd_and_hms(2025, 4, 2, 12, 0, 0)
        .single()
        .expect("valid timestamp");

    let mut zillow_denied = qualified_lead("lead-000005");
    zillow_denied.source = MarketingChannel::Zillow;
    zillow_denied.phase = LeadPhase::Denied {
        reason: DenialReason::RentBelowMinimum,
        note: None,
        during_review: false,
    };

    let report = ChannelReport::from_leads(&[
        website_new,
        website_dup,
        referral_done,
        referral_archived,
        zillow_denied,
    ]);
    let summary = report.summary();

    assert_eq!(summary.total_leads, 5);
    let labels: Vec<&str> = summary
        .channels
        .iter()
        .map(|entry| entry.channel_label)
        .collect();
    assert_eq!(labels, vec!["Website", "Referral", "Zillow"]);

    let website = &summary.channels[0];
    assert_eq!(website.leads, 2);
    assert_eq!(website.duplicates, 1);
    assert_eq!(website.qualified, 0);
    assert_eq!(website.conversion_rate, 0.0);

    let referral = &summary.channels[1];
    assert_eq!(referral.leads, 2);
    assert_eq!(referral.qualified, 2);
    assert_eq!(referral.approved, 2);
    assert_eq!(referral.completed, 1);
    assert_eq!(referral.archived, 1);
    assert!((referral.conversion_rate - 0.5).abs() < f32::EPSILON);

    let zillow = &summary.channels[2];
    assert_eq!(zillow.denied, 1);
    assert_eq!(zillow.qualified, 0);

    assert_eq!(summary.top_channel, Some("Referral"));
    let april: Vec<_> = summary
        .monthly
        .iter()
        .filter(|point| point.month == "2025-04")
        .collect();
    assert_eq!(april.len(), 1);
    assert_eq!(april[0].channel, MarketingChannel::Referral);
    assert_eq!(april[0].leads, 1);
}

#[test]
fn csv_export_writes_header_and_rows() {
    let mut duplicate = lead("lead-000002", "a@example.com", "515-555-0100");
    duplicate.is_duplicate = true;
    duplicate.duplicate_of = Some(crate::workflows::leads::domain::LeadId(
        "lead-000001".to_string(),
    ));
    let leads = vec![qualified_lead("lead-000001"), duplicate];

    let mut buffer = Vec::new();
    let rows = write_leads_csv(&mut buffer, &leads).expect("export succeeds");
    let output = String::from_utf8(buffer).expect("utf8 output");
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(rows, 2);
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "id,first_name,last_name,email,phone,source,status,application_status,\
qualification_completion,onboarding_completion,duplicate_of,created_at"
    );
    assert!(lines[1].starts_with("lead-000001,Jordan,Owner,lead-000001@owners.test,"));
    assert!(lines[1].contains(",qualified,,100,0,,"));
    assert!(lines[2].contains(",lead-000001,2025-03-14T09:30:00+00:00"));
}

#[test]
fn csv_export_of_empty_store_still_has_header() {
    let mut buffer = Vec::new();
    let rows = write_leads_csv(&mut buffer, &[]).expect("export succeeds");
    let output = String::from_utf8(buffer).expect("utf8 output");

    assert_eq!(rows, 0);
    assert!(output.starts_with("id,first_name"));
    assert_eq!(output.lines().count(), 1);
}
