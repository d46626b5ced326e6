use crate::infra::{build_service, manager_id, seed_demo_leads};
use chrono::Local;
use clap::Args;
use owner_leads::error::AppError;
use owner_leads::workflows::leads::domain::property_answer_key;
use owner_leads::workflows::leads::{
    AnswerValue, Answers, FormKind, IntakeSubmission, LeadAction, LeadView, MarketingChannel,
    PropertyRecord, QuickAction, UserId,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ChannelReportArgs {
    /// User requesting the report (needs the analytics permission)
    #[arg(long, default_value = "mgr-1")]
    pub(crate) user: String,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Destination CSV file. Writes to stdout when omitted.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the final lead record as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_channel_report(args: ChannelReportArgs) -> Result<(), AppError> {
    let (service, _) = build_service();
    seed_demo_leads(&service)?;
    let summary = service.channel_report(&UserId(args.user))?;

    if args.json {
        let payload = serde_json::to_string_pretty(&summary).map_err(io::Error::other)?;
        println!("{payload}");
        return Ok(());
    }

    println!(
        "Channel performance as of {} ({} leads)",
        Local::now().date_naive(),
        summary.total_leads
    );
    for entry in &summary.channels {
        println!(
            "- {}: {} leads | {} duplicates | {} qualified | {} approved | {} completed | {} denied | {:.0}% conversion",
            entry.channel_label,
            entry.leads,
            entry.duplicates,
            entry.qualified,
            entry.approved,
            entry.completed,
            entry.denied,
            entry.conversion_rate * 100.0
        );
    }
    match summary.top_channel {
        Some(channel) => println!("Top converting channel: {channel}"),
        None => println!("Top converting channel: none yet"),
    }

    if !summary.monthly.is_empty() {
        println!("Monthly intake:");
        for point in &summary.monthly {
            println!(
                "  - {} {}: {}",
                point.month, point.channel_label, point.leads
            );
        }
    }

    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let (service, _) = build_service();
    seed_demo_leads(&service)?;

    match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            let rows = service.export_csv(BufWriter::new(file))?;
            println!("Exported {} leads to {}", rows, path.display());
        }
        None => {
            let stdout = io::stdout();
            service.export_csv(stdout.lock())?;
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let (service, notifications) = build_service();
    let manager = manager_id();

    println!("Owner lead pipeline demo");
    let intake = IntakeSubmission {
        first_name: "Harper".to_string(),
        last_name: "Lindqvist".to_string(),
        email: "harper.lindqvist@example.com".to_string(),
        phone: "(515) 555-0177".to_string(),
        source: MarketingChannel::Google,
        assigned_to: Some("Priya Shah".to_string()),
        properties: Vec::new(),
        answers: Answers::new(),
    };
    let lead = service.submit_intake(intake)?;
    print_step("Intake received", &lead);

    let lead = service.add_property(&lead.id, &manager, PropertyRecord::at("2115 Beaver Ave"))?;
    print_step("Property added", &lead);
    print_actions(&service.actions_for(&lead.id, &manager)?.actions);

    let steps = [
        ("Lead approved", LeadAction::ApproveLead),
        ("Application link sent", LeadAction::SendApplicationLink),
    ];
    for (label, action) in steps {
        let lead = service.apply_action(&lead.id, &manager, action)?;
        print_step(label, &lead);
    }

    let lead = service.record_answers(
        &lead.id,
        &manager,
        FormKind::Application,
        application_answers(),
    )?;
    print_step("Application answered", &lead);

    let steps = [
        ("Application submitted", LeadAction::SubmitApplication),
        ("Application approved", LeadAction::ApproveApplication),
        ("Onboarding approved", LeadAction::ApproveOnboarding),
    ];
    for (label, action) in steps {
        let lead = service.apply_action(&lead.id, &manager, action)?;
        print_step(label, &lead);
    }

    let lead = service.record_answers(
        &lead.id,
        &manager,
        FormKind::Onboarding,
        onboarding_answers(),
    )?;
    print_step("Onboarding answered", &lead);

    for document in &lead.documents {
        service.sign_document(&lead.id, &manager, &document.id)?;
        println!("  Signed {}", document.name);
    }

    let lead = service.apply_action(&lead.id, &manager, LeadAction::AddToPortfolio)?;
    print_step("Added to portfolio", &lead);

    println!("Timeline:");
    for event in &lead.timeline {
        println!(
            "  - {} [{}] {}",
            event.occurred_at.format("%H:%M:%S"),
            event.actor,
            event.description
        );
    }

    let sent = notifications.sent();
    if sent.is_empty() {
        println!("Owner notifications: none dispatched");
    } else {
        println!("Owner notifications:");
        for notification in sent {
            println!(
                "  - template={} -> {}",
                notification.template, notification.recipient
            );
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&lead) {
            Ok(json) => println!("Final lead record:\n{}", json),
            Err(err) => println!("Final lead record unavailable: {}", err),
        }
    }

    Ok(())
}

fn print_step(label: &str, lead: &LeadView) {
    println!(
        "- {} -> {} | qualification {}% | onboarding {}%",
        label, lead.display_status, lead.qualification_completion, lead.onboarding_completion
    );
}

fn print_actions(actions: &[QuickAction]) {
    let labels: Vec<&str> = actions.iter().map(|action| action.label()).collect();
    println!("  Available actions: {}", labels.join(", "));
}

fn text(value: &str) -> AnswerValue {
    AnswerValue::Text(value.to_string())
}

fn application_answers() -> Answers {
    let mut answers = Answers::new();
    answers.insert("legal_name".to_string(), text("Harper Lindqvist"));
    answers.insert("mailing_address".to_string(), text("77 Walnut St"));
    answers.insert("desired_start".to_string(), text("2025-06-01"));
    answers.insert("pets_allowed".to_string(), text("yes"));
    answers.insert(property_answer_key(0, "bedrooms"), AnswerValue::Number(4.0));
    answers.insert(property_answer_key(0, "bathrooms"), AnswerValue::Number(2.5));
    answers.insert(property_answer_key(0, "square_feet"), AnswerValue::Number(1980.0));
    answers.insert(property_answer_key(0, "target_rent"), AnswerValue::Number(2150.0));
    answers
}

fn onboarding_answers() -> Answers {
    let mut answers = Answers::new();
    answers.insert("tax_id".to_string(), text("42-1234567"));
    answers.insert("agreement_signature".to_string(), text("H. Lindqvist"));
    answers.insert(property_answer_key(0, "key_location"), text("Front desk"));
    answers.insert(property_answer_key(0, "utilities"), text("owner"));
    answers.insert("insurance_carrier".to_string(), text("Hawkeye Casualty"));
    answers.insert("policy_number".to_string(), text("HC-9081"));
    answers.insert("routing_number".to_string(), text("073000228"));
    answers.insert("account_number".to_string(), text("004417"));
    answers
}
