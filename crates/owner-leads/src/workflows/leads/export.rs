use std::io::Write;

use serde::Serialize;

use super::domain::Lead;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct LeadRow<'a> {
    id: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    source: &'static str,
    status: &'static str,
    application_status: &'static str,
    qualification_completion: u8,
    onboarding_completion: u8,
    duplicate_of: &'a str,
    created_at: String,
}

impl<'a> LeadRow<'a> {
    fn of(lead: &'a Lead) -> Self {
        Self {
            id: lead.id.as_str(),
            first_name: &lead.contact.first_name,
            last_name: &lead.contact.last_name,
            email: &lead.contact.email,
            phone: &lead.contact.phone,
            source: lead.source.label(),
            status: lead.status().label(),
            application_status: lead
                .application_status()
                .map(|status| status.label())
                .unwrap_or(""),
            qualification_completion: lead.qualification_completion,
            onboarding_completion: lead.onboarding_completion(),
            duplicate_of: lead
                .duplicate_of
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or(""),
            created_at: lead.created_at.to_rfc3339(),
        }
    }
}

/// Write one row per lead with a header line. Returns the number of data rows.
pub fn write_leads_csv<W: Write>(writer: W, leads: &[Lead]) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for lead in leads {
        csv_writer.serialize(LeadRow::of(lead))?;
    }
    if leads.is_empty() {
        csv_writer.write_record(HEADER)?;
    }
    csv_writer.flush()?;
    Ok(leads.len())
}

const HEADER: [&str; 12] = [
    "id",
    "first_name",
    "last_name",
    "email",
    "phone",
    "source",
    "status",
    "application_status",
    "qualification_completion",
    "onboarding_completion",
    "duplicate_of",
    "created_at",
];
