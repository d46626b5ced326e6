use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::domain::{Lead, LeadId};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+$").expect("email pattern compiles")
    })
}

/// Trimmed, lowercased email, or `None` when the value is not a usable address.
pub fn normalize_email(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    email_pattern().is_match(&normalized).then_some(normalized)
}

/// Digits only, or `None` when nothing numeric remains.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Annotate every non-archived lead with `is_duplicate`/`duplicate_of`.
///
/// The first lead to use a normalized email or phone owns it; later leads sharing either key are
/// flagged against that first lead. Email is checked before phone and wins when both match.
/// Archived leads are copied through untouched and never register keys. The input is not mutated.
pub fn detect_duplicates(leads: &[Lead]) -> Vec<Lead> {
    let mut emails: HashMap<String, LeadId> = HashMap::new();
    let mut phones: HashMap<String, LeadId> = HashMap::new();

    leads
        .iter()
        .map(|lead| {
            let mut annotated = lead.clone();
            if lead.is_archived() {
                return annotated;
            }

            annotated.is_duplicate = false;
            annotated.duplicate_of = None;

            if let Some(email) = normalize_email(&lead.contact.email) {
                match emails.get(&email) {
                    Some(original) => {
                        annotated.is_duplicate = true;
                        annotated.duplicate_of = Some(original.clone());
                    }
                    None => {
                        emails.insert(email, lead.id.clone());
                    }
                }
            }

            if let Some(phone) = normalize_phone(&lead.contact.phone) {
                match phones.get(&phone) {
                    Some(original) => {
                        annotated.is_duplicate = true;
                        if annotated.duplicate_of.is_none() {
                            annotated.duplicate_of = Some(original.clone());
                        }
                    }
                    None => {
                        phones.insert(phone, lead.id.clone());
                    }
                }
            }

            annotated
        })
        .collect()
}
