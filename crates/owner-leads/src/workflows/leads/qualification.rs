use super::completeness::{completion_percent, incomplete_sections, AnswerMap};
use super::domain::{property_answer_key, AnswerValue, Answers, Lead, LeadPhase};
use super::forms::FormSchema;

/// Result of running the questionnaire save path over a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationOutcome {
    pub completion: u8,
    pub phase: LeadPhase,
    pub missing_sections: Vec<String>,
}

/// Merge stored questionnaire answers with the values held on the lead itself: contact fields
/// answer the contact section, property records answer the per-property section.
pub fn questionnaire_answers(lead: &Lead, questionnaire: &FormSchema) -> Answers {
    let mut answers = lead.questionnaire_answers.clone();

    let contact = [
        ("first_name", &lead.contact.first_name),
        ("last_name", &lead.contact.last_name),
        ("email", &lead.contact.email),
        ("phone", &lead.contact.phone),
    ];
    for (field_id, value) in contact {
        answers.insert(field_id.to_string(), AnswerValue::Text(value.clone()));
    }

    for section in questionnaire.sections.iter().filter(|section| section.repeatable) {
        for (index, property) in lead.properties.iter().enumerate() {
            for field in &section.fields {
                if let Some(value) = property.answer(&field.id) {
                    answers.insert(property_answer_key(index, &field.id), value);
                }
            }
        }
    }

    answers
}

pub fn evaluate_questionnaire(lead: &Lead, questionnaire: &FormSchema) -> QualificationOutcome {
    let answers = questionnaire_answers(lead, questionnaire);
    let source = AnswerMap {
        answers: &answers,
        properties: lead.properties.len(),
    };

    let completion = completion_percent(questionnaire, &source);
    let phase = match completion {
        100 => LeadPhase::Qualified,
        0 => LeadPhase::New,
        _ => LeadPhase::Partial,
    };

    QualificationOutcome {
        completion,
        phase,
        missing_sections: incomplete_sections(questionnaire, &source),
    }
}
