//! Required-field completeness over form sections.
//!
//! Non-repeatable sections need every required field answered. Repeatable sections are checked
//! once per property index and count as complete when any single property satisfies them.

use super::domain::{property_answer_key, Answers, Lead};
use super::forms::{FormSchema, FormSection};

/// Read-only view of the answers a section is evaluated against.
pub trait AnswerSource {
    fn answer_is_present(&self, key: &str) -> bool;
    fn property_count(&self) -> usize;
}

/// Answers stored in `onboarding_answers`, with the lead's property list as the repeat count.
pub struct OnboardingAnswers<'a> {
    answers: &'a Answers,
    properties: usize,
}

impl<'a> OnboardingAnswers<'a> {
    pub fn of(lead: &'a Lead) -> Self {
        Self {
            answers: &lead.onboarding_answers,
            properties: lead.properties.len(),
        }
    }
}

impl AnswerSource for OnboardingAnswers<'_> {
    fn answer_is_present(&self, key: &str) -> bool {
        self.answers
            .get(key)
            .map(|value| value.is_answered())
            .unwrap_or(false)
    }

    fn property_count(&self) -> usize {
        self.properties
    }
}

/// Plain answer map paired with an explicit property count.
pub struct AnswerMap<'a> {
    pub answers: &'a Answers,
    pub properties: usize,
}

impl AnswerSource for AnswerMap<'_> {
    fn answer_is_present(&self, key: &str) -> bool {
        self.answers
            .get(key)
            .map(|value| value.is_answered())
            .unwrap_or(false)
    }

    fn property_count(&self) -> usize {
        self.properties
    }
}

pub fn is_section_complete(section: &FormSection, source: &impl AnswerSource) -> bool {
    let mut required = section.required_fields().peekable();
    if required.peek().is_none() {
        return true;
    }

    if !section.repeatable {
        return required.all(|field| source.answer_is_present(&field.id));
    }

    let required: Vec<_> = required.collect();
    (0..source.property_count()).any(|index| {
        required
            .iter()
            .all(|field| source.answer_is_present(&property_answer_key(index, &field.id)))
    })
}

/// Ids of the sections in `schema` that are not yet complete, in schema order.
pub fn incomplete_sections(schema: &FormSchema, source: &impl AnswerSource) -> Vec<String> {
    schema
        .sections
        .iter()
        .filter(|section| !is_section_complete(section, source))
        .map(|section| section.id.clone())
        .collect()
}

pub fn is_form_complete(schema: &FormSchema, source: &impl AnswerSource) -> bool {
    schema
        .sections
        .iter()
        .all(|section| is_section_complete(section, source))
}

/// Share of complete sections, rounded down. An empty schema is fully complete.
pub fn completion_percent(schema: &FormSchema, source: &impl AnswerSource) -> u8 {
    let total = schema.sections.len();
    if total == 0 {
        return 100;
    }
    let complete = schema
        .sections
        .iter()
        .filter(|section| is_section_complete(section, source))
        .count();
    ((complete * 100) / total) as u8
}

pub fn is_application_complete(lead: &Lead, application: &FormSchema) -> bool {
    is_form_complete(application, &OnboardingAnswers::of(lead))
}

pub fn is_onboarding_complete(lead: &Lead, onboarding: &FormSchema) -> bool {
    is_form_complete(onboarding, &OnboardingAnswers::of(lead))
}

pub fn onboarding_completion(lead: &Lead, onboarding: &FormSchema) -> u8 {
    completion_percent(onboarding, &OnboardingAnswers::of(lead))
}
