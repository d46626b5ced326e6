use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Questionnaire,
    Application,
    Onboarding,
}

impl FormKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "questionnaire" => Some(Self::Questionnaire),
            "application" => Some(Self::Application),
            "onboarding" | "documents" => Some(Self::Onboarding),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FormKind::Questionnaire => "questionnaire",
            FormKind::Application => "application",
            FormKind::Onboarding => "onboarding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Number,
    Currency,
    Date,
    Select,
    MultiSelect,
    Radio,
    Checkbox,
    File,
    Signature,
}

impl FieldType {
    pub const fn requires_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::MultiSelect | FieldType::Radio)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormField {
    pub fn required(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required: true,
            options: Vec::new(),
        }
    }

    pub fn optional(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(id, label, field_type)
        }
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|option| option.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSection {
    pub id: String,
    pub title: String,
    /// Instantiated once per property instead of once per lead.
    #[serde(default)]
    pub repeatable: bool,
    pub fields: Vec<FormField>,
}

impl FormSection {
    pub fn new(id: &str, title: &str, fields: Vec<FormField>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            repeatable: false,
            fields,
        }
    }

    pub fn per_property(id: &str, title: &str, fields: Vec<FormField>) -> Self {
        Self {
            repeatable: true,
            ..Self::new(id, title, fields)
        }
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|field| field.required)
    }
}

/// Versioned form template. Every successful edit bumps `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub kind: FormKind,
    pub version: u32,
    pub sections: Vec<FormSection>,
}

/// Editor operations over a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FormEdit {
    AddSection { section: FormSection },
    RemoveSection { section_id: String },
    RenameSection { section_id: String, title: String },
    SetRepeatable { section_id: String, repeatable: bool },
    MoveSection { section_id: String, position: usize },
    AddField { section_id: String, field: FormField },
    UpdateField { section_id: String, field: FormField },
    RemoveField { section_id: String, field_id: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("section `{0}` not found")]
    SectionNotFound(String),
    #[error("field `{field_id}` not found in section `{section_id}`")]
    FieldNotFound { section_id: String, field_id: String },
    #[error("a form must keep at least one section")]
    LastSection,
    #[error("identifier `{0}` is already used in this form")]
    DuplicateId(String),
    #[error("field `{0}` needs at least one option")]
    MissingOptions(String),
    #[error("identifiers must not be blank")]
    BlankIdentifier,
}

impl FormSchema {
    pub fn standard(kind: FormKind) -> Self {
        match kind {
            FormKind::Questionnaire => Self::questionnaire(),
            FormKind::Application => Self::application(),
            FormKind::Onboarding => Self::onboarding(),
        }
    }

    /// Owner questionnaire used to qualify new leads.
    pub fn questionnaire() -> Self {
        Self {
            kind: FormKind::Questionnaire,
            version: 1,
            sections: vec![
                FormSection::new(
                    "owner_contact",
                    "Owner Contact",
                    vec![
                        FormField::required("first_name", "First name", FieldType::Text),
                        FormField::required("last_name", "Last name", FieldType::Text),
                        FormField::required("email", "Email", FieldType::Email),
                        FormField::required("phone", "Phone", FieldType::Phone),
                    ],
                ),
                FormSection::per_property(
                    "properties",
                    "Properties",
                    vec![
                        FormField::required("address", "Property address", FieldType::Text),
                        FormField::optional("bedrooms", "Bedrooms", FieldType::Number),
                        FormField::optional("bathrooms", "Bathrooms", FieldType::Number),
                        FormField::optional("current_rent", "Current rent", FieldType::Currency),
                        FormField::optional("occupied", "Currently occupied", FieldType::Checkbox),
                    ],
                ),
            ],
        }
    }

    /// Owner application submitted after a lead is approved.
    pub fn application() -> Self {
        Self {
            kind: FormKind::Application,
            version: 1,
            sections: vec![
                FormSection::new(
                    "owner_details",
                    "Owner Details",
                    vec![
                        FormField::required("legal_name", "Legal name on title", FieldType::Text),
                        FormField::required("mailing_address", "Mailing address", FieldType::Text),
                        FormField::optional("co_owner_name", "Co-owner", FieldType::Text),
                    ],
                ),
                FormSection::per_property(
                    "property_details",
                    "Property Details",
                    vec![
                        FormField::required("bedrooms", "Bedrooms", FieldType::Number),
                        FormField::required("bathrooms", "Bathrooms", FieldType::Number),
                        FormField::required("square_feet", "Square feet", FieldType::Number),
                        FormField::required("target_rent", "Target rent", FieldType::Currency),
                        FormField::optional("hoa_name", "HOA", FieldType::Text),
                    ],
                ),
                FormSection::new(
                    "management_preferences",
                    "Management Preferences",
                    vec![
                        FormField::required("desired_start", "Desired start date", FieldType::Date),
                        FormField::required("pets_allowed", "Pets allowed", FieldType::Radio)
                            .with_options(&["yes", "no", "case_by_case"]),
                    ],
                ),
                FormSection::new(
                    "additional_notes",
                    "Additional Notes",
                    vec![FormField::optional("notes", "Notes", FieldType::Textarea)],
                ),
            ],
        }
    }

    /// Onboarding packet: legal paperwork and per-property access details.
    pub fn onboarding() -> Self {
        Self {
            kind: FormKind::Onboarding,
            version: 1,
            sections: vec![
                FormSection::new(
                    "legal_documents",
                    "Legal Documents",
                    vec![
                        FormField::required("tax_id", "Tax ID", FieldType::Text),
                        FormField::required(
                            "agreement_signature",
                            "Management agreement signature",
                            FieldType::Signature,
                        ),
                    ],
                ),
                FormSection::per_property(
                    "property_access",
                    "Property Access",
                    vec![
                        FormField::required("key_location", "Key location", FieldType::Text),
                        FormField::optional("alarm_code", "Alarm code", FieldType::Text),
                        FormField::required(
                            "utilities",
                            "Utilities responsibility",
                            FieldType::Select,
                        )
                        .with_options(&["owner", "tenant", "split"]),
                    ],
                ),
                FormSection::new(
                    "insurance",
                    "Insurance",
                    vec![
                        FormField::required("insurance_carrier", "Carrier", FieldType::Text),
                        FormField::required("policy_number", "Policy number", FieldType::Text),
                        FormField::optional("policy_document", "Declarations page", FieldType::File),
                    ],
                ),
                FormSection::new(
                    "banking",
                    "Owner Distributions",
                    vec![
                        FormField::required("routing_number", "Routing number", FieldType::Text),
                        FormField::required("account_number", "Account number", FieldType::Text),
                    ],
                ),
            ],
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&FormSection> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    /// Apply one editor operation, returning the next version of the schema.
    pub fn apply(&self, edit: FormEdit) -> Result<FormSchema, FormError> {
        let mut next = self.clone();
        match edit {
            FormEdit::AddSection { section } => {
                validate_identifier(&section.id)?;
                if next.sections.iter().any(|existing| existing.id == section.id) {
                    return Err(FormError::DuplicateId(section.id));
                }
                let mut seen = next.field_ids();
                for field in &section.fields {
                    validate_field(field)?;
                    if !seen.insert(field.id.clone()) {
                        return Err(FormError::DuplicateId(field.id.clone()));
                    }
                }
                next.sections.push(section);
            }
            FormEdit::RemoveSection { section_id } => {
                let index = next.section_index(&section_id)?;
                if next.sections.len() == 1 {
                    return Err(FormError::LastSection);
                }
                next.sections.remove(index);
            }
            FormEdit::RenameSection { section_id, title } => {
                let index = next.section_index(&section_id)?;
                next.sections[index].title = title;
            }
            FormEdit::SetRepeatable {
                section_id,
                repeatable,
            } => {
                let index = next.section_index(&section_id)?;
                next.sections[index].repeatable = repeatable;
            }
            FormEdit::MoveSection {
                section_id,
                position,
            } => {
                let index = next.section_index(&section_id)?;
                let section = next.sections.remove(index);
                let position = position.min(next.sections.len());
                next.sections.insert(position, section);
            }
            FormEdit::AddField { section_id, field } => {
                validate_field(&field)?;
                if next.field_ids().contains(&field.id) {
                    return Err(FormError::DuplicateId(field.id));
                }
                let index = next.section_index(&section_id)?;
                next.sections[index].fields.push(field);
            }
            FormEdit::UpdateField { section_id, field } => {
                validate_field(&field)?;
                let index = next.section_index(&section_id)?;
                let slot = next.sections[index]
                    .fields
                    .iter_mut()
                    .find(|existing| existing.id == field.id)
                    .ok_or_else(|| FormError::FieldNotFound {
                        section_id: section_id.clone(),
                        field_id: field.id.clone(),
                    })?;
                *slot = field;
            }
            FormEdit::RemoveField {
                section_id,
                field_id,
            } => {
                let index = next.section_index(&section_id)?;
                let fields = &mut next.sections[index].fields;
                let position = fields
                    .iter()
                    .position(|field| field.id == field_id)
                    .ok_or(FormError::FieldNotFound {
                        section_id,
                        field_id,
                    })?;
                fields.remove(position);
            }
        }

        next.version = self.version.saturating_add(1);
        Ok(next)
    }

    fn section_index(&self, section_id: &str) -> Result<usize, FormError> {
        self.sections
            .iter()
            .position(|section| section.id == section_id)
            .ok_or_else(|| FormError::SectionNotFound(section_id.to_string()))
    }

    fn field_ids(&self) -> BTreeSet<String> {
        self.sections
            .iter()
            .flat_map(|section| section.fields.iter().map(|field| field.id.clone()))
            .collect()
    }
}

fn validate_identifier(id: &str) -> Result<(), FormError> {
    if id.trim().is_empty() {
        Err(FormError::BlankIdentifier)
    } else {
        Ok(())
    }
}

fn validate_field(field: &FormField) -> Result<(), FormError> {
    validate_identifier(&field.id)?;
    if field.field_type.requires_options() && field.options.is_empty() {
        return Err(FormError::MissingOptions(field.id.clone()));
    }
    Ok(())
}

/// The three templates the pipeline evaluates leads against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormCatalog {
    pub questionnaire: FormSchema,
    pub application: FormSchema,
    pub onboarding: FormSchema,
}

impl Default for FormCatalog {
    fn default() -> Self {
        Self {
            questionnaire: FormSchema::questionnaire(),
            application: FormSchema::application(),
            onboarding: FormSchema::onboarding(),
        }
    }
}

impl FormCatalog {
    pub fn get(&self, kind: FormKind) -> &FormSchema {
        match kind {
            FormKind::Questionnaire => &self.questionnaire,
            FormKind::Application => &self.application,
            FormKind::Onboarding => &self.onboarding,
        }
    }

    pub fn replace(&mut self, schema: FormSchema) {
        match schema.kind {
            FormKind::Questionnaire => self.questionnaire = schema,
            FormKind::Application => self.application = schema,
            FormKind::Onboarding => self.onboarding = schema,
        }
    }
}
