//! Immutable lead snapshots.
//!
//! Every mutation takes `&self` and returns a new `LeadStore`; the previous snapshot stays valid.
//! Duplicate detection is re-run on each new snapshot and `revision` increases by one.

use serde::{Deserialize, Serialize};

use super::domain::{EventKind, Lead, LeadId, LeadPhase, LeadStatus};
use super::duplicates::detect_duplicates;
use super::intake::{IntakeError, IntakeSubmission};
use super::lifecycle::{apply_action, reevaluate, ActionContext, LeadAction, LifecycleError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadStore {
    leads: Vec<Lead>,
    next_sequence: u64,
    revision: u64,
}

impl Default for LeadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lead {0} not found")]
    NotFound(LeadId),
    #[error("lead {0} already exists")]
    Conflict(LeadId),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl LeadStore {
    pub fn new() -> Self {
        Self {
            leads: Vec::new(),
            next_sequence: 1,
            revision: 0,
        }
    }

    /// Seed a store from existing records, keeping their order.
    pub fn from_leads(leads: Vec<Lead>) -> Result<Self, StoreError> {
        leads
            .into_iter()
            .try_fold(Self::new(), |store, lead| store.insert(lead))
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn get(&self, id: &LeadId) -> Option<&Lead> {
        self.leads.iter().find(|lead| &lead.id == id)
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn with_status(&self, status: LeadStatus) -> Vec<&Lead> {
        self.leads
            .iter()
            .filter(|lead| lead.status() == status)
            .collect()
    }

    pub fn duplicates(&self) -> Vec<&Lead> {
        self.leads.iter().filter(|lead| lead.is_duplicate).collect()
    }

    /// Append a lead. Ids shaped like `lead-NNNNNN` advance the sequence past their number.
    pub fn insert(&self, lead: Lead) -> Result<Self, StoreError> {
        if self.get(&lead.id).is_some() {
            return Err(StoreError::Conflict(lead.id));
        }

        let next_sequence = lead
            .id
            .as_str()
            .strip_prefix("lead-")
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(|sequence| self.next_sequence.max(sequence.saturating_add(1)))
            .unwrap_or(self.next_sequence);

        let mut leads = self.leads.clone();
        leads.push(lead);
        Ok(self.replace(leads, next_sequence))
    }

    /// Validate an intake submission and append the resulting lead, already run through the
    /// questionnaire save path.
    pub fn create(
        &self,
        submission: &IntakeSubmission,
        ctx: &ActionContext<'_>,
    ) -> Result<(Self, LeadId), StoreError> {
        submission.validate()?;

        let id = LeadId::from_sequence(self.next_sequence);
        let contact = submission.contact();
        let mut lead = Lead {
            id: id.clone(),
            contact,
            source: submission.source,
            assigned_to: submission.assigned_to.clone(),
            created_at: ctx.at,
            phase: LeadPhase::New,
            qualification_completion: 0,
            is_duplicate: false,
            duplicate_of: None,
            properties: submission
                .properties
                .iter()
                .filter(|property| !property.address.trim().is_empty())
                .cloned()
                .collect(),
            questionnaire_answers: submission.answers.clone(),
            onboarding_answers: Default::default(),
            timeline: Vec::new(),
            documents: Vec::new(),
        };
        let description = format!(
            "Lead created for {} via {}",
            lead.contact.full_name(),
            lead.source.label()
        );
        lead.record(EventKind::LeadCreated, description, &ctx.actor.name, ctx.at);
        let lead = reevaluate(&lead, ctx);

        let store = self.insert(lead)?;
        Ok((store, id))
    }

    /// Replace one lead with the result of `update`. The id cannot be changed by the closure.
    pub fn update<F>(&self, id: &LeadId, update: F) -> Result<Self, StoreError>
    where
        F: FnOnce(&Lead) -> Result<Lead, LifecycleError>,
    {
        let index = self
            .leads
            .iter()
            .position(|lead| &lead.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut updated = update(&self.leads[index])?;
        updated.id = id.clone();

        let mut leads = self.leads.clone();
        leads[index] = updated;
        Ok(self.replace(leads, self.next_sequence))
    }

    pub fn apply(
        &self,
        id: &LeadId,
        action: &LeadAction,
        ctx: &ActionContext<'_>,
    ) -> Result<Self, StoreError> {
        self.update(id, |lead| apply_action(lead, action, ctx))
    }

    fn replace(&self, leads: Vec<Lead>, next_sequence: u64) -> Self {
        Self {
            leads: detect_duplicates(&leads),
            next_sequence,
            revision: self.revision + 1,
        }
    }
}
