use metrics_exporter_prometheus::PrometheusHandle;
use owner_leads::workflows::leads::{
    DenialReason, IntakeSubmission, LeadAction, LeadRepository, LeadServiceError, LeadStore,
    MarketingChannel, NotificationError, NotificationPublisher, OwnerLeadService,
    OwnerNotification, PropertyRecord, RepositoryError, Role, User, UserDirectory, UserId,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type LeadService = OwnerLeadService<InMemoryLeadRepository, LoggingNotificationPublisher>;

/// Process-lifetime snapshot holder. Commits must build on the stored revision.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLeadRepository {
    snapshot: Arc<Mutex<LeadStore>>,
}

impl LeadRepository for InMemoryLeadRepository {
    fn load(&self) -> Result<LeadStore, RepositoryError> {
        let guard = self.snapshot.lock().expect("repository mutex poisoned");
        Ok(guard.clone())
    }

    fn commit(&self, snapshot: LeadStore) -> Result<(), RepositoryError> {
        let mut guard = self.snapshot.lock().expect("repository mutex poisoned");
        let stored = guard.revision();
        if snapshot.revision() != stored + 1 {
            return Err(RepositoryError::Stale {
                stored,
                found: snapshot.revision(),
            });
        }
        *guard = snapshot;
        Ok(())
    }
}

/// Stands in for the e-mail gateway: every owner message is logged and kept for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationPublisher {
    sent: Arc<Mutex<Vec<OwnerNotification>>>,
}

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notification: OwnerNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            lead_id = %notification.lead_id,
            recipient = %notification.recipient,
            "owner notification queued"
        );
        let mut guard = self.sent.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl LoggingNotificationPublisher {
    pub(crate) fn sent(&self) -> Vec<OwnerNotification> {
        self.sent.lock().expect("notification mutex poisoned").clone()
    }
}

pub(crate) fn demo_directory() -> UserDirectory {
    UserDirectory::new([
        User::new("mgr-1", "Morgan Reyes", Role::Manager),
        User::new("pm-1", "Priya Shah", Role::PmStaff),
        User::new("leasing-1", "Luis Ortega", Role::LeasingStaff),
    ])
}

pub(crate) fn manager_id() -> UserId {
    UserId("mgr-1".to_string())
}

pub(crate) fn build_service() -> (Arc<LeadService>, LoggingNotificationPublisher) {
    let repository = Arc::new(InMemoryLeadRepository::default());
    let notifications = LoggingNotificationPublisher::default();
    let service = OwnerLeadService::new(
        repository,
        Arc::new(notifications.clone()),
        demo_directory(),
    );
    (Arc::new(service), notifications)
}

fn submission(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
    source: MarketingChannel,
    addresses: &[&str],
) -> IntakeSubmission {
    IntakeSubmission {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        source,
        assigned_to: None,
        properties: addresses
            .iter()
            .map(|address| PropertyRecord::at(*address))
            .collect(),
        answers: Default::default(),
    }
}

/// Load a small pipeline spread across channels and stages.
pub(crate) fn seed_demo_leads(service: &LeadService) -> Result<usize, LeadServiceError> {
    let manager = manager_id();
    let leads = [
        submission(
            "Dana",
            "Whitfield",
            "dana.whitfield@example.com",
            "(515) 555-0110",
            MarketingChannel::Zillow,
            &["1420 Grand Ave"],
        ),
        submission(
            "Marcus",
            "Bell",
            "marcus.bell@example.com",
            "515-555-0121",
            MarketingChannel::Referral,
            &["88 Ingersoll Ave", "90 Ingersoll Ave"],
        ),
        submission(
            "Elena",
            "Park",
            "elena.park@example.com",
            "515.555.0132",
            MarketingChannel::Google,
            &[],
        ),
        submission(
            "Sam",
            "Okafor",
            "sam.okafor@example.com",
            "515-555-0143",
            MarketingChannel::Facebook,
            &["310 Woodland Ave"],
        ),
        submission(
            "Dana",
            "Whitfield",
            "Dana.Whitfield@example.com",
            "515-555-0199",
            MarketingChannel::Website,
            &["1420 Grand Ave"],
        ),
    ];

    let mut created = Vec::with_capacity(leads.len());
    for lead in leads {
        created.push(service.create_lead(&manager, lead)?.id);
    }

    service.apply_action(&created[0], &manager, LeadAction::ApproveLead)?;
    service.apply_action(&created[0], &manager, LeadAction::SendApplicationLink)?;
    service.apply_action(&created[1], &manager, LeadAction::ApproveLead)?;
    service.apply_action(&created[1], &manager, LeadAction::StartApplication)?;
    service.apply_action(
        &created[3],
        &manager,
        LeadAction::Deny {
            reason: DenialReason::NotInServiceArea,
            note: Some("Property is in Ames".to_string()),
        },
    )?;

    info!(leads = created.len(), "demo leads seeded");
    Ok(created.len())
}
