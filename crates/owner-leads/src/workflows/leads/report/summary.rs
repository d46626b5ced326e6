use super::super::domain::{Lead, LeadStatus, MarketingChannel};
use super::views::{ChannelPerformanceEntry, ChannelReportSummary, MonthlyLeadPoint};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelTally {
    pub leads: usize,
    pub duplicates: usize,
    pub qualified: usize,
    pub approved: usize,
    pub completed: usize,
    pub denied: usize,
    pub archived: usize,
}

impl ChannelTally {
    /// Completed leads over unique (non-duplicate) leads.
    pub fn conversion_rate(&self) -> f32 {
        let unique = self.leads.saturating_sub(self.duplicates);
        if unique == 0 {
            0.0
        } else {
            self.completed as f32 / unique as f32
        }
    }
}

/// Marketing-channel aggregation over a lead collection.
#[derive(Debug, Default)]
pub struct ChannelReport {
    pub channels: HashMap<MarketingChannel, ChannelTally>,
    pub monthly: BTreeMap<(String, MarketingChannel), usize>,
}

impl ChannelReport {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let mut report = ChannelReport::default();
        let qualified_rank = LeadStatus::Qualified.funnel_rank().unwrap_or(u8::MAX);
        let approved_rank = LeadStatus::Approved.funnel_rank().unwrap_or(u8::MAX);

        for lead in leads {
            let tally = report.channels.entry(lead.source).or_default();
            tally.leads += 1;
            if lead.is_duplicate {
                tally.duplicates += 1;
            }
            if lead.is_archived() {
                tally.archived += 1;
            }

            // Archived leads count by the stage they reached before archival.
            let reached = lead.phase.reached().status();
            match reached.funnel_rank() {
                Some(rank) => {
                    if rank >= qualified_rank {
                        tally.qualified += 1;
                    }
                    if rank >= approved_rank {
                        tally.approved += 1;
                    }
                    if reached == LeadStatus::Completed {
                        tally.completed += 1;
                    }
                }
                None => {
                    if reached == LeadStatus::Denied {
                        tally.denied += 1;
                    }
                }
            }

            let month = lead.created_at.format("%Y-%m").to_string();
            *report.monthly.entry((month, lead.source)).or_default() += 1;
        }

        report
    }

    pub fn summary(&self) -> ChannelReportSummary {
        let channels: Vec<ChannelPerformanceEntry> = MarketingChannel::ordered()
            .into_iter()
            .filter_map(|channel| {
                self.channels
                    .get(&channel)
                    .map(|tally| ChannelPerformanceEntry::from_tally(channel, tally))
            })
            .collect();

        let monthly = self
            .monthly
            .iter()
            .map(|((month, channel), leads)| MonthlyLeadPoint {
                month: month.clone(),
                channel: *channel,
                channel_label: channel.label(),
                leads: *leads,
            })
            .collect();

        let top_channel = channels
            .iter()
            .filter(|entry| entry.completed > 0)
            .max_by(|a, b| {
                a.conversion_rate
                    .partial_cmp(&b.conversion_rate)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|entry| entry.channel_label);

        ChannelReportSummary {
            total_leads: channels.iter().map(|entry| entry.leads).sum(),
            channels,
            monthly,
            top_channel,
        }
    }
}
