use super::super::domain::MarketingChannel;
use super::summary::ChannelTally;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelPerformanceEntry {
    pub channel: MarketingChannel,
    pub channel_label: &'static str,
    pub leads: usize,
    pub duplicates: usize,
    pub qualified: usize,
    pub approved: usize,
    pub completed: usize,
    pub denied: usize,
    pub archived: usize,
    pub conversion_rate: f32,
}

impl ChannelPerformanceEntry {
    pub(crate) fn from_tally(channel: MarketingChannel, tally: &ChannelTally) -> Self {
        Self {
            channel,
            channel_label: channel.label(),
            leads: tally.leads,
            duplicates: tally.duplicates,
            qualified: tally.qualified,
            approved: tally.approved,
            completed: tally.completed,
            denied: tally.denied,
            archived: tally.archived,
            conversion_rate: tally.conversion_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyLeadPoint {
    pub month: String,
    pub channel: MarketingChannel,
    pub channel_label: &'static str,
    pub leads: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReportSummary {
    pub total_leads: usize,
    pub channels: Vec<ChannelPerformanceEntry>,
    pub monthly: Vec<MonthlyLeadPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_channel: Option<&'static str>,
}
