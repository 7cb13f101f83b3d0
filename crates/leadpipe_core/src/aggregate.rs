//! Dashboard figures derived from the two result collections.
//!
//! Everything here is a pure projection: the same inputs always produce an
//! equal [`DashboardAggregate`], and nothing is cached between calls.

use crate::{Category, ForecastRecord, LeadRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardAggregate {
    pub total_leads: usize,
    pub qualified_email_count: usize,
    pub hot_count: usize,
    /// Forecast records per category, in first-seen order.
    pub category_distribution: Vec<CategoryCount>,
    /// Share of forecast records that are hot, as a rounded percentage.
    pub hot_rate: u32,
}

impl DashboardAggregate {
    pub fn count_for(&self, category: &Category) -> usize {
        self.category_distribution
            .iter()
            .find(|entry| &entry.category == category)
            .map_or(0, |entry| entry.count)
    }
}

pub fn aggregate(leads: &[LeadRecord], forecast: &[ForecastRecord]) -> DashboardAggregate {
    let qualified_email_count = leads
        .iter()
        .filter(|lead| lead.has_qualified_email())
        .count();

    let mut category_distribution: Vec<CategoryCount> = Vec::new();
    for record in forecast {
        match category_distribution
            .iter_mut()
            .find(|entry| entry.category == record.category)
        {
            Some(entry) => entry.count += 1,
            None => category_distribution.push(CategoryCount {
                category: record.category.clone(),
                count: 1,
            }),
        }
    }

    let hot_count = forecast
        .iter()
        .filter(|record| record.category == Category::Hot)
        .count();

    DashboardAggregate {
        total_leads: leads.len(),
        qualified_email_count,
        hot_count,
        category_distribution,
        hot_rate: rounded_percent(hot_count, forecast.len()),
    }
}

/// `round(part / max(whole, 1) * 100)` with halves rounded up.
fn rounded_percent(part: usize, whole: usize) -> u32 {
    let whole = whole.max(1) as u64;
    let part = part as u64;
    ((part * 200 + whole) / (2 * whole)) as u32
}
