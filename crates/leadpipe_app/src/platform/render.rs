use std::fmt::Write as _;

use leadpipe_core::{Phase, RunSnapshot, RECENT_OPPORTUNITY_LIMIT};

use crate::cli::View;

pub fn render(snapshot: &RunSnapshot, view: View) -> String {
    let mut out = String::new();

    if let Some(error) = &snapshot.error_message {
        let _ = writeln!(out, "Error: {error}");
    }
    for warning in &snapshot.fetch_warnings {
        let _ = writeln!(out, "Warning: could not load {warning}");
    }
    if !snapshot.has_data() {
        if snapshot.phase == Phase::Completed {
            out.push_str("No leads were returned for this run.\n");
        }
        return out;
    }

    match view {
        View::Dashboard => render_dashboard(&mut out, snapshot),
        View::Leads => render_leads(&mut out, snapshot),
        View::Analytics => render_analytics(&mut out, snapshot),
        View::All => {
            render_dashboard(&mut out, snapshot);
            out.push('\n');
            render_leads(&mut out, snapshot);
            out.push('\n');
            render_analytics(&mut out, snapshot);
        }
    }
    out
}

pub fn status_line(snapshot: &RunSnapshot) -> String {
    let phase = match snapshot.phase {
        Phase::Idle => "Idle",
        Phase::Running => "Running",
        Phase::Completed => "Completed",
        Phase::Failed => "Failed",
    };
    match snapshot.steps_completed {
        Some(steps) if snapshot.phase == Phase::Running => {
            format!("[{phase} {steps}/6] {}", snapshot.status_message)
        }
        _ => format!("[{phase}] {}", snapshot.status_message),
    }
}

fn render_dashboard(out: &mut String, snapshot: &RunSnapshot) {
    let aggregate = &snapshot.aggregate;
    out.push_str("== Dashboard ==\n");
    let _ = writeln!(out, "Leads Generated:   {}", aggregate.total_leads);
    let _ = writeln!(out, "Emails Qualified:  {}", aggregate.qualified_email_count);
    let _ = writeln!(out, "Hot Opportunities: {}", aggregate.hot_count);

    out.push_str("\nPipeline Forecast\n");
    for entry in &aggregate.category_distribution {
        let _ = writeln!(out, "  {:<10} {}", entry.category, entry.count);
    }

    out.push_str("\nRecent Opportunities\n");
    for record in snapshot.recent_opportunities(RECENT_OPPORTUNITY_LIMIT) {
        let _ = writeln!(
            out,
            "  {} [{}] {}",
            record.email, record.category, record.reason
        );
    }
}

fn render_leads(out: &mut String, snapshot: &RunSnapshot) {
    let _ = writeln!(out, "== All Leads ({}) ==", snapshot.leads.len());
    for lead in &snapshot.leads {
        let emails = lead.email_list();
        if emails.is_empty() {
            let _ = writeln!(out, "  {} - No emails found", lead.url);
        } else {
            let _ = writeln!(out, "  {} - {}", lead.url, emails.join(", "));
        }
    }
}

fn render_analytics(out: &mut String, snapshot: &RunSnapshot) {
    let aggregate = &snapshot.aggregate;
    let total = snapshot.forecast.len().max(1) as f64;
    out.push_str("== Analytics ==\n");
    out.push_str("Lead Distribution\n");
    for entry in &aggregate.category_distribution {
        let share = entry.count as f64 / total * 100.0;
        let _ = writeln!(out, "  {:<10} {:>4} ({share:.1}%)", entry.category, entry.count);
    }
    let _ = writeln!(out, "Hot Lead Rate: {}%", aggregate.hot_rate);
}
