use crate::models::{Application, ApplicationStatus, GroupCount, Statistics};

pub fn statistics_json(stats: &Statistics) -> serde_json::Result<String> {
    serde_json::to_string_pretty(stats)
}

pub fn render_statistics(stats: &Statistics) -> String {
    let mut lines = vec![
        "Job Search Statistics".to_string(),
        "=".repeat(40),
        format!("{:<24} {:>10}", "Total applications", stats.total_applications),
        format!("{:<24} {:>10}", "Total interviews", stats.total_interviews),
        format!("{:<24} {:>9.2}%", "Response rate", stats.response_rate),
    ];

    if stats.total_applications == 0 {
        lines.push("\nNo applications tracked yet.".to_string());
        return finish(lines);
    }

    lines.push("\nBy status:".to_string());
    // Known statuses in lifecycle order; anything else the store returned afterwards.
    for status in ApplicationStatus::ALL {
        if let Some(count) = stats.status_counts.get(status.as_str()) {
            lines.push(format!("  {:<22} {:>10}", status.as_str(), count));
        }
    }
    for (status, count) in &stats.status_counts {
        if status.parse::<ApplicationStatus>().is_err() {
            lines.push(format!("  {:<22} {:>10}", status, count));
        }
    }

    push_groups(&mut lines, "By company (top 10):", &stats.company_counts);
    push_groups(&mut lines, "By month:", &stats.monthly_counts);

    finish(lines)
}

fn push_groups(lines: &mut Vec<String>, title: &str, groups: &[GroupCount]) {
    if groups.is_empty() {
        return;
    }
    lines.push(format!("\n{}", title));
    lines.extend(
        groups
            .iter()
            .map(|group| format!("  {:<22} {:>10}", truncate(&group.key, 22), group.count)),
    );
}

pub fn render_follow_ups(apps: &[Application], days_ahead: i64) -> String {
    if apps.is_empty() {
        return format!("No follow-ups due in the next {} days.\n", days_ahead);
    }

    let mut lines = vec![
        format!(
            "{:<6} {:<12} {:<14} {:<24} {:<28}",
            "ID", "FOLLOW UP", "STATUS", "COMPANY", "POSITION"
        ),
        "-".repeat(86),
    ];
    for app in apps {
        let date = app
            .follow_up_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        lines.push(format!(
            "{:<6} {:<12} {:<14} {:<24} {:<28}",
            app.id,
            date,
            app.status.as_str(),
            truncate(&app.company, 22),
            truncate(&app.position, 26)
        ));
    }
    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
