//! One-line status summaries of widget snapshots.

use pulseboard_widget::WidgetSnapshot;

/// `name [state] value | counter=n ... | task`
pub fn summary(snapshot: &WidgetSnapshot) -> String {
    let counters = snapshot
        .counters
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut line = format!(
        "{} [{}] {} | {}",
        snapshot.name,
        snapshot.state,
        snapshot.display_value(),
        counters
    );
    if let Some(task) = &snapshot.current_task {
        line.push_str(" | ");
        line.push_str(task);
    }
    if let Some(error) = &snapshot.resource.error {
        line.push_str(&format!(" (stale: {error})"));
    }
    line
}
