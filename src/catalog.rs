//! Topic-centric listing of a project's resources: each topic with the
//! subscriptions attached to it, sortable and filterable by free text.

use crate::model::{Labels, Subscription, Topic};

const EVENT_ID_KEY: &str = "publishing_event_id";

#[derive(Debug, Clone, PartialEq)]
pub struct TopicEntry {
    pub topic: Topic,
    pub subscriptions: Vec<Subscription>,
}

/// Pairs every topic with the subscriptions naming it by full resource name.
pub fn associate(topics: &[Topic], subscriptions: &[Subscription]) -> Vec<TopicEntry> {
    topics
        .iter()
        .map(|topic| TopicEntry {
            topic: topic.clone(),
            subscriptions: subscriptions
                .iter()
                .filter(|sub| sub.topic == topic.name)
                .cloned()
                .collect(),
        })
        .collect()
}

pub fn sort_by_topic_name(entries: &mut [TopicEntry]) {
    entries.sort_by(|a, b| a.topic.short_name().cmp(b.topic.short_name()));
}

/// Case-insensitive match against topic and subscription short names and
/// label values. Empty text keeps everything.
pub fn filter_entries<'a>(entries: &'a [TopicEntry], text: &str) -> Vec<&'a TopicEntry> {
    let needle = text.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| needle.is_empty() || entry_matches(entry, &needle))
        .collect()
}

fn entry_matches(entry: &TopicEntry, needle: &str) -> bool {
    let hit = |value: &str| value.to_lowercase().contains(needle);
    hit(entry.topic.short_name())
        || entry.topic.labels.values().any(|v| hit(v.as_str()))
        || entry
            .subscriptions
            .iter()
            .any(|sub| hit(sub.short_name()) || sub.labels.values().any(|v| hit(v.as_str())))
}

/// Flattens entries back into the two lists the graph builder consumes.
pub fn graph_inputs<'a, I>(entries: I) -> (Vec<Topic>, Vec<Subscription>)
where
    I: IntoIterator<Item = &'a TopicEntry>,
{
    let mut topics = Vec::new();
    let mut subscriptions = Vec::new();
    for entry in entries {
        topics.push(entry.topic.clone());
        subscriptions.extend(entry.subscriptions.iter().cloned());
    }
    (topics, subscriptions)
}

/// Labels shown on resource cards; event-id bookkeeping labels are hidden.
pub fn visible_labels(labels: &Labels) -> impl Iterator<Item = (&String, &String)> {
    labels.iter().filter(|(key, _)| !key.starts_with(EVENT_ID_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<Topic>, Vec<Subscription>) {
        let mut billing = Topic::new("projects/p/topics/billing");
        billing.labels.insert("team".to_string(), "Payments".to_string());
        let topics = vec![Topic::new("projects/p/topics/orders"), billing];
        let subs = vec![
            Subscription::new("projects/p/subscriptions/orders-audit", "projects/p/topics/orders")
                .with_label("env", "staging"),
            Subscription::new("projects/p/subscriptions/billing-sink", "projects/p/topics/billing"),
            Subscription::new("projects/p/subscriptions/stray", "projects/other/topics/orders"),
        ];
        (topics, subs)
    }

    #[test]
    fn associates_by_full_topic_name() {
        let (topics, subs) = fixture();
        let entries = associate(&topics, &subs);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subscriptions.len(), 1);
        assert_eq!(entries[0].subscriptions[0].short_name(), "orders-audit");
        assert_eq!(entries[1].subscriptions.len(), 1);
    }

    #[test]
    fn sorts_by_short_name() {
        let (topics, subs) = fixture();
        let mut entries = associate(&topics, &subs);
        sort_by_topic_name(&mut entries);
        assert_eq!(entries[0].topic.short_name(), "billing");
    }

    #[test]
    fn filters_on_names_and_label_values() {
        let (topics, subs) = fixture();
        let entries = associate(&topics, &subs);
        assert_eq!(filter_entries(&entries, "").len(), 2);
        assert_eq!(filter_entries(&entries, "PAYMENTS")[0].topic.short_name(), "billing");
        assert_eq!(filter_entries(&entries, "audit")[0].topic.short_name(), "orders");
        assert_eq!(filter_entries(&entries, "staging")[0].topic.short_name(), "orders");
        // Label keys are not searched.
        assert!(filter_entries(&entries, "team").is_empty());
    }

    #[test]
    fn graph_inputs_flatten_entries() {
        let (topics, subs) = fixture();
        let entries = associate(&topics, &subs);
        let (t, s) = graph_inputs(filter_entries(&entries, "billing"));
        assert_eq!(t.len(), 1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn hides_event_id_labels() {
        let sub = Subscription::new("projects/p/subscriptions/s", "projects/p/topics/t")
            .with_label("publishing_event_id_1", "orders")
            .with_label("owner", "ops");
        let shown: Vec<_> = visible_labels(&sub.labels).map(|(k, _)| k.as_str()).collect();
        assert_eq!(shown, vec!["owner"]);
    }
}
