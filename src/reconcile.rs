use crate::models::{OverrideMap, TaskOverride, VirtualInstance};

/// Applies the stored override for each instance, if there is one.
///
/// Instances are never added or removed here; skipping is only flagged and
/// left to [`visible`]. Running it twice with the same overrides changes nothing.
pub fn reconcile(instances: Vec<VirtualInstance>, overrides: &OverrideMap) -> Vec<VirtualInstance> {
    instances
        .into_iter()
        .map(|mut instance| {
            if let Some(o) = overrides.get(&instance.key()) {
                apply_override(&mut instance, o);
            }
            instance
        })
        .collect()
}

/// Copies every field the override sets onto the instance.
pub fn apply_override(instance: &mut VirtualInstance, o: &TaskOverride) {
    if let Some(status) = o.status {
        instance.status = status;
    }
    if let Some(title) = &o.title {
        instance.title = title.clone();
    }
    if let Some(description) = &o.description {
        instance.description = description.clone();
    }
    if let Some(priority) = o.priority {
        instance.priority = priority;
    }
    if let Some(assignees) = &o.assignees {
        instance.assignees = assignees.clone();
    }
    if let Some(skipped) = o.skipped {
        instance.skipped = skipped;
    }
    instance.overridden = true;
}

/// Drops instances marked as skipped.
pub fn visible(instances: Vec<VirtualInstance>) -> Vec<VirtualInstance> {
    instances.into_iter().filter(|i| !i.skipped).collect()
}
