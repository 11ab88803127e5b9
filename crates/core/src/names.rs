use std::collections::HashSet;

use crate::schedule::Schedule;

fn with_suffix(name: &str, suffix: usize) -> String {
    format!("{name} ({suffix})")
}

/// Propose a name for the schedule that would become number `count + 1`.
///
/// Starts from `"{base} {count + 1}"` and appends the smallest positive
/// `" (n)"` suffix needed to avoid every name in `existing`.
pub fn next_schedule_name<S: AsRef<str>>(existing: &[S], count: usize, base: &str) -> String {
    let taken: HashSet<&str> = existing.iter().map(AsRef::as_ref).collect();
    let candidate = format!("{base} {}", count + 1);
    if !taken.contains(candidate.as_str()) {
        return candidate;
    }
    (1..)
        .map(|n| with_suffix(&candidate, n))
        .find(|name| !taken.contains(name.as_str()))
        .unwrap_or(candidate)
}

/// Rename later duplicates so every schedule name is unique, keeping the
/// first occurrence of each name as is. Returns how many were renamed.
pub fn mangle_duplicate_schedule_names(schedules: &mut [Schedule]) -> usize {
    let original: HashSet<String> = schedules.iter().map(|s| s.name.clone()).collect();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut renamed = 0;

    for schedule in schedules.iter_mut() {
        if claimed.insert(schedule.name.clone()) {
            continue;
        }
        let replacement = (1..)
            .map(|n| with_suffix(&schedule.name, n))
            .find(|name| !original.contains(name) && !claimed.contains(name))
            .unwrap_or_else(|| schedule.name.clone());
        claimed.insert(replacement.clone());
        schedule.name = replacement;
        renamed += 1;
    }
    renamed
}
