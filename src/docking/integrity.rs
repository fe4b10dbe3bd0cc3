use std::collections::HashSet;
use std::hash::{Hash as _, Hasher as _};

use super::DockingManager;
use super::types::DockState;

impl DockingManager {
    /// Check the panel/tab-group invariants. An empty list means the model is consistent.
    ///
    /// - `state == TABBED` iff `tab_group_id` is set, and the referenced group lists the panel.
    /// - Every group is non-empty, lists distinct registered panels that point back at it, and
    ///   its active panel is a member.
    /// - `minimized` iff `state == MINIMIZED`.
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues: Vec<String> = Vec::new();

        for (key, panel) in &self.panels {
            if *key != panel.id {
                issues.push(format!("integrity: panel key {key:?} holds id {:?}", panel.id));
            }

            let tabbed = panel.state == DockState::Tabbed;
            match (&panel.tab_group_id, tabbed) {
                (Some(gid), true) => match self.tab_groups.get(gid) {
                    None => issues.push(format!(
                        "integrity: panel {key:?} references missing tab group {gid:?}"
                    )),
                    Some(group) if !group.contains(key) => issues.push(format!(
                        "integrity: panel {key:?} not listed by its tab group {gid:?}"
                    )),
                    Some(_) => {}
                },
                (None, false) => {}
                (Some(gid), false) => issues.push(format!(
                    "integrity: panel {key:?} has tab group {gid:?} but state {:?}",
                    panel.state
                )),
                (None, true) => issues.push(format!("integrity: panel {key:?} TABBED without a group")),
            }

            if panel.minimized != (panel.state == DockState::Minimized) {
                issues.push(format!(
                    "integrity: panel {key:?} minimized={} but state {:?}",
                    panel.minimized, panel.state
                ));
            }
        }

        for (gid, group) in &self.tab_groups {
            if group.panel_ids.is_empty() {
                issues.push(format!("integrity: tab group {gid:?} is empty"));
            }
            if !group.contains(&group.active_panel) {
                issues.push(format!(
                    "integrity: tab group {gid:?} active {:?} not in {:?}",
                    group.active_panel, group.panel_ids
                ));
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for id in &group.panel_ids {
                if !seen.insert(id.as_str()) {
                    issues.push(format!("integrity: tab group {gid:?} lists {id:?} twice"));
                }
                match self.panels.get(id) {
                    None => issues.push(format!(
                        "integrity: tab group {gid:?} references missing panel {id:?}"
                    )),
                    Some(panel) if panel.tab_group_id.as_ref() != Some(gid) => issues.push(format!(
                        "integrity: tab group {gid:?} lists {id:?} which points at {:?}",
                        panel.tab_group_id
                    )),
                    Some(_) => {}
                }
            }
        }

        issues
    }
}

pub(super) fn hash_issues(lines: &[String]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for line in lines {
        line.hash(&mut hasher);
    }
    hasher.finish()
}
