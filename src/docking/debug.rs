use super::DockingManager;
use super::integrity;

impl DockingManager {
    pub(super) fn debug_log_event(&mut self, message: impl Into<String>) {
        if !self.options.debug_event_log {
            return;
        }
        self.push_debug_log_line(message.into());
    }

    fn push_debug_log_line(&mut self, message: String) {
        let cap = self.options.debug_log_capacity();
        while self.debug_log.len() >= cap {
            self.debug_log.pop_front();
        }
        self.debug_seq = self.debug_seq.wrapping_add(1);
        self.debug_log
            .push_back(format!("[event {}] {}", self.debug_seq, message));
    }

    /// Clear the debug event ring buffer.
    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }

    /// The debug event ring buffer, one event per line (oldest first).
    pub fn debug_log_text(&self) -> String {
        self.debug_log
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Log integrity issues once per distinct issue set, and once more when they clear.
    pub(super) fn debug_check_integrity(&mut self, after: &str) {
        if !self.options.debug_integrity {
            return;
        }
        let issues = self.integrity_issues();
        let hash = if issues.is_empty() {
            0
        } else {
            integrity::hash_issues(&issues)
        };
        let prev = std::mem::replace(&mut self.debug_last_integrity_hash, hash);

        if prev != hash {
            if issues.is_empty() {
                log::info!("integrity OK after {after}");
                self.debug_log_event(format!("integrity OK after {after}"));
            } else {
                log::error!(
                    "integrity issues after {after} (hash {hash:016x}):\n{}",
                    issues.join("\n")
                );
                if self.options.debug_event_log {
                    for issue in &issues {
                        self.push_debug_log_line(format!("after {after}: {issue}"));
                    }
                }
            }
        }
        if !issues.is_empty() && self.options.debug_integrity_panic {
            panic!("panel_dock integrity failed after {after}:\n{}", issues.join("\n"));
        }
    }
}
