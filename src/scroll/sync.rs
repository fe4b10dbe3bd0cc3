use std::collections::BTreeSet;

use crate::docking::PanelId;

pub type SyncGroupId = String;

/// Axes a sync group keeps equal. Offsets are vertical, so only `Vertical` and `Both` propagate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    None,
    Horizontal,
    #[default]
    Vertical,
    Both,
}

impl SyncMode {
    pub fn syncs_vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncGroup {
    pub id: SyncGroupId,
    pub mode: SyncMode,
    pub members: BTreeSet<PanelId>,
}

impl SyncGroup {
    pub fn new(id: impl Into<SyncGroupId>, mode: SyncMode) -> Self {
        Self {
            id: id.into(),
            mode,
            members: BTreeSet::new(),
        }
    }

    pub fn contains(&self, panel_id: &str) -> bool {
        self.members.contains(panel_id)
    }

    /// Members other than `panel_id` that should follow its offset.
    pub fn followers<'a>(&'a self, panel_id: &'a str) -> impl Iterator<Item = &'a PanelId> + 'a {
        let syncs = self.mode.syncs_vertical();
        self.members
            .iter()
            .filter(move |m| syncs && m.as_str() != panel_id)
    }
}
