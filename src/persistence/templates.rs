//! Built-in layouts, generated once into `layouts/templates/` when missing.

use chrono::Utc;
use egui::{Rect, Vec2, vec2};
use uuid::Uuid;

use crate::dock_builder::{DockBuilder, DockLeaf, SplitDirection};
use crate::docking::{DockState, DockingOptions, Zone};

use super::snapshot::{LAYOUT_SNAPSHOT_VERSION, LayoutSnapshot, PanelRecord, TabGroupRecord};

pub const PARAMETERS_PANEL: &str = "parameters";
pub const ANIMATION_PANEL: &str = "animation";
pub const PLOTS_PANEL: &str = "plots";
pub const DATA_PANEL: &str = "data";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutTemplate {
    Development,
    Analysis,
    Presentation,
}

impl LayoutTemplate {
    pub const ALL: [Self; 3] = [Self::Development, Self::Analysis, Self::Presentation];

    pub fn name(self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Analysis => "Analysis",
            Self::Presentation => "Presentation",
        }
    }

    /// File name under `layouts/templates/`.
    pub fn file_name(self) -> String {
        format!("{}_template.json", self.name().to_lowercase())
    }

    fn description(self) -> &'static str {
        match self {
            Self::Development => "Parameters on the left, animation in the middle, plots and data tabbed below",
            Self::Analysis => "Plots and data get most of the window; narrow parameter column",
            Self::Presentation => "Animation front and center with plots beside it",
        }
    }

    /// The fixed snapshot for this template inside `bounds`.
    pub fn snapshot(self, bounds: Rect, options: &DockingOptions) -> LayoutSnapshot {
        let mut b = DockBuilder::new();
        let root = b.add_node();
        let mut minimized: Vec<&'static str> = Vec::new();

        match self {
            Self::Development => {
                let (left, rest) = b.split_node(root, SplitDirection::Left, 0.3);
                let (bottom, center) = b.split_node(rest, SplitDirection::Down, 0.35);
                b.dock_pane(PARAMETERS_PANEL, left);
                b.dock_panes([PLOTS_PANEL, DATA_PANEL], bottom);
                b.dock_pane(ANIMATION_PANEL, center);
            }
            Self::Analysis => {
                let (left, rest) = b.split_node(root, SplitDirection::Left, 0.2);
                let (right, rest) = b.split_node(rest, SplitDirection::Right, 0.45);
                let (bottom, center) = b.split_node(rest, SplitDirection::Down, 0.55);
                b.dock_pane(PARAMETERS_PANEL, left);
                b.dock_pane(DATA_PANEL, right);
                b.dock_pane(PLOTS_PANEL, bottom);
                b.dock_pane(ANIMATION_PANEL, center);
            }
            Self::Presentation => {
                let (right, center) = b.split_node(root, SplitDirection::Right, 0.3);
                b.dock_pane(PLOTS_PANEL, right);
                b.dock_pane(ANIMATION_PANEL, center);
                minimized.extend([PARAMETERS_PANEL, DATA_PANEL]);
            }
        }

        let leaves = b.finish(root, bounds);
        let records = TemplateRecords::new(options).build(&leaves, &minimized, bounds);

        let now = Utc::now();
        LayoutSnapshot {
            id: Uuid::new_v4(),
            name: format!("{} Template", self.name()),
            description: self.description().to_owned(),
            template: Some(self),
            created_at: now,
            modified_at: now,
            version: LAYOUT_SNAPSHOT_VERSION,
            panels: records.0,
            tab_groups: records.1,
            container_bounds: bounds.into(),
        }
    }
}

fn title(id: &str) -> String {
    match id {
        PARAMETERS_PANEL => "Parameters",
        ANIMATION_PANEL => "Animation",
        PLOTS_PANEL => "Plots",
        DATA_PANEL => "Data",
        other => other,
    }
    .to_owned()
}

struct TemplateRecords {
    min_size: Vec2,
    max_size: Vec2,
    next_z_index: i32,
}

impl TemplateRecords {
    fn new(options: &DockingOptions) -> Self {
        Self {
            min_size: options.default_min_size,
            max_size: options.default_max_size,
            next_z_index: 1,
        }
    }

    fn record(&mut self, id: &str, rect: Rect, state: DockState, zone: Zone) -> PanelRecord {
        let z_index = self.next_z_index;
        self.next_z_index += 1;
        PanelRecord {
            id: id.to_owned(),
            title: title(id),
            state,
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
            min_width: self.min_size.x,
            min_height: self.min_size.y,
            max_width: self.max_size.x,
            max_height: self.max_size.y,
            dock_zone: zone,
            tab_group_id: None,
            is_minimized: false,
            z_index,
            restore_state: None,
        }
    }

    fn build(
        mut self,
        leaves: &[DockLeaf<&'static str>],
        minimized: &[&'static str],
        bounds: Rect,
    ) -> (Vec<PanelRecord>, Vec<TabGroupRecord>) {
        let mut panels = Vec::new();
        let mut groups = Vec::new();

        for leaf in leaves {
            match leaf.panes.as_slice() {
                [] => {}
                [id] => panels.push(self.record(id, leaf.rect, DockState::Docked, leaf.zone)),
                ids => {
                    let group_id = format!("tabs-{}", groups.len() + 1);
                    for id in ids {
                        let mut record = self.record(id, leaf.rect, DockState::Tabbed, Zone::TabGroup);
                        record.tab_group_id = Some(group_id.clone());
                        panels.push(record);
                    }
                    groups.push(TabGroupRecord {
                        title: title(ids[0]),
                        id: group_id,
                        panel_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
                        active_panel: ids[0].to_owned(),
                        x: leaf.rect.min.x,
                        y: leaf.rect.min.y,
                        width: leaf.rect.width(),
                        height: leaf.rect.height(),
                    });
                }
            }
        }

        // Hidden panels come back as a centered floating window.
        let size = vec2(bounds.width() * 0.4, bounds.height() * 0.5).max(self.min_size);
        let floating = Rect::from_center_size(bounds.center(), size);
        for id in minimized {
            let mut record = self.record(id, floating, DockState::Minimized, Zone::None);
            record.is_minimized = true;
            record.restore_state = Some(DockState::Floating);
            panels.push(record);
        }

        (panels, groups)
    }
}
