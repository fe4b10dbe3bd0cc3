use egui::{Pos2, Rect, Vec2, pos2, vec2};

use super::{DockEvent, DockState, DockingManager, DockingOptions, PanelId, Zone};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_model_ok(dock: &DockingManager) {
    let issues = dock.integrity_issues();
    assert!(
        issues.is_empty(),
        "docking integrity failed:\n{}",
        issues.join("\n")
    );
}

fn strict_options() -> DockingOptions {
    DockingOptions {
        debug_integrity: true,
        debug_integrity_panic: true,
        default_container: Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0)),
        ..Default::default()
    }
}

fn dock_with(ids: &[&str]) -> DockingManager {
    let mut dock = DockingManager::new(strict_options());
    for (i, id) in ids.iter().enumerate() {
        let offset = 10.0 * i as f32;
        assert!(dock.register_panel(
            *id,
            id.to_uppercase(),
            pos2(100.0 + offset, 100.0 + offset),
            vec2(200.0, 150.0),
            DockState::Floating,
        ));
    }
    dock
}

fn ids(list: &[&str]) -> Vec<PanelId> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed ^ 0xD0C3_D0C3_D0C3_D0C3)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005u64)
            .wrapping_add(1442695040888963407u64);
        self.0 >> 11
    }

    fn next_usize(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() as usize) % upper
    }

    fn next_bool(&mut self) -> bool {
        (self.next_u64() & 1) != 0
    }

    fn next_pos(&mut self, bounds: Rect) -> Pos2 {
        // Slightly past the container so NONE is exercised too.
        let x = (self.next_usize(920) as f32) - 60.0;
        let y = (self.next_usize(720) as f32) - 60.0;
        pos2(bounds.min.x + x, bounds.min.y + y)
    }
}

#[test]
fn register_is_idempotent_by_id() {
    init_logger();
    let mut dock = dock_with(&["a"]);
    assert!(!dock.register_panel("a", "Other", Pos2::ZERO, vec2(50.0, 50.0), DockState::Docked));

    let panel = dock.panel("a").unwrap();
    assert_eq!(panel.title, "A");
    assert_eq!(panel.state, DockState::Floating);
    assert_eq!(dock.panels().len(), 1);
}

#[test]
fn register_clamps_to_default_min_size() {
    let mut dock = DockingManager::new(strict_options());
    dock.register_panel("tiny", "Tiny", Pos2::ZERO, vec2(5.0, 5.0), DockState::Floating);
    assert_eq!(dock.panel("tiny").unwrap().size, vec2(120.0, 80.0));
}

#[test]
fn register_tabbed_falls_back_to_floating() {
    let mut dock = DockingManager::new(strict_options());
    dock.register_panel("t", "T", Pos2::ZERO, vec2(200.0, 200.0), DockState::Tabbed);
    let panel = dock.panel("t").unwrap();
    assert_eq!(panel.state, DockState::Floating);
    assert_eq!(panel.tab_group_id, None);
    assert_model_ok(&dock);
}

#[test]
fn register_minimized_restores_as_floating() {
    let mut dock = DockingManager::new(strict_options());
    dock.register_panel("m", "M", Pos2::ZERO, vec2(200.0, 200.0), DockState::Minimized);
    assert!(dock.panel("m").unwrap().minimized);
    assert!(dock.restore_panel("m"));
    let panel = dock.panel("m").unwrap();
    assert_eq!(panel.state, DockState::Floating);
    assert!(!panel.minimized);
}

#[test]
fn tab_group_invariants_hold() {
    let mut dock = dock_with(&["a", "b", "c"]);
    let gid = dock
        .create_tab_group(&ids(&["b", "a", "b", "ghost"]), pos2(300.0, 200.0), vec2(250.0, 200.0))
        .unwrap();

    let group = dock.tab_group(&gid).unwrap();
    assert_eq!(group.panel_ids, ids(&["b", "a"]));
    assert_eq!(group.active_panel, "b");
    assert_eq!(group.title, "B");

    for id in ["a", "b"] {
        let panel = dock.panel(id).unwrap();
        assert_eq!(panel.state, DockState::Tabbed);
        assert_eq!(panel.tab_group_id.as_deref(), Some(gid.as_str()));
        assert_eq!(panel.position, pos2(300.0, 200.0));
    }
    assert_eq!(dock.panel("c").unwrap().tab_group_id, None);
    assert_model_ok(&dock);
}

#[test]
fn create_tab_group_without_known_panels_is_none() {
    let mut dock = dock_with(&["a"]);
    assert!(dock.create_tab_group(&ids(&["x", "y"]), Pos2::ZERO, vec2(10.0, 10.0)).is_none());
    assert!(dock.tab_groups().is_empty());
}

#[test]
fn unregister_promotes_next_tab_and_deletes_empty_group() {
    let mut dock = dock_with(&["a", "b", "c"]);
    let gid = dock
        .create_tab_group(&ids(&["a", "b", "c"]), Pos2::ZERO, vec2(300.0, 300.0))
        .unwrap();

    assert!(dock.unregister_panel("a").is_some());
    let group = dock.tab_group(&gid).unwrap();
    assert_eq!(group.panel_ids, ids(&["b", "c"]));
    assert_eq!(group.active_panel, "b");

    dock.unregister_panel("b");
    dock.unregister_panel("c");
    assert!(dock.tab_group(&gid).is_none());
    assert!(dock.panels().is_empty());
    assert_model_ok(&dock);
}

#[test]
fn unregister_unknown_is_noop() {
    let mut dock = dock_with(&["a"]);
    assert!(dock.unregister_panel("nope").is_none());
    assert_eq!(dock.panels().len(), 1);
}

#[test]
fn moving_a_tab_clamps_without_wraparound() {
    let mut dock = dock_with(&["a", "b", "c"]);
    let gid = dock
        .create_tab_group(&ids(&["a", "b", "c"]), Pos2::ZERO, vec2(300.0, 300.0))
        .unwrap();

    assert!(dock.move_tab(&gid, "a", 10));
    assert_eq!(dock.tab_group(&gid).unwrap().panel_ids, ids(&["b", "c", "a"]));

    assert!(dock.move_tab(&gid, "a", -1));
    assert_eq!(dock.tab_group(&gid).unwrap().panel_ids, ids(&["b", "a", "c"]));

    assert!(dock.move_tab(&gid, "c", isize::MIN));
    assert_eq!(dock.tab_group(&gid).unwrap().panel_ids, ids(&["c", "b", "a"]));

    assert!(!dock.move_tab(&gid, "ghost", 1));
    assert!(!dock.move_tab("no-group", "a", 1));
}

#[test]
fn add_to_tab_group_moves_panel_between_groups() {
    let mut dock = dock_with(&["a", "b", "c", "d"]);
    let g1 = dock
        .create_tab_group(&ids(&["a", "b"]), Pos2::ZERO, vec2(300.0, 300.0))
        .unwrap();
    let g2 = dock
        .create_tab_group(&ids(&["c"]), pos2(400.0, 0.0), vec2(300.0, 300.0))
        .unwrap();
    assert_ne!(g1, g2);

    assert!(dock.add_to_tab_group(&g2, "a"));
    assert_eq!(dock.tab_group(&g1).unwrap().panel_ids, ids(&["b"]));
    assert_eq!(dock.tab_group(&g1).unwrap().active_panel, "b");
    let g2_group = dock.tab_group(&g2).unwrap();
    assert_eq!(g2_group.panel_ids, ids(&["c", "a"]));
    assert_eq!(g2_group.active_panel, "a");
    assert_eq!(dock.panel("a").unwrap().position, pos2(400.0, 0.0));

    assert!(dock.add_to_tab_group(&g2, "d"));
    assert!(dock.set_active_tab_panel(&g2, "c"));
    assert!(!dock.set_active_tab_panel(&g2, "b"));
    assert_model_ok(&dock);
}

#[test]
fn remove_from_tab_group_floats_at_group_position() {
    let mut dock = dock_with(&["a", "b"]);
    let gid = dock
        .create_tab_group(&ids(&["a", "b"]), pos2(50.0, 60.0), vec2(300.0, 300.0))
        .unwrap();
    assert!(dock.remove_from_tab_group("a"));

    let panel = dock.panel("a").unwrap();
    assert_eq!(panel.state, DockState::Floating);
    assert_eq!(panel.position, pos2(50.0, 60.0));
    assert_eq!(dock.tab_group(&gid).unwrap().active_panel, "b");
    assert!(!dock.remove_from_tab_group("a"));
    assert_model_ok(&dock);
}

#[test]
fn minimize_and_restore_return_to_prior_state() {
    let mut dock = dock_with(&["a"]);
    dock.dock_panel("a", Zone::Top);
    assert!(dock.minimize_panel("a"));

    let panel = dock.panel("a").unwrap();
    assert_eq!(panel.state, DockState::Minimized);
    assert!(panel.minimized);
    assert!(dock.layout_items().is_empty());

    assert!(dock.restore_panel("a"));
    let panel = dock.panel("a").unwrap();
    assert_eq!(panel.state, DockState::Docked);
    assert_eq!(panel.dock_zone, Zone::Top);
    assert!(!panel.minimized);

    assert!(!dock.minimize_panel("ghost"));
    assert!(!dock.restore_panel("ghost"));
}

#[test]
fn minimizing_a_tab_detaches_it_and_restores_floating() {
    let mut dock = dock_with(&["a", "b"]);
    let gid = dock
        .create_tab_group(&ids(&["a", "b"]), Pos2::ZERO, vec2(300.0, 300.0))
        .unwrap();

    assert!(dock.minimize_panel("a"));
    assert_model_ok(&dock);
    assert_eq!(dock.panel("a").unwrap().tab_group_id, None);
    assert_eq!(dock.tab_group(&gid).unwrap().panel_ids, ids(&["b"]));

    dock.restore_panel("a");
    assert_eq!(dock.panel("a").unwrap().state, DockState::Floating);
    assert_model_ok(&dock);
}

#[test]
fn docking_claims_a_fraction_of_the_container() {
    let mut dock = dock_with(&["l", "r", "b"]);
    dock.set_size_constraints("r", vec2(10.0, 10.0), vec2(100.0, f32::MAX));

    assert!(dock.dock_panel("l", Zone::Left));
    let left = dock.panel("l").unwrap();
    assert_eq!(left.position, Pos2::ZERO);
    assert!((left.size.x - 240.0).abs() < 1e-3);
    assert_eq!(left.size.y, 600.0);

    // Clamped to max width, still flush with the right edge.
    assert!(dock.dock_panel("r", Zone::Right));
    let right = dock.panel("r").unwrap();
    assert_eq!(right.size.x, 100.0);
    assert_eq!(right.rect().max.x, 800.0);

    assert!(dock.dock_panel("b", Zone::Bottom));
    let bottom = dock.panel("b").unwrap();
    assert!((bottom.rect().max.y - 600.0).abs() < 1e-3);
    assert_eq!(bottom.dock_zone, Zone::Bottom);
}

#[test]
fn docking_to_a_non_edge_zone_floats() {
    let mut dock = dock_with(&["a"]);
    assert!(dock.dock_panel("a", Zone::Center));
    let panel = dock.panel("a").unwrap();
    assert_eq!(panel.state, DockState::Floating);
    assert_eq!(panel.position, pos2(100.0, 100.0));
}

#[test]
fn bring_to_front_raises_z_index() {
    let mut dock = dock_with(&["a", "b"]);
    assert!(dock.panel("b").unwrap().z_index > dock.panel("a").unwrap().z_index);
    assert!(dock.bring_to_front("a"));
    assert!(dock.panel("a").unwrap().z_index > dock.panel("b").unwrap().z_index);
    assert!(!dock.bring_to_front("ghost"));
}

#[test]
fn container_update_does_not_move_docked_panels() {
    let mut dock = dock_with(&["a"]);
    dock.dock_panel("a", Zone::Right);
    let before = dock.panel("a").unwrap().rect();

    dock.update_container_bounds(Rect::from_min_size(Pos2::ZERO, vec2(1600.0, 900.0)));
    assert_eq!(dock.panel("a").unwrap().rect(), before);
    assert_eq!(dock.zones().right.max.x, 1600.0);
}

#[test]
fn adjustments_for_unknown_panels_are_skipped() {
    use crate::layout::PanelLayoutCoordinator;

    let mut dock = dock_with(&["a", "b"]);
    let items = dock.layout_items();
    let mut adjustments = PanelLayoutCoordinator::default().resolve_resize("a", vec2(400.0, 400.0), &items);
    assert!(!adjustments.is_empty());

    let mut ghost = adjustments[0].clone();
    ghost.panel_id = "ghost".to_owned();
    adjustments.push(ghost);

    let expected = adjustments.len() - 1;
    assert_eq!(dock.apply_adjustments(&adjustments), expected);
    assert_eq!(dock.panel("a").unwrap().size, vec2(400.0, 400.0));
}

#[test]
fn subscribers_see_panel_and_tab_group_changes() {
    let mut dock = dock_with(&[]);
    let rx = dock.subscribe();
    dock.register_panel("a", "A", Pos2::ZERO, vec2(200.0, 200.0), DockState::Floating);
    dock.register_panel("b", "B", Pos2::ZERO, vec2(200.0, 200.0), DockState::Floating);
    dock.create_tab_group(&ids(&["a", "b"]), Pos2::ZERO, vec2(200.0, 200.0));

    let events: Vec<DockEvent> = rx.try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, DockEvent::Panels(p) if p.contains_key("b"))));
    assert!(events.iter().any(|e| matches!(e, DockEvent::TabGroups(g) if g.len() == 1)));

    drop(rx);
    dock.register_panel("c", "C", Pos2::ZERO, vec2(200.0, 200.0), DockState::Floating);
}

#[test]
fn debug_log_is_a_bounded_ring_buffer() {
    let mut dock = DockingManager::new(DockingOptions {
        debug_event_log: true,
        debug_event_log_capacity: 3,
        ..Default::default()
    });
    for id in ["a", "b", "c", "d", "e"] {
        dock.register_panel(id, id, Pos2::ZERO, vec2(200.0, 200.0), DockState::Floating);
    }
    let text = dock.debug_log_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert!(lines[2].starts_with("[event 5]"), "{text}");
    assert!(lines[2].contains("register e"), "{text}");

    dock.debug_log_clear();
    assert!(dock.debug_log_text().is_empty());
}

#[test]
fn clear_removes_everything() {
    let mut dock = dock_with(&["a", "b"]);
    dock.create_tab_group(&ids(&["a", "b"]), Pos2::ZERO, vec2(200.0, 200.0));
    dock.start_drag("a", pos2(10.0, 10.0));
    dock.clear();
    assert!(dock.panels().is_empty());
    assert!(dock.tab_groups().is_empty());
    assert!(dock.drag_state().is_none());
}

#[test]
fn model_random_operations_stay_integrity_ok() {
    init_logger();
    const POOL: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "p5"];

    for seed in 1u64..=12u64 {
        let mut rng = Rng::new(seed);
        let mut dock = DockingManager::new(strict_options());
        let bounds = dock.container_bounds();

        for _step in 0..400 {
            let id = POOL[rng.next_usize(POOL.len())];
            match rng.next_usize(12) {
                0 => {
                    let state = match rng.next_usize(4) {
                        0 => DockState::Docked,
                        1 => DockState::Floating,
                        2 => DockState::Tabbed,
                        _ => DockState::Minimized,
                    };
                    let pos = rng.next_pos(bounds);
                    dock.register_panel(id, id, pos, vec2(150.0, 120.0), state);
                }
                1 => {
                    dock.unregister_panel(id);
                }
                2 => {
                    dock.start_drag(id, rng.next_pos(bounds));
                }
                3 => {
                    dock.update_drag(rng.next_pos(bounds));
                }
                4 => {
                    if let Some(outcome) = dock.end_drag() {
                        assert!(dock.panel(outcome.panel_id()).is_some());
                    }
                }
                5 => {
                    if rng.next_bool() {
                        dock.minimize_panel(id);
                    } else {
                        dock.restore_panel(id);
                    }
                }
                6 => {
                    let count = 1 + rng.next_usize(3);
                    let members: Vec<PanelId> = (0..count)
                        .map(|_| POOL[rng.next_usize(POOL.len())].to_owned())
                        .collect();
                    let pos = rng.next_pos(bounds);
                    dock.create_tab_group(&members, pos, vec2(250.0, 200.0));
                }
                7 => {
                    let groups: Vec<String> = dock.tab_groups().keys().cloned().collect();
                    if !groups.is_empty() {
                        let gid = &groups[rng.next_usize(groups.len())];
                        dock.add_to_tab_group(gid, id);
                    }
                }
                8 => {
                    let groups: Vec<String> = dock.tab_groups().keys().cloned().collect();
                    if !groups.is_empty() {
                        let gid = &groups[rng.next_usize(groups.len())];
                        let offset = rng.next_usize(7) as isize - 3;
                        dock.move_tab(gid, id, offset);
                    }
                }
                9 => {
                    dock.remove_from_tab_group(id);
                }
                10 => {
                    let zone = match rng.next_usize(5) {
                        0 => Zone::Left,
                        1 => Zone::Right,
                        2 => Zone::Top,
                        3 => Zone::Bottom,
                        _ => Zone::Center,
                    };
                    dock.dock_panel(id, zone);
                }
                _ => {
                    dock.cancel_drag();
                }
            }
            assert_model_ok(&dock);
        }
    }
}

#[test]
fn revision_tracks_model_changes_only() {
    let mut dock = dock_with(&["a"]);
    assert!(dock.revision() > 0);

    assert!(dock.start_drag("a", pos2(110.0, 110.0)));
    let before = dock.revision();
    dock.update_drag(pos2(300.0, 300.0));
    assert_eq!(dock.revision(), before, "hover updates are not model changes");
    dock.cancel_drag();

    dock.update_container_bounds(Rect::from_min_size(Pos2::ZERO, vec2(640.0, 480.0)));
    assert!(dock.revision() > before);
}

#[test]
fn repeated_integrity_failures_are_logged_once() {
    init_logger();
    let mut dock = DockingManager::new(DockingOptions {
        debug_integrity_panic: false,
        debug_event_log: true,
        ..strict_options()
    });
    dock.register_panel("a", "A", pos2(10.0, 10.0), vec2(200.0, 150.0), DockState::Floating);
    dock.debug_log_clear();

    dock.panels.get_mut("a").unwrap().minimized = true;
    dock.debug_check_integrity("corrupt");
    dock.debug_check_integrity("corrupt");
    let text = dock.debug_log_text();
    assert_eq!(text.matches("after corrupt:").count(), 1, "{text}");

    dock.panels.get_mut("a").unwrap().minimized = false;
    dock.debug_check_integrity("repair");
    dock.debug_check_integrity("repair");
    assert_eq!(dock.debug_log_text().matches("integrity OK after repair").count(), 1);
}

#[test]
fn zone_threshold_changes_apply_without_resize() {
    let mut dock = dock_with(&["a"]);
    let bounds = dock.container_bounds();
    let near_left = pos2(70.0, 300.0);
    assert_eq!(dock.zones().classify(near_left), Zone::Center);

    dock.options.zone_threshold = 100.0;
    dock.update_container_bounds(bounds);
    assert_eq!(dock.zones().threshold, 100.0);
    assert_eq!(dock.zones().classify(near_left), Zone::Left);

    dock.set_zone_threshold(20.0);
    assert_eq!(dock.options.zone_threshold, 20.0);
    assert_eq!(dock.zones().classify(near_left), Zone::Center);
}
