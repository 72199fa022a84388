//! Turn flow, unit lifecycle and combat rules through the public battle API.

use tactics_core::abilities::UnitAbility;
use tactics_core::buffs::{Buff, BuffEffect};
use tactics_core::cell::CellId;
use tactics_core::events::BattleEvent;
use tactics_core::grid_state::GridState;
use tactics_core::pathfinding::Path;
use tactics_core::unit::UnitId;
use tactics_core::unit_state::UnitState;
use tactics_test_utils::fixtures::{battle_with, soldier, strip, three_player_battle};

#[test]
fn test_end_turn_skips_defeated_player() {
    let mut battle = three_player_battle();

    // Player 0 walks up to player 1's only unit and finishes it.
    battle.await_input();
    battle.on_unit_clicked(UnitId(0));
    battle.on_cell_clicked(CellId(3));
    let ability = UnitAbility::new("Finisher", 20, 1);
    battle.unit_ability(&ability);
    battle.on_unit_clicked(UnitId(1));
    assert!(battle.unit(UnitId(1)).is_none());
    assert!(!battle.is_over());

    assert_eq!(battle.end_turn(), Some(2));
    assert_eq!(battle.current_player(), 2);
    assert_eq!(battle.end_turn(), Some(0));
}

#[test]
fn test_finished_unit_stays_finished_until_turn_start() {
    let mut battle = battle_with(
        strip(6),
        vec![soldier(0, 0, 0, 3), soldier(1, 1, 1, 3), soldier(2, 1, 5, 3)],
    );
    battle.await_input();
    battle.on_unit_clicked(UnitId(0));
    battle.unit_ability(&UnitAbility::new("Jab", 1, 1));
    battle.on_unit_clicked(UnitId(1));
    assert_eq!(battle.unit(UnitId(0)).unwrap().state(), UnitState::Finished);

    // Clicks and abilities cannot revive the selection.
    battle.on_unit_clicked(UnitId(0));
    battle.unit_ability(&UnitAbility::new("Jab", 1, 5));
    battle.on_unit_clicked(UnitId(0));
    assert_eq!(battle.unit(UnitId(0)).unwrap().state(), UnitState::Finished);
    assert!(!battle.is_paused());

    battle.end_turn();
    battle.end_turn();
    let unit = battle.unit(UnitId(0)).unwrap();
    assert_eq!(unit.state(), UnitState::Friendly);
    assert!(unit.is_ready());
    assert_eq!(unit.stats.action_points, 1);
}

#[test]
fn test_over_budget_move_is_a_no_op() {
    let mut battle = battle_with(strip(6), vec![soldier(0, 0, 0, 2), soldier(1, 1, 5, 2)]);
    let path = Path::from_steps(vec![CellId(1), CellId(2), CellId(3)]);

    assert!(!battle.move_unit(UnitId(0), CellId(3), &path));
    let unit = battle.unit(UnitId(0)).unwrap();
    assert_eq!(unit.cell(), CellId(0));
    assert_eq!(unit.stats.movement_points, 2);
    assert!(battle.grid().is_taken(CellId(0)));
    assert!(!battle.grid().is_taken(CellId(3)));
    assert!(battle.drain_events().iter().all(|e| !matches!(e, BattleEvent::UnitMoved { .. })));
}

#[test]
fn test_move_raises_event_with_path() {
    let mut battle = battle_with(strip(6), vec![soldier(0, 0, 0, 2), soldier(1, 1, 5, 2)]);
    battle.drain_events();
    let path = Path::from_steps(vec![CellId(1), CellId(2)]);

    assert!(battle.move_unit(UnitId(0), CellId(2), &path));
    assert_eq!(
        battle.drain_events(),
        vec![BattleEvent::UnitMoved {
            unit: UnitId(0),
            origin: CellId(0),
            destination: CellId(2),
            path,
        }]
    );
}

#[test]
fn test_damage_floor_through_battle() {
    let mut battle = battle_with(strip(4), vec![soldier(0, 0, 0, 2), soldier(1, 1, 1, 2)]);
    assert!(battle.apply_buff(UnitId(1), Buff::new(2, BuffEffect::Defence(10))));

    let outcome = battle.attack(UnitId(0), UnitId(1)).unwrap();
    assert_eq!(outcome.damage, 4);
    assert_eq!(outcome.dealt, 1);
    assert_eq!(battle.unit(UnitId(1)).unwrap().stats.hit_points, 9);
}

#[test]
fn test_exhausted_attacker_cannot_attack_again() {
    let mut battle = battle_with(strip(4), vec![soldier(0, 0, 0, 2), soldier(1, 1, 1, 2)]);
    assert!(battle.attack(UnitId(0), UnitId(1)).is_some());
    assert!(battle.attack(UnitId(0), UnitId(1)).is_none());
    assert_eq!(battle.unit(UnitId(1)).unwrap().stats.hit_points, 6);
    assert_eq!(battle.unit(UnitId(0)).unwrap().stats.movement_points, 0);
}

#[test]
fn test_game_ends_once() {
    let mut battle = battle_with(strip(4), vec![soldier(0, 0, 0, 2), soldier(1, 1, 1, 2)]);
    battle.await_input();
    battle.on_unit_clicked(UnitId(0));
    battle.unit_ability(&UnitAbility::new("Finisher", 50, 1));
    battle.on_unit_clicked(UnitId(1));

    assert!(battle.is_over());
    assert_eq!(battle.winner(), Some(0));
    assert_eq!(battle.end_turn(), None);
    let ended = battle
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, BattleEvent::GameEnded { .. }))
        .count();
    assert_eq!(ended, 1);
    assert_ne!(battle.state(), &GridState::TurnChanging);
}
