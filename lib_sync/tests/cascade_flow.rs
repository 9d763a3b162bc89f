//! Selection cascade behaviour: ordering, stale-response discarding and the
//! server-authoritative efficiency target.

mod support;

use std::time::Duration;

use lib_sync::SelectionError;
use support::{user, Call, Harness, Script};
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn later_vehicle_wins_even_when_earlier_response_arrives_last() {
    let mut script = Script::fleet();
    script.users.get_mut("v1").unwrap().0 = Duration::from_secs(3);
    script.users.get_mut("v2").unwrap().0 = Duration::from_secs(1);
    let h = Harness::new(script);

    let slow = tokio::spawn(h.engine.select_vehicle("v1".into()));
    let fast = tokio::spawn(h.engine.select_vehicle("v2".into()));
    fast.await.unwrap();
    slow.await.unwrap();

    let view = h.engine.snapshot();
    assert_eq!(view.selected_vehicle_id, Some("v2".into()));
    assert_eq!(view.users, vec![user("u3", "Fay")]);
}

#[tokio::test(start_paused = true)]
async fn vehicle_change_clears_dependents_before_any_response() {
    let mut script = Script::fleet();
    script.targets.get_mut("u1").unwrap().0 = Duration::from_secs(2);
    script.users.get_mut("v2").unwrap().0 = Duration::from_secs(2);
    let h = Harness::new(script);

    h.engine.select_vehicle("v1".into()).await;
    let pending_target = tokio::spawn(h.engine.select_user("u1".into()).unwrap());
    sleep(Duration::from_millis(100)).await;

    let pending_users = tokio::spawn(h.engine.select_vehicle("v2".into()));
    let view = h.engine.snapshot();
    assert_eq!(view.selected_vehicle_id, Some("v2".into()));
    assert_eq!(view.selected_user_id, None);
    assert!(view.users.is_empty());
    assert_eq!(view.efficiency_target, None);
    assert_eq!(view.average_mileage, None);

    pending_target.await.unwrap();
    pending_users.await.unwrap();
    let view = h.engine.snapshot();
    assert_eq!(view.efficiency_target, None);
    assert_eq!(view.average_mileage, None);
    assert_eq!(view.users, vec![user("u3", "Fay")]);
}

#[tokio::test(start_paused = true)]
async fn switching_users_discards_the_previous_users_late_values() {
    let mut script = Script::fleet();
    script.averages.get_mut("u1").unwrap().0 = Duration::from_secs(3);
    script.targets.get_mut("u1").unwrap().0 = Duration::from_secs(3);
    let h = Harness::new(script);

    h.engine.select_vehicle("v1".into()).await;
    let stale = tokio::spawn(h.engine.select_user("u1".into()).unwrap());
    h.engine.select_user("u2".into()).unwrap().await;
    stale.await.unwrap();

    let view = h.engine.snapshot();
    assert_eq!(view.selected_user_id, Some("u2".into()));
    assert_eq!(view.efficiency_target, Some(9.0));
    assert_eq!(view.average_mileage.as_deref(), Some("7.25"));
}

#[tokio::test(start_paused = true)]
async fn user_selection_loads_target_and_average_concurrently() {
    let mut script = Script::fleet();
    script.targets.get_mut("u1").unwrap().0 = Duration::from_secs(2);
    script.averages.get_mut("u1").unwrap().0 = Duration::from_secs(2);
    let h = Harness::new(script);
    h.engine.select_vehicle("v1".into()).await;

    let started = tokio::time::Instant::now();
    h.engine.select_user("u1".into()).unwrap().await;

    assert!(started.elapsed() < Duration::from_secs(3));
    let view = h.engine.snapshot();
    assert_eq!(view.efficiency_target, Some(8.0));
    assert_eq!(view.average_mileage.as_deref(), Some("6.5"));
}

#[tokio::test(start_paused = true)]
async fn server_echo_replaces_the_requested_target() {
    let mut script = Script::fleet();
    script.target_ceiling = Some(12.0);
    let h = Harness::new(script);
    h.select_pair("v1", "u1").await;

    assert!(h.engine.update_efficiency_target(10.0).unwrap().await);
    assert_eq!(h.engine.snapshot().efficiency_target, Some(10.0));

    assert!(h.engine.update_efficiency_target(15.0).unwrap().await);
    assert_eq!(h.engine.snapshot().efficiency_target, Some(12.0));

    let updates: Vec<_> = h
        .gateway
        .calls()
        .into_iter()
        .filter_map(|(_, call)| match call {
            Call::UpdateTarget(update) => Some(update),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].efficient_target_value, 10.0);
    assert_eq!(updates[0].status, "ACTIVE");
    assert_eq!(updates[0].user_id.as_str(), "u1");
    assert_eq!(updates[0].vehicle_id.as_str(), "v1");
}

#[tokio::test(start_paused = true)]
async fn target_update_requires_a_complete_pair() {
    let h = Harness::new(Script::fleet());
    h.engine.select_vehicle("v1".into()).await;

    assert_eq!(
        h.engine.update_efficiency_target(10.0).err(),
        Some(SelectionError::UserNotSelected)
    );
    assert_eq!(
        h.engine.update_efficiency_target(f64::INFINITY).err(),
        Some(SelectionError::InvalidTarget(f64::INFINITY))
    );
    assert_eq!(h.gateway.count(|c| matches!(c, Call::UpdateTarget(_))), 0);
}

#[tokio::test(start_paused = true)]
async fn refreshing_the_average_is_idempotent() {
    let h = Harness::new(Script::fleet());
    h.select_pair("v1", "u1").await;

    assert!(h.engine.refresh_average_mileage().unwrap().await);
    assert!(h.engine.refresh_average_mileage().unwrap().await);

    assert_eq!(h.engine.snapshot().average_mileage.as_deref(), Some("6.5"));
    assert_eq!(h.gateway.count(|c| matches!(c, Call::FetchAverage { .. })), 3);
}

#[tokio::test(start_paused = true)]
async fn selecting_a_user_without_a_vehicle_is_rejected_locally() {
    let h = Harness::new(Script::fleet());

    assert_eq!(
        h.engine.select_user("u1".into()).err(),
        Some(SelectionError::VehicleNotSelected)
    );
    assert_eq!(h.engine.snapshot().selected_user_id, None);
    assert!(h.gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_fetches_leave_entities_absent() {
    let mut script = Script::fleet();
    script.fail_vehicles = true;
    script.targets.remove("u1");
    let h = Harness::new(script);

    assert_eq!(h.engine.load_vehicles().await, 0);
    assert!(h.engine.snapshot().vehicles.is_empty());

    h.select_pair("v1", "u1").await;
    let view = h.engine.snapshot();
    assert_eq!(view.efficiency_target, None);
    assert_eq!(view.average_mileage.as_deref(), Some("6.5"));
}
