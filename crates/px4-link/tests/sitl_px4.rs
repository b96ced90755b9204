use mission_core::{builtin_survey_mission, ParamValue, DATALINK_LOSS_ACTION, RTL_TYPE};
use px4_link::{LinkConfig, Vehicle, VehicleState};
use std::time::Duration;

fn sitl_bind_addr() -> String {
    std::env::var("AUTOMISSION_SITL_UDP_BIND").unwrap_or_else(|_| String::from("0.0.0.0:14540"))
}

async fn connect_sitl() -> Vehicle {
    let config = LinkConfig {
        connect_timeout: Some(Duration::from_secs(60)),
        ..LinkConfig::default()
    };
    Vehicle::connect_with_config(&format!("udpin:{}", sitl_bind_addr()), config)
        .await
        .unwrap()
}

async fn wait_for_state<F>(vehicle: &Vehicle, mut predicate: F, timeout: Duration)
where
    F: FnMut(&VehicleState) -> bool,
{
    let mut rx = vehicle.state();
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => panic!("timed out waiting for vehicle state"),
            result = rx.changed() => {
                result.expect("watch channel closed");
                let state = rx.borrow().clone();
                if predicate(&state) {
                    return;
                }
            }
        }
    }
}

#[tokio::test]
#[ignore = "requires PX4 SITL endpoint"]
async fn sitl_heartbeat_identifies_px4() {
    let vehicle = connect_sitl().await;
    let identity = vehicle.identity().expect("identity after connect");
    assert_ne!(identity.system_id, 0);
    assert!(!vehicle.available_modes().is_empty());
    vehicle.disconnect().await;
}

#[tokio::test]
#[ignore = "requires PX4 SITL endpoint"]
async fn sitl_param_read_write_roundtrip() {
    let vehicle = connect_sitl().await;

    let original = vehicle.param_read(RTL_TYPE).await.unwrap();
    let echoed = vehicle.param_write(RTL_TYPE, ParamValue::Integer(0)).await.unwrap();
    assert_eq!(echoed, ParamValue::Integer(0));
    vehicle.param_write(RTL_TYPE, original).await.unwrap();

    let dll = vehicle.param_read(DATALINK_LOSS_ACTION).await.unwrap();
    assert!(matches!(dll, ParamValue::Integer(_)));

    vehicle.disconnect().await;
}

#[tokio::test]
#[ignore = "requires PX4 SITL endpoint"]
async fn sitl_upload_builtin_mission_and_enter_auto_mission() {
    let vehicle = connect_sitl().await;
    let mission = builtin_survey_mission();

    vehicle
        .upload_mission(mission.start_index, mission.waypoints.clone())
        .await
        .unwrap();

    vehicle.set_mode_by_name("AUTO.MISSION").await.unwrap();
    wait_for_state(&vehicle, |s| s.mode_name == "AUTO.MISSION", Duration::from_secs(10)).await;

    vehicle.set_mode_by_name("AUTO.LOITER").await.unwrap();
    vehicle.disconnect().await;
}

#[tokio::test]
#[ignore = "requires PX4 SITL endpoint"]
async fn sitl_unknown_mode_is_rejected_locally() {
    let vehicle = connect_sitl().await;
    let err = vehicle.set_mode_by_name("GUIDED").await.unwrap_err();
    assert!(matches!(err, px4_link::LinkError::ModeNotAvailable(_)));
    vehicle.disconnect().await;
}
