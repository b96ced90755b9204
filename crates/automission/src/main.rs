use automission::{CommandGateway, MissionSupervisor, SupervisorConfig, SupervisorError};
use mission_core::builtin_survey_mission;
use px4_link::Vehicle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SupervisorError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SupervisorConfig::from_env()?;
    info!(connection = %config.connection, "waiting for autopilot heartbeat");
    let vehicle = Vehicle::connect(&config.connection).await?;
    if let Some(identity) = vehicle.identity() {
        info!(
            system_id = identity.system_id,
            component_id = identity.component_id,
            autopilot = ?identity.autopilot,
            "autopilot connected"
        );
    }

    // Subscribe before arming so no early report is missed.
    let feed = vehicle.mission_reached_feed();
    let gateway = CommandGateway::new(vehicle.clone(), config.gateway);
    let mut supervisor = MissionSupervisor::new(gateway, config);

    supervisor.prepare(builtin_survey_mission()).await?;

    let closed = tokio::select! {
        session = supervisor.monitor(feed) => Some(session),
        _ = tokio::signal::ctrl_c() => None,
    };
    match closed {
        Some(session) => {
            let link = vehicle.link_state().borrow().clone();
            warn!(?session, ?link, "telemetry link closed");
        }
        None => info!(session = ?supervisor.progress().state(), "interrupted"),
    }

    vehicle.disconnect().await;
    Ok(())
}
