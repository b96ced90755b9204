//! Request/response boundary to the flight controller.
//!
//! [`FlightController`] is the narrow surface the supervisor needs from an
//! autopilot link. [`CommandGateway`] wraps one and gives every call the same
//! treatment: wait until the controller is reachable, issue the request
//! (optionally bounded by a timeout), log the outcome and fold any failure
//! into a [`GatewayError`]. The gateway never retries.

mod px4;

use crate::error::{GatewayError, Operation};
use async_trait::async_trait;
use mission_core::{ParamValue, Waypoint};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[async_trait]
pub trait FlightController: Send + Sync {
    type Error: Display + Send;

    /// Resolves once the controller can take requests. No timeout.
    async fn wait_available(&self) -> Result<(), Self::Error>;

    async fn get_param(&self, id: &str) -> Result<ParamValue, Self::Error>;

    /// Returns the value the controller reports after the write.
    async fn set_param(&self, id: &str, value: ParamValue) -> Result<ParamValue, Self::Error>;

    async fn set_mode(&self, mode: &str) -> Result<(), Self::Error>;

    async fn current_mode(&self) -> Result<String, Self::Error>;

    async fn arm(&self, arm: bool) -> Result<(), Self::Error>;

    async fn takeoff(&self, altitude_m: f32) -> Result<(), Self::Error>;

    /// Replace the whole mission on the controller.
    async fn push_mission(&self, start_index: u16, waypoints: &[Waypoint]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Upper bound on a single request, not counting the availability wait.
    pub call_timeout: Option<Duration>,
}

pub struct CommandGateway<C> {
    controller: Arc<C>,
    config: GatewayConfig,
}

impl<C> Clone for CommandGateway<C> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            config: self.config,
        }
    }
}

impl<C: FlightController> CommandGateway<C> {
    pub fn new(controller: C, config: GatewayConfig) -> Self {
        Self {
            controller: Arc::new(controller),
            config,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub async fn get_param(&self, id: &str) -> Result<ParamValue, GatewayError> {
        let value = self
            .invoke(Operation::GetParam, id, self.controller.get_param(id))
            .await?;
        info!(param = id, %value, "parameter read");
        Ok(value)
    }

    pub async fn set_param(&self, id: &str, value: ParamValue) -> Result<ParamValue, GatewayError> {
        let reported = self
            .invoke(Operation::SetParam, id, self.controller.set_param(id, value))
            .await?;
        info!(param = id, requested = %value, %reported, "parameter written");
        Ok(reported)
    }

    pub async fn set_mode(&self, mode: &str) -> Result<(), GatewayError> {
        self.invoke(Operation::SetMode, mode, self.controller.set_mode(mode))
            .await
    }

    pub async fn current_mode(&self) -> Result<String, GatewayError> {
        self.invoke(Operation::CurrentMode, "", self.controller.current_mode())
            .await
    }

    pub async fn arm(&self, arm: bool) -> Result<(), GatewayError> {
        let operation = if arm { Operation::Arm } else { Operation::Disarm };
        self.invoke(operation, "", self.controller.arm(arm)).await
    }

    pub async fn takeoff(&self, altitude_m: f32) -> Result<(), GatewayError> {
        let subject = format!("{altitude_m} m");
        self.invoke(Operation::Takeoff, &subject, self.controller.takeoff(altitude_m))
            .await
    }

    pub async fn push_mission(&self, start_index: u16, waypoints: &[Waypoint]) -> Result<(), GatewayError> {
        let subject = format!("{} items from #{start_index}", waypoints.len());
        self.invoke(
            Operation::PushMission,
            &subject,
            self.controller.push_mission(start_index, waypoints),
        )
        .await
    }

    async fn invoke<T, F>(&self, operation: Operation, subject: &str, request: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, C::Error>>,
    {
        let outcome = match self.controller.wait_available().await {
            Err(err) => Err(format!("controller unavailable: {err}")),
            Ok(()) => match self.config.call_timeout {
                None => request.await.map_err(|err| err.to_string()),
                Some(limit) => match tokio::time::timeout(limit, request).await {
                    Ok(result) => result.map_err(|err| err.to_string()),
                    Err(_) => Err(format!("no response within {} ms", limit.as_millis())),
                },
            },
        };

        match outcome {
            Ok(value) => {
                // Mode read-back is polled; keep it out of the operator log.
                if operation == Operation::CurrentMode {
                    debug!(%operation, "request succeeded");
                } else {
                    info!(%operation, subject, "request succeeded");
                }
                Ok(value)
            }
            Err(reason) => {
                error!(%operation, subject, %reason, "request failed");
                Err(GatewayError { operation, reason })
            }
        }
    }
}
