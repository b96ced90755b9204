use crate::error::GatewayError;
use crate::gateway::{CommandGateway, FlightController};
use mission_core::{FailsafeParameter, ParamValue, DATALINK_LOSS_ACTION, RC_LOSS_ACTION};
use tracing::{info, warn};

/// Current datalink-loss and RC-loss failsafe actions.
#[derive(Debug, Clone, PartialEq)]
pub struct FailsafeStatus {
    pub datalink_action: FailsafeParameter,
    pub rc_loss_action: FailsafeParameter,
}

impl FailsafeStatus {
    pub fn any_enabled(&self) -> bool {
        !self.datalink_action.is_disabled() || !self.rc_loss_action.is_disabled()
    }
}

/// Outcome of both disable attempts. Each carries the value the controller
/// reported back, or why the write failed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisableReport {
    pub datalink: Result<ParamValue, GatewayError>,
    pub rc_loss: Result<ParamValue, GatewayError>,
}

impl DisableReport {
    pub fn is_complete(&self) -> bool {
        self.datalink.is_ok() && self.rc_loss.is_ok()
    }
}

pub struct FailsafeConfigurator<C> {
    gateway: CommandGateway<C>,
}

impl<C: FlightController> FailsafeConfigurator<C> {
    pub fn new(gateway: CommandGateway<C>) -> Self {
        Self { gateway }
    }

    /// Reads both failsafe parameters. Fails if either read fails; no
    /// default is substituted.
    pub async fn read_status(&self) -> Result<FailsafeStatus, GatewayError> {
        let datalink = self.gateway.get_param(DATALINK_LOSS_ACTION).await?;
        let rc_loss = self.gateway.get_param(RC_LOSS_ACTION).await?;

        info!("----------PX4 FAILSAFE STATUS----------");
        info!(" {DATALINK_LOSS_ACTION} = {datalink}");
        info!(" {RC_LOSS_ACTION} = {rc_loss}");
        info!("---------------------------------------");

        Ok(FailsafeStatus {
            datalink_action: FailsafeParameter {
                id: DATALINK_LOSS_ACTION.to_string(),
                value: datalink,
            },
            rc_loss_action: FailsafeParameter {
                id: RC_LOSS_ACTION.to_string(),
                value: rc_loss,
            },
        })
    }

    /// Sets both failsafe actions to zero. The second write is attempted
    /// even when the first one fails.
    pub async fn disable(&self) -> DisableReport {
        let disabled = ParamValue::Integer(0);
        let report = DisableReport {
            datalink: self.gateway.set_param(DATALINK_LOSS_ACTION, disabled).await,
            rc_loss: self.gateway.set_param(RC_LOSS_ACTION, disabled).await,
        };

        if report.is_complete() {
            info!("datalink and RC failsafes disabled");
        } else {
            warn!(
                datalink_ok = report.datalink.is_ok(),
                rc_loss_ok = report.rc_loss.is_ok(),
                "failsafes only partially disabled"
            );
        }
        report
    }
}
