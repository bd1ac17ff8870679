// ── Command submission ──

use serde_json::Value;
use smarthq_api::wire::ApiRequest;
use tracing::info;
use uuid::Uuid;

use super::Client;
use crate::error::CoreError;

impl Client {
    /// Send an appliance control command.
    ///
    /// Fire-and-forget: returns the request id once the frame is
    /// written. Results arrive later as uncorrelated `command_result`
    /// events. The device id is not checked against the registry.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotConnected`] unless the connection is up, or
    /// [`CoreError::SendFailed`] if the frame could not be written.
    pub async fn send_command(
        &self,
        device_id: &str,
        command: &str,
        data: Vec<Value>,
    ) -> Result<Uuid, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::NotConnected);
        }

        let id = Uuid::new_v4();
        let request = ApiRequest::control(
            self.inner.config.api_host.as_str(),
            id.to_string(),
            self.user_id(),
            device_id,
            command,
            data,
        );
        self.send_frame(&request).await?;

        info!(device_id, command, request_id = %id, "Command sent");
        Ok(id)
    }
}
