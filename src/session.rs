//! Session Client: one upload turns a complete Input Set into a session id.

use tracing::{debug, info};

use crate::api::{RemoteService, SessionId};
use crate::error::RunnerError;
use crate::guard::InFlight;
use crate::inputs::{InputSet, Slot};

#[derive(Debug, Default)]
pub struct SessionClient {
    in_flight: InFlight,
}

impl SessionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Validates `inputs` and uploads them under their standardized names.
    ///
    /// Returns `Ok(None)` without sending anything when another upload is
    /// still outstanding. Validation failures never reach the network.
    pub async fn upload<S: RemoteService>(
        &self,
        service: &S,
        inputs: &InputSet,
    ) -> Result<Option<SessionId>, RunnerError> {
        let Some(_flight) = self.in_flight.try_begin() else {
            debug!("upload already in flight, ignoring");
            return Ok(None);
        };

        let parts = inputs.upload_parts()?;
        for slot in Slot::ALL {
            if let Some(file) = inputs.get(slot) {
                debug!(standard = slot.standard_filename(), original = file.name(), "mapping input");
            }
        }

        let response = service
            .upload(parts)
            .await
            .map_err(RunnerError::from_upload)?;

        if response.session_id.trim().is_empty() {
            return Err(RunnerError::Protocol(
                "upload response has an empty session_id".into(),
            ));
        }
        info!(
            session_id = %response.session_id,
            total_bytes = response.total_bytes,
            "inputs uploaded"
        );
        Ok(Some(SessionId::new(response.session_id)))
    }
}
