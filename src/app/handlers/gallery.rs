// SPDX-License-Identifier: GPL-3.0-only

//! Gallery handlers

use crate::app::CameraApp;
use crate::app::state::Message;
use crate::app::task::Task;
use tracing::error;

impl CameraApp {
    pub(crate) fn handle_select_media(&mut self, id: Option<String>) -> Task<Message> {
        self.gallery.select(id.as_deref());
        Task::none()
    }

    pub(crate) fn handle_delete_media(&mut self, id: String) -> Task<Message> {
        if let Err(e) = self.gallery.delete(&id) {
            error!(id = %id, error = %e, "Failed to delete media");
        }
        Task::none()
    }
}
