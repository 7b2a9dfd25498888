//! DOM rendering of orchestrator notifications.
//!
//! The page provides the elements below by id; missing elements are skipped.

use capgate_core::{BiometricUi, CameraUi, ErrorNotice, StatusKind, UiSurface};
use tracing::warn;
use web_sys::{Document, Element};

const CAMERA_BUTTON: &str = "camera-button";
const BIOMETRIC_BUTTON: &str = "biometric-button";
const STATUS: &str = "status";
const ERROR: &str = "error";
const ERROR_MESSAGE: &str = "error-message";
const REMEDIATION: &str = "remediation";
const REMEDIATION_TITLE: &str = "remediation-title";
const REMEDIATION_STEPS: &str = "remediation-steps";

pub struct DomUi {
    document: Document,
}

impl DomUi {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_attr(&self, id: &str, name: &str, on: bool) {
        let Some(el) = self.element(id) else {
            return;
        };
        let result = if on {
            el.set_attribute(name, "")
        } else {
            el.remove_attribute(name)
        };
        if let Err(err) = result {
            warn!(id, name, error = ?err, "DOM attribute update failed");
        }
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        self.set_attr(id, "hidden", hidden);
    }

    fn set_kind(&self, id: &str, kind: &str) {
        if let Some(el) = self.element(id) {
            if let Err(err) = el.set_attribute("data-kind", kind) {
                warn!(id, error = ?err, "DOM attribute update failed");
            }
        }
    }

    fn fill_steps(&self, steps: &[&str]) {
        let Some(list) = self.element(REMEDIATION_STEPS) else {
            return;
        };
        list.set_text_content(None);
        for &step in steps {
            match self.document.create_element("li") {
                Ok(item) => {
                    item.set_text_content(Some(step));
                    if let Err(err) = list.append_child(&item) {
                        warn!(error = ?err, "Failed to append remediation step");
                    }
                }
                Err(err) => warn!(error = ?err, "Failed to create remediation step"),
            }
        }
    }
}

impl UiSurface for DomUi {
    fn camera_changed(&self, state: CameraUi) {
        self.set_text(CAMERA_BUTTON, state.label());
        self.set_attr(CAMERA_BUTTON, "disabled", !state.enabled());
        self.set_kind(
            CAMERA_BUTTON,
            match state {
                CameraUi::Off => "off",
                CameraUi::Requesting => "requesting",
                CameraUi::On => "on",
            },
        );
    }

    fn biometric_changed(&self, state: BiometricUi) {
        self.set_text(BIOMETRIC_BUTTON, state.label());
        self.set_attr(BIOMETRIC_BUTTON, "disabled", !state.enabled());
        self.set_kind(
            BIOMETRIC_BUTTON,
            if state.authenticated { "authenticated" } else { "idle" },
        );
    }

    fn show_status(&self, kind: StatusKind, text: &str) {
        self.set_text(STATUS, text);
        self.set_kind(
            STATUS,
            match kind {
                StatusKind::Success => "success",
                StatusKind::Info => "info",
            },
        );
        self.set_hidden(STATUS, false);
    }

    fn show_error(&self, notice: &ErrorNotice) {
        self.set_text(ERROR_MESSAGE, &notice.message);
        self.set_kind(ERROR, notice.code);
        self.set_hidden(ERROR, false);

        match &notice.remediation {
            Some(remediation) => {
                self.set_text(
                    REMEDIATION_TITLE,
                    &format!("How to fix this in {}:", remediation.browser),
                );
                self.fill_steps(remediation.steps);
                self.set_hidden(REMEDIATION, false);
            }
            None => self.set_hidden(REMEDIATION, true),
        }
    }

    fn clear_messages(&self) {
        self.set_hidden(STATUS, true);
        self.set_hidden(ERROR, true);
        self.set_hidden(REMEDIATION, true);
    }
}
