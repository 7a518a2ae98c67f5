//! Collaborators consumed by the chat session.
//!
//! - [`GenerativeService`]: unary text and text+image completions
//! - [`ImagePicker`]: asks the user for an image
//! - [`Notifier`]: blocking user-visible alerts

use crate::error::Result;
use async_trait::async_trait;

/// MIME type assumed when a picker cannot tell.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// A single-shot generative language service.
///
/// Failures are opaque: implementations report them as `ChatError::Service`
/// (or any other variant) and the caller only distinguishes success from
/// failure.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Completes a text prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Completes a prompt accompanied by an inlined base64 image.
    async fn complete_with_image(
        &self,
        prompt: &str,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<String>;
}

/// An image returned by the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    /// Base64-encoded image bytes.
    pub base64: String,
    pub mime_type: String,
}

impl PickedImage {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Creates a picked image with the default MIME type.
    pub fn jpeg(base64: impl Into<String>) -> Self {
        Self::new(base64, DEFAULT_IMAGE_MIME_TYPE)
    }
}

/// Source of user-chosen images.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    /// Asks the user for an image.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(image))`: An image was chosen
    /// - `Ok(None)`: The user cancelled or nothing usable was returned
    /// - `Err(_)`: The picker failed
    async fn pick_image(&self) -> Result<Option<PickedImage>>;
}

/// User-visible failure classes, each with a fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// The text completion failed.
    SendFailed,
    /// The image analysis failed.
    ImageAnalysisFailed,
}

impl Alert {
    pub fn title(&self) -> &'static str {
        "Error"
    }

    pub fn message(&self) -> &'static str {
        match self {
            Alert::SendFailed => "Something went wrong while getting a reply. Please try again.",
            Alert::ImageAnalysisFailed => {
                "Something went wrong while analyzing the image. Please try again."
            }
        }
    }
}

/// Presents dismissible alerts to the user. No retry action is offered.
pub trait Notifier: Send + Sync {
    fn alert(&self, alert: Alert);
}
