//! Remote image edit client.
//!
//! Each [`EditOperation`] is a fixed prompt plus the number of images it
//! takes. The client encodes the images, sends them through an
//! [`EditTransport`] with bounded retry, and returns the first image the
//! model answers with.

use std::fmt;

mod error;
pub mod gemini;
pub mod retry;
pub mod wire;

pub use error::{EditError, EditResult};
pub use gemini::GeminiTransport;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};

use self::wire::{Content, GenerateRequest, GenerateResponse, GenerationConfig, Part};
use crate::image_ref::ImageRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOperation {
    RemoveAccessories,
    IsolateOutfit,
    Fuse,
}

struct OperationTemplate {
    name: &'static str,
    arity: usize,
    prompt: &'static str,
}

static TEMPLATES: [OperationTemplate; 3] = [
    OperationTemplate {
        name: "remove-accessories",
        arity: 1,
        prompt: "Remove every accessory from the person in this photo: glasses, sunglasses, \
hats, caps, jewelry, watches, bags, scarves and belts. Keep the person's face, hair, body, \
pose, skin tone, lighting and background exactly as they are, and keep their clothing \
unchanged. Return a single photorealistic image.",
    },
    OperationTemplate {
        name: "isolate-outfit",
        arity: 1,
        prompt: "Extract only the outfit worn or shown in this photo. Remove the person, \
mannequin or hanger and present the garments as a clean, front-facing product shot on a plain \
white background. Preserve the exact colors, fabric texture, patterns, logos and fit of every \
garment. Return a single photorealistic image.",
    },
    OperationTemplate {
        name: "fuse",
        arity: 2,
        prompt: "Dress the person from the first image in the outfit from the second image. \
Keep the person's identity, face, hair, body shape, pose and background from the first image. \
Fit the garments naturally to the body with realistic folds, shadows and lighting that match \
the scene. Return a single photorealistic full-body image.",
    },
];

impl EditOperation {
    pub const ALL: [EditOperation; 3] = [Self::RemoveAccessories, Self::IsolateOutfit, Self::Fuse];

    fn template(self) -> &'static OperationTemplate {
        &TEMPLATES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.template().name
    }

    /// Number of images the operation takes, in order.
    pub fn arity(self) -> usize {
        self.template().arity
    }

    pub fn prompt(self) -> &'static str {
        self.template().prompt
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sends one request to the image model.
pub trait EditTransport {
    fn generate(&self, model: &str, request: &GenerateRequest) -> EditResult<GenerateResponse>;
}

/// Seam used by the workflow driver.
pub trait ImageEditor {
    fn edit(&self, operation: EditOperation, images: &[ImageRef]) -> EditResult<ImageRef>;
}

pub struct EditClient<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
    model: String,
}

impl<T: EditTransport> EditClient<T> {
    pub fn new(transport: T, model: impl Into<String>) -> Self {
        Self {
            transport,
            sleeper: ThreadSleeper,
            policy: RetryPolicy::default(),
            model: model.into(),
        }
    }
}

impl<T: EditTransport, S: Sleeper> EditClient<T, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> EditClient<T, S2> {
        EditClient {
            transport: self.transport,
            sleeper,
            policy: self.policy,
            model: self.model,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: EditTransport, S: Sleeper> ImageEditor for EditClient<T, S> {
    fn edit(&self, operation: EditOperation, images: &[ImageRef]) -> EditResult<ImageRef> {
        let request = build_request(operation, images)?;
        tracing::info!(
            %operation,
            model = %self.model,
            images = images.len(),
            "requesting image edit"
        );

        let response = retry::run_with_retry(&self.policy, &self.sleeper, operation.name(), |_| {
            self.transport.generate(&self.model, &request)
        })?;
        let image = response.into_image()?;
        tracing::info!(%operation, result = ?image, "image edit complete");
        Ok(image)
    }
}

/// Encodes the images, in order, followed by the operation's prompt.
pub fn build_request(operation: EditOperation, images: &[ImageRef]) -> EditResult<GenerateRequest> {
    if images.len() != operation.arity() {
        return Err(EditError::ArityMismatch {
            operation,
            expected: operation.arity(),
            actual: images.len(),
        });
    }

    let mut parts = Vec::with_capacity(images.len() + 1);
    for image in images {
        let (mime_type, payload) = image.decompose()?;
        parts.push(Part::image(mime_type, payload));
    }
    parts.push(Part::text(operation.prompt()));

    Ok(GenerateRequest {
        contents: vec![Content { role: None, parts }],
        generation_config: GenerationConfig::default(),
    })
}
