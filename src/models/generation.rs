use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `POST /generate-image` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGeneration {
    pub prompt: String,
    pub number_of_images: u32,
}

/// `POST /change-background` body. `input_image` is an opaque
/// reference, typically an embedded data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundChange {
    pub prompt: String,
    pub input_image: String,
}

/// `POST /generate-pose` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseGeneration {
    pub prompt: String,
    pub input_image: String,
}

/// One of the three request shapes the gateway forwards upstream.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Image(ImageGeneration),
    Background(BackgroundChange),
    Pose(PoseGeneration),
}

impl GenerationRequest {
    /// Discriminator the provider dispatches on.
    pub fn generation_type(&self) -> &'static str {
        match self {
            GenerationRequest::Image(_) => "GenerateImage",
            GenerationRequest::Background(_) => "BackgroundChanger",
            GenerationRequest::Pose(_) => "PoseGenerator",
        }
    }

    /// Provider payload: `{input: {generation_type, ...fields}}`, field
    /// names and values unchanged.
    pub fn provider_payload(&self) -> Value {
        let input = match self {
            GenerationRequest::Image(req) => json!({
                "generation_type": self.generation_type(),
                "number_of_images": req.number_of_images,
                "prompt": req.prompt,
            }),
            GenerationRequest::Background(req) => json!({
                "generation_type": self.generation_type(),
                "input_image": req.input_image,
                "prompt": req.prompt,
            }),
            GenerationRequest::Pose(req) => json!({
                "generation_type": self.generation_type(),
                "input_image": req.input_image,
                "prompt": req.prompt,
            }),
        };

        json!({ "input": input })
    }
}

impl From<ImageGeneration> for GenerationRequest {
    fn from(req: ImageGeneration) -> Self {
        GenerationRequest::Image(req)
    }
}

impl From<BackgroundChange> for GenerationRequest {
    fn from(req: BackgroundChange) -> Self {
        GenerationRequest::Background(req)
    }
}

impl From<PoseGeneration> for GenerationRequest {
    fn from(req: PoseGeneration) -> Self {
        GenerationRequest::Pose(req)
    }
}
