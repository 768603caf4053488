pub mod claude;
pub mod gemini;
pub mod media;

pub use gemini::{generate_image, GeminiImageConfig, GeneratedImage, ImageGenerationError};
pub use media::LoadedReference;
