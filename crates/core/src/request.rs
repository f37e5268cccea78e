//! Request assembly for `generateContent`.
//!
//! The body shape is fixed by the remote service: snake_case keys, the system
//! instruction outside `contents`, and JSON requested as the response type.

use crate::catalog::{Catalog, Language, Mode};
use crate::error::AnalysisFailure;
use crate::image_processing::EncodedImage;
use serde::Serialize;

/// User-turn text sent alongside the image.
pub const USER_PROMPT: &str = "Analyze the attached image based on your instructions.";

const RESPONSE_MIME_TYPE: &str = "application/json";

/// Everything one run sends to the model. Built fresh per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub image: EncodedImage,
    pub instruction_text: String,
    pub model_id: String,
}

impl AnalysisRequest {
    /// The JSON body for `generateContent`.
    pub fn body(&self) -> GenerateContentBody<'_> {
        GenerateContentBody {
            system_instruction: SystemInstruction {
                parts: [TextPart {
                    text: &self.instruction_text,
                }],
            },
            contents: [UserContent {
                parts: (
                    TextPart { text: USER_PROMPT },
                    InlineDataPart {
                        inline_data: InlineData {
                            mime_type: &self.image.mime_type,
                            data: &self.image.bytes_base64,
                        },
                    },
                ),
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateContentBody<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: [UserContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserContent<'a> {
    // Serialized as a two-element array: text first, then the image.
    parts: (TextPart<'a>, InlineDataPart<'a>),
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineDataPart<'a> {
    inline_data: InlineData<'a>,
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Populates [`AnalysisRequest`]s from the catalog.
pub struct RequestBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Builds the request for one run.
    ///
    /// # Errors
    ///
    /// Fails with `ConfigurationMissing` rather than sending an empty
    /// instruction when the catalog has nothing for `(mode, language)`.
    pub fn build(
        &self,
        image: EncodedImage,
        mode: Mode,
        language: Language,
        model_id: &str,
    ) -> Result<AnalysisRequest, AnalysisFailure> {
        let instruction = self
            .catalog
            .lookup_instruction(mode, language)
            .ok_or_else(|| AnalysisFailure::configuration_missing(mode))?;

        Ok(AnalysisRequest {
            image,
            instruction_text: instruction.to_string(),
            model_id: model_id.to_string(),
        })
    }
}
