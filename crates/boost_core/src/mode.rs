/// Closed set of transforms the user can pick for a job.
///
/// Every variant except [`ProcessingMode::CustomEdit`] maps to a fixed
/// catalog instruction; `CustomEdit` derives its instruction through the
/// conversational protocol and only falls back to the catalog text when no
/// finalized prompt was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Enhance,
    Upscale2K,
    Upscale4K,
    Upscale8K,
    RemoveBackground,
    RemoveWatermark,
    CustomEdit,
    Cartoon,
    Anime,
    Sketch,
    Fantasy,
}

impl ProcessingMode {
    /// All modes, in menu display order.
    pub const ALL: [ProcessingMode; 11] = [
        ProcessingMode::Enhance,
        ProcessingMode::Upscale2K,
        ProcessingMode::Upscale4K,
        ProcessingMode::Upscale8K,
        ProcessingMode::RemoveBackground,
        ProcessingMode::RemoveWatermark,
        ProcessingMode::CustomEdit,
        ProcessingMode::Cartoon,
        ProcessingMode::Anime,
        ProcessingMode::Sketch,
        ProcessingMode::Fantasy,
    ];

    /// Human-readable menu label.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingMode::Enhance => "Enhance Quality",
            ProcessingMode::Upscale2K => "Upscale to 2K",
            ProcessingMode::Upscale4K => "Upscale to 4K",
            ProcessingMode::Upscale8K => "Upscale to 8K",
            ProcessingMode::RemoveBackground => "Remove Background",
            ProcessingMode::RemoveWatermark => "Remove Watermark",
            ProcessingMode::CustomEdit => "Custom AI Edit",
            ProcessingMode::Cartoon => "Cartoon Style",
            ProcessingMode::Anime => "Anime Style",
            ProcessingMode::Sketch => "Sketch Effect",
            ProcessingMode::Fantasy => "Fantasy Look",
        }
    }

    /// The fixed natural-language instruction sent to the model for this mode.
    pub fn instruction(&self) -> &'static str {
        match self {
            ProcessingMode::Enhance => {
                "Enhance this photo by improving clarity, sharpness, and color balance, \
                 and reducing noise. **Crucially, you must not alter any facial features \
                 or the identity of people in the photo.** The goal is a clearer, restored \
                 version of the original. Output only the enhanced image."
            }
            ProcessingMode::Upscale2K => UPSCALE_2K,
            ProcessingMode::Upscale4K => UPSCALE_4K,
            ProcessingMode::Upscale8K => UPSCALE_8K,
            ProcessingMode::RemoveBackground => {
                "Identify the most prominent subject in this photo. Create a new image \
                 where this subject is perfectly preserved, but the entire background is \
                 removed and replaced with transparency. Output only the resulting PNG image."
            }
            ProcessingMode::RemoveWatermark => {
                "Analyze the image for any overlaid graphical elements, logos, or text \
                 that are not part of the original scene. Use content-aware fill to remove \
                 these elements and realistically reconstruct the underlying image. \
                 Output only the cleaned image."
            }
            // Fallback only; a finalized conversational prompt normally replaces this.
            ProcessingMode::CustomEdit => "Apply the user-defined edit to this image.",
            ProcessingMode::Cartoon => {
                "Convert this photo into a high-quality, modern 3D cartoon style, similar \
                 to what you'd see in a major animation studio film. Emphasize expressive \
                 features, vibrant and saturated colors, and clean, bold outlines. The \
                 final result should have a polished, slightly exaggerated, and charming \
                 animated look while perfectly preserving the subject's identity. Output \
                 only the cartoonified image."
            }
            ProcessingMode::Anime => {
                "Convert this image into a beautiful anime art style, with characteristic \
                 large eyes, detailed hair, and soft coloring. Output only the anime-styled \
                 image."
            }
            ProcessingMode::Sketch => {
                "Turn this image into a detailed, realistic pencil sketch, as if drawn by \
                 an artist. It should be black and white. Output only the sketch image."
            }
            ProcessingMode::Fantasy => {
                "Re-render this image in a high-fantasy art style, with epic lighting, \
                 magical elements, and an ethereal quality. Output only the fantasy-style \
                 image."
            }
        }
    }
}

macro_rules! upscale_text {
    ($resolution:literal) => {
        concat!(
            "Upscale this image to ",
            $resolution,
            " resolution (longest side). Enhance details and sharpness as you upscale, \
             but crucially, preserve the original identity and all facial features of any \
             subjects. Do not invent new details. The result should be a larger, clearer \
             version of the original photo. Output only the upscaled image."
        )
    };
}

const UPSCALE_2K: &str = upscale_text!("2K (2048px)");
const UPSCALE_4K: &str = upscale_text!("4K (3840px)");
const UPSCALE_8K: &str = upscale_text!("8K (7680px)");

#[cfg(test)]
mod tests {
    use super::ProcessingMode;

    #[test]
    fn every_mode_has_label_and_instruction() {
        for mode in ProcessingMode::ALL {
            assert!(!mode.label().is_empty());
            assert!(!mode.instruction().is_empty());
        }
    }

    #[test]
    fn upscale_instructions_name_their_resolution() {
        assert!(ProcessingMode::Upscale2K.instruction().contains("2K (2048px)"));
        assert!(ProcessingMode::Upscale4K.instruction().contains("4K (3840px)"));
        assert!(ProcessingMode::Upscale8K.instruction().contains("8K (7680px)"));
    }
}
