//! Prompt text sent to the generative models

use crate::booking::{Complexity, TattooStyle};

/// Line-work guidance for each style
#[must_use]
pub fn style_guidance(style: TattooStyle) -> &'static str {
    match style {
        TattooStyle::Realism => {
            "smooth graded shading with real volume and soft transitions; outlines only where the form needs them"
        },
        TattooStyle::Traditional => {
            "bold even black outlines, solid black shading and strong contrast in the old-school flash manner"
        },
        TattooStyle::Minimalist => {
            "single-needle fine lines, generous empty space and only the details that carry the idea"
        },
        TattooStyle::Geometric => {
            "exact straight lines and arcs, sacred-geometry structure, dotwork fills and crisp angles"
        },
        TattooStyle::Watercolor => {
            "loose flowing shapes, soft bleeding edges and splashes, rendered in high-contrast greys so the stencil stays readable"
        },
        TattooStyle::Lettering => {
            "clean high-contrast letterforms (script, blackletter or serif) with legible spacing and flow"
        },
        TattooStyle::Blackwork => {
            "large solid black fills, hard contrast and patterns carved out of negative space"
        },
    }
}

/// Detail guidance for each complexity level
#[must_use]
pub fn complexity_guidance(complexity: Complexity) -> &'static str {
    match complexity {
        Complexity::Simple => "keep shading light and let a clear silhouette carry the piece",
        Complexity::Medium => "balance the detail with moderate standard shading",
        Complexity::Detailed => {
            "fill it with texture (stippling, hatching, etched lines) and fine internal patterns"
        },
    }
}

/// Prompt for a fresh design
#[must_use]
pub fn design_prompt(subject: &str, style: TattooStyle, complexity: Complexity) -> String {
    format!(
        "You are an experienced tattoo artist drawing a custom stencil.\n\
         \n\
         Subject requested by the client: \"{subject}\"\n\
         Style: {style}\n\
         Complexity: {complexity}\n\
         \n\
         Requirements:\n\
         - Place the design in the middle of a plain white (#FFFFFF) background. No frame, no skin, no body.\n\
         - Technique: {technique}.\n\
         - Detail: {detail}.\n\
         - Render black ink on white paper at flash-sheet quality so it reads well on the body.\n\
         - Interpret the request freely but keep it clear. Add lettering only if the subject asks for it.",
        subject = subject.trim(),
        style = style,
        complexity = complexity,
        technique = style_guidance(style),
        detail = complexity_guidance(complexity),
    )
}

/// Prompt for redrawing a reference image
#[must_use]
pub fn enhance_prompt(description: &str, style: TattooStyle) -> String {
    format!(
        "You are an experienced tattoo artist. Redraw the attached reference as a finished tattoo stencil.\n\
         \n\
         Client notes: \"{description}\"\n\
         Style: {style}\n\
         \n\
         Requirements:\n\
         - Remove sketch noise, paper grain, uneven lighting and anything behind the drawing.\n\
         - Make every line crisp and confident; fix symmetry or anatomy where it is clearly off.\n\
         - Apply the {style} style: {technique}.\n\
         - Return high-contrast black linework on a plain white background.",
        description = description.trim(),
        style = style,
        technique = style_guidance(style),
    )
}

/// Prompt for turning a flattened placement preview into a healed-tattoo photo
///
/// The placement chosen by the user is final, so the prompt forbids any
/// change to the design's position, rotation or size.
#[must_use]
pub fn simulation_prompt(design_prompt: &str) -> String {
    format!(
        "Photo edit: make the tattoo overlay in this picture look like a real, healed tattoo.\n\
         \n\
         The user has already positioned the design exactly where they want it.\n\
         Keep the geometry fixed: the design must not move, rotate, scale or change outline.\n\
         Only change how the ink sits in the skin.\n\
         \n\
         - Ink lives under the surface of the skin. Pores, fine hairs, creases and scars stay visible on top of it.\n\
         - Lighter shading lets the skin tone through.\n\
         - Highlights and sheen on the skin pass over the ink; shadows and muscle folds darken it equally.\n\
         - Match the grain, noise and white balance of the original photo.\n\
         - Let the internal lines follow small surface contours without shifting the overall placement.\n\
         \n\
         Design description: \"{design}\"",
        design = design_prompt.trim(),
    )
}

/// Prompt for the text-only refine step
#[must_use]
pub fn refine_prompt(raw: &str) -> String {
    format!(
        "Rewrite this tattoo idea as one short, vivid prompt for an image generator. \
         Reply with the prompt only: \"{}\"",
        raw.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_prompt_mentions_inputs() {
        let prompt = design_prompt("  a koi fish  ", TattooStyle::Geometric, Complexity::Simple);
        assert!(prompt.contains("\"a koi fish\""));
        assert!(prompt.contains("Style: Geometric"));
        assert!(prompt.contains("Complexity: Simple"));
        assert!(prompt.contains(style_guidance(TattooStyle::Geometric)));
        assert!(prompt.contains("#FFFFFF"));
    }

    #[test]
    fn test_simulation_prompt_pins_geometry() {
        let prompt = simulation_prompt("rose");
        assert!(prompt.contains("must not move, rotate, scale"));
        assert!(prompt.contains("\"rose\""));
    }

    #[test]
    fn test_every_style_has_guidance() {
        for style in TattooStyle::ALL {
            assert!(!style_guidance(*style).is_empty());
        }
    }
}
