//! Inference configuration generation
//!
//! The knob set emitted here is a protocol contract with the inference
//! runtime; changing any value changes observable outputs.

use anuvaad_core::GemmPrecision;

/// Render the per-model inference configuration in text form.
///
/// `has_quality_model` disables `skip-cost` so the runtime produces the
/// scores the quality model consumes.
pub fn inference_config_text(precision: GemmPrecision, has_quality_model: bool) -> String {
    let skip_cost = !has_quality_model;
    format!(
        "beam-size: 1\n\
         normalize: 1.0\n\
         word-penalty: 0\n\
         max-length-break: 128\n\
         mini-batch-words: 1024\n\
         workspace: 128\n\
         max-length-factor: 2.0\n\
         skip-cost: {skip_cost}\n\
         cpu-threads: 0\n\
         quiet: true\n\
         quiet-translation: true\n\
         gemm-precision: {precision}\n\
         alignment: soft\n",
        precision = precision.as_str(),
    )
}
