//! Chain executor.

use super::{TransformContext, TransformerRef, TransformerRegistry};
use crate::debug;
use crate::pipeline::BuildError;

/// Run `chain` over `content`, stage by stage.
///
/// The first failing stage aborts the chain; the error names the resource
/// and the stage. An empty chain returns the content unchanged.
pub fn apply(
    chain: &[TransformerRef],
    content: Vec<u8>,
    registry: &TransformerRegistry,
    cx: &TransformContext<'_>,
) -> Result<Vec<u8>, BuildError> {
    let mut content = content;
    for stage in chain {
        let Some(transformer) = registry.get(stage.name()) else {
            return Err(BuildError::transform(cx.request, stage.name(), super::TransformError::Unknown));
        };

        debug!("transform"; "{} <- {}", cx.request, stage.name());
        content = transformer
            .transform(content, stage.options(), cx)
            .map_err(|source| BuildError::transform(cx.request, stage.name(), source))?;
    }
    Ok(content)
}
