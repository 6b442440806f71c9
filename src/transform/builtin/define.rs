//! `define`: inline build-wide constants.

use crate::transform::{Options, TransformContext, TransformError, Transformer};

/// Replaces defined constant names with their literal values.
pub struct DefineTransformer;

impl Transformer for DefineTransformer {
    fn transform(
        &self,
        input: Vec<u8>,
        _options: &Options,
        cx: &TransformContext<'_>,
    ) -> Result<Vec<u8>, TransformError> {
        if cx.defines.is_empty() {
            return Ok(input);
        }
        let text = String::from_utf8(input)?;
        Ok(cx.defines.substitute(&text).into_owned().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BuildMode, Defines, ImportContext, ResourceRequest};
    use std::path::Path;

    #[test]
    fn test_define_uses_frozen_constants() {
        let request = ResourceRequest::new("@/app.js", ImportContext::Module, BuildMode::Production);
        let mut defines = Defines::new();
        defines.insert_json("process.env.CLIENT_ID", &serde_json::json!("tanibox"));
        let cx = TransformContext {
            request: &request,
            path: Path::new("/src/app.js"),
            root: Path::new("/"),
            defines: &defines,
        };

        let out = DefineTransformer
            .transform(b"auth(process.env.CLIENT_ID)".to_vec(), &Options::new(), &cx)
            .unwrap();
        assert_eq!(out, b"auth(\"tanibox\")");
    }
}
