//! `raw`: expose content to scripts as a string.

use crate::transform::{Options, TransformContext, TransformError, Transformer};

/// Wraps text content as `export default "<content>";`.
pub struct RawTransformer;

impl Transformer for RawTransformer {
    fn transform(
        &self,
        input: Vec<u8>,
        _options: &Options,
        _cx: &TransformContext<'_>,
    ) -> Result<Vec<u8>, TransformError> {
        let text = String::from_utf8(input)?;
        let literal = serde_json::Value::String(text).to_string();
        Ok(format!("export default {literal};\n").into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BuildMode, Defines, ImportContext, ResourceRequest};
    use std::path::Path;

    #[test]
    fn test_raw_escapes_content() {
        let request = ResourceRequest::new("a.pug", ImportContext::Raw, BuildMode::Production);
        let defines = Defines::new();
        let cx = TransformContext {
            request: &request,
            path: Path::new("/a.pug"),
            root: Path::new("/"),
            defines: &defines,
        };
        let out = RawTransformer
            .transform(b"p \"hi\"\n".to_vec(), &Options::new(), &cx)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "export default \"p \\\"hi\\\"\\n\";\n");
    }

    #[test]
    fn test_raw_rejects_binary() {
        let request = ResourceRequest::new("a.png", ImportContext::Raw, BuildMode::Production);
        let defines = Defines::new();
        let cx = TransformContext {
            request: &request,
            path: Path::new("/a.png"),
            root: Path::new("/"),
            defines: &defines,
        };
        let err = RawTransformer.transform(vec![0xff, 0xfe], &Options::new(), &cx).unwrap_err();
        assert!(matches!(err, TransformError::NotUtf8(_)));
    }
}
