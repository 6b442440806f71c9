//! `minify`: script and stylesheet minification.
//!
//! Uses oxc for JavaScript and lightningcss for CSS.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::core::AssetKind;
use crate::transform::{Options, TransformContext, TransformError, Transformer};

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(format!("failed to parse script ({} errors)", ret.errors.len()));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Minifies by asset kind.
///
/// The kind comes from the `kind` option, falling back to the resource's
/// extension. Kinds other than script and stylesheet pass through.
pub struct MinifyTransformer;

impl Transformer for MinifyTransformer {
    fn transform(
        &self,
        input: Vec<u8>,
        options: &Options,
        cx: &TransformContext<'_>,
    ) -> Result<Vec<u8>, TransformError> {
        let kind = match options.get("kind") {
            Some(value) => serde_json::from_value::<AssetKind>(value.clone())
                .map_err(|e| TransformError::invalid_option("kind", e.to_string()))?,
            None => AssetKind::from_path(cx.path),
        };

        let minify = match kind {
            AssetKind::Script => minify_js,
            AssetKind::Stylesheet => minify_css,
            _ => return Ok(input),
        };

        let source = String::from_utf8(input)?;
        minify(&source)
            .map(String::into_bytes)
            .map_err(TransformError::Failed)
    }
}
