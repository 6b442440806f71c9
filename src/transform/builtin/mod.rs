//! Built-in transformers.
//!
//! | Name      | Effect                                               |
//! |-----------|------------------------------------------------------|
//! | `raw`     | wrap content as a JS module exporting a string       |
//! | `define`  | replace defined constants with their literals        |
//! | `minify`  | minify scripts (oxc) and stylesheets (lightningcss)  |
//! | `command` | pipe content through an external process             |

mod command;
mod define;
mod minify;
mod raw;

pub use command::CommandTransformer;
pub use define::DefineTransformer;
pub use minify::{MinifyTransformer, minify_css, minify_js};
pub use raw::RawTransformer;

pub const RAW: &str = "raw";
pub const DEFINE: &str = "define";
pub const MINIFY: &str = "minify";
pub const COMMAND: &str = "command";
