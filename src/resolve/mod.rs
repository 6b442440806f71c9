//! Path/alias resolution for resource identifiers.
//!
//! ```text
//! alias  "@" -> /project/resources/js
//!
//! "@/app.js"        -> /project/resources/js/app.js
//! "./sass/app.scss" -> <from_dir>/sass/app.scss
//! "@x/app.js"       -> UnresolvedAlias (claims an alias, none registered)
//! ```

mod alias;

pub use alias::{ALIAS_SIGILS, AliasTable};
