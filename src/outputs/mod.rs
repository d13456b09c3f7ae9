//! Output generation for the rendered page and the normalized cards.
//!
//! # Submodules
//!
//! - [`html`]: Writes the page, with every feed container rendered, as HTML
//! - [`json`]: Writes each container's cards to a JSON file for API consumption
//!
//! # Output Structure
//!
//! ```text
//! site/
//! └── index.html            # --output
//!
//! json_output_dir/          # --json-output-dir
//! ├── jane.json
//! └── another-handle.json
//! ```

pub mod html;
pub mod json;
