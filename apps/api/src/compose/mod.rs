// Template Compositor: ProfileData -> MarkupTree -> self-contained HTML.
// Pure code only; the renderer owns everything that touches a browser.

pub mod compositor;
pub mod markup;
pub mod styles;

pub use compositor::compose;
pub use markup::MarkupTree;
