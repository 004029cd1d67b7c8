//! Value types shared by the prediction components

mod assessment;
mod observation;
mod reference;
mod research;
mod target;
mod uncertainty;
mod window;

pub use assessment::*;
pub use observation::*;
pub use reference::*;
pub use research::*;
pub use target::*;
pub use uncertainty::*;
pub use window::*;
