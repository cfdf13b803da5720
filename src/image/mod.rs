pub mod buffer;
pub mod io;
pub mod traits;
pub mod view;

pub use self::buffer::{Channel, ColorSpace, PixelBuffer, Rotation};
pub use self::traits::{ImageView, Rows};
pub use self::view::{ChannelView, StripView};
