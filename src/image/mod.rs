pub mod brightness;
pub mod f32;
pub mod io;
pub mod page;
pub mod traits;
pub mod u8;

pub use self::brightness::{BrightnessGrid, WHITE};
pub use self::f32::ImageF32;
pub use self::page::PageImage;
pub use self::traits::{ImageView, ImageViewMut, Rows};
pub use self::u8::ImageU8;
