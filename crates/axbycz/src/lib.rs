#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use axbycz_lie as lie;

#[doc(inline)]
pub use axbycz_calib as calib;

#[doc(inline)]
pub use axbycz_synthetic as synthetic;
