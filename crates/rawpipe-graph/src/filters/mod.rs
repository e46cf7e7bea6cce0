//! Built-in filter types.
//!
//! | Name             | Type                     |
//! |------------------|--------------------------|
//! | `InputImage16`   | [`InputImage16`]         |
//! | `Crop`           | [`Crop`]                 |
//! | `Resample`       | [`Resample`]             |
//! | `Cache`          | [`Cache`]                |
//! | `ColorTransform` | [`ColorTransformFilter`] |

/// Implements the `Any` upcasts of [`Filter`](crate::Filter).
macro_rules! impl_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use impl_any;

mod cache;
mod crop;
mod input;
mod resample;
mod transform;

pub use cache::Cache;
pub use crop::Crop;
pub use input::InputImage16;
pub use resample::{resample, Resample, ResampleQuality};
pub use transform::ColorTransformFilter;
