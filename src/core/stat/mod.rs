pub mod rolling_window;

pub use rolling_window::*;

/// `MetricTrait` is implemented by statistic structures that can be cleared in place.
/// The underlying metric should be with inner-mutability, thus, here we use `&self`.
pub trait MetricTrait: Send + Sync {
    fn reset(&self);
}
