pub mod detail;
pub mod engine;
pub mod expression;
pub mod filters;
pub mod headless;
pub mod layers;
pub mod readiness;
pub mod reminder;
pub mod surface;
pub mod sync;
pub mod viewport;
