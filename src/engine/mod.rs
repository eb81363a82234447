pub mod amount_calculator;
pub mod form;
pub mod pipeline;
pub mod range;
pub mod range_drag;
pub mod session;
pub mod wizard;
