pub mod credential;
pub mod hours;
pub mod reconciler;
