pub mod block;
pub mod template;
pub mod week;
