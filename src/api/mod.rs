pub mod extract;
pub mod forms;

pub use extract::JsonBody;
