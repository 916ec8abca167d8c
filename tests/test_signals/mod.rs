pub mod generate;

pub use generate::tick_train;
