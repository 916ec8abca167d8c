mod ticks;

pub use ticks::{TickTrainConfig, generate_tick_train};
