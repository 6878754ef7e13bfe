pub mod life_timer;
pub mod settings;
pub mod timer;

pub use life_timer::{LifeTimer, LifeTimerData};
pub use settings::{Settings, Theme};
pub use timer::{default_timers, Timer, TimerKind};
