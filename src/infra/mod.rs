pub mod schedule_source;

pub use schedule_source::{
    load_default_schedule, load_schedule_file, parse_schedule, ScheduleLoadError, ScheduleSource,
};
