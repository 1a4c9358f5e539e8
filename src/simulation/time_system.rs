//! Game clock and schedule events
//!
//! The clock only moves when the world hands it scaled milliseconds. Every
//! hour boundary it crosses is reported back as typed events, which the
//! world dispatches to its behaviour handlers.

use anyhow::Result;
use std::fmt;

/// Real milliseconds (at 1x) per game hour
pub const MS_PER_GAME_HOUR: f32 = 10_000.0;
pub const START_HOUR: u32 = 6;
/// Speed multipliers the clock accepts; 0 pauses
pub const SPEEDS: [u32; 4] = [0, 1, 2, 4];

pub const WAKE_UP_HOUR: u32 = 6;
pub const WORK_START_HOUR: u32 = 9;
pub const LUNCH_START_HOUR: u32 = 12;
pub const LUNCH_END_HOUR: u32 = 13;
pub const WORK_END_HOUR: u32 = 17;
pub const SLEEP_HOUR: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn next(self) -> Self {
        match self {
            DayOfWeek::Monday => DayOfWeek::Tuesday,
            DayOfWeek::Tuesday => DayOfWeek::Wednesday,
            DayOfWeek::Wednesday => DayOfWeek::Thursday,
            DayOfWeek::Thursday => DayOfWeek::Friday,
            DayOfWeek::Friday => DayOfWeek::Saturday,
            DayOfWeek::Saturday => DayOfWeek::Sunday,
            DayOfWeek::Sunday => DayOfWeek::Monday,
        }
    }

    pub fn is_weekday(self) -> bool {
        !matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    Night,
    Dawn,
    Day,
    Dusk,
    Evening,
}

impl DayPhase {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            5..=6 => DayPhase::Dawn,
            7..=17 => DayPhase::Day,
            18..=19 => DayPhase::Dusk,
            20..=21 => DayPhase::Evening,
            _ => DayPhase::Night,
        }
    }
}

/// Daily routine markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEvent {
    WakeUp,
    WorkStart,
    LunchStart,
    LunchEnd,
    WorkEnd,
    Sleep,
}

impl ScheduleEvent {
    /// Schedule event starting at `hour`, if any. Work only happens on weekdays.
    pub fn at(hour: u32, day_of_week: DayOfWeek) -> Option<Self> {
        let weekday = day_of_week.is_weekday();
        match hour {
            WAKE_UP_HOUR => Some(ScheduleEvent::WakeUp),
            WORK_START_HOUR if weekday => Some(ScheduleEvent::WorkStart),
            LUNCH_START_HOUR => Some(ScheduleEvent::LunchStart),
            LUNCH_END_HOUR => Some(ScheduleEvent::LunchEnd),
            WORK_END_HOUR if weekday => Some(ScheduleEvent::WorkEnd),
            SLEEP_HOUR => Some(ScheduleEvent::Sleep),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScheduleEvent::WakeUp => "schedule:wake-up",
            ScheduleEvent::WorkStart => "schedule:work-start",
            ScheduleEvent::LunchStart => "schedule:lunch-start",
            ScheduleEvent::LunchEnd => "schedule:lunch-end",
            ScheduleEvent::WorkEnd => "schedule:work-end",
            ScheduleEvent::Sleep => "schedule:sleep",
        }
    }
}

/// Everything the clock reports
#[derive(Debug, Clone, PartialEq)]
pub enum TimeEvent {
    HourChanged {
        hour: u32,
        previous_hour: u32,
        day: u32,
    },
    DayChanged {
        day: u32,
        previous_day: u32,
    },
    PhaseChanged {
        phase: DayPhase,
        previous_phase: DayPhase,
        hour: u32,
    },
    SpeedChanged {
        speed: u32,
        previous_speed: u32,
    },
    Schedule {
        event: ScheduleEvent,
        hour: u32,
        day: u32,
    },
}

impl TimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TimeEvent::HourChanged { .. } => "time:hour-changed",
            TimeEvent::DayChanged { .. } => "time:day-changed",
            TimeEvent::PhaseChanged { .. } => "time:phase-changed",
            TimeEvent::SpeedChanged { .. } => "time:speed-changed",
            TimeEvent::Schedule { event, .. } => event.name(),
        }
    }
}

/// Game clock
#[derive(Debug, Clone)]
pub struct TimeSystem {
    hour: u32,
    day: u32,
    day_of_week: DayOfWeek,
    phase: DayPhase,
    speed: u32,
    /// Progress into the current hour
    hour_elapsed_ms: f32,
    /// Scaled milliseconds since the clock started
    total_elapsed_ms: f64,
}

impl Default for TimeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSystem {
    pub fn new() -> Self {
        Self {
            hour: START_HOUR,
            day: 1,
            day_of_week: DayOfWeek::Monday,
            phase: DayPhase::for_hour(START_HOUR),
            speed: 1,
            hour_elapsed_ms: 0.0,
            total_elapsed_ms: 0.0,
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn day_of_week(&self) -> DayOfWeek {
        self.day_of_week
    }

    pub fn phase(&self) -> DayPhase {
        self.phase
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.speed == 0
    }

    /// Scaled milliseconds since the start; the clock agents time waits with
    pub fn elapsed_ms(&self) -> f64 {
        self.total_elapsed_ms
    }

    pub fn minute(&self) -> u32 {
        (self.hour_elapsed_ms / MS_PER_GAME_HOUR * 60.0) as u32
    }

    pub fn is_work_hours(&self) -> bool {
        self.day_of_week.is_weekday() && (WORK_START_HOUR..WORK_END_HOUR).contains(&self.hour)
    }

    pub fn is_night(&self) -> bool {
        self.hour >= SLEEP_HOUR || self.hour < WAKE_UP_HOUR
    }

    /// Change the speed multiplier; only 0, 1, 2 and 4 are accepted
    pub fn set_speed(&mut self, speed: u32) -> Result<Option<TimeEvent>> {
        if !SPEEDS.contains(&speed) {
            anyhow::bail!("Invalid speed {}x (expected one of {:?})", speed, SPEEDS);
        }
        if speed == self.speed {
            return Ok(None);
        }
        let previous_speed = self.speed;
        self.speed = speed;
        Ok(Some(TimeEvent::SpeedChanged {
            speed,
            previous_speed,
        }))
    }

    /// Apply the speed multiplier to a frame delta
    pub fn scale(&self, delta_ms: f32) -> f32 {
        delta_ms * self.speed as f32
    }

    /// Advance the clock by already-scaled milliseconds
    pub fn advance(&mut self, scaled_ms: f32) -> Vec<TimeEvent> {
        let mut events = Vec::new();
        if scaled_ms <= 0.0 {
            return events;
        }

        self.total_elapsed_ms += scaled_ms as f64;
        self.hour_elapsed_ms += scaled_ms;
        while self.hour_elapsed_ms >= MS_PER_GAME_HOUR {
            self.hour_elapsed_ms -= MS_PER_GAME_HOUR;
            self.advance_hour(&mut events);
        }
        events
    }

    fn advance_hour(&mut self, events: &mut Vec<TimeEvent>) {
        let previous_hour = self.hour;
        self.hour = (self.hour + 1) % 24;

        if self.hour == 0 {
            let previous_day = self.day;
            self.day += 1;
            self.day_of_week = self.day_of_week.next();
            events.push(TimeEvent::DayChanged {
                day: self.day,
                previous_day,
            });
        }

        events.push(TimeEvent::HourChanged {
            hour: self.hour,
            previous_hour,
            day: self.day,
        });

        let phase = DayPhase::for_hour(self.hour);
        if phase != self.phase {
            events.push(TimeEvent::PhaseChanged {
                phase,
                previous_phase: self.phase,
                hour: self.hour,
            });
            self.phase = phase;
        }

        if let Some(event) = ScheduleEvent::at(self.hour, self.day_of_week) {
            events.push(TimeEvent::Schedule {
                event,
                hour: self.hour,
                day: self.day,
            });
        }
    }
}

impl fmt::Display for TimeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Day {} ({}) {:02}:{:02}",
            self.day,
            self.day_of_week,
            self.hour,
            self.minute()
        )
    }
}
