//! Schedules for recurring notifications, as five-field cron expressions.

use std::fmt;

/// A notification schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Daily {
        hour: u8,
        minute: u8,
    },
    /// `day_of_week` uses cron numbering (0 or 7 is Sunday, 1 is Monday).
    Weekly {
        hour: u8,
        minute: u8,
        day_of_week: u8,
    },
    Monthly {
        hour: u8,
        minute: u8,
        day_of_month: u8,
    },
    /// Anything the simple forms cannot express.
    Custom(String),
}

impl Schedule {
    /// Every day at 09:00.
    pub const DAILY: Schedule = Schedule::Daily { hour: 9, minute: 0 };
    /// Mondays at 09:00.
    pub const WEEKLY: Schedule = Schedule::Weekly {
        hour: 9,
        minute: 0,
        day_of_week: 1,
    };
    /// The 1st of each month at 09:00.
    pub const MONTHLY: Schedule = Schedule::Monthly {
        hour: 9,
        minute: 0,
        day_of_month: 1,
    };

    pub fn to_cron(&self) -> String {
        match self {
            Schedule::Daily { hour, minute } => format!("{} {} * * *", minute, hour),
            Schedule::Weekly {
                hour,
                minute,
                day_of_week,
            } => format!("{} {} * * {}", minute, hour, day_of_week),
            Schedule::Monthly {
                hour,
                minute,
                day_of_month,
            } => format!("{} {} {} * *", minute, hour, day_of_month),
            Schedule::Custom(expression) => expression.clone(),
        }
    }

    /// Recognise a cron expression.
    ///
    /// Returns `None` unless there are exactly five fields. Expressions whose
    /// fields are not plain numbers, or that restrict the month, are `Custom`.
    pub fn parse(expression: &str) -> Option<Schedule> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
            return None;
        };
        let custom = || Some(Schedule::Custom(fields.join(" ")));

        let (Some(minute), Some(hour)) = (number(minute, 0..=59), number(hour, 0..=23)) else {
            return custom();
        };
        if *month != "*" {
            return custom();
        }

        match (*day_of_month, *day_of_week) {
            ("*", "*") => Some(Schedule::Daily { hour, minute }),
            ("*", dow) => match number(dow, 0..=7) {
                Some(day_of_week) => Some(Schedule::Weekly {
                    hour,
                    minute,
                    day_of_week,
                }),
                None => custom(),
            },
            (dom, "*") => match number(dom, 1..=31) {
                Some(day_of_month) => Some(Schedule::Monthly {
                    hour,
                    minute,
                    day_of_month,
                }),
                None => custom(),
            },
            _ => custom(),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cron())
    }
}

fn number(field: &str, range: std::ops::RangeInclusive<u8>) -> Option<u8> {
    field.parse::<u8>().ok().filter(|n| range.contains(n))
}
