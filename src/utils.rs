use std::fmt;

use chrono::NaiveDateTime;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    InvalidOrder(String),
    InvalidData(String),
    Other(String),
}

impl std::error::Error for Error {}

impl std::convert::From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::convert::From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidData(e.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn as_secs(dur: std::time::Duration) -> f64 {
    (dur.as_secs() as f64) * 1.0 + (dur.subsec_nanos() as f64) * 0.000000001
}

pub struct Timer(std::time::SystemTime);

impl Timer {
    pub fn new() -> Timer {
        Timer(std::time::SystemTime::now())
    }

    pub fn since(&self) -> f64 {
        as_secs(self.0.elapsed().unwrap())
    }

    pub fn reset(&mut self) {
        self.0 = std::time::SystemTime::now();
    }
}

pub struct ThreadTimer(cpu_time::ThreadTime);

impl ThreadTimer {
    pub fn new() -> ThreadTimer {
        ThreadTimer(cpu_time::ThreadTime::now())
    }

    pub fn since(&self) -> f64 {
        as_secs(self.0.elapsed())
    }
}

pub struct LogTimes {
    pub timer: Timer,
    pub msgs: Vec<(String, f64)>,
    pub longest: usize,
}
impl LogTimes {
    pub fn new() -> LogTimes {
        LogTimes {
            timer: Timer::new(),
            msgs: Vec::new(),
            longest: 6,
        }
    }
    pub fn add(&mut self, msg: &str) {
        self.longest = usize::max(self.longest, msg.len());
        self.msgs.push((String::from(msg), self.timer.since()));
        self.timer.reset();
    }
}
impl fmt::Display for LogTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tot = 0.0;
        for (a, b) in &self.msgs {
            write!(f, "{}:{}{:6.2}s\n", a, " ".repeat(self.longest - a.len()), b)?;
            tot += b;
        }
        write!(f, "TOTAL:{}{:6.2}s", " ".repeat(self.longest - 5), tot)
    }
}

pub struct Timings<O> {
    pub timings: Vec<(String, f64)>,
    pub others: Vec<(String, O)>,
}

impl<O> Timings<O> {
    pub fn new() -> Timings<O> {
        Timings {
            timings: Vec::new(),
            others: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, tm: f64) {
        self.timings.push((String::from(name), tm));
    }

    pub fn add_other(&mut self, name: &str, other: O) {
        self.others.push((String::from(name), other));
    }
}

impl<O> fmt::Display for Timings<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timings:")?;
        for (name, tm) in &self.timings {
            write!(f, "\n{}: {:0.1}s", name, tm)?;
        }
        Ok(())
    }
}

const TIMEFORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn timestamp_string(ts: i64) -> String {
    match NaiveDateTime::from_timestamp_opt(ts, 0) {
        Some(dt) => dt.format(TIMEFORMAT).to_string(),
        None => format!("@{}", ts),
    }
}
